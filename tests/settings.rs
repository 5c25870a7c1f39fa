use super::*;

#[test]
fn host_is_required() {
    let stderr = CommandBuilder::new(format!("--address {} status", address(1)))
        .expected_exit_code(1)
        .run_and_extract_stderr();

    assert!(
        stderr.contains("error: no mining server host configured"),
        "{stderr}"
    );
}

#[test]
fn invalid_address_is_a_usage_error() {
    let stderr = CommandBuilder::new("--host 127.0.0.1 --address 2short status")
        .expected_exit_code(2)
        .run_and_extract_stderr();

    assert!(stderr.contains("Invalid bitcoin address `2short`"), "{stderr}");
}

#[test]
fn duplicate_addresses_are_rejected() {
    let stderr = CommandBuilder::new(format!(
        "--host 127.0.0.1 --address {} --address {} status",
        address(1),
        address(1)
    ))
    .expected_exit_code(1)
    .run_and_extract_stderr();

    assert!(
        stderr.contains("error: invalid address configuration"),
        "{stderr}"
    );
    assert!(stderr.contains("already exists"), "{stderr}");
}

#[test]
fn configuration_from_environment() {
    let server = MockServer::healthy(&[address(1), address(2)]);

    let stdout = CommandBuilder::new("check")
        .env("MINEMONITOR_HOST", "127.0.0.1")
        .env("MINEMONITOR_PORT", server.port())
        .env(
            "MINEMONITOR_ADDRESSES",
            format!("{},{}", address(2), address(1)),
        )
        .run_and_extract_stdout();

    assert_eq!(
        stdout,
        format!(
            "Connected to mining server at 127.0.0.1:{} as {}\n",
            server.port(),
            address(2)
        )
    );
}

#[test]
fn configuration_from_config_dir() {
    let server = MockServer::healthy(&[address(1)]);

    let stdout = CommandBuilder::new("--config-dir . check")
        .write(
            "minemonitor.toml",
            format!(
                "host = \"127.0.0.1\"\nport = {}\naddresses = [\"{}\"]\n",
                server.port(),
                address(1)
            ),
        )
        .run_and_extract_stdout();

    assert!(stdout.starts_with("Connected"), "{stdout}");
}

#[test]
fn configuration_from_xdg_config_dir() {
    let server = MockServer::healthy(&[address(1)]);

    let builder = CommandBuilder::new("check");

    let dir = builder.tempdir().join(".config").join("minemonitor");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("minemonitor.toml"),
        format!(
            "host = \"127.0.0.1\"\nport = {}\naddresses = [\"{}\"]\n",
            server.port(),
            address(1)
        ),
    )
    .unwrap();

    assert!(builder.run_and_extract_stdout().starts_with("Connected"));
}

#[test]
fn cli_overrides_config_file() {
    let server = MockServer::healthy(&[address(1)]);

    let stdout = CommandBuilder::new(format!("--config-dir . --port {} check", server.port()))
        .write(
            "minemonitor.toml",
            format!(
                "host = \"127.0.0.1\"\nport = 1\naddresses = [\"{}\"]\n",
                address(1)
            ),
        )
        .run_and_extract_stdout();

    assert!(stdout.starts_with("Connected"), "{stdout}");
}

#[test]
fn unknown_config_keys_are_rejected() {
    let stderr = CommandBuilder::new("--config minemonitor.toml check")
        .write("minemonitor.toml", "host = \"127.0.0.1\"\ncolor = \"red\"\n")
        .expected_exit_code(1)
        .run_and_extract_stderr();

    assert!(
        stderr.contains("error: failed to deserialize config file `minemonitor.toml`"),
        "{stderr}"
    );
}
