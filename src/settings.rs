use {super::*, options::Options};

const CONFIG_FILE: &str = "minemonitor.toml";
const ENV_PREFIX: &str = "MINEMONITOR_";

/// TOML config file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub addresses: Option<Vec<Address>>,
    pub scan_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub http_address: Option<String>,
    pub http_port: Option<u16>,
}

/// Unified settings struct with all resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub addresses: Option<Vec<Address>>,
    pub scan_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub http_address: Option<String>,
    pub http_port: Option<u16>,
}

impl Settings {
    /// Load settings from all sources with proper priority
    pub(crate) fn load(options: Options) -> Result<Self> {
        let mut env = BTreeMap::<String, String>::new();

        for (var, value) in env::vars_os() {
            let Some(var) = var.to_str() else {
                continue;
            };

            let Some(key) = var.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            env.insert(
                key.into(),
                value.into_string().map_err(|value| {
                    anyhow!(
                        "environment variable `{var}` not valid unicode: `{}`",
                        value.to_string_lossy()
                    )
                })?,
            );
        }

        Self::merge(options, env)
    }

    pub(crate) fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
        let settings = Self::from_options(&options).or(Self::from_env(&env)?);

        let config = match Self::find_config_path(&settings) {
            Some(path) => Self::read_config(&path)?,
            None => Config::default(),
        };

        let settings = settings.or(Self::from_config(&config)).or_defaults();

        settings.validate()?;

        Ok(settings)
    }

    fn read_config(path: &FsPath) -> Result<Config> {
        toml::from_str(
            &fs::read_to_string(path)
                .context(anyhow!("failed to open config file `{}`", path.display()))?,
        )
        .context(anyhow!(
            "failed to deserialize config file `{}`",
            path.display()
        ))
    }

    fn find_config_path(settings: &Self) -> Option<PathBuf> {
        if let Some(path) = &settings.config {
            return Some(path.clone());
        }

        if let Some(dir) = &settings.config_dir {
            let path = dir.join(CONFIG_FILE);
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::config_dir()?.join("minemonitor").join(CONFIG_FILE);

        path.exists().then_some(path)
    }

    pub(crate) fn from_options(options: &Options) -> Self {
        Self {
            config: options.config.clone(),
            config_dir: options.config_dir.clone(),
            host: options.host.clone(),
            port: options.port,
            addresses: (!options.addresses.is_empty()).then(|| options.addresses.clone()),
            scan_interval: options.scan_interval,
            timeout: options.timeout,
            http_address: options.http_address.clone(),
            http_port: options.http_port,
        }
    }

    pub fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        let get_string = |key: &str| env.get(key).cloned();

        let get_path = |key: &str| env.get(key).map(PathBuf::from);

        let get_u16 = |key: &str| -> Result<Option<u16>> {
            env.get(key)
                .map(|int| int.parse::<u16>())
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable {ENV_PREFIX}{key} as u16")
                })
        };

        let get_u64 = |key: &str| -> Result<Option<u64>> {
            env.get(key)
                .map(|int| int.parse::<u64>())
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable {ENV_PREFIX}{key} as u64")
                })
        };

        let get_addresses = |key: &str| -> Result<Option<Vec<Address>>> {
            env.get(key)
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(Address::from_str)
                        .collect::<Result<Vec<Address>, AddressError>>()
                })
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable {ENV_PREFIX}{key} as addresses")
                })
        };

        Ok(Self {
            config: get_path("CONFIG"),
            config_dir: get_path("CONFIG_DIR"),
            host: get_string("HOST"),
            port: get_u16("PORT")?,
            addresses: get_addresses("ADDRESSES")?,
            scan_interval: get_u64("SCAN_INTERVAL")?,
            timeout: get_u64("TIMEOUT")?,
            http_address: get_string("HTTP_ADDRESS"),
            http_port: get_u16("HTTP_PORT")?,
        })
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            config: None,
            config_dir: None,
            host: config.host.clone(),
            port: config.port,
            addresses: config.addresses.clone(),
            scan_interval: config.scan_interval,
            timeout: config.timeout,
            http_address: config.http_address.clone(),
            http_port: config.http_port,
        }
    }

    /// Merge self with another Settings, self takes priority
    pub fn or(self, other: Self) -> Self {
        Self {
            config: self.config.or(other.config),
            config_dir: self.config_dir.or(other.config_dir),
            host: self.host.or(other.host),
            port: self.port.or(other.port),
            addresses: self.addresses.or(other.addresses),
            scan_interval: self.scan_interval.or(other.scan_interval),
            timeout: self.timeout.or(other.timeout),
            http_address: self.http_address.or(other.http_address),
            http_port: self.http_port.or(other.http_port),
        }
    }

    fn or_defaults(self) -> Self {
        Self {
            port: Some(self.port.unwrap_or(DEFAULT_PORT)),
            scan_interval: Some(
                self.scan_interval
                    .unwrap_or(DEFAULT_SCAN_INTERVAL.as_secs()),
            ),
            timeout: Some(self.timeout.unwrap_or(DEFAULT_TIMEOUT.as_secs())),
            http_address: Some(self.http_address.unwrap_or_else(|| "127.0.0.1".into())),
            ..self
        }
    }

    fn validate(&self) -> Result {
        match &self.host {
            Some(host) if !host.trim().is_empty() => {}
            _ => bail!("no mining server host configured"),
        }

        ensure!(
            self.scan_interval != Some(0),
            "scan interval must be greater than zero"
        );

        ensure!(self.timeout != Some(0), "timeout must be greater than zero");

        self.address_set()?;

        Ok(())
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or_default().trim()
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Identifier of the mining server this configuration polls.
    pub fn entry_id(&self) -> String {
        format!("{}:{}", self.host(), self.port())
    }

    pub fn address_set(&self) -> Result<AddressSet> {
        AddressSet::new(self.addresses.clone().unwrap_or_default())
            .context("invalid address configuration")
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SCAN_INTERVAL)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn http_address(&self) -> &str {
        self.http_address.as_deref().unwrap_or("127.0.0.1")
    }

    pub fn http_port(&self) -> Option<u16> {
        self.http_port
    }

    pub(crate) fn fetcher(&self) -> Result<Fetcher> {
        Fetcher::new(
            Arc::new(ReqwestClient::new()?),
            self.host(),
            self.port(),
            self.timeout(),
        )
    }

    pub(crate) fn coordinator(&self) -> Result<Coordinator> {
        Ok(Coordinator::new(
            self.fetcher()?,
            self.address_set()?,
            self.scan_interval(),
        ))
    }
}
