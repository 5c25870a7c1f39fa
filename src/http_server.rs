use super::*;

pub(crate) mod error;

/// Binds the control API and serves it until `cancel_token` fires.
pub(crate) fn spawn(
    address: &str,
    port: u16,
    router: Router,
    cancel_token: CancellationToken,
    tasks: &mut JoinSet<()>,
) -> Result<SocketAddr> {
    info!("Spawning http server task");

    let listener = bind_listener(address, port)?;
    let local_addr = listener.local_addr()?;
    let listener = tokio::net::TcpListener::from_std(listener)?;

    info!("HTTP server listening on http://{local_addr}");

    tasks.spawn(async move {
        let shutdown = async move {
            cancel_token.cancelled().await;
            info!("Shutting down http server");
        };

        if let Err(err) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            error!("HTTP server error: {err}");
        }
    });

    Ok(local_addr)
}

fn bind_listener(address: &str, port: u16) -> Result<std::net::TcpListener> {
    let addr = (address, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow!("failed to resolve address {address}:{port}"))?;

    let listener = std::net::TcpListener::bind(addr)
        .with_context(|| format!("failed to bind HTTP server to {addr}"))?;

    listener.set_nonblocking(true)?;

    Ok(listener)
}
