use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Monitor {}

impl Monitor {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        let coordinator = settings.coordinator()?;

        coordinator.first_refresh().await?;

        let registrar = Arc::new(Mutex::new(Registrar::new(coordinator.entry_id())));

        if let Some(snapshot) = coordinator.snapshot() {
            let added = registrar.lock().register(&snapshot);
            info!(
                "Registered {} sensors for {}",
                added.len(),
                coordinator.entry_id()
            );
            info!("{}", summary(coordinator.entry_id(), &snapshot));
        }

        let mut tasks = JoinSet::new();

        if let Some(port) = settings.http_port() {
            http_server::spawn(
                settings.http_address(),
                port,
                api::router(coordinator.clone(), registrar.clone()),
                cancel_token.clone(),
                &mut tasks,
            )?;
        }

        let mut topology = coordinator.subscribe_topology();
        let mut status = coordinator.subscribe();
        status.mark_unchanged();

        tasks.spawn(coordinator.clone().run(cancel_token.clone()));

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                changed = topology.recv() => match changed {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Some(snapshot) = coordinator.snapshot() {
                            register_new(&registrar, &snapshot);
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }

                    let current = status.borrow_and_update().clone();

                    if current.last_update_success
                        && let Some(snapshot) = &current.snapshot
                    {
                        register_new(&registrar, snapshot);
                        info!("{}", summary(coordinator.entry_id(), snapshot));
                    }
                }
            }
        }

        while tasks.join_next().await.is_some() {}

        Ok(())
    }
}

/// Sections missing from earlier cycles (network, info, a client that
/// failed) get their sensors once they show up.
fn register_new(registrar: &Mutex<Registrar>, snapshot: &Snapshot) -> usize {
    let added = registrar.lock().register(snapshot);

    for sensor in &added {
        info!("New sensor {}", sensor.name);
    }

    added.len()
}

fn summary(entry: &str, snapshot: &Snapshot) -> String {
    let projection = Projection::new(Some(snapshot), true);

    let mut summary = format!(
        "{entry}: {}/{} workers active, {}",
        projection.active_workers(),
        projection.total_workers(),
        snapshot.total_hash_rate(),
    );

    if let Some(share) = projection.network_share() {
        summary.push_str(&format!(", {share}% of network"));
    }

    summary
}
