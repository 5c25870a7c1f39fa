use super::*;

#[derive(Debug, Snafu)]
pub enum SetupError {
    #[snafu(display("Failed to retrieve data from mining server at {server}"))]
    NotReady {
        server: String,
        source: UpdateFailed,
    },
}

/// What observers see. Replaced as a whole after every cycle.
#[derive(Debug, Clone, Default)]
pub struct Status {
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_update_success: bool,
    pub last_error: Option<UpdateFailed>,
    pub last_updated: Option<DateTime<Utc>>,
    pub cycles: u64,
    generation: u64,
}

impl Status {
    fn outcome(&self) -> Result<(), UpdateFailed> {
        match (&self.last_error, self.last_update_success) {
            (Some(err), false) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

/// Workers that appeared since the previous cycle, per address.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyChanged {
    pub new_workers: BTreeMap<Address, BTreeSet<String>>,
}

impl TopologyChanged {
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.new_workers.keys()
    }
}

/// The address set plus a counter bumped on every successful mutation.
struct Tracked {
    set: AddressSet,
    generation: u64,
}

struct Inner {
    fetcher: Fetcher,
    addresses: RwLock<Tracked>,
    scan_interval: Duration,
    status: watch::Sender<Status>,
    topology: broadcast::Sender<TopologyChanged>,
    cycle: tokio::sync::Mutex<()>,
}

/// Owns the polling schedule and the last committed [`Snapshot`].
///
/// At most one fetch runs at a time. A refresh requested while another is in
/// flight waits for it and returns its outcome instead of starting a second
/// one.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn new(fetcher: Fetcher, addresses: AddressSet, scan_interval: Duration) -> Self {
        let (status, _) = watch::channel(Status::default());
        let (topology, _) = broadcast::channel(16);

        Self {
            inner: Arc::new(Inner {
                fetcher,
                addresses: RwLock::new(Tracked {
                    set: addresses,
                    generation: 0,
                }),
                scan_interval,
                status,
                topology,
                cycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// `host:port`, used as the entry id of every sensor this coordinator
    /// backs.
    pub fn entry_id(&self) -> &str {
        self.inner.fetcher.server()
    }

    pub fn scan_interval(&self) -> Duration {
        self.inner.scan_interval
    }

    pub fn status(&self) -> Status {
        self.inner.status.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.status.borrow().snapshot.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.status.borrow().last_update_success
    }

    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.inner.status.subscribe()
    }

    pub fn subscribe_topology(&self) -> broadcast::Receiver<TopologyChanged> {
        self.inner.topology.subscribe()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.inner.addresses.read().set.to_vec()
    }

    fn mutate(
        &self,
        change: impl FnOnce(&mut AddressSet) -> Result<(), AddressError>,
    ) -> Result<(), AddressError> {
        let mut tracked = self.inner.addresses.write();
        change(&mut tracked.set)?;
        tracked.generation += 1;
        Ok(())
    }

    pub fn add_address(&self, address: Address) -> Result<(), AddressError> {
        match self.mutate(|set| set.add(address.clone())) {
            Ok(()) => {
                info!("Added bitcoin address {address} to {}", self.entry_id());
                Ok(())
            }
            Err(err) => {
                warn!("{err}");
                Err(err)
            }
        }
    }

    pub fn remove_address(&self, address: &Address) -> Result<(), AddressError> {
        match self.mutate(|set| set.remove(address)) {
            Ok(()) => {
                info!("Removed bitcoin address {address} from {}", self.entry_id());
                Ok(())
            }
            Err(err) => {
                warn!("{err}");
                Err(err)
            }
        }
    }

    /// Initial refresh. Failing here means the coordinator never became
    /// ready and should not be used.
    pub async fn first_refresh(&self) -> Result<(), SetupError> {
        self.refresh()
            .await
            .map_err(|source| SetupError::NotReady {
                server: self.entry_id().into(),
                source,
            })
    }

    /// Runs a cycle, or joins the one in flight if it was fetched with the
    /// current address set.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let requested_after = self.inner.status.borrow().cycles;

        let _cycle = self.inner.cycle.lock().await;

        let (addresses, generation) = {
            let tracked = self.inner.addresses.read();
            (tracked.set.to_vec(), tracked.generation)
        };

        {
            let status = self.inner.status.borrow();
            if status.cycles != requested_after && status.generation == generation {
                debug!(
                    "Refresh of {} coalesced into cycle {}",
                    self.entry_id(),
                    status.cycles
                );
                return status.outcome();
            }
        }

        let result = self.inner.fetcher.fetch(&addresses).await;

        self.commit(result, generation)
    }

    fn commit(
        &self,
        result: Result<Snapshot, UpdateFailed>,
        generation: u64,
    ) -> Result<(), UpdateFailed> {
        let was_successful = {
            let status = self.inner.status.borrow();
            status.last_update_success || status.cycles == 0
        };

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let mut changed = None;

                self.inner.status.send_modify(|status| {
                    if let Some(previous) = &status.snapshot {
                        let new_workers = previous.new_workers(&snapshot);
                        if !new_workers.is_empty() {
                            changed = Some(TopologyChanged { new_workers });
                        }
                    }

                    status.snapshot = Some(snapshot);
                    status.last_update_success = true;
                    status.last_error = None;
                    status.last_updated = Some(Utc::now());
                    status.cycles += 1;
                    status.generation = generation;
                });

                if !was_successful {
                    info!("Fetching data from {} recovered", self.entry_id());
                }

                if let Some(changed) = changed {
                    for (address, workers) in &changed.new_workers {
                        info!("New workers detected for {address}: {workers:?}");
                    }
                    self.inner.topology.send(changed).ok();
                }

                Ok(())
            }
            Err(err) => {
                if was_successful {
                    error!("Error fetching data: {err}");
                } else {
                    debug!("Error fetching data: {err}");
                }

                self.inner.status.send_modify(|status| {
                    status.last_update_success = false;
                    status.last_error = Some(err.clone());
                    status.cycles += 1;
                    status.generation = generation;
                });

                Err(err)
            }
        }
    }

    /// Refreshes every `scan_interval` until cancelled. The first tick fires
    /// one interval from now; call [`Coordinator::first_refresh`] before.
    pub async fn run(self, cancel_token: CancellationToken) {
        let mut ticker = interval_at(
            Instant::now() + self.inner.scan_interval,
            self.inner.scan_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Polling {} every {}s",
            self.entry_id(),
            self.inner.scan_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Stopping coordinator for {}", self.entry_id());
                    break;
                }
                _ = ticker.tick() => {
                    // failures are recorded on the status and logged in commit
                    self.refresh().await.ok();
                }
            }
        }
    }
}
