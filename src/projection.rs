use super::*;

const ONLINE_MINUTES: i64 = 10;
const WARNING_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientField {
    BestDifficulty,
    WorkersCount,
}

impl ClientField {
    pub const ALL: [Self; 2] = [Self::BestDifficulty, Self::WorkersCount];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerField {
    BestDifficulty,
    HashRate,
    Status,
}

impl WorkerField {
    pub const ALL: [Self; 3] = [Self::BestDifficulty, Self::HashRate, Self::Status];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkField {
    Blocks,
    Difficulty,
    NetworkHashRate,
    PooledTransactions,
}

impl NetworkField {
    pub const ALL: [Self; 4] = [
        Self::Blocks,
        Self::Difficulty,
        Self::NetworkHashRate,
        Self::PooledTransactions,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoField {
    HighScoreBestDifficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateField {
    HashRate,
    NetworkShare,
    ActiveWorkers,
    TotalWorkers,
}

impl AggregateField {
    pub const ALL: [Self; 4] = [
        Self::HashRate,
        Self::NetworkShare,
        Self::ActiveWorkers,
        Self::TotalWorkers,
    ];
}

/// Which value a sensor reads out of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    Client {
        address: Address,
        field: ClientField,
    },
    Worker {
        address: Address,
        index: usize,
        field: WorkerField,
    },
    Network {
        field: NetworkField,
    },
    Info {
        field: InfoField,
    },
    Aggregate {
        field: AggregateField,
    },
}

impl Selector {
    /// Field key as named by the server, or a derived key for aggregates.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Client { field, .. } => match field {
                ClientField::BestDifficulty => "bestDifficulty",
                ClientField::WorkersCount => "workersCount",
            },
            Self::Worker { field, .. } => match field {
                WorkerField::BestDifficulty => "bestDifficulty",
                WorkerField::HashRate => "hashRate",
                WorkerField::Status => "status",
            },
            Self::Network { field } => match field {
                NetworkField::Blocks => "blocks",
                NetworkField::Difficulty => "difficulty",
                NetworkField::NetworkHashRate => "networkhashps",
                NetworkField::PooledTransactions => "pooledtx",
            },
            Self::Info { field } => match field {
                InfoField::HighScoreBestDifficulty => "highscore_bestDifficulty",
            },
            Self::Aggregate { field } => match field {
                AggregateField::HashRate => "total_hashrate",
                AggregateField::NetworkShare => "network_share",
                AggregateField::ActiveWorkers => "active_workers",
                AggregateField::TotalWorkers => "total_workers",
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Client { field, .. } => match field {
                ClientField::BestDifficulty => "Best Difficulty",
                ClientField::WorkersCount => "Workers Count",
            },
            Self::Worker { field, .. } => match field {
                WorkerField::BestDifficulty => "Best Difficulty",
                WorkerField::HashRate => "Hash Rate",
                WorkerField::Status => "Status",
            },
            Self::Network { field } => match field {
                NetworkField::Blocks => "Blocks",
                NetworkField::Difficulty => "Network Difficulty",
                NetworkField::NetworkHashRate => "Network Hash Rate",
                NetworkField::PooledTransactions => "Pooled Transactions",
            },
            Self::Info { field } => match field {
                InfoField::HighScoreBestDifficulty => "All-time Best Difficulty",
            },
            Self::Aggregate { field } => match field {
                AggregateField::HashRate => "Total Hash Rate",
                AggregateField::NetworkShare => "Network Share",
                AggregateField::ActiveWorkers => "Active Workers",
                AggregateField::TotalWorkers => "Total Workers",
            },
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Worker {
                field: WorkerField::HashRate,
                ..
            }
            | Self::Network {
                field: NetworkField::NetworkHashRate,
            }
            | Self::Aggregate {
                field: AggregateField::HashRate,
            } => Some("TH/s"),
            Self::Aggregate {
                field: AggregateField::NetworkShare,
            } => Some("%"),
            _ => None,
        }
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            Self::Client { address, .. } | Self::Worker { address, .. } => Some(address),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    #[display("online")]
    Online,
    #[display("warning")]
    Warning,
    #[display("offline")]
    Offline,
}

impl WorkerStatus {
    /// Recency of `lastSeen` when the server reports it, otherwise whether
    /// the worker is hashing at all.
    pub fn of(worker: &WorkerRecord, now: DateTime<Utc>) -> Self {
        match worker.last_seen() {
            Some(last_seen) => {
                let minutes = (now - last_seen).num_minutes();
                if minutes < ONLINE_MINUTES {
                    Self::Online
                } else if minutes < WARNING_MINUTES {
                    Self::Warning
                } else {
                    Self::Offline
                }
            }
            None if worker.raw_hash_rate().is_active() => Self::Online,
            None => Self::Offline,
        }
    }
}

/// Read-only view over the last committed snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Projection<'a> {
    snapshot: Option<&'a Snapshot>,
    last_update_success: bool,
    now: DateTime<Utc>,
}

impl<'a> Projection<'a> {
    pub fn new(snapshot: Option<&'a Snapshot>, last_update_success: bool) -> Self {
        Self {
            snapshot,
            last_update_success,
            now: Utc::now(),
        }
    }

    pub fn from_status(status: &'a Status) -> Self {
        Self::new(status.snapshot.as_deref(), status.last_update_success)
    }

    pub fn at(self, now: DateTime<Utc>) -> Self {
        Self { now, ..self }
    }

    fn worker(&self, address: &Address, index: usize) -> Option<&'a WorkerRecord> {
        self.snapshot?.client.get(address)?.workers.get(index)
    }

    pub fn value(&self, selector: &Selector) -> Option<Value> {
        let snapshot = self.snapshot?;

        match selector {
            Selector::Client { address, field } => {
                let client = snapshot.client.get(address)?;
                match field {
                    ClientField::BestDifficulty => {
                        units::format_difficulty(client.best_difficulty.as_ref())
                    }
                    ClientField::WorkersCount => client.workers_count.clone(),
                }
            }
            Selector::Worker {
                address,
                index,
                field,
            } => {
                let worker = self.worker(address, *index)?;
                match field {
                    WorkerField::BestDifficulty => {
                        units::format_difficulty(worker.best_difficulty.as_ref())
                    }
                    WorkerField::HashRate => {
                        units::to_terahash_per_second(worker.hash_rate.as_ref())
                    }
                    WorkerField::Status => {
                        Some(json!(WorkerStatus::of(worker, self.now).to_string()))
                    }
                }
            }
            Selector::Network { field } => {
                let network = &snapshot.network;
                match field {
                    NetworkField::Blocks => network.blocks.clone(),
                    NetworkField::Difficulty => network.difficulty.clone(),
                    NetworkField::NetworkHashRate => {
                        units::to_terahash_per_second(network.networkhashps.as_ref())
                    }
                    NetworkField::PooledTransactions => network.pooledtx.clone(),
                }
            }
            Selector::Info {
                field: InfoField::HighScoreBestDifficulty,
            } => units::format_difficulty(
                snapshot.info.high_scores.first()?.best_difficulty.as_ref(),
            ),
            Selector::Aggregate { field } => match field {
                AggregateField::HashRate => Some(json!(self.aggregate_hashrate())),
                AggregateField::NetworkShare => self.network_share().map(|share| json!(share)),
                AggregateField::ActiveWorkers => Some(json!(self.active_workers())),
                AggregateField::TotalWorkers => Some(json!(self.total_workers())),
            },
        }
    }

    pub fn available(&self, selector: &Selector) -> bool {
        if !self.last_update_success {
            return false;
        }

        let Some(snapshot) = self.snapshot else {
            return false;
        };

        match selector {
            Selector::Client { address, .. } => snapshot.client.contains_key(address),
            Selector::Worker { address, index, .. } => self.worker(address, *index).is_some(),
            Selector::Network { .. } => !snapshot.network.is_empty(),
            Selector::Info { .. } => !snapshot.info.high_scores.is_empty(),
            Selector::Aggregate {
                field: AggregateField::NetworkShare,
            } => self.network_share().is_some(),
            Selector::Aggregate { .. } => !snapshot.client.is_empty(),
        }
    }

    /// Extra state reported next to the value. Workers expose their name and
    /// any fields the server sent beyond the known ones.
    pub fn attributes(&self, selector: &Selector) -> Map<String, Value> {
        let mut attributes = Map::new();

        if let Selector::Worker { address, index, .. } = selector {
            if let Some(worker) = self.worker(address, *index) {
                attributes.insert("worker_name".into(), json!(worker.display_name(*index)));
                attributes.extend(worker.extra.clone());
            }
        }

        attributes
    }

    fn raw_hash_rate(&self) -> HashRate {
        self.snapshot
            .map(Snapshot::total_hash_rate)
            .unwrap_or_default()
    }

    /// Sum of every worker's hash rate in TH/s.
    pub fn aggregate_hashrate(&self) -> f64 {
        self.raw_hash_rate().terahash()
    }

    /// Percentage of the network hash rate, six decimals. `None` unless the
    /// network hash rate is a positive number.
    pub fn network_share(&self) -> Option<f64> {
        let network = self
            .snapshot?
            .network
            .networkhashps
            .as_ref()
            .and_then(units::numeric)
            .filter(|hashes| *hashes > 0.0)?;

        Some(units::round_to(self.raw_hash_rate().0 / network * 100.0, 6))
    }

    pub fn active_workers(&self) -> usize {
        self.snapshot
            .map(|snapshot| {
                snapshot
                    .workers()
                    .filter(|(_, worker)| worker.raw_hash_rate().is_active())
                    .count()
            })
            .unwrap_or_default()
    }

    pub fn total_workers(&self) -> usize {
        self.snapshot
            .map(|snapshot| snapshot.workers().count())
            .unwrap_or_default()
    }
}
