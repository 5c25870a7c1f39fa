use super::*;

/// Stable identity of a sensor. Worker sensors are named after the worker
/// they were created for, but their readings follow its index in the server's
/// list, so a reordered list moves values between ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay)]
pub struct SensorId {
    pub entry: String,
    pub scope: String,
    pub worker: Option<String>,
    pub key: &'static str,
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}_{}", self.entry, self.scope)?;

        if let Some(worker) = &self.worker {
            write!(f, "_{worker}")?;
        }

        write!(f, "_{}", self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub device: String,
    pub unit: Option<&'static str>,
    pub selector: Selector,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: SensorId,
    pub name: String,
    pub unit: Option<&'static str>,
    pub value: Option<Value>,
    pub available: bool,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Owns the set of sensors created so far and adds the ones a new snapshot
/// calls for.
#[derive(Debug, Clone)]
pub struct Registrar {
    entry: String,
    registered: BTreeSet<SensorId>,
    sensors: Vec<Sensor>,
}

impl Registrar {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            entry: entry.into(),
            registered: BTreeSet::new(),
            sensors: Vec::new(),
        }
    }

    fn sensor(&self, selector: Selector, worker: Option<String>) -> Sensor {
        let (scope, name, device) = match &selector {
            Selector::Client { address, .. } | Selector::Worker { address, .. } => {
                let name = match &worker {
                    Some(worker) => format!("{address} {worker} {}", selector.label()),
                    None => format!("{address} {}", selector.label()),
                };
                (address.to_string(), name, format!("MineMonitor {address}"))
            }
            Selector::Network { .. } => (
                "network".into(),
                format!("Bitcoin Network {}", selector.label()),
                "MineMonitor Network".into(),
            ),
            Selector::Info { .. } => (
                "info".into(),
                format!("MineMonitor {}", selector.label()),
                "MineMonitor Network".into(),
            ),
            Selector::Aggregate { .. } => (
                "aggregate".into(),
                format!("MineMonitor {}", selector.label()),
                "MineMonitor Network".into(),
            ),
        };

        Sensor {
            id: SensorId {
                entry: self.entry.clone(),
                scope,
                worker,
                key: selector.key(),
            },
            name,
            device,
            unit: selector.unit(),
            selector,
        }
    }

    /// Every sensor the snapshot calls for, registered or not.
    pub fn required(&self, snapshot: &Snapshot) -> Vec<Sensor> {
        let mut sensors = Vec::new();

        for (address, client) in &snapshot.client {
            for field in ClientField::ALL {
                sensors.push(self.sensor(
                    Selector::Client {
                        address: address.clone(),
                        field,
                    },
                    None,
                ));
            }

            for (index, worker) in client.workers.iter().enumerate() {
                for field in WorkerField::ALL {
                    sensors.push(self.sensor(
                        Selector::Worker {
                            address: address.clone(),
                            index,
                            field,
                        },
                        Some(worker.display_name(index)),
                    ));
                }
            }
        }

        if !snapshot.network.is_empty() {
            for field in NetworkField::ALL {
                sensors.push(self.sensor(Selector::Network { field }, None));
            }
        }

        if !snapshot.info.high_scores.is_empty() {
            sensors.push(self.sensor(
                Selector::Info {
                    field: InfoField::HighScoreBestDifficulty,
                },
                None,
            ));
        }

        for field in AggregateField::ALL {
            sensors.push(self.sensor(Selector::Aggregate { field }, None));
        }

        sensors
    }

    /// Registers whatever is missing and returns only the sensors that were
    /// added by this call.
    pub fn register(&mut self, snapshot: &Snapshot) -> Vec<Sensor> {
        let added = self
            .required(snapshot)
            .into_iter()
            .filter(|sensor| !self.registered.contains(&sensor.id))
            .collect::<Vec<Sensor>>();

        for sensor in &added {
            debug!("Registering sensor {}", sensor.id);
            self.registered.insert(sensor.id.clone());
        }

        self.sensors.extend(added.iter().cloned());

        added
    }

    pub fn is_registered(&self, id: &SensorId) -> bool {
        self.registered.contains(id)
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn readings(&self, projection: &Projection) -> Vec<Reading> {
        self.sensors
            .iter()
            .map(|sensor| Reading {
                id: sensor.id.clone(),
                name: sensor.name.clone(),
                unit: sensor.unit,
                value: projection.value(&sensor.selector),
                available: projection.available(&sensor.selector),
                attributes: projection.attributes(&sensor.selector),
            })
            .collect()
    }
}
