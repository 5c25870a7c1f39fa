use super::*;

/// Everything fetched during one successful cycle.
///
/// `client` only holds addresses whose endpoint answered 200. `network` and
/// `info` are empty when their endpoint did not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub client: BTreeMap<Address, ClientRecord>,
    pub network: NetworkRecord,
    pub info: InfoRecord,
}

impl Snapshot {
    pub fn worker_names(&self, address: &Address) -> BTreeSet<String> {
        self.client
            .get(address)
            .map(|client| {
                client
                    .workers
                    .iter()
                    .enumerate()
                    .map(|(i, worker)| worker.display_name(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Names present in `next` but not in `self`, for every address that
    /// both snapshots contain.
    pub fn new_workers(&self, next: &Snapshot) -> BTreeMap<Address, BTreeSet<String>> {
        next.client
            .keys()
            .filter(|address| self.client.contains_key(*address))
            .filter_map(|address| {
                let known = self.worker_names(address);
                let added = next
                    .worker_names(address)
                    .into_iter()
                    .filter(|name| !known.contains(name))
                    .collect::<BTreeSet<String>>();

                (!added.is_empty()).then(|| (address.clone(), added))
            })
            .collect()
    }

    pub fn workers(&self) -> impl Iterator<Item = (&Address, &WorkerRecord)> {
        self.client
            .iter()
            .flat_map(|(address, client)| client.workers.iter().map(move |w| (address, w)))
    }

    pub fn total_hash_rate(&self) -> HashRate {
        self.workers().map(|(_, worker)| worker.raw_hash_rate()).sum()
    }
}

#[cfg(test)]
pub(crate) fn snapshot_with(workers: &[(Address, Vec<&str>)]) -> Snapshot {
    Snapshot {
        client: workers
            .iter()
            .map(|(address, names)| {
                (
                    address.clone(),
                    ClientRecord {
                        workers_count: Some(json!(names.len())),
                        workers: names
                            .iter()
                            .map(|name| WorkerRecord {
                                name: Some(name.to_string()),
                                hash_rate: Some(json!(1e12)),
                                ..Default::default()
                            })
                            .collect(),
                        ..Default::default()
                    },
                )
            })
            .collect(),
        ..Default::default()
    }
}
