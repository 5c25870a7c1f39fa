use super::*;

pub use error::{EndpointUnavailable, ProbeError, UpdateFailed};

mod error;

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Endpoint {
    #[display("client data for {_0}")]
    Client(Address),
    #[display("network data")]
    Network,
    #[display("info data")]
    Info,
}

impl Endpoint {
    fn path(&self) -> String {
        match self {
            Self::Client(address) => format!("client/{address}"),
            Self::Network => "network".into(),
            Self::Info => "info".into(),
        }
    }
}

/// Pulls one [`Snapshot`] from a mining server's `/api`.
///
/// Every request of a cycle shares a single deadline. Running out of time
/// abandons the cycle, while a non-200 answer only blanks the section it
/// belongs to.
#[derive(Clone)]
pub struct Fetcher {
    client: Arc<dyn HttpClient>,
    server: String,
    base: Url,
    deadline: Duration,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("base", &self.base.as_str())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Fetcher {
    pub fn new(
        client: Arc<dyn HttpClient>,
        host: &str,
        port: u16,
        deadline: Duration,
    ) -> Result<Self> {
        ensure!(!host.trim().is_empty(), "mining server host must not be empty");
        ensure!(!deadline.is_zero(), "fetch timeout must be positive");

        let server = format!("{}:{port}", host.trim());

        let base = Url::parse(&format!("http://{server}/api/"))
            .with_context(|| format!("invalid mining server address `{server}`"))?;

        Ok(Self {
            client,
            server,
            base,
            deadline,
        })
    }

    /// `host:port` of the mining server.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, UpdateFailed> {
        self.base.join(&endpoint.path()).map_err(|err| {
            error::FetchSnafu {
                endpoint: endpoint.clone(),
                url: format!("{}{}", self.base, endpoint.path()),
                message: err.to_string(),
            }
            .build()
        })
    }

    pub async fn fetch(&self, addresses: &[Address]) -> Result<Snapshot, UpdateFailed> {
        let started = Instant::now();

        let snapshot = match timeout(self.deadline, self.fetch_sections(addresses)).await {
            Ok(result) => result?,
            Err(_) => {
                return error::FetchTimeoutSnafu {
                    server: self.server.clone(),
                    deadline: self.deadline,
                }
                .fail();
            }
        };

        debug!(
            "Fetched {} of {} clients from {} in {:?}",
            snapshot.client.len(),
            addresses.len(),
            self.server,
            started.elapsed()
        );

        Ok(snapshot)
    }

    async fn fetch_sections(&self, addresses: &[Address]) -> Result<Snapshot, UpdateFailed> {
        let mut snapshot = Snapshot::default();

        for address in addresses {
            if let Some(client) = self.get_json(Endpoint::Client(address.clone())).await? {
                snapshot.client.insert(address.clone(), client);
            }
        }

        if let Some(network) = self.get_json(Endpoint::Network).await? {
            snapshot.network = network;
        }

        if let Some(info) = self.get_json(Endpoint::Info).await? {
            snapshot.info = info;
        }

        Ok(snapshot)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Option<T>, UpdateFailed> {
        let url = self.url(&endpoint)?;

        let response = self.client.get(url.clone()).await.map_err(|err| {
            error::FetchSnafu {
                endpoint: endpoint.clone(),
                url: url.to_string(),
                message: format!("{err:#}"),
            }
            .build()
        })?;

        if !response.is_ok() {
            error!(
                "{}",
                EndpointUnavailable {
                    endpoint,
                    status: response.status,
                }
            );
            return Ok(None);
        }

        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|err| {
                error::FetchSnafu {
                    endpoint,
                    url: url.to_string(),
                    message: format!("invalid JSON: {err}"),
                }
                .build()
            })
    }

    /// Connection test: `/info` must answer, then the first address must be
    /// known to the server.
    pub async fn probe(&self, address: &Address) -> Result<(), ProbeError> {
        let info = self.probe_status(&Endpoint::Info).await?;

        if info != 200 {
            return error::CannotConnectSnafu {
                server: self.server.clone(),
                message: format!("info endpoint answered {info}"),
            }
            .fail();
        }

        let status = self.probe_status(&Endpoint::Client(address.clone())).await?;

        if status != 200 {
            return error::InvalidAddressSnafu {
                server: self.server.clone(),
                address: address.clone(),
                status,
            }
            .fail();
        }

        Ok(())
    }

    async fn probe_status(&self, endpoint: &Endpoint) -> Result<u16, ProbeError> {
        let cannot_connect = |message: String| {
            error::CannotConnectSnafu {
                server: self.server.clone(),
                message,
            }
            .build()
        };

        let url = self
            .url(endpoint)
            .map_err(|err| cannot_connect(err.to_string()))?;

        match timeout(self.deadline, self.client.get(url)).await {
            Ok(Ok(response)) => Ok(response.status),
            Ok(Err(err)) => Err(cannot_connect(format!("{err:#}"))),
            Err(_) => Err(cannot_connect(format!(
                "timed out after {}s",
                self.deadline.as_secs_f64()
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    pub(crate) enum Reply {
        Json(Value),
        Status(u16),
        Body(&'static str),
        Transport(&'static str),
        Hang,
    }

    /// Scripted server keyed by the path below `/api/`.
    #[derive(Default)]
    pub(crate) struct FakeServer {
        routes: Mutex<BTreeMap<String, Value>>,
        statuses: Mutex<BTreeMap<String, u16>>,
        bodies: Mutex<BTreeMap<String, &'static str>>,
        transport: Mutex<BTreeMap<String, &'static str>>,
        hanging: Mutex<BTreeSet<String>>,
        delay: Mutex<Option<Duration>>,
        pub(crate) requests: Mutex<Vec<String>>,
    }

    impl FakeServer {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub(crate) fn reply(&self, path: &str, reply: Reply) {
            let path = path.to_string();
            self.routes.lock().remove(&path);
            self.statuses.lock().remove(&path);
            self.bodies.lock().remove(&path);
            self.transport.lock().remove(&path);
            self.hanging.lock().remove(&path);

            match reply {
                Reply::Json(value) => {
                    self.routes.lock().insert(path, value);
                }
                Reply::Status(status) => {
                    self.statuses.lock().insert(path, status);
                }
                Reply::Body(body) => {
                    self.bodies.lock().insert(path, body);
                }
                Reply::Transport(message) => {
                    self.transport.lock().insert(path, message);
                }
                Reply::Hang => {
                    self.hanging.lock().insert(path);
                }
            }
        }

        /// Every request sleeps this long before answering.
        pub(crate) fn delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        pub(crate) fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl HttpClient for FakeServer {
        async fn get(&self, url: Url) -> Result<HttpResponse> {
            let path = url
                .path()
                .strip_prefix("/api/")
                .unwrap_or(url.path())
                .to_string();

            self.requests.lock().push(path.clone());

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.hanging.lock().contains(&path) {
                std::future::pending::<()>().await;
            }

            if let Some(message) = self.transport.lock().get(&path) {
                bail!("{message}");
            }

            if let Some(status) = self.statuses.lock().get(&path) {
                return Ok(HttpResponse {
                    status: *status,
                    body: String::new(),
                });
            }

            if let Some(body) = self.bodies.lock().get(&path) {
                return Ok(HttpResponse::ok(*body));
            }

            match self.routes.lock().get(&path) {
                Some(value) => Ok(HttpResponse::ok(value.to_string())),
                None => Ok(HttpResponse {
                    status: 404,
                    body: "not found".into(),
                }),
            }
        }
    }

    pub(crate) fn client_json(workers: &[(&str, f64)]) -> Value {
        json!({
            "bestDifficulty": 4321.7,
            "workersCount": workers.len(),
            "workers": workers
                .iter()
                .map(|(name, hash_rate)| json!({
                    "name": name,
                    "bestDifficulty": "1234.5",
                    "hashRate": hash_rate,
                }))
                .collect::<Vec<Value>>(),
        })
    }

    pub(crate) fn network_json() -> Value {
        json!({
            "blocks": 840000,
            "difficulty": 83148355189239.77,
            "networkhashps": 6.0e20,
            "pooledtx": 4200,
            "chain": "main",
        })
    }

    pub(crate) fn info_json() -> Value {
        json!({
            "highScores": [
                {"bestDifficulty": 9876543.21, "updatedAt": "2024-05-01"},
                {"bestDifficulty": 12.0},
            ],
            "uptime": 1000,
        })
    }

    pub(crate) fn healthy(addresses: &[Address]) -> Arc<FakeServer> {
        let server = FakeServer::new();
        for address in addresses {
            server.reply(
                &format!("client/{address}"),
                Reply::Json(client_json(&[("rig1", 1e12), ("rig2", 0.0)])),
            );
        }
        server.reply("network", Reply::Json(network_json()));
        server.reply("info", Reply::Json(info_json()));
        server
    }

    pub(crate) fn fetcher(server: Arc<FakeServer>) -> Fetcher {
        Fetcher::new(server, "pool.local", DEFAULT_PORT, DEFAULT_TIMEOUT).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::{fake::*, *},
        crate::address::address,
        pretty_assertions::assert_eq,
    };

    #[test]
    fn builds_api_urls() {
        let fetcher = fetcher(FakeServer::new());
        assert_eq!(fetcher.server(), "pool.local:3334");
        assert_eq!(
            fetcher
                .url(&Endpoint::Client(address(1)))
                .unwrap()
                .as_str(),
            format!("http://pool.local:3334/api/client/{}", address(1))
        );
        assert_eq!(
            fetcher.url(&Endpoint::Network).unwrap().as_str(),
            "http://pool.local:3334/api/network"
        );
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(Fetcher::new(FakeServer::new(), "", 1, DEFAULT_TIMEOUT).is_err());
        assert!(Fetcher::new(FakeServer::new(), "host", 1, Duration::ZERO).is_err());
    }

    #[tokio::test]
    async fn fetches_everything_in_order() {
        let addresses = [address(2), address(1)];
        let server = healthy(&addresses);
        let snapshot = fetcher(server.clone()).fetch(&addresses).await.unwrap();

        assert_eq!(
            *server.requests.lock(),
            vec![
                format!("client/{}", address(2)),
                format!("client/{}", address(1)),
                "network".to_string(),
                "info".to_string(),
            ]
        );

        assert_eq!(snapshot.client.len(), 2);
        assert_eq!(snapshot.client[&address(1)].workers.len(), 2);
        assert_eq!(snapshot.network.blocks, Some(json!(840000)));
        assert_eq!(snapshot.network.extra.get("chain"), Some(&json!("main")));
        assert_eq!(snapshot.info.high_scores.len(), 2);
    }

    #[tokio::test]
    async fn non_200_endpoints_leave_sections_empty() {
        let addresses = [address(1), address(2)];
        let server = healthy(&addresses);
        server.reply("network", Reply::Status(500));
        server.reply(&format!("client/{}", address(2)), Reply::Status(404));

        let snapshot = fetcher(server.clone()).fetch(&addresses).await.unwrap();

        assert!(snapshot.client.contains_key(&address(1)));
        assert!(!snapshot.client.contains_key(&address(2)));
        assert!(snapshot.network.is_empty());
        assert!(!snapshot.info.is_empty());
        assert_eq!(server.request_count(), 4);
    }

    #[tokio::test]
    async fn transport_error_fails_the_cycle() {
        let addresses = [address(1)];
        let server = healthy(&addresses);
        server.reply("info", Reply::Transport("connection reset"));

        let err = fetcher(server).fetch(&addresses).await.unwrap_err();

        assert!(!err.is_timeout());
        assert!(matches!(
            err,
            UpdateFailed::FetchError {
                endpoint: Endpoint::Info,
                ..
            }
        ));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn invalid_json_fails_the_cycle() {
        let addresses = [address(1)];
        let server = healthy(&addresses);
        server.reply(&format!("client/{}", address(1)), Reply::Body("<html>"));

        let err = fetcher(server).fetch(&addresses).await.unwrap_err();

        assert!(err.to_string().contains("invalid JSON"), "{err}");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_covers_the_whole_batch() {
        let addresses = [address(1), address(2), address(3)];
        let server = healthy(&addresses);
        server.delay(Duration::from_secs(3));

        let err = fetcher(server.clone()).fetch(&addresses).await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Timeout connecting to mining server at pool.local:3334 after 10s"
        );
        assert_eq!(server.request_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_endpoint_times_out() {
        let addresses = [address(1)];
        let server = healthy(&addresses);
        server.reply("network", Reply::Hang);

        assert!(
            fetcher(server)
                .fetch(&addresses)
                .await
                .unwrap_err()
                .is_timeout()
        );
    }

    #[tokio::test]
    async fn probe_checks_info_then_address() {
        let addresses = [address(1)];

        let server = healthy(&addresses);
        fetcher(server.clone()).probe(&address(1)).await.unwrap();
        assert_eq!(
            *server.requests.lock(),
            vec!["info".to_string(), format!("client/{}", address(1))]
        );

        let server = healthy(&addresses);
        server.reply("info", Reply::Status(503));
        assert!(matches!(
            fetcher(server).probe(&address(1)).await,
            Err(ProbeError::CannotConnect { .. })
        ));

        let server = healthy(&addresses);
        assert!(matches!(
            fetcher(server).probe(&address(2)).await,
            Err(ProbeError::InvalidAddress { status: 404, .. })
        ));

        let server = healthy(&addresses);
        server.reply("info", Reply::Transport("refused"));
        assert!(matches!(
            fetcher(server).probe(&address(1)).await,
            Err(ProbeError::CannotConnect { .. })
        ));
    }
}
