use {
    anyhow::{Context, Error, anyhow, bail, ensure},
    arguments::Arguments,
    async_trait::async_trait,
    axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{delete, get, post},
    },
    chrono::{DateTime, Utc},
    clap::Parser,
    derive_more::Display,
    parking_lot::{Mutex, RwLock},
    reqwest::Url,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    serde_json::{Map, Value, json},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::Snafu,
    std::{
        collections::{BTreeMap, BTreeSet},
        env,
        fmt::{self, Formatter},
        fs,
        io,
        iter::Sum,
        net::{SocketAddr, ToSocketAddrs},
        ops::Add,
        path::{Path as FsPath, PathBuf},
        process,
        str::FromStr,
        sync::Arc,
        time::Duration,
    },
    tokio::{
        runtime::Runtime,
        sync::{broadcast, watch},
        task::JoinSet,
        time::{Instant, MissedTickBehavior, interval_at, timeout},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt},
};

pub use {
    address::{Address, AddressError, AddressSet},
    coordinator::{Coordinator, SetupError, Status, TopologyChanged},
    fetcher::{Endpoint, EndpointUnavailable, Fetcher, UpdateFailed},
    hashrate::HashRate,
    http::{HttpClient, HttpResponse, ReqwestClient},
    projection::{
        AggregateField, ClientField, InfoField, NetworkField, Projection, Selector, WorkerField,
        WorkerStatus,
    },
    records::{ClientRecord, HighScore, InfoRecord, NetworkRecord, WorkerRecord},
    registrar::{Reading, Registrar, Sensor, SensorId},
    snapshot::Snapshot,
};

pub mod address;
mod api;
mod arguments;
pub mod coordinator;
pub mod fetcher;
pub mod hashrate;
pub mod http;
mod http_server;
mod logs;
mod options;
pub mod projection;
pub mod records;
pub mod registrar;
pub mod settings;
mod si;
mod signal;
pub mod snapshot;
mod subcommand;
pub mod units;

pub const USER_AGENT: &str = concat!("minemonitor/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_PORT: u16 = 3334;
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

type Result<T = (), E = Error> = std::result::Result<T, E>;

pub fn main() {
    let guard = logs::init();

    let args = Arguments::parse();

    let code = match Runtime::new() {
        Ok(runtime) => runtime.block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match args.run(cancel_token).await {
                Err(err) => {
                    eprintln!("error: {err}");

                    for (i, cause) in err.chain().skip(1).enumerate() {
                        if i == 0 {
                            eprintln!();
                            eprintln!("because:");
                        }
                        eprintln!("- {cause}");
                    }

                    if env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        eprintln!();
                        eprintln!("{}", err.backtrace());
                    }

                    1
                }
                Ok(()) => 0,
            }
        }),
        Err(err) => {
            eprintln!("error: failed to create tokio runtime: {err}");
            1
        }
    };

    drop(guard);

    process::exit(code);
}
