use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
    #[arg(long, help = "Load configuration from <CONFIG>.")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Load configuration from <CONFIG_DIR>/minemonitor.toml.")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, help = "Connect to mining server at <HOST>.")]
    pub host: Option<String>,

    #[arg(long, help = "Connect to mining server on port <PORT>. [default: 3334]")]
    pub port: Option<u16>,

    #[arg(
        long = "address",
        value_delimiter = ',',
        help = "Monitor payout <ADDRESS>. May be repeated or comma separated."
    )]
    pub addresses: Vec<Address>,

    #[arg(
        long,
        help = "Poll the mining server every <SCAN_INTERVAL> seconds. [default: 60]"
    )]
    pub scan_interval: Option<u64>,

    #[arg(
        long,
        help = "Abort a poll cycle after <TIMEOUT> seconds. [default: 10]"
    )]
    pub timeout: Option<u64>,

    #[arg(
        long,
        help = "Listen for control API requests at <HTTP_ADDRESS>. [default: 127.0.0.1]"
    )]
    pub http_address: Option<String>,

    #[arg(long, help = "Enable control API on <HTTP_PORT>. Disabled if not set.")]
    pub http_port: Option<u16>,
}
