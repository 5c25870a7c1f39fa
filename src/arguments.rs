use {
    super::*,
    clap::builder::styling::{AnsiColor, Effects, Styles},
    options::Options,
    settings::Settings,
    subcommand::{Subcommand, monitor::Monitor},
};

#[derive(Debug, Parser)]
#[command(
  version,
  about = "Watch payout addresses on a mining server and expose their workers as sensors",
  styles = Styles::styled()
    .error(AnsiColor::Red.on_default() | Effects::BOLD)
    .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
    .literal(AnsiColor::Blue.on_default())
    .placeholder(AnsiColor::Cyan.on_default())
    .usage(AnsiColor::Yellow.on_default() | Effects::BOLD),
)]
pub(crate) struct Arguments {
    #[command(flatten)]
    pub(crate) options: Options,
    /// Defaults to `monitor`.
    #[command(subcommand)]
    pub(crate) subcommand: Option<Subcommand>,
}

impl Arguments {
    pub(crate) async fn run(self, cancel_token: CancellationToken) -> Result {
        let settings = Settings::load(self.options)?;

        debug!(
            "Using mining server {} with {} address(es), polling every {}s",
            settings.entry_id(),
            settings.address_set()?.len(),
            settings.scan_interval().as_secs(),
        );

        self.subcommand
            .unwrap_or(Subcommand::Monitor(Monitor {}))
            .run(settings, cancel_token)
            .await
    }
}
