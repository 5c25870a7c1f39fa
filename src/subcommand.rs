use {super::*, settings::Settings};

mod check;
pub(crate) mod monitor;
mod status;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Test the connection to the mining server")]
    Check(check::Check),
    #[command(about = "Poll the mining server and serve the control API")]
    Monitor(monitor::Monitor),
    #[command(about = "Fetch once and print every sensor reading")]
    Status(status::Status),
}

impl Subcommand {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        match self {
            Self::Check(check) => check.run(settings).await,
            Self::Monitor(monitor) => monitor.run(settings, cancel_token).await,
            Self::Status(status) => status.run(settings).await,
        }
    }
}
