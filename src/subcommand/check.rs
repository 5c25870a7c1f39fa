use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Check {}

impl Check {
    pub(crate) async fn run(self, settings: Settings) -> Result {
        let fetcher = settings.fetcher()?;
        let addresses = settings.address_set()?;

        fetcher.probe(addresses.first()).await?;

        println!(
            "Connected to mining server at {} as {}",
            fetcher.server(),
            addresses.first()
        );

        Ok(())
    }
}
