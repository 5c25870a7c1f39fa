use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Status {}

impl Status {
    pub(crate) async fn run(self, settings: Settings) -> Result {
        let coordinator = settings.coordinator()?;

        coordinator.first_refresh().await?;

        let mut registrar = Registrar::new(coordinator.entry_id());

        if let Some(snapshot) = coordinator.snapshot() {
            registrar.register(&snapshot);
        }

        let status = coordinator.status();
        let readings = registrar.readings(&Projection::from_status(&status));

        println!("{}", serde_json::to_string_pretty(&readings)?);

        Ok(())
    }
}
