use taper_core::{Config, PersistenceGateway};

use super::{load_engine, print_json, runtime, CliResult};

/// Wipe the plan, the event log and any pending reminder.
pub fn run(confirmed: bool) -> CliResult {
    if !confirmed {
        return Err("this deletes the plan and every recorded event; pass --yes to confirm".into());
    }
    let config = Config::load()?;
    runtime()?.block_on(async {
        let mut engine = load_engine(&config).await?;
        engine.disarm_reminder().await;
        engine.gateway().clear_all().await?;
        tracing::info!("all data cleared");
        print_json(&serde_json::json!({ "type": "data_cleared" }))
    })
}
