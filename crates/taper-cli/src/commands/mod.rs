pub mod config;
pub mod record;
pub mod reminder;
pub mod reset;
pub mod setup;
pub mod stats;
pub mod status;
pub mod watch;

use serde::Serialize;
use taper_core::{Config, KvReminderPlatform, QuitEngine, SqliteGateway, SystemClock};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub type CliEngine = QuitEngine<SqliteGateway, KvReminderPlatform, SystemClock>;

/// Open the database and load the engine with the on-disk configuration.
pub async fn load_engine(config: &Config) -> CliResult<CliEngine> {
    let db = SqliteGateway::open()?;
    let platform = KvReminderPlatform::new(db.clone());
    Ok(QuitEngine::load(db, platform, SystemClock, config).await?)
}

pub fn runtime() -> CliResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn require_plan(engine: &CliEngine) -> CliResult {
    if engine.plan().is_none() {
        return Err("no plan configured, run `taper setup` first".into());
    }
    Ok(())
}
