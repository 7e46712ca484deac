use chrono::Utc;
use clap::Subcommand;
use taper_core::{Config, KvReminderPlatform, SqliteGateway};

use super::{load_engine, print_json, runtime, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Print the pending reminder, if any
    Show,
    /// Cancel the pending reminder
    Cancel,
}

pub fn run(action: ReminderAction) -> CliResult {
    match action {
        ReminderAction::Show => {
            let platform = KvReminderPlatform::new(SqliteGateway::open()?);
            match platform.stored()? {
                Some(stored) => {
                    let due = stored.reminder.firing_at_ms <= Utc::now().timestamp_millis();
                    print_json(&serde_json::json!({
                        "reminder": stored.reminder,
                        "payload": stored.payload,
                        "due": due,
                    }))?;
                }
                None => println!("null"),
            }
            Ok(())
        }
        ReminderAction::Cancel => {
            let config = Config::load()?;
            runtime()?.block_on(async {
                let mut engine = load_engine(&config).await?;
                let cancelled = engine.disarm_reminder().await;
                print_json(&serde_json::json!({ "cancelled": cancelled }))
            })
        }
    }
}
