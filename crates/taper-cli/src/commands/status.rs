use serde::Serialize;
use taper_core::format::format_hms;
use taper_core::{Config, CountdownSnapshot};

use super::{load_engine, print_json, runtime, CliResult};

#[derive(Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    snapshot: CountdownSnapshot,
    remaining: String,
    /// Fraction of the current wait already served.
    progress: f64,
}

pub fn run() -> CliResult {
    let config = Config::load()?;
    runtime()?.block_on(async {
        let mut engine = load_engine(&config).await?;
        let transition = engine.tick();
        let snapshot = engine.snapshot();
        print_json(&StatusOutput {
            snapshot,
            remaining: format_hms(snapshot.remaining_secs),
            progress: snapshot.progress(),
        })?;
        if let Some(event) = transition {
            print_json(&event)?;
        }
        Ok(())
    })
}
