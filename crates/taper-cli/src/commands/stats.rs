use serde::Serialize;
use taper_core::format::format_duration;
use taper_core::{Config, PlanStats};

use super::{load_engine, print_json, require_plan, runtime, CliResult};

#[derive(Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    stats: PlanStats,
    average_interval_today: String,
    interval: String,
}

pub fn run() -> CliResult {
    let config = Config::load()?;
    runtime()?.block_on(async {
        let engine = load_engine(&config).await?;
        require_plan(&engine)?;
        let Some(stats) = engine.stats() else {
            return Ok(());
        };
        print_json(&StatsOutput {
            average_interval_today: format_duration(stats.average_interval_today_secs.unwrap_or(0)),
            interval: format_duration(u64::from(stats.interval_secs)),
            stats,
        })
    })
}
