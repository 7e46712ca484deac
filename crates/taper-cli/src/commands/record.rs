use taper_core::Config;

use super::{load_engine, print_json, require_plan, runtime, CliResult};

pub fn run() -> CliResult {
    let config = Config::load()?;
    runtime()?.block_on(async {
        let mut engine = load_engine(&config).await?;
        require_plan(&engine)?;
        for event in engine.record_event().await? {
            print_json(&event)?;
        }
        print_json(&engine.snapshot())
    })
}
