use std::time::Duration;

use chrono::Utc;
use taper_core::{Config, Event, SharedEngine, Ticker};
use tokio::sync::broadcast::error::RecvError;

use super::{load_engine, print_json, require_plan, runtime, CliResult};

/// Print a snapshot line on every tick until the wait is over or Ctrl-C.
pub fn run() -> CliResult {
    let config = Config::load()?;
    runtime()?.block_on(async {
        let engine = load_engine(&config).await?;
        require_plan(&engine)?;

        let shared = SharedEngine::new(engine);
        let mut snapshots = shared.subscribe();
        let mut events = shared.subscribe_events();
        let period = Duration::from_millis(config.engine.tick_interval_ms.max(100));
        let ticker = Ticker::spawn(shared.clone(), period);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut stop = false;
        while !stop {
            tokio::select! {
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = *snapshots.borrow_and_update();
                    print_json(&Event::StateSnapshot { snapshot, at: Utc::now() })?;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        print_json(&event)?;
                        stop = matches!(event, Event::TimeUp { .. });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "watch output fell behind");
                    }
                    Err(RecvError::Closed) => stop = true,
                },
                _ = &mut ctrl_c => stop = true,
            }
            if shared.snapshot().await.is_time_up {
                stop = true;
            }
        }

        ticker.shutdown().await;
        Ok(())
    })
}
