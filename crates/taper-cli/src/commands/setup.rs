use chrono::NaiveDate;
use clap::Args;
use taper_core::{ActiveWindow, Clock, Config, PersistenceGateway, PlanConfig, PlanKind, SystemClock};

use super::{load_engine, print_json, runtime, CliResult};

#[derive(Args)]
pub struct SetupArgs {
    /// Cigarettes per day before starting
    #[arg(long)]
    per_day: u32,
    /// gentle, balanced or aggressive
    #[arg(long, default_value = "balanced")]
    plan: PlanKind,
    /// Start of the active window (HH:MM)
    #[arg(long, default_value = "07:00")]
    active_start: String,
    /// End of the active window (HH:MM)
    #[arg(long, default_value = "23:00")]
    active_end: String,
    /// Price of one pack
    #[arg(long, default_value = "0")]
    pack_price: f64,
    /// Cigarettes per pack
    #[arg(long, default_value = "20")]
    per_pack: u32,
    /// First day of the plan (YYYY-MM-DD), defaults to today
    #[arg(long)]
    start_date: Option<NaiveDate>,
}

pub fn run(args: SetupArgs) -> CliResult {
    let config = Config::load()?;
    let plan = PlanConfig {
        daily_baseline_count: args.per_day,
        plan_kind: args.plan,
        start_date: args.start_date.unwrap_or_else(|| SystemClock.today()),
        active_window: ActiveWindow::parse(&args.active_start, &args.active_end)?,
        pack_price: args.pack_price,
        units_per_pack: args.per_pack,
    };
    plan.validate()?;

    runtime()?.block_on(async {
        let mut engine = load_engine(&config).await?;
        engine.gateway().save_plan(&plan).await?;
        engine.refresh().await?;
        tracing::info!(plan_kind = %plan.plan_kind, baseline = plan.daily_baseline_count, "plan saved");
        print_json(&serde_json::json!({
            "plan": plan,
            "metrics": engine.metrics(),
        }))
    })
}
