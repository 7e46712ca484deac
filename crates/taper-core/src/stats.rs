//! Progress statistics over the event log.

use chrono::{DateTime, FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::log::{EventLog, EventLogEntry};
use crate::plan::{DerivedMetrics, PlanConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStats {
    pub days_elapsed: u32,
    pub today_count: usize,
    pub total_count: usize,
    pub target_daily_count: u32,
    /// Target minus today's count; negative once the target is exceeded.
    pub remaining_today: i64,
    /// Mean gap between today's events, if there were at least two.
    pub average_interval_today_secs: Option<u64>,
    pub interval_secs: u32,
    pub money_spent: f64,
    /// Cost of the baseline habit since the start date minus what was spent.
    pub money_saved: f64,
}

pub fn summarize(
    plan: &PlanConfig,
    log: &EventLog,
    metrics: DerivedMetrics,
    now: DateTime<FixedOffset>,
) -> PlanStats {
    let days_elapsed = plan.days_elapsed(now.date_naive());
    let midnight_ms = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(*now.offset())
        .single()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| now.timestamp_millis());

    let today: Vec<EventLogEntry> = log
        .sorted()
        .into_iter()
        .filter(|e| e.occurred_at_ms >= midnight_ms)
        .collect();

    let unit_price = plan.unit_price();
    let total_count = log.len();
    let baseline_total = u64::from(plan.daily_baseline_count) * (u64::from(days_elapsed) + 1);
    let avoided = baseline_total.saturating_sub(total_count as u64);

    PlanStats {
        days_elapsed,
        today_count: today.len(),
        total_count,
        target_daily_count: metrics.target_daily_count,
        remaining_today: i64::from(metrics.target_daily_count) - today.len() as i64,
        average_interval_today_secs: average_interval_secs(&today),
        interval_secs: metrics.interval_secs,
        money_spent: total_count as f64 * unit_price,
        money_saved: avoided as f64 * unit_price,
    }
}

/// Mean gap between consecutive chronologically sorted entries.
fn average_interval_secs(sorted: &[EventLogEntry]) -> Option<u64> {
    if sorted.len() < 2 {
        return None;
    }
    let total_ms: i64 = sorted
        .windows(2)
        .map(|w| w[1].occurred_at_ms - w[0].occurred_at_ms)
        .sum();
    let mean_ms = total_ms as f64 / (sorted.len() - 1) as f64;
    Some((mean_ms / 1000.0).round() as u64)
}
