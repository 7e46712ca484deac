//! Daily target and wait-interval calculation.
//!
//! The target shrinks linearly from the baseline to zero over the plan
//! horizon. The reduction applied on a given day is the *cumulative*
//! reduction `baseline / horizon * days_elapsed`, rounded half-up once,
//! rather than a per-day step rounded up and multiplied. The two differ when
//! `baseline / horizon` is not an integer: for 15 cigarettes over 20 days the
//! cumulative rule gives 15, 14, 13, 13, 12 ... while the per-day ceiling
//! gives 15, 14, 13, 12, 11 ... and bottoms out at 1 on day 14. The curve a
//! plan starts with must not change under it, so the legacy per-day rule is
//! kept selectable as [`ReductionCurve::CeilPerDay`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PlanConfig;

/// Upper bound for the wait interval, also used once the target reaches 0.
pub const MAX_INTERVAL_SECS: u32 = 24 * 3600;

/// Default awake-time budget the daily target is spread across (16 hours).
pub const DEFAULT_ACTIVE_SECONDS_PER_DAY: u32 = 16 * 3600;

/// How the cumulative reduction is rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionCurve {
    /// `round_half_up(baseline / horizon * days)`.
    #[default]
    RoundedCumulative,
    /// `ceil(baseline / horizon) * days`.
    CeilPerDay,
}

/// Today's target and the wait between permitted events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub target_daily_count: u32,
    pub interval_secs: u32,
}

impl DerivedMetrics {
    /// Metrics of a finished (or empty) plan.
    pub const DONE: DerivedMetrics = DerivedMetrics {
        target_daily_count: 0,
        interval_secs: MAX_INTERVAL_SECS,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanMetricsCalculator {
    pub active_seconds_per_day: u32,
    pub curve: ReductionCurve,
}

impl Default for PlanMetricsCalculator {
    fn default() -> Self {
        Self {
            active_seconds_per_day: DEFAULT_ACTIVE_SECONDS_PER_DAY,
            curve: ReductionCurve::default(),
        }
    }
}

impl PlanMetricsCalculator {
    pub fn new(active_seconds_per_day: u32, curve: ReductionCurve) -> Self {
        Self {
            active_seconds_per_day,
            curve,
        }
    }

    pub fn compute(&self, plan: &PlanConfig, today: NaiveDate) -> DerivedMetrics {
        self.compute_for_day(plan, plan.days_elapsed(today))
    }

    /// Metrics for a plan that has been running `days_elapsed` whole days.
    pub fn compute_for_day(&self, plan: &PlanConfig, days_elapsed: u32) -> DerivedMetrics {
        let baseline = plan.daily_baseline_count;
        let horizon = plan.plan_kind.horizon_days();

        if baseline == 0 || days_elapsed >= horizon {
            return DerivedMetrics::DONE;
        }

        let reduction = self.cumulative_reduction(baseline, horizon, days_elapsed);
        let target = (baseline as i64 - reduction).max(1) as u32;

        DerivedMetrics {
            target_daily_count: target,
            interval_secs: self.interval_for(target),
        }
    }

    /// Wait interval for a daily target. Never 0 while the target is positive.
    pub fn interval_for(&self, target_daily_count: u32) -> u32 {
        if target_daily_count == 0 {
            return MAX_INTERVAL_SECS;
        }
        (self.active_seconds_per_day / target_daily_count).clamp(1, MAX_INTERVAL_SECS)
    }

    fn cumulative_reduction(&self, baseline: u32, horizon: u32, days_elapsed: u32) -> i64 {
        match self.curve {
            ReductionCurve::RoundedCumulative => {
                // round_half_up(baseline * days / horizon) in integers, so
                // exact .5 ties always round up.
                let (baseline, horizon, days) =
                    (u64::from(baseline), u64::from(horizon), u64::from(days_elapsed));
                ((2 * baseline * days + horizon) / (2 * horizon)) as i64
            }
            ReductionCurve::CeilPerDay => {
                let step = baseline.div_ceil(horizon) as i64;
                step * days_elapsed as i64
            }
        }
    }
}
