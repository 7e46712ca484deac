//! Quit plan configuration.
//!
//! A [`PlanConfig`] is captured once during onboarding and never edited by the
//! engine. Everything the countdown needs is derived from it plus "today" by
//! [`metrics::PlanMetricsCalculator::compute`].

pub mod metrics;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use metrics::{DerivedMetrics, ReductionCurve, MAX_INTERVAL_SECS};

const SECS_PER_DAY: u32 = 24 * 3600;

/// Reduction plan chosen at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    #[serde(alias = "slow")]
    Gentle,
    #[default]
    Balanced,
    Aggressive,
}

impl PlanKind {
    /// Days this plan takes to reach zero cigarettes per day.
    pub fn horizon_days(self) -> u32 {
        match self {
            PlanKind::Gentle => 30,
            PlanKind::Balanced => 20,
            PlanKind::Aggressive => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlanKind::Gentle => "gentle",
            PlanKind::Balanced => "balanced",
            PlanKind::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gentle" | "slow" => Ok(PlanKind::Gentle),
            "balanced" => Ok(PlanKind::Balanced),
            "aggressive" => Ok(PlanKind::Aggressive),
            other => Err(ValidationError::InvalidValue {
                field: "plan_kind".into(),
                message: format!("unknown plan '{other}'"),
            }),
        }
    }
}

/// Portion of the day over which the daily budget is spread.
///
/// `end` may be earlier than `start`, in which case the window wraps past
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ActiveWindow {
    /// Parse a window from two `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            start: parse_time_of_day(start)?,
            end: parse_time_of_day(end)?,
        })
    }

    fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.wraps_midnight() {
            time >= self.start || time < self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    /// Seconds from `time` until the window next opens; 0 when inside it.
    pub fn secs_until_open(&self, time: NaiveTime) -> u32 {
        if self.contains(time) {
            return 0;
        }
        let now = time.num_seconds_from_midnight();
        let open = self.start.num_seconds_from_midnight();
        (open + SECS_PER_DAY - now) % SECS_PER_DAY
    }
}

/// Quit plan captured at onboarding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Average cigarettes per day before the plan started.
    pub daily_baseline_count: u32,
    pub plan_kind: PlanKind,
    pub start_date: NaiveDate,
    pub active_window: ActiveWindow,
    #[serde(default)]
    pub pack_price: f64,
    #[serde(default = "default_units_per_pack")]
    pub units_per_pack: u32,
}

fn default_units_per_pack() -> u32 {
    20
}

impl PlanConfig {
    pub fn new(daily_baseline_count: u32, plan_kind: PlanKind, start_date: NaiveDate) -> Self {
        Self {
            daily_baseline_count,
            plan_kind,
            start_date,
            active_window: ActiveWindow::default(),
            pack_price: 0.0,
            units_per_pack: default_units_per_pack(),
        }
    }

    /// Check the values onboarding is expected to enforce.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.daily_baseline_count == 0 {
            return Err(ValidationError::InvalidValue {
                field: "daily_baseline_count".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.units_per_pack == 0 {
            return Err(ValidationError::InvalidValue {
                field: "units_per_pack".into(),
                message: "must be greater than zero".into(),
            });
        }
        if !self.pack_price.is_finite() || self.pack_price < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "pack_price".into(),
                message: format!("{} is not a valid price", self.pack_price),
            });
        }
        if self.active_window.start == self.active_window.end {
            return Err(ValidationError::EmptyActiveWindow {
                start: format_time_of_day(self.active_window.start),
                end: format_time_of_day(self.active_window.end),
            });
        }
        Ok(())
    }

    /// Price of a single cigarette.
    pub fn unit_price(&self) -> f64 {
        if self.units_per_pack == 0 {
            return 0.0;
        }
        self.pack_price / self.units_per_pack as f64
    }

    /// Whole days since the plan started, clamped at zero for clock skew.
    pub fn days_elapsed(&self, today: NaiveDate) -> u32 {
        (today - self.start_date).num_days().max(0) as u32
    }
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTimeOfDay(s.to_string()))
}

pub fn format_time_of_day(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time_of_day(*t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time_of_day(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn horizons_per_plan() {
        assert_eq!(PlanKind::Gentle.horizon_days(), 30);
        assert_eq!(PlanKind::Balanced.horizon_days(), 20);
        assert_eq!(PlanKind::Aggressive.horizon_days(), 10);
    }

    #[test]
    fn plan_kind_accepts_legacy_slow() {
        assert_eq!("slow".parse::<PlanKind>().unwrap(), PlanKind::Gentle);
        let parsed: PlanKind = serde_json::from_str("\"slow\"").unwrap();
        assert_eq!(parsed, PlanKind::Gentle);
        assert!("turbo".parse::<PlanKind>().is_err());
    }

    #[test]
    fn daytime_window() {
        let w = ActiveWindow::parse("07:00", "23:00").unwrap();
        assert!(w.contains(t(7, 0)));
        assert!(w.contains(t(22, 59)));
        assert!(!w.contains(t(23, 0)));
        assert!(!w.contains(t(3, 0)));
        assert_eq!(w.secs_until_open(t(6, 0)), 3600);
        assert_eq!(w.secs_until_open(t(23, 30)), 7 * 3600 + 30 * 60);
    }

    #[test]
    fn overnight_window() {
        let w = ActiveWindow::parse("20:00", "02:00").unwrap();
        assert!(w.contains(t(23, 0)));
        assert!(w.contains(t(1, 59)));
        assert!(!w.contains(t(12, 0)));
        assert_eq!(w.secs_until_open(t(19, 0)), 3600);
    }

    #[test]
    fn rejects_malformed_time() {
        assert_eq!(
            ActiveWindow::parse("7am", "23:00"),
            Err(ValidationError::InvalidTimeOfDay("7am".into()))
        );
    }

    #[test]
    fn validate_catches_bad_fields() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let mut plan = PlanConfig::new(20, PlanKind::Balanced, start);
        assert!(plan.validate().is_ok());

        plan.daily_baseline_count = 0;
        assert!(plan.validate().is_err());

        plan.daily_baseline_count = 20;
        plan.active_window = ActiveWindow::parse("08:00", "08:00").unwrap();
        assert!(matches!(
            plan.validate(),
            Err(ValidationError::EmptyActiveWindow { .. })
        ));
    }

    #[test]
    fn serializes_times_as_hhmm() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let plan = PlanConfig::new(15, PlanKind::Gentle, start);
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["active_window"]["start"], "07:00");
        assert_eq!(json["start_date"], "2026-03-01");
        let back: PlanConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn days_elapsed_clamps_future_start() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let plan = PlanConfig::new(15, PlanKind::Gentle, start);
        let earlier = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(plan.days_elapsed(earlier), 0);
        let later = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        assert_eq!(plan.days_elapsed(later), 3);
    }

    #[test]
    fn unit_price_divides_pack() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut plan = PlanConfig::new(15, PlanKind::Gentle, start);
        plan.pack_price = 10.0;
        plan.units_per_pack = 20;
        assert!((plan.unit_price() - 0.5).abs() < f64::EPSILON);
    }
}
