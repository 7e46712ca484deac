//! The quit-plan engine.
//!
//! Ties the plan, the event log, the countdown and the reminder scheduler
//! together. The engine is passive: it changes state only when the host calls
//! [`QuitEngine::refresh`], [`QuitEngine::record_event`] or
//! [`QuitEngine::tick`]. State-changing calls take `&mut self`, so one owner
//! serializes them; share it through [`SharedEngine`](crate::timer::SharedEngine).
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = QuitEngine::load(gateway, platform, SystemClock, &config).await?;
//! engine.record_event().await?;
//! // Once per second:
//! engine.tick();
//! let snap = engine.snapshot();
//! ```

use chrono::{TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::log::{EventLog, EventLogEntry};
use crate::notify::{NotificationPlatform, NotificationScheduler, RearmOutcome};
use crate::plan::{DerivedMetrics, PlanConfig};
use crate::stats::{self, PlanStats};
use crate::storage::{Config, EngineSettings, PersistenceGateway};
use crate::timer::{CountdownEngine, CountdownSnapshot, CountdownTransition};

pub struct QuitEngine<G, P, C> {
    gateway: G,
    scheduler: NotificationScheduler<P>,
    clock: C,
    settings: EngineSettings,
    plan: Option<PlanConfig>,
    log: EventLog,
    countdown: CountdownEngine,
}

impl<G, P, C> QuitEngine<G, P, C>
where
    G: PersistenceGateway,
    P: NotificationPlatform,
    C: Clock,
{
    /// Create an engine with nothing loaded. It reports `Idle` until
    /// [`refresh`](Self::refresh) succeeds.
    pub fn new(gateway: G, platform: P, clock: C, config: &Config) -> Self {
        Self {
            gateway,
            scheduler: NotificationScheduler::new(platform, config.notifications.clone()),
            clock,
            settings: config.engine.clone(),
            plan: None,
            log: EventLog::new(),
            countdown: CountdownEngine::new(),
        }
    }

    /// Create an engine, adopt any reminder left by a previous session and
    /// load the plan and log.
    ///
    /// # Errors
    /// Returns a storage error if the initial load fails.
    pub async fn load(gateway: G, platform: P, clock: C, config: &Config) -> Result<Self> {
        let mut engine = Self::new(gateway, platform, clock, config);
        engine.scheduler.restore().await;
        engine.refresh().await?;
        Ok(engine)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn plan(&self) -> Option<&PlanConfig> {
        self.plan.as_ref()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn metrics(&self) -> DerivedMetrics {
        self.countdown.metrics()
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &NotificationScheduler<P> {
        &self.scheduler
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Whether periodic ticks can still change anything.
    pub fn needs_ticks(&self) -> bool {
        self.countdown.needs_ticks()
    }

    /// Display projection, recomputed from the absolute deadline.
    pub fn snapshot(&self) -> CountdownSnapshot {
        self.countdown
            .snapshot(self.clock.now_ms(), self.clock.time_of_day())
    }

    pub fn stats(&self) -> Option<PlanStats> {
        let plan = self.plan.as_ref()?;
        Some(stats::summarize(
            plan,
            &self.log,
            self.countdown.metrics(),
            self.clock.local_now(),
        ))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reload the plan and log from persistence and recompute everything.
    ///
    /// On failure the previous state is kept and keeps being reported.
    ///
    /// # Errors
    /// Returns the storage error from the gateway.
    pub async fn refresh(&mut self) -> Result<Option<Event>> {
        let plan = self.gateway.load_plan().await.map_err(|e| {
            warn!(error = %e, "refresh: failed to load plan, keeping last state");
            e
        })?;
        let entries = self.gateway.list().await.map_err(|e| {
            warn!(error = %e, "refresh: failed to list events, keeping last state");
            e
        })?;

        self.log = EventLog::from_entries(entries);
        self.plan = plan;

        let Some(plan) = self.plan.as_ref() else {
            debug!("refresh: no plan configured");
            self.countdown.clear();
            return Ok(None);
        };

        let now = self.clock.now_ms();
        let metrics = self.settings.calculator().compute(plan, self.clock.today());
        let pause_window = self
            .settings
            .pause_outside_active_window
            .then_some(plan.active_window);
        self.countdown.set_pause_window(pause_window);

        let last = self
            .log
            .last_event(self.settings.sort_event_log)
            .map(|e| e.occurred_at_ms);
        self.countdown.start(metrics, last, now);

        debug!(
            target_daily_count = metrics.target_daily_count,
            interval_secs = metrics.interval_secs,
            events = self.log.len(),
            "refresh: recomputed"
        );

        Ok(Some(Event::CountdownStarted {
            next_allowed_at_ms: self.countdown.next_allowed_at_ms().unwrap_or(now),
            interval_secs: metrics.interval_secs,
            target_daily_count: metrics.target_daily_count,
            at: Utc::now(),
        }))
    }

    /// Record an event at "now", restart the wait and rearm the reminder.
    ///
    /// Without a plan this is a logged no-op. If the append fails nothing
    /// changes: log, countdown and reminder stay as they were.
    ///
    /// # Errors
    /// Returns the storage error from the gateway.
    pub async fn record_event(&mut self) -> Result<Vec<Event>> {
        let Some(plan) = self.plan.as_ref() else {
            warn!("record_event called before a plan was configured");
            return Ok(Vec::new());
        };

        // The day may have rolled over since the last recompute.
        let metrics = self.settings.calculator().compute(plan, self.clock.today());
        let entry = EventLogEntry::at(self.clock.now_ms());

        self.gateway.append(entry).await.map_err(|e| {
            warn!(error = %e, "failed to append event");
            e
        })?;
        self.log.append(entry);

        let base = self
            .log
            .last_event(self.settings.sort_event_log)
            .unwrap_or(entry);
        let now = self.clock.now_ms();
        self.countdown.reset(metrics, base.occurred_at_ms, now);

        let next_allowed_at_ms = self
            .countdown
            .next_allowed_at_ms()
            .unwrap_or(entry.occurred_at_ms);
        let paused = self.countdown.is_paused_at(self.clock.time_of_day());

        info!(
            occurred_at_ms = entry.occurred_at_ms,
            next_allowed_at_ms,
            interval_secs = metrics.interval_secs,
            target_daily_count = metrics.target_daily_count,
            "event recorded"
        );

        let mut events = vec![Event::EventRecorded {
            occurred_at_ms: entry.occurred_at_ms,
            next_allowed_at_ms,
            interval_secs: metrics.interval_secs,
            target_daily_count: metrics.target_daily_count,
            at: to_utc(entry.occurred_at_ms),
        }];

        events.push(match self.scheduler.rearm(next_allowed_at_ms, now, paused).await {
            RearmOutcome::Armed(reminder) => Event::ReminderArmed {
                firing_at_ms: reminder.firing_at_ms,
                at: to_utc(now),
            },
            RearmOutcome::Skipped(reason) => Event::ReminderSkipped {
                reason,
                at: to_utc(now),
            },
        });

        Ok(events)
    }

    /// Advance the countdown. Call about once per second.
    pub fn tick(&mut self) -> Option<Event> {
        let now = self.clock.now_ms();
        let at = to_utc(now);
        match self.countdown.tick(now, self.clock.time_of_day())? {
            CountdownTransition::TimeUp => {
                info!("wait interval over");
                Some(Event::TimeUp { at })
            }
            CountdownTransition::WindowClosed { reopens_in_secs } => {
                debug!(reopens_in_secs, "outside active window");
                Some(Event::WindowClosed {
                    reopens_in_secs,
                    at,
                })
            }
            CountdownTransition::WindowOpened => Some(Event::WindowOpened { at }),
        }
    }

    /// Cancel the outstanding reminder without touching the countdown.
    pub async fn disarm_reminder(&mut self) -> bool {
        self.scheduler.disarm().await
    }
}

fn to_utc(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}
