//! End-to-end engine behavior against in-memory collaborators.

use chrono::{NaiveDate, NaiveTime};
use taper_core::notify::RecordingPlatform;
use taper_core::{
    ActiveWindow, Config, CountdownState, Event, EventLogEntry, ManualClock, MemoryGateway,
    PersistenceGateway, PlanConfig, PlanKind, QuitEngine, SkipReason,
};

type TestEngine = QuitEngine<MemoryGateway, RecordingPlatform, ManualClock>;

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 4, 1).unwrap()
}

fn clock_at(hour: u32) -> ManualClock {
    ManualClock::at(start_date(), NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
}

fn plan() -> PlanConfig {
    PlanConfig::new(20, PlanKind::Balanced, start_date())
}

/// Config whose day-0 interval for a baseline of 20 is exactly 100 seconds.
fn short_interval_config() -> Config {
    let mut config = Config::default();
    config.engine.active_seconds_per_day = 2000;
    config
}

async fn engine_with(
    gateway: MemoryGateway,
    clock: ManualClock,
    config: &Config,
) -> (TestEngine, RecordingPlatform) {
    let platform = RecordingPlatform::new();
    let engine = QuitEngine::load(gateway, platform.clone(), clock, config)
        .await
        .unwrap();
    (engine, platform)
}

#[tokio::test]
async fn empty_log_on_start_day_is_already_time_up() {
    let (engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock_at(10),
        &Config::default(),
    )
    .await;

    let snap = engine.snapshot();
    assert_eq!(snap.remaining_secs, 0);
    assert!(snap.is_time_up);
    assert_eq!(snap.target_daily_count, 20);
    assert_eq!(snap.interval_secs, 2880);
}

#[tokio::test]
async fn countdown_follows_the_wall_clock() {
    let clock = clock_at(10);
    let (mut engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &short_interval_config(),
    )
    .await;

    engine.record_event().await.unwrap();
    assert_eq!(engine.snapshot().remaining_secs, 100);

    clock.advance_secs(50);
    assert!(engine.tick().is_none());
    let snap = engine.snapshot();
    assert_eq!(snap.remaining_secs, 50);
    assert!(!snap.is_time_up);

    clock.advance_secs(50);
    assert!(matches!(engine.tick(), Some(Event::TimeUp { .. })));
    let snap = engine.snapshot();
    assert_eq!(snap.remaining_secs, 0);
    assert!(snap.is_time_up);
    assert_eq!(snap.state, CountdownState::TimeUp);

    // Further ticks are no-ops.
    clock.advance_secs(10);
    assert!(engine.tick().is_none());
}

#[tokio::test]
async fn suspended_process_catches_up_in_one_tick() {
    let clock = clock_at(10);
    let (mut engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &Config::default(),
    )
    .await;

    engine.record_event().await.unwrap();
    clock.advance_secs(6 * 3600);
    assert!(matches!(engine.tick(), Some(Event::TimeUp { .. })));
}

#[tokio::test]
async fn record_then_snapshot_is_never_zero() {
    let clock = clock_at(10);
    let (mut engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &Config::default(),
    )
    .await;

    for _ in 0..5 {
        engine.record_event().await.unwrap();
        let snap = engine.snapshot();
        assert!(snap.interval_secs > 0);
        assert!(snap.remaining_secs >= 1);
        clock.advance_secs(7);
    }
}

#[tokio::test]
async fn repeated_records_keep_one_reminder() {
    let clock = clock_at(10);
    let (mut engine, platform) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &Config::default(),
    )
    .await;

    for _ in 0..4 {
        let events = engine.record_event().await.unwrap();
        assert!(matches!(events[1], Event::ReminderArmed { .. }));
        assert_eq!(platform.pending_count(), 1);
        clock.advance_secs(60);
    }
    assert_eq!(platform.scheduled_total(), 4);
    assert_eq!(platform.cancelled_total(), 3);

    let payload = &platform.pending_payloads()[0];
    let reminder = &platform.pending_reminders()[0];
    assert_eq!(payload.timer_end_ms - reminder.firing_at_ms, 27_000);
}

#[tokio::test]
async fn disarm_twice_is_harmless() {
    let (mut engine, platform) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock_at(10),
        &Config::default(),
    )
    .await;

    engine.record_event().await.unwrap();
    assert!(engine.disarm_reminder().await);
    assert!(!engine.disarm_reminder().await);
    assert_eq!(platform.pending_count(), 0);
    assert!(engine.scheduler().outstanding().is_none());
}

#[tokio::test]
async fn short_interval_skips_the_reminder() {
    let (mut engine, platform) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock_at(10),
        &short_interval_config(),
    )
    .await;

    // A 100s interval minus the 27s buffer still leaves room.
    let events = engine.record_event().await.unwrap();
    assert!(matches!(events[1], Event::ReminderArmed { .. }));

    let mut config = short_interval_config();
    config.engine.active_seconds_per_day = 400;
    let (mut engine, _) =
        engine_with(MemoryGateway::with_plan(plan()), clock_at(10), &config).await;
    // 20s interval: the reminder would land before now.
    let events = engine.record_event().await.unwrap();
    assert!(matches!(
        events[1],
        Event::ReminderSkipped {
            reason: SkipReason::TooSoon,
            ..
        }
    ));
    assert_eq!(platform.pending_count(), 1);
}

#[tokio::test]
async fn failed_append_changes_nothing() {
    let clock = clock_at(10);
    let gateway = MemoryGateway::with_plan(plan());
    let (mut engine, platform) =
        engine_with(gateway.clone(), clock.clone(), &Config::default()).await;

    engine.record_event().await.unwrap();
    let before_snapshot = engine.snapshot();
    let before_reminder = platform.pending_reminders();

    gateway.set_fail_appends(true);
    clock.advance_secs(30);
    assert!(engine.record_event().await.is_err());

    assert_eq!(engine.log().len(), 1);
    assert_eq!(
        engine.snapshot().next_allowed_at_ms,
        before_snapshot.next_allowed_at_ms
    );
    assert_eq!(platform.pending_reminders(), before_reminder);
    assert_eq!(gateway.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_last_known_state() {
    let clock = clock_at(10);
    let gateway = MemoryGateway::with_plan(plan());
    let (mut engine, _) = engine_with(gateway.clone(), clock.clone(), &Config::default()).await;
    engine.record_event().await.unwrap();
    let before = engine.snapshot();

    gateway.set_fail_reads(true);
    assert!(engine.refresh().await.is_err());
    assert_eq!(engine.snapshot(), before);
    assert!(engine.plan().is_some());
}

#[tokio::test]
async fn missing_plan_reports_idle() {
    let (mut engine, platform) =
        engine_with(MemoryGateway::new(), clock_at(10), &Config::default()).await;

    let snap = engine.snapshot();
    assert_eq!(snap.state, CountdownState::Idle);
    assert_eq!(snap.remaining_secs, 0);
    assert_eq!(snap.interval_secs, 0);
    assert_eq!(snap.target_daily_count, 0);
    assert!(!snap.is_time_up);

    assert!(engine.record_event().await.unwrap().is_empty());
    assert!(engine.log().is_empty());
    assert_eq!(platform.scheduled_total(), 0);
    assert!(engine.stats().is_none());
}

#[tokio::test]
async fn refresh_picks_up_plan_saved_later() {
    let gateway = MemoryGateway::new();
    let (mut engine, _) = engine_with(gateway.clone(), clock_at(10), &Config::default()).await;
    assert_eq!(engine.snapshot().state, CountdownState::Idle);

    gateway.save_plan(&plan()).await.unwrap();
    assert!(matches!(
        engine.refresh().await.unwrap(),
        Some(Event::CountdownStarted { .. })
    ));
    assert!(engine.snapshot().is_time_up);
}

#[tokio::test]
async fn countdown_resumes_from_persisted_log() {
    let clock = clock_at(10);
    let gateway = MemoryGateway::with_plan(plan());
    let ten_min_ago = clock_now(&clock) - 600_000;
    gateway.seed(EventLogEntry::at(ten_min_ago));

    let (engine, _) = engine_with(gateway, clock, &Config::default()).await;
    assert_eq!(engine.snapshot().remaining_secs, 2880 - 600);
}

#[tokio::test]
async fn sorted_mode_uses_latest_timestamp() {
    let clock = clock_at(10);
    let now = clock_now(&clock);
    let gateway = MemoryGateway::with_plan(plan());
    gateway.seed(EventLogEntry::at(now - 60_000));
    // Appended last but older, e.g. imported from another device.
    gateway.seed(EventLogEntry::at(now - 1_200_000));

    let (engine, _) = engine_with(gateway.clone(), clock.clone(), &Config::default()).await;
    assert_eq!(engine.snapshot().remaining_secs, 2880 - 1200);

    let mut config = Config::default();
    config.engine.sort_event_log = true;
    let (engine, _) = engine_with(gateway, clock, &config).await;
    assert_eq!(engine.snapshot().remaining_secs, 2880 - 60);
}

#[tokio::test]
async fn later_days_lengthen_the_interval() {
    let clock = clock_at(10);
    let (mut engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &Config::default(),
    )
    .await;

    clock.advance_secs(10 * 86_400);
    let events = engine.record_event().await.unwrap();
    match &events[0] {
        Event::EventRecorded {
            interval_secs,
            target_daily_count,
            ..
        } => {
            assert_eq!(*target_daily_count, 10);
            assert_eq!(*interval_secs, 5760);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn finished_plan_waits_the_maximum() {
    let clock = clock_at(10);
    let (mut engine, _) = engine_with(
        MemoryGateway::with_plan(plan()),
        clock.clone(),
        &Config::default(),
    )
    .await;

    clock.advance_secs(25 * 86_400);
    engine.refresh().await.unwrap();
    engine.record_event().await.unwrap();
    let snap = engine.snapshot();
    assert_eq!(snap.target_daily_count, 0);
    assert_eq!(snap.interval_secs, 86_400);
    assert_eq!(snap.remaining_secs, 86_400);
}

#[tokio::test]
async fn outside_active_window_is_paused_when_enabled() {
    let mut plan = plan();
    plan.active_window = ActiveWindow::parse("07:00", "23:00").unwrap();
    let mut config = Config::default();
    config.engine.pause_outside_active_window = true;

    let clock = clock_at(22);
    let (mut engine, platform) =
        engine_with(MemoryGateway::with_plan(plan), clock.clone(), &config).await;

    engine.record_event().await.unwrap();
    assert_eq!(engine.snapshot().state, CountdownState::Counting);

    clock.advance_secs(3600);
    match engine.tick() {
        Some(Event::WindowClosed {
            reopens_in_secs, ..
        }) => assert_eq!(reopens_in_secs, 8 * 3600),
        other => panic!("expected WindowClosed, got {other:?}"),
    }
    let snap = engine.snapshot();
    assert!(snap.is_paused);
    assert!(!snap.is_time_up);

    // Recording while paused does not arm a reminder.
    let events = engine.record_event().await.unwrap();
    assert!(matches!(
        events[1],
        Event::ReminderSkipped {
            reason: SkipReason::Paused,
            ..
        }
    ));
    assert_eq!(platform.pending_count(), 0);
}

#[tokio::test]
async fn stats_track_today() {
    let clock = clock_at(10);
    let mut plan = plan();
    plan.pack_price = 10.0;
    let (mut engine, _) =
        engine_with(MemoryGateway::with_plan(plan), clock.clone(), &Config::default()).await;

    engine.record_event().await.unwrap();
    clock.advance_secs(3600);
    engine.record_event().await.unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.today_count, 2);
    assert_eq!(stats.remaining_today, 18);
    assert_eq!(stats.average_interval_today_secs, Some(3600));
    assert!((stats.money_spent - 1.0).abs() < 1e-9);
}

fn clock_now(clock: &ManualClock) -> i64 {
    use taper_core::Clock;
    clock.now_ms()
}
