//! Background ticking for a shared engine.
//!
//! [`SharedEngine`] wraps a [`QuitEngine`] behind an async mutex so the tick
//! task and host commands never interleave. Each change publishes a fresh
//! [`CountdownSnapshot`] on a `watch` channel and transitions on a
//! `broadcast` channel.
//!
//! [`Ticker`] drives `tick()` about once per second while the host is in the
//! foreground and the countdown can still change. After `TimeUp` it parks
//! until a record or refresh wakes it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::engine::QuitEngine;
use crate::error::Result;
use crate::events::Event;
use crate::notify::NotificationPlatform;
use crate::storage::PersistenceGateway;
use crate::timer::CountdownSnapshot;

const EVENT_CAPACITY: usize = 32;

pub struct SharedEngine<G, P, C> {
    engine: Arc<Mutex<QuitEngine<G, P, C>>>,
    snapshots: Arc<watch::Sender<CountdownSnapshot>>,
    events: broadcast::Sender<Event>,
    wake: Arc<Notify>,
}

impl<G, P, C> Clone for SharedEngine<G, P, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            snapshots: Arc::clone(&self.snapshots),
            events: self.events.clone(),
            wake: Arc::clone(&self.wake),
        }
    }
}

impl<G, P, C> SharedEngine<G, P, C>
where
    G: PersistenceGateway,
    P: NotificationPlatform,
    C: Clock,
{
    pub fn new(engine: QuitEngine<G, P, C>) -> Self {
        let (snapshots, _) = watch::channel(engine.snapshot());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            snapshots: Arc::new(snapshots),
            events,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Receiver that always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<CountdownSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> CountdownSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn record_event(&self) -> Result<Vec<Event>> {
        let mut engine = self.engine.lock().await;
        let was_ticking = engine.needs_ticks();
        let events = engine.record_event().await?;
        self.publish(&engine, &events);
        self.wake_if_unparked(was_ticking, &engine);
        Ok(events)
    }

    pub async fn refresh(&self) -> Result<Option<Event>> {
        let mut engine = self.engine.lock().await;
        let was_ticking = engine.needs_ticks();
        let event = engine.refresh().await?;
        self.publish(&engine, event.as_slice());
        self.wake_if_unparked(was_ticking, &engine);
        Ok(event)
    }

    /// One tick. Returns whether further ticks can change anything.
    pub async fn tick(&self) -> bool {
        let mut engine = self.engine.lock().await;
        let event = engine.tick();
        self.publish(&engine, event.as_slice());
        engine.needs_ticks()
    }

    fn publish(&self, engine: &QuitEngine<G, P, C>, events: &[Event]) {
        self.snapshots.send_replace(engine.snapshot());
        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event.clone());
        }
    }

    /// Wake a parked ticker when a command made ticks meaningful again.
    fn wake_if_unparked(&self, was_ticking: bool, engine: &QuitEngine<G, P, C>) {
        if !was_ticking && engine.needs_ticks() {
            self.wake.notify_one();
        }
    }
}

/// Handle to the spawned tick task. Dropping it stops the task.
pub struct Ticker {
    shutdown_tx: watch::Sender<bool>,
    foreground_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<G, P, C>(shared: SharedEngine<G, P, C>, period: Duration) -> Self
    where
        G: PersistenceGateway + 'static,
        P: NotificationPlatform + 'static,
        C: Clock + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let (foreground_tx, mut foreground_rx) = watch::channel(true);
        let wake = Arc::clone(&shared.wake);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut foreground = true;
            let mut active = true;

            info!(period_ms = period.as_millis() as u64, "ticker started");

            loop {
                tokio::select! {
                    _ = interval.tick(), if foreground && active => {
                        active = shared.tick().await;
                        if !active {
                            debug!("ticker parked");
                        }
                    }
                    _ = wake.notified() => {
                        active = true;
                        interval.reset();
                    }
                    changed = foreground_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        foreground = *foreground_rx.borrow_and_update();
                        if foreground {
                            // Resync immediately on resume.
                            active = shared.tick().await;
                            interval.reset();
                        }
                        debug!(foreground, "ticker lifecycle change");
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("ticker shutting down");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            foreground_tx,
            handle: Some(handle),
        }
    }

    /// Pause ticking while hidden; ticking resumes with an immediate resync.
    pub fn set_foreground(&self, foreground: bool) {
        self.foreground_tx.send_replace(foreground);
    }

    /// Signal the task to stop and wait for it.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("ticker task failed: {e}");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
