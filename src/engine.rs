use std::time::Duration;

use crate::broadcast::{SettingsBroadcaster, SubscriptionHandle};
use crate::sampler::Sample;
use crate::scheduler::SamplingScheduler;
use crate::settings::{Position, Settings, SettingsStore};

/// Final on-screen positions of the widgets, captured by the shell once at
/// shutdown. Positions are ephemeral during the session and durable only
/// across restarts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidgetPositions {
    pub system: Position,
    pub clock: Position,
}

/// Application-lifetime wiring: owns the settings store, the subscriber
/// registry, and the sampling scheduler.
///
/// The presentation shell subscribes its display surfaces here, starts
/// sampling, and routes the settings editor's "apply" through
/// [`Engine::apply_settings`] so every surface sees the change without
/// re-fetching anything.
pub struct Engine {
    store: SettingsStore,
    broadcaster: SettingsBroadcaster,
    scheduler: SamplingScheduler,
}

impl Engine {
    /// Load settings from the fixed per-user path and start stopped.
    pub fn new() -> Self {
        Self::with_store(SettingsStore::open())
    }

    /// Use an explicit store (embedders, tests).
    pub fn with_store(store: SettingsStore) -> Self {
        Self {
            store,
            broadcaster: SettingsBroadcaster::new(),
            scheduler: SamplingScheduler::new(),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.store.current()
    }

    /// Register a display surface for settings changes.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionHandle
    where
        F: FnMut(&Settings) + 'static,
    {
        self.broadcaster.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.broadcaster.unsubscribe(handle)
    }

    /// Persist `settings` (best-effort) and notify every subscriber with
    /// the new snapshot. This is the settings editor's "Apply" path.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.store.save(settings);
        let snapshot = self.store.current();
        self.broadcaster.publish(&snapshot);
    }

    /// Apply `Settings::default()` — the settings editor's "Reset" path.
    pub fn reset_settings(&mut self) {
        self.apply_settings(Settings::default());
    }

    /// Start periodic sampling; `on_tick` receives one [`Sample`] per
    /// interval.
    pub fn start_sampling<F>(&mut self, interval: Duration, on_tick: F)
    where
        F: FnMut(Sample) + Send + 'static,
    {
        self.scheduler.start(interval, on_tick);
    }

    pub fn stop_sampling(&mut self) {
        self.scheduler.stop();
    }

    /// Tear down at application exit: persist the widgets' final positions
    /// (when the shell still has them) and stop the scheduler. After this
    /// returns no tick callback will run.
    pub fn shutdown(&mut self, positions: Option<WidgetPositions>) {
        if let Some(positions) = positions {
            let mut settings = self.store.current();
            settings.system_widget_position = positions.system;
            settings.clock_widget_position = positions.clock;
            self.store.save(settings);
        }
        self.scheduler.stop();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
