//! Desklet core: periodic host-metrics sampling plus a persisted
//! appearance/layout settings document with change propagation.
//!
//! The presentation shell (windows, dragging, rendering, tray menu) lives
//! outside this crate and consumes four seams:
//!
//! - [`SettingsStore`] — load/default/save the settings document.
//! - [`SamplingScheduler`] — periodic [`Sample`] delivery from the
//!   [`MetricsSampler`].
//! - [`SettingsBroadcaster`] — fan-out of applied settings to every
//!   display surface.
//! - [`Engine`] — application-lifetime wiring of the three above.

pub mod broadcast;
pub mod clock;
pub mod engine;
pub mod sampler;
pub mod scheduler;
pub mod settings;

pub use broadcast::{SettingsBroadcaster, SubscriptionHandle};
pub use clock::ClockReading;
pub use engine::{Engine, WidgetPositions};
pub use sampler::{MemorySample, MetricsSampler, Sample, StorageSample};
pub use scheduler::SamplingScheduler;
pub use settings::{Position, Settings, SettingsError, SettingsStore};
