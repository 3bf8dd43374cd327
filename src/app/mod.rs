//! Application-Layer: State-Manager, Events, Scheduler, Retry und Controller.

pub mod controller;
pub mod event_bus;
pub mod event_log;
pub mod events;
pub mod feature_store;
pub mod manager;
pub mod resolver;
pub mod retry;
pub mod scenario;
/// Zeitquelle und Timer-Queue
pub mod scheduler;

pub use controller::InteractionController;
pub use event_bus::{EventBus, SubscriptionId};
pub use event_log::EventLog;
pub use events::{CleanupReason, FeatureSnapshot, InteractionEvent};
pub use feature_store::{FeatureState, FeatureStore};
pub use manager::{ActiveLayer, FeatureStateManager, ScheduledTask};
pub use resolver::resolve_engine_layers;
pub use retry::{LayerResolution, ResolutionPhase, RetryPolicy};
pub use scenario::{Scenario, ScenarioStep, StyleLayerGroup};
pub use scheduler::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
