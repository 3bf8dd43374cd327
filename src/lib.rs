//! WebGIS Map Interaction Library.
//! Feature-Hover/-Selektion über dynamisch registrierte Karten-Layer,
//! als Library exportiert für Tests und Einbettung in eine Host-Anwendung.

pub mod app;
pub mod core;
pub mod engine;
pub mod shared;

pub use app::{
    EventBus, FeatureSnapshot, FeatureState, FeatureStateManager, InteractionController,
    InteractionEvent, ManualClock, ResolutionPhase, Scenario, ScenarioStep, SystemClock,
};
pub use core::{FeatureHit, LayerConfig, LayerType, LngLat, MapFeature, RawFeatureId, Slot};
pub use engine::{EngineError, InMemoryMapEngine, MapEngine, MapEvent, MapEventKind, StyleLayer};
pub use shared::InteractionOptions;
