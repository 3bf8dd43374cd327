//! Core-Domänentypen: Layer-Konfiguration, Features, Identität, Render-Reihenfolge.

pub mod feature;
pub mod feature_id;
pub mod layer_config;
/// Slot-Zuordnung und Layer-Stack
pub mod layer_order;

pub use feature::{FeatureHit, LngLat, MapFeature, RawFeatureId};
pub use feature_id::{composite_key, feature_id};
pub use layer_config::{InspectConfig, LayerConfig, LayerType, SubLayerConfig};
pub use layer_order::{slot_for_layer_type, LayerStack, Slot, StackEntry};
