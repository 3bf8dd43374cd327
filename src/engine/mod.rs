//! Schnittstelle zur Render-Engine (Style-Layer, Listener, Feature-State).
//!
//! Der State-Manager benutzt ausschließlich diese minimale Fähigkeitsmenge.
//! `memory` enthält eine vollständige In-Memory-Implementierung für Tests
//! und den Szenario-Runner.

mod error;
pub mod memory;

use serde::{Deserialize, Serialize};

use crate::core::RawFeatureId;

pub use error::EngineError;
pub use memory::InMemoryMapEngine;

/// Feature-State-Key für Hover.
pub const HOVER_STATE: &str = "hover";
/// Feature-State-Key für Selektion.
pub const SELECTED_STATE: &str = "selected";

/// Ein Layer im aktuellen Engine-Style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleLayer {
    /// Engine-Layer-ID
    pub id: String,
    /// Engine-Layer-Typ (`fill`, `line`, `symbol`, `raster`, …)
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Source-Name
    #[serde(default)]
    pub source: Option<String>,
    /// Source-Layer (Vektor-Tiles)
    #[serde(default, rename = "source-layer")]
    pub source_layer: Option<String>,
    /// Freie Metadaten
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl StyleLayer {
    /// Erstellt einen Style-Layer ohne Source.
    pub fn new(id: impl Into<String>, layer_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layer_type: layer_type.into(),
            source: None,
            source_layer: None,
            metadata: None,
        }
    }

    /// Setzt Source und optional Source-Layer (Builder).
    pub fn with_source(mut self, source: &str, source_layer: Option<&str>) -> Self {
        self.source = Some(source.to_string());
        self.source_layer = source_layer.map(str::to_string);
        self
    }
}

/// Adresse eines Features im Feature-State-Store der Engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTarget {
    /// Source-Name
    pub source: String,
    /// Engine-native Feature-ID
    pub id: RawFeatureId,
    /// Source-Layer (nur Vektor-Sources)
    pub source_layer: Option<String>,
}

/// Von der Engine gemeldete Ereignisarten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapEventKind {
    /// Style wird gleich neu geladen
    StyleLoading,
    /// Style-Daten haben sich gesetzt
    StyleData,
    /// Maus hat die Karte bzw. einen Layer verlassen
    MouseLeave,
}

/// Ein Engine-Ereignis, optional auf einen Engine-Layer bezogen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEvent {
    /// Ereignisart
    pub kind: MapEventKind,
    /// Engine-Layer-ID (None = kartenweit)
    #[serde(default)]
    pub layer_id: Option<String>,
}

impl MapEvent {
    /// Kartenweites Ereignis.
    pub fn map(kind: MapEventKind) -> Self {
        Self {
            kind,
            layer_id: None,
        }
    }

    /// Layer-bezogenes Ereignis.
    pub fn layer(kind: MapEventKind, layer_id: impl Into<String>) -> Self {
        Self {
            kind,
            layer_id: Some(layer_id.into()),
        }
    }
}

/// Handle eines registrierten Engine-Listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Minimale Fähigkeitsmenge der Render-Engine.
pub trait MapEngine {
    /// Aktuelle Style-Layer (von unten nach oben).
    fn style_layers(&self) -> Vec<StyleLayer>;

    /// Registriert einen Listener, optional auf einen Engine-Layer beschränkt.
    fn add_listener(&mut self, kind: MapEventKind, layer_id: Option<&str>) -> ListenerId;

    /// Entfernt einen Listener; unbekannte Handles werden ignoriert.
    fn remove_listener(&mut self, id: ListenerId);

    /// Setzt einen booleschen Feature-State-Key.
    fn set_feature_state(
        &mut self,
        target: &FeatureTarget,
        key: &str,
        value: bool,
    ) -> Result<(), EngineError>;

    /// Entfernt einen Feature-State-Key (bzw. den ganzen State bei `None`).
    fn remove_feature_state(
        &mut self,
        target: &FeatureTarget,
        key: Option<&str>,
    ) -> Result<(), EngineError>;

    /// Liest einen Feature-State-Key.
    fn feature_state(&self, target: &FeatureTarget, key: &str) -> Option<bool>;
}
