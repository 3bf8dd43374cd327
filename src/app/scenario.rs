//! Szenario-Beschreibung (JSON) für den Controller und die Binary.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{FeatureHit, LayerConfig, LngLat, MapFeature};
use crate::engine::StyleLayer;

/// Engine-Layer eines logischen Layers, die gemeinsam eingefügt werden.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleLayerGroup {
    /// Deklarierter Layer-Typ (bestimmt den Slot)
    pub layer_type: String,
    /// Engine-Layer in Zeichenreihenfolge
    pub layers: Vec<StyleLayer>,
}

/// Ein Schritt eines Szenarios.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ScenarioStep {
    /// Layer registrieren
    Register { config: LayerConfig },
    /// Layer abmelden
    Unregister { layer_id: String },
    /// Engine-Layer nachträglich hinzufügen (z.B. verzögert geladene Daten)
    AddStyleLayers { layer_type: String, layers: Vec<StyleLayer> },
    /// Einzel-Hover
    Hover {
        layer_id: String,
        feature: MapFeature,
        #[serde(default)]
        lng_lat: Option<LngLat>,
    },
    /// Batch-Hover
    HoverBatch {
        hits: Vec<FeatureHit>,
        #[serde(default)]
        lng_lat: Option<LngLat>,
    },
    /// Hover eines Features beenden
    Leave { layer_id: String, feature: MapFeature },
    /// Maus verlässt die Karte
    MouseLeave,
    /// Batch-Klick
    Click { hits: Vec<FeatureHit> },
    /// Alle Selektionen aufheben
    ClearSelections,
    /// Selektiertes Feature schließen
    CloseSelected { feature_id: String },
    /// Uhr vorspulen (fällige Timer laufen in Reihenfolge)
    Advance { ms: u64 },
    /// Style neu laden, optional mit neuen Engine-Layern
    StyleReload {
        #[serde(default)]
        style: Vec<StyleLayerGroup>,
    },
    /// Staleness-Sweep sofort ausführen
    Sweep,
}

/// Vollständiges Szenario: Start-Style plus Schritte.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Optionaler Name für Logs
    #[serde(default)]
    pub name: Option<String>,
    /// Engine-Layer beim Start
    #[serde(default)]
    pub style: Vec<StyleLayerGroup>,
    /// Auszuführende Schritte
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

const DEMO_SCENARIO: &str = r#"{
  "name": "demo",
  "style": [
    { "layerType": "tms", "layers": [
      { "id": "tms-layer-satellite", "type": "raster", "source": "satellite" } ] },
    { "layerType": "geojson", "layers": [
      { "id": "geojson-plots-fill", "type": "fill", "source": "plots" },
      { "id": "geojson-plots-line", "type": "line", "source": "plots" } ] }
  ],
  "steps": [
    { "action": "register", "config": { "id": "satellite", "type": "tms", "source": "satellite" } },
    { "action": "register", "config": { "id": "plots", "type": "geojson", "source": "plots" } },
    { "action": "register", "config": { "id": "villages", "type": "geojson", "source": "villages" } },
    { "action": "hover", "layerId": "plots",
      "feature": { "id": 42, "properties": { "survey_no": "12/3" } },
      "lngLat": { "lng": 73.81, "lat": 15.49 } },
    { "action": "click", "hits": [
      { "layerId": "plots", "feature": { "id": 42, "properties": { "survey_no": "12/3" } } } ] },
    { "action": "add-style-layers", "layerType": "geojson", "layers": [
      { "id": "geojson-villages-fill", "type": "fill", "source": "villages" } ] },
    { "action": "advance", "ms": 500 },
    { "action": "click", "hits": [
      { "layerId": "plots", "feature": { "id": 42 } },
      { "layerId": "villages", "feature": { "id": 7, "properties": { "name": "Panaji" } } } ] },
    { "action": "close-selected", "featureId": "feature-7" },
    { "action": "mouse-leave" },
    { "action": "clear-selections" }
  ]
}"#;

impl Scenario {
    /// Parst ein Szenario aus JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Szenario-JSON ungültig")
    }

    /// Lädt ein Szenario aus einer JSON-Datei.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Szenario-Datei nicht lesbar: {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Fehler beim Laden von {}", path.display()))
    }

    /// Eingebautes Demo-Szenario.
    pub fn demo() -> Result<Self> {
        Self::from_json_str(DEMO_SCENARIO)
    }
}
