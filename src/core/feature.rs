//! Roh-Features, wie sie die Render-Engine bei Hover/Klick liefert.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Engine-native Feature-ID (numerisch oder String).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFeatureId {
    /// Numerische ID (Vektor-Tiles, `generateId`)
    Number(u64),
    /// String-ID (GeoJSON mit `promoteId`)
    Text(String),
}

impl std::fmt::Display for RawFeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawFeatureId::Number(n) => write!(f, "{n}"),
            RawFeatureId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RawFeatureId {
    fn from(value: u64) -> Self {
        RawFeatureId::Number(value)
    }
}

impl From<&str> for RawFeatureId {
    fn from(value: &str) -> Self {
        RawFeatureId::Text(value.to_string())
    }
}

/// Geographische Position (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LngLat {
    /// Längengrad
    pub lng: f64,
    /// Breitengrad
    pub lat: f64,
}

impl LngLat {
    /// Erstellt eine Position aus Längen- und Breitengrad.
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Ein Feature, wie es von `queryRenderedFeatures` bzw. Maus-Events kommt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFeature {
    /// Engine-native ID (fehlt ohne `generateId`/`promoteId`)
    #[serde(default)]
    pub id: Option<RawFeatureId>,
    /// Source, aus der das Feature stammt
    #[serde(default)]
    pub source: Option<String>,
    /// Source-Layer (nur Vektor-Tiles)
    #[serde(default)]
    pub source_layer: Option<String>,
    /// Attribute des Features
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// GeoJSON-Geometrie
    #[serde(default)]
    pub geometry: Value,
}

impl MapFeature {
    /// Erstellt ein Feature mit engine-nativer ID.
    pub fn with_id(id: impl Into<RawFeatureId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Setzt eine Property (Builder).
    pub fn property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    /// Setzt Source und optional Source-Layer (Builder).
    pub fn from_source(mut self, source: &str, source_layer: Option<&str>) -> Self {
        self.source = Some(source.to_string());
        self.source_layer = source_layer.map(str::to_string);
        self
    }

    /// Setzt die Geometrie (Builder).
    pub fn geometry(mut self, geometry: Value) -> Self {
        self.geometry = geometry;
        self
    }

    /// Liest eine Property als Anzeige-String (Strings ohne Quotes, Zahlen/Bools formatiert).
    ///
    /// `null` und leere Strings gelten als nicht vorhanden.
    pub fn property_text(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// ID für das Visual-State-Mirroring: native ID, sonst `properties.id`.
    pub fn state_id(&self) -> Option<RawFeatureId> {
        if let Some(id) = &self.id {
            return Some(id.clone());
        }
        match self.properties.get("id")? {
            Value::Number(n) => n.as_u64().map(RawFeatureId::Number),
            Value::String(s) if !s.is_empty() => Some(RawFeatureId::Text(s.clone())),
            _ => None,
        }
    }
}

/// Treffer eines Features auf einem logischen Layer (Batch-Eingabe für Hover/Klick).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureHit {
    /// Getroffenes Feature
    pub feature: MapFeature,
    /// Logische Layer-ID (Registry), nicht die Engine-Layer-ID
    pub layer_id: String,
    /// Position des Treffers (falls bekannt)
    #[serde(default)]
    pub lng_lat: Option<LngLat>,
}

impl FeatureHit {
    /// Erstellt einen Treffer ohne Position.
    pub fn new(feature: MapFeature, layer_id: impl Into<String>) -> Self {
        Self {
            feature,
            layer_id: layer_id.into(),
            lng_lat: None,
        }
    }

    /// Setzt die Position (Builder).
    pub fn at(mut self, lng_lat: LngLat) -> Self {
        self.lng_lat = Some(lng_lat);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_text_ignores_null_and_empty() {
        let feature = MapFeature::default()
            .property("a", Value::Null)
            .property("b", "")
            .property("c", 17)
            .property("d", "x");
        assert_eq!(feature.property_text("a"), None);
        assert_eq!(feature.property_text("b"), None);
        assert_eq!(feature.property_text("c").as_deref(), Some("17"));
        assert_eq!(feature.property_text("d").as_deref(), Some("x"));
        assert_eq!(feature.property_text("missing"), None);
    }

    #[test]
    fn test_state_id_prefers_native_id() {
        let feature = MapFeature::with_id(42).property("id", 7);
        assert_eq!(feature.state_id(), Some(RawFeatureId::Number(42)));

        let promoted = MapFeature::default().property("id", "abc");
        assert_eq!(promoted.state_id(), Some(RawFeatureId::Text("abc".into())));

        assert_eq!(MapFeature::default().state_id(), None);
    }

    #[test]
    fn test_deserializes_engine_feature_json() {
        let feature: MapFeature = serde_json::from_value(json!({
            "id": 42,
            "source": "plots",
            "sourceLayer": "parcels",
            "properties": { "name": "Plot 1" },
            "geometry": { "type": "Point", "coordinates": [73.8, 15.5] }
        }))
        .expect("gültiges Feature-JSON");
        assert_eq!(feature.id, Some(RawFeatureId::Number(42)));
        assert_eq!(feature.source_layer.as_deref(), Some("parcels"));
    }
}
