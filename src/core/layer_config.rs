//! Layer-Konfiguration aus der externen Layer-Registry.
//!
//! Die Konfiguration wird nur gelesen; der State-Manager hält für die Dauer
//! der Registrierung eine geteilte Referenz (`Arc<LayerConfig>`).

use serde::{Deserialize, Serialize};

/// Deklarierter Typ eines logischen Layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerType {
    /// Kompletter Fremd-Style (keine eigene Source)
    Style,
    /// Vektor-Tiles
    Vector,
    /// Raster-Tiles (XYZ/TMS)
    Tms,
    /// WMS-Dienst
    Wms,
    /// WMTS-Dienst
    Wmts,
    /// GeoJSON-Datei oder -URL
    Geojson,
    /// CSV mit Koordinatenspalten
    Csv,
    /// Punkt-Marker
    Markers,
    /// Einzelnes georeferenziertes Bild
    Img,
    /// Gruppierung mehrerer Layer
    LayerGroup,
    /// Unbekannter Typ aus einer neueren Registry-Version
    #[serde(other)]
    Unknown,
}

impl LayerType {
    /// Bezeichner wie in der Registry-Konfiguration.
    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Style => "style",
            LayerType::Vector => "vector",
            LayerType::Tms => "tms",
            LayerType::Wms => "wms",
            LayerType::Wmts => "wmts",
            LayerType::Geojson => "geojson",
            LayerType::Csv => "csv",
            LayerType::Markers => "markers",
            LayerType::Img => "img",
            LayerType::LayerGroup => "layer-group",
            LayerType::Unknown => "unknown",
        }
    }

    /// Präfixe der Engine-Layer-IDs, die für diesen Typ generiert werden.
    ///
    /// Die generierte ID ist `{präfix}{config-id}`, optional gefolgt von `-{suffix}`.
    pub fn generated_id_prefixes(self) -> &'static [&'static str] {
        match self {
            LayerType::Vector => &["vector-layer-"],
            LayerType::Tms => &["tms-layer-"],
            LayerType::Wms => &["wms-layer-"],
            LayerType::Wmts => &["wmts-layer-"],
            LayerType::Geojson => &["geojson-"],
            LayerType::Csv => &["csv-"],
            LayerType::Markers => &["markers-"],
            LayerType::Img => &["img-layer-"],
            LayerType::Style | LayerType::LayerGroup | LayerType::Unknown => &[],
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beschreibung eines Sub-Layers innerhalb von `LayerConfig::layers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubLayerConfig {
    /// Optionale eigene ID des Sub-Layers
    #[serde(default)]
    pub id: Option<String>,
    /// Source-Layer innerhalb der Vektor-Source
    #[serde(default)]
    pub source_layer: Option<String>,
    /// Engine-Layer-Typ (`fill`, `line`, `raster`, …)
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,
}

/// Metadaten, welche Feature-Properties für Benutzer relevant sind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectConfig {
    /// Property, die als Titel eines Features angezeigt wird
    #[serde(default)]
    pub label: Option<String>,
    /// Properties, die im Info-Panel gelistet werden
    #[serde(default)]
    pub fields: Vec<String>,
    /// Anzeigenamen der Felder (gleiche Reihenfolge wie `fields`)
    #[serde(default)]
    pub field_titles: Vec<String>,
}

/// Deskriptor eines logischen Layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    /// Eindeutige Layer-ID
    pub id: String,
    /// Deklarierter Layer-Typ
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    /// Name der Engine-Source
    #[serde(default)]
    pub source: Option<String>,
    /// Source-Layer (Vektor-Tiles)
    #[serde(default)]
    pub source_layer: Option<String>,
    /// Mehrere Source-Layer (Vektor-Tiles)
    #[serde(default)]
    pub source_layers: Vec<String>,
    /// Sub-Layer-Deskriptoren
    #[serde(default)]
    pub layers: Vec<SubLayerConfig>,
    /// Inspect-Metadaten für Info-Panels
    #[serde(default)]
    pub inspect: Option<InspectConfig>,
}

impl LayerConfig {
    /// Erstellt eine minimale Konfiguration ohne Source-Angaben.
    pub fn new(id: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            source: None,
            source_layer: None,
            source_layers: Vec::new(),
            layers: Vec::new(),
            inspect: None,
        }
    }

    /// Setzt die Engine-Source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Setzt den Source-Layer.
    pub fn with_source_layer(mut self, source_layer: impl Into<String>) -> Self {
        self.source_layer = Some(source_layer.into());
        self
    }

    /// Alle deklarierten Source-Layer (Einzelwert und Liste zusammengeführt).
    pub fn declared_source_layers(&self) -> impl Iterator<Item = &str> {
        self.source_layer
            .iter()
            .chain(self.source_layers.iter())
            .map(String::as_str)
    }

    /// Ob Visual-State-Mirroring für diesen Layer möglich ist.
    ///
    /// `style`-Layer haben keine eigene Source.
    pub fn supports_feature_state(&self) -> bool {
        self.layer_type != LayerType::Style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_registry_json_with_kebab_case_types() {
        let json = r#"{
            "id": "plots",
            "type": "layer-group",
            "sourceLayer": "parcels",
            "sourceLayers": ["villages"],
            "layers": [{ "sourceLayer": "roads", "type": "line" }],
            "inspect": { "label": "name", "fields": ["survey_no"] }
        }"#;
        let config: LayerConfig = serde_json::from_str(json).expect("gültiges Registry-JSON");
        assert_eq!(config.layer_type, LayerType::LayerGroup);
        assert_eq!(
            config.declared_source_layers().collect::<Vec<_>>(),
            vec!["parcels", "villages"]
        );
        assert_eq!(config.layers[0].source_layer.as_deref(), Some("roads"));
        assert_eq!(
            config.inspect.as_ref().and_then(|i| i.label.as_deref()),
            Some("name")
        );
    }

    #[test]
    fn test_unknown_type_falls_back_instead_of_failing() {
        let config: LayerConfig =
            serde_json::from_str(r#"{ "id": "x", "type": "terrain-3d" }"#).expect("parsebar");
        assert_eq!(config.layer_type, LayerType::Unknown);
        assert!(config.supports_feature_state());
    }

    #[test]
    fn test_style_layers_have_no_feature_state() {
        assert!(!LayerConfig::new("basemap", LayerType::Style).supports_feature_state());
    }
}
