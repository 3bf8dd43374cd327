//! Stabile Feature-Identität und Composite-Keys.
//!
//! Auflösungsreihenfolge:
//! 1. Engine-native ID
//! 2. `properties.id`
//! 3. `properties.fid`
//! 4. `properties.giscode`
//! 5. Domänen-Properties mit hoher Eindeutigkeit (kombiniert mit Layer-ID)
//! 6. Hash der serialisierten Geometrie (kombiniert mit Layer-ID)

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::MapFeature;

/// Properties, die innerhalb eines Layers in der Regel eindeutig sind.
const LIKELY_UNIQUE_PROPERTIES: &[&str] = &["survey_no", "plot_no", "khasra_no", "name", "code"];

/// Leitet die logische Feature-ID ab.
///
/// Gleiches Feature + gleicher Layer ergibt innerhalb einer Session immer dieselbe ID.
pub fn feature_id(feature: &MapFeature, layer_id: &str) -> String {
    if let Some(id) = &feature.id {
        return format!("feature-{id}");
    }
    if let Some(id) = feature.property_text("id") {
        return format!("feature-{id}");
    }
    if let Some(fid) = feature.property_text("fid") {
        return format!("fid-{fid}");
    }
    if let Some(giscode) = feature.property_text("giscode") {
        return format!("giscode-{giscode}");
    }
    for key in LIKELY_UNIQUE_PROPERTIES {
        if let Some(value) = feature.property_text(key) {
            return format!("{layer_id}-{key}-{value}");
        }
    }
    format!("{layer_id}-geom-{:016x}", geometry_hash(feature))
}

/// Composite-Key `"{layer_id}:{feature_id}"`.
pub fn composite_key(layer_id: &str, feature_id: &str) -> String {
    format!("{layer_id}:{feature_id}")
}

// DefaultHasher::new() ist nicht zufällig geseedet, der Wert bleibt prozessweit stabil.
fn geometry_hash(feature: &MapFeature) -> u64 {
    let serialized = serde_json::to_string(&feature.geometry).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_id_wins_over_properties() {
        let feature = MapFeature::with_id(42).property("fid", 9);
        assert_eq!(feature_id(&feature, "L1"), "feature-42");
    }

    #[test]
    fn test_property_fallbacks_in_order() {
        let by_id = MapFeature::default().property("id", "a").property("fid", 1);
        assert_eq!(feature_id(&by_id, "L"), "feature-a");

        let by_fid = MapFeature::default().property("fid", 1).property("giscode", "g");
        assert_eq!(feature_id(&by_fid, "L"), "fid-1");

        let by_giscode = MapFeature::default().property("giscode", "G-77");
        assert_eq!(feature_id(&by_giscode, "L"), "giscode-G-77");

        let by_domain = MapFeature::default().property("survey_no", "12/3");
        assert_eq!(feature_id(&by_domain, "plots"), "plots-survey_no-12/3");
    }

    #[test]
    fn test_geometry_hash_is_stable_and_layer_scoped() {
        let feature = MapFeature::default()
            .geometry(json!({ "type": "Point", "coordinates": [73.81, 15.49] }));
        let first = feature_id(&feature, "L1");
        assert_eq!(first, feature_id(&feature.clone(), "L1"));
        assert!(first.starts_with("L1-geom-"));
        assert_ne!(first, feature_id(&feature, "L2"));

        let other = MapFeature::default()
            .geometry(json!({ "type": "Point", "coordinates": [73.82, 15.49] }));
        assert_ne!(first, feature_id(&other, "L1"));
    }

    #[test]
    fn test_composite_key_format() {
        assert_eq!(composite_key("L1", "feature-42"), "L1:feature-42");
    }
}
