//! Auflösung logischer Layer auf konkrete Engine-Layer-IDs.
//!
//! Stufen (höhere Stufen gewinnen):
//! 1. Exakte ID
//! 2. ID + `-` oder Leerzeichen als Präfix (`{id}-outline`, `{id} text`)
//! 3. Generierungskonvention des Layer-Typs (`vector-layer-{id}`, `geojson-{id}`, …)
//! 4. Nur wenn 1–3 leer sind: `source-layer`/`source`-Treffer und Sub-Layer-Source-Layer
//!
//! Das Ergebnis ist dedupliziert und folgt der Style-Reihenfolge. Ein leeres
//! Ergebnis ist kein Fehler, sondern löst den Retry aus.

use indexmap::IndexSet;

use crate::core::LayerConfig;
use crate::engine::StyleLayer;

/// Ermittelt die Engine-Layer-IDs für eine Layer-Konfiguration.
pub fn resolve_engine_layers(config: &LayerConfig, style_layers: &[StyleLayer]) -> Vec<String> {
    let mut matches: IndexSet<&str> = IndexSet::new();

    for layer in style_layers {
        if is_direct_match(config, &layer.id) {
            matches.insert(&layer.id);
        }
    }

    if matches.is_empty() {
        for layer in style_layers {
            if is_source_match(config, layer) {
                matches.insert(&layer.id);
            }
        }
    }

    matches.into_iter().map(str::to_string).collect()
}

/// Stufen 1–3: ID-basierte Treffer.
fn is_direct_match(config: &LayerConfig, engine_id: &str) -> bool {
    let id = config.id.as_str();
    if engine_id == id {
        return true;
    }
    if let Some(rest) = engine_id.strip_prefix(id) {
        if rest.starts_with('-') || rest.starts_with(' ') {
            return true;
        }
    }
    config
        .layer_type
        .generated_id_prefixes()
        .iter()
        .any(|prefix| matches_generated(engine_id, prefix, id))
}

/// `{prefix}{id}` exakt oder gefolgt von `-{suffix}`.
fn matches_generated(engine_id: &str, prefix: &str, id: &str) -> bool {
    engine_id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(id))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('-'))
}

/// Stufe 4: Source- bzw. Source-Layer-Treffer.
fn is_source_match(config: &LayerConfig, layer: &StyleLayer) -> bool {
    if let Some(source_layer) = layer.source_layer.as_deref() {
        if config.declared_source_layers().any(|sl| sl == source_layer) {
            return true;
        }
        if config
            .layers
            .iter()
            .any(|sub| sub.source_layer.as_deref() == Some(source_layer))
        {
            return true;
        }
    }
    match (config.source.as_deref(), layer.source.as_deref()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LayerType, SubLayerConfig};

    fn style(ids: &[(&str, Option<&str>, Option<&str>)]) -> Vec<StyleLayer> {
        ids.iter()
            .map(|(id, source, source_layer)| StyleLayer {
                id: id.to_string(),
                layer_type: "fill".to_string(),
                source: source.map(str::to_string),
                source_layer: source_layer.map(str::to_string),
                metadata: None,
            })
            .collect()
    }

    #[test]
    fn test_exact_and_separator_prefix_matches() {
        let layers = style(&[
            ("roads", None, None),
            ("roads-outline", None, None),
            ("roads text", None, None),
            ("roadside", None, None),
        ]);
        let config = LayerConfig::new("roads", LayerType::Vector);
        assert_eq!(
            resolve_engine_layers(&config, &layers),
            vec!["roads", "roads-outline", "roads text"]
        );
    }

    #[test]
    fn test_generated_convention_per_type() {
        let layers = style(&[
            ("geojson-L1-fill", None, None),
            ("geojson-L1-line", None, None),
            ("geojson-L10-fill", None, None),
            ("csv-L1", None, None),
        ]);
        let config = LayerConfig::new("L1", LayerType::Geojson);
        assert_eq!(
            resolve_engine_layers(&config, &layers),
            vec!["geojson-L1-fill", "geojson-L1-line"]
        );

        let tms = LayerConfig::new("sat", LayerType::Tms);
        let layers = style(&[("tms-layer-sat", None, None)]);
        assert_eq!(resolve_engine_layers(&tms, &layers), vec!["tms-layer-sat"]);
    }

    #[test]
    fn test_source_tier_only_when_id_tiers_empty() {
        let layers = style(&[
            ("plots", None, None),
            ("parcel-fill", Some("tiles"), Some("parcels")),
        ]);
        let config = LayerConfig::new("plots", LayerType::Vector).with_source_layer("parcels");
        assert_eq!(resolve_engine_layers(&config, &layers), vec!["plots"]);

        let layers = style(&[
            ("parcel-fill", Some("tiles"), Some("parcels")),
            ("parcel-line", Some("tiles"), Some("parcels")),
            ("other", Some("tiles"), Some("villages")),
        ]);
        assert_eq!(
            resolve_engine_layers(&config, &layers),
            vec!["parcel-fill", "parcel-line"]
        );
    }

    #[test]
    fn test_source_and_sublayer_matches_are_deduplicated() {
        let layers = style(&[
            ("a", Some("tiles"), Some("roads")),
            ("b", Some("other"), Some("rivers")),
            ("c", Some("other"), Some("lakes")),
        ]);
        let mut config = LayerConfig::new("hydro", LayerType::Vector).with_source("tiles");
        config.layers = vec![
            SubLayerConfig {
                source_layer: Some("rivers".into()),
                ..SubLayerConfig::default()
            },
            SubLayerConfig {
                source_layer: Some("roads".into()),
                ..SubLayerConfig::default()
            },
        ];
        assert_eq!(resolve_engine_layers(&config, &layers), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_style_yields_empty_result() {
        let config = LayerConfig::new("L1", LayerType::Geojson).with_source("L1");
        assert!(resolve_engine_layers(&config, &[]).is_empty());
    }
}
