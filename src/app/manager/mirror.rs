//! Spiegelung des logischen Hover-/Selektionszustands in den
//! Feature-State-Store der Engine. Best-effort: Fehler werden geloggt,
//! der logische Zustand bleibt bestehen.

use super::FeatureStateManager;
use crate::core::{LayerConfig, MapFeature};
use crate::engine::{FeatureTarget, MapEngine, HOVER_STATE, SELECTED_STATE};

/// Baut die Engine-Adresse eines Features (Feature-Angaben vor Layer-Konfiguration).
pub(super) fn feature_target(config: &LayerConfig, feature: &MapFeature) -> Option<FeatureTarget> {
    let source = feature.source.clone().or_else(|| config.source.clone())?;
    let id = feature.state_id()?;
    let source_layer = feature
        .source_layer
        .clone()
        .or_else(|| config.source_layer.clone());
    Some(FeatureTarget {
        source,
        id,
        source_layer,
    })
}

impl<E: MapEngine> FeatureStateManager<E> {
    /// Setzt (`true`) bzw. entfernt (`false`) einen State-Key in der Engine.
    pub(super) fn mirror(&mut self, key: &str, state_key: &str, value: bool) {
        let Some(state) = self.store.get(key) else {
            return;
        };
        let Some(config) = self.layers.get(&state.layer_id) else {
            return;
        };
        if !config.supports_feature_state() {
            log::debug!(
                "Layer '{}' ist ein style-Layer ohne eigene Source, kein Feature-State",
                config.id
            );
            return;
        }
        let Some(target) = feature_target(config, &state.feature) else {
            log::debug!("Feature '{}' hat keine Source/ID für Feature-State", key);
            return;
        };

        let result = if value {
            self.engine.set_feature_state(&target, state_key, true)
        } else {
            self.engine.remove_feature_state(&target, Some(state_key))
        };
        match result {
            Ok(()) => {
                if self.debug {
                    log::debug!("Feature-State {}={} für '{}'", state_key, value, key);
                }
            }
            Err(e) => log::warn!("Feature-State '{}' für '{}' fehlgeschlagen: {}", state_key, key, e),
        }
    }

    /// Entfernt Hover- und Selektionsspiegelung eines Features.
    pub(super) fn clear_visual_state(&mut self, key: &str) {
        let Some(state) = self.store.get(key) else {
            return;
        };
        let (hovered, selected) = (state.is_hovered, state.is_selected);
        if hovered {
            self.mirror(key, HOVER_STATE, false);
        }
        if selected {
            self.mirror(key, SELECTED_STATE, false);
        }
    }

    /// Spiegelt den aktuellen Zustand aller Features eines Layers erneut
    /// (nach Style-Reload ist der Feature-State-Store der Engine leer).
    pub(super) fn reapply_visual_state(&mut self, layer_id: &str) {
        let entries: Vec<(String, bool, bool)> = self
            .store
            .layer_entries(layer_id)
            .map(|(k, s)| (k.clone(), s.is_hovered, s.is_selected))
            .collect();
        for (key, hovered, selected) in entries {
            if hovered {
                self.mirror(&key, HOVER_STATE, true);
            }
            if selected {
                self.mirror(&key, SELECTED_STATE, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LayerType, RawFeatureId};

    #[test]
    fn test_feature_fields_win_over_config() {
        let config = LayerConfig::new("L", LayerType::Vector)
            .with_source("cfg-src")
            .with_source_layer("cfg-layer");
        let feature = MapFeature::with_id(5).from_source("feat-src", Some("feat-layer"));
        let target = feature_target(&config, &feature).expect("Target ableitbar");
        assert_eq!(target.source, "feat-src");
        assert_eq!(target.source_layer.as_deref(), Some("feat-layer"));
        assert_eq!(target.id, RawFeatureId::Number(5));
    }

    #[test]
    fn test_config_fills_missing_source() {
        let config = LayerConfig::new("L", LayerType::Geojson).with_source("plots");
        let target = feature_target(&config, &MapFeature::with_id("a")).expect("Target");
        assert_eq!(target.source, "plots");
        assert_eq!(target.source_layer, None);
    }

    #[test]
    fn test_no_target_without_source_or_id() {
        let config = LayerConfig::new("L", LayerType::Geojson);
        assert!(feature_target(&config, &MapFeature::with_id(1)).is_none());
        let config = config.with_source("s");
        assert!(feature_target(&config, &MapFeature::default()).is_none());
    }
}
