//! Interaktions-Events für UI- und Export-Konsumenten.
//!
//! Ein Event pro Zustandsübergang bzw. pro Batch; die Namen entsprechen den
//! serialisierten `type`-Tags (`feature-hover`, `selections-cleared`, …).

use serde::Serialize;

use crate::core::{LayerConfig, LngLat, MapFeature};

/// Momentaufnahme eines getrackten Features zum Zeitpunkt des Events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSnapshot {
    /// Composite-Key `"{layer_id}:{feature_id}"`
    pub key: String,
    /// Logische Layer-ID
    pub layer_id: String,
    /// Logische Feature-ID
    pub feature_id: String,
    /// Roh-Feature
    pub feature: MapFeature,
    /// Letzte bekannte Position
    pub lng_lat: Option<LngLat>,
}

/// Grund eines `cleanup`-Events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupReason {
    /// Periodischer Staleness-Sweep
    StaleSweep,
    /// Manager wurde abgebaut
    Dispose,
}

/// Alle Events des State-Managers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum InteractionEvent {
    /// Layer wurde registriert (unabhängig vom Auflösungserfolg)
    LayerRegistered {
        layer_id: String,
        config: LayerConfig,
    },
    /// Layer wurde abgemeldet
    LayerUnregistered {
        layer_id: String,
        removed_features: usize,
    },
    /// Einzel-Hover
    FeatureHover {
        feature: FeatureSnapshot,
        lng_lat: Option<LngLat>,
    },
    /// Batch-Hover über überlappende Features
    FeaturesBatchHover {
        features: Vec<FeatureSnapshot>,
        lng_lat: Option<LngLat>,
    },
    /// Maus hat die Karte verlassen, alle Hover gelöscht
    MapMouseLeave { cleared: Vec<FeatureSnapshot> },
    /// Klick auf genau ein Feature
    FeatureClick {
        feature: FeatureSnapshot,
        selected_features: Vec<FeatureSnapshot>,
        cleared_features: Vec<FeatureSnapshot>,
    },
    /// Klick auf mehrere überlappende Features
    FeatureClickMultiple {
        selected_features: Vec<FeatureSnapshot>,
        cleared_features: Vec<FeatureSnapshot>,
    },
    /// Hover eines einzelnen Features beendet
    FeatureLeave { feature: FeatureSnapshot },
    /// Ein selektiertes Feature wurde geschlossen
    FeatureDeselected { feature: FeatureSnapshot },
    /// Alle Selektionen aufgehoben
    SelectionsCleared { cleared_features: Vec<FeatureSnapshot> },
    /// Feature-States entfernt (Sweep oder Dispose)
    Cleanup {
        reason: CleanupReason,
        removed: Vec<String>,
    },
}

impl InteractionEvent {
    /// Event-Name wie im serialisierten `type`-Tag.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionEvent::LayerRegistered { .. } => "layer-registered",
            InteractionEvent::LayerUnregistered { .. } => "layer-unregistered",
            InteractionEvent::FeatureHover { .. } => "feature-hover",
            InteractionEvent::FeaturesBatchHover { .. } => "features-batch-hover",
            InteractionEvent::MapMouseLeave { .. } => "map-mouse-leave",
            InteractionEvent::FeatureClick { .. } => "feature-click",
            InteractionEvent::FeatureClickMultiple { .. } => "feature-click-multiple",
            InteractionEvent::FeatureLeave { .. } => "feature-leave",
            InteractionEvent::FeatureDeselected { .. } => "feature-deselected",
            InteractionEvent::SelectionsCleared { .. } => "selections-cleared",
            InteractionEvent::Cleanup { .. } => "cleanup",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LayerType;

    #[test]
    fn test_serialized_tag_matches_name() {
        let events = vec![
            InteractionEvent::LayerRegistered {
                layer_id: "L1".into(),
                config: LayerConfig::new("L1", LayerType::Geojson),
            },
            InteractionEvent::MapMouseLeave {
                cleared: Vec::new(),
            },
            InteractionEvent::FeatureClickMultiple {
                selected_features: Vec::new(),
                cleared_features: Vec::new(),
            },
            InteractionEvent::SelectionsCleared {
                cleared_features: Vec::new(),
            },
            InteractionEvent::Cleanup {
                reason: CleanupReason::StaleSweep,
                removed: vec!["L1:feature-1".into()],
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).expect("serialisierbar");
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_payload_fields_are_camel_case() {
        let event = InteractionEvent::SelectionsCleared {
            cleared_features: Vec::new(),
        };
        let json = serde_json::to_value(&event).expect("serialisierbar");
        assert!(json.get("clearedFeatures").is_some(), "{json}");
    }
}
