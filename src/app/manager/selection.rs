//! Selektion: Batch-Klick, einzelnes Schließen, alles aufheben.

use super::FeatureStateManager;
use crate::app::{FeatureSnapshot, InteractionEvent};
use crate::core::FeatureHit;
use crate::engine::{MapEngine, SELECTED_STATE};

impl<E: MapEngine> FeatureStateManager<E> {
    /// Batch-Klick mit Unterstützung für überlappende Features.
    ///
    /// Ablauf: bisherige Selektion sichern, alles abwählen, den Batch
    /// selektieren, genau ein Event veröffentlichen (`feature-click` bei
    /// einem Feature, sonst `feature-click-multiple`). Ein leerer Batch
    /// ruft stattdessen `clear_all_selections(false)` auf, ein Batch aus
    /// lauter ungültigen Einträgen wird ignoriert.
    pub fn handle_feature_clicks(&mut self, hits: &[FeatureHit]) {
        if self.disposed {
            return;
        }
        let mut batch: Vec<(String, String, &FeatureHit)> = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some((fid, key)) = self.identify(&hit.feature, &hit.layer_id) {
                if !batch.iter().any(|(k, _, _)| *k == key) {
                    batch.push((key, fid, hit));
                }
            }
        }
        if batch.is_empty() {
            if hits.is_empty() {
                self.clear_all_selections(false);
            } else if self.debug {
                log::debug!("Klick-Batch ohne gültige Einträge ignoriert");
            }
            return;
        }

        let cleared_features = self.selected_features();
        self.clear_all_selections(true);

        let now = self.clock.now();
        let mut selected_features: Vec<FeatureSnapshot> = Vec::with_capacity(batch.len());
        for (key, fid, hit) in &batch {
            self.store
                .upsert(key, &hit.layer_id, fid, &hit.feature, hit.lng_lat, now);
            self.update_selected_flag(key, true);
            self.mirror(key, SELECTED_STATE, true);
            if let Some(snapshot) = self.store.snapshot(key) {
                selected_features.push(snapshot);
            }
        }
        if self.debug {
            log::debug!(
                "Klick: {} selektiert, {} abgewählt",
                selected_features.len(),
                cleared_features.len()
            );
        }

        let event = if selected_features.len() == 1 {
            InteractionEvent::FeatureClick {
                feature: selected_features[0].clone(),
                selected_features,
                cleared_features,
            }
        } else {
            InteractionEvent::FeatureClickMultiple {
                selected_features,
                cleared_features,
            }
        };
        self.emit(event);
    }

    /// Schließt ein selektiertes Feature anhand seiner logischen Feature-ID.
    ///
    /// Gibt `false` zurück (mit Warnung), wenn kein selektiertes Feature passt.
    pub fn close_selected_feature(&mut self, feature_id: &str) -> bool {
        let Some(key) = self.store.find_selected_by_feature_id(feature_id) else {
            log::warn!("Kein selektiertes Feature mit ID '{}' gefunden", feature_id);
            return false;
        };
        self.update_selected_flag(&key, false);
        self.mirror(&key, SELECTED_STATE, false);
        if let Some(snapshot) = self.store.snapshot(&key) {
            self.emit(InteractionEvent::FeatureDeselected { feature: snapshot });
        }
        true
    }

    /// Hebt alle Selektionen auf.
    ///
    /// Veröffentlicht `selections-cleared`, sofern nicht unterdrückt und
    /// tatsächlich etwas abgewählt wurde. Gibt die abgewählten Features zurück.
    pub fn clear_all_selections(&mut self, suppress_event: bool) -> Vec<FeatureSnapshot> {
        let mut cleared = Vec::new();
        for key in self.store.selected_keys() {
            if let Some(snapshot) = self.store.snapshot(&key) {
                cleared.push(snapshot);
            }
            self.update_selected_flag(&key, false);
            self.mirror(&key, SELECTED_STATE, false);
        }
        if !suppress_event && !cleared.is_empty() {
            self.emit(InteractionEvent::SelectionsCleared {
                cleared_features: cleared.clone(),
            });
        }
        cleared
    }

    fn update_selected_flag(&mut self, key: &str, selected: bool) {
        if self.store.set_selected(key, selected).is_none() {
            log::error!("Selektions-Update für unbekannten Feature-Key '{}' abgebrochen", key);
        }
    }
}
