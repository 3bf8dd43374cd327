//! Hover: Einzel- und Batch-Hover, Leave-Ereignisse, optionaler Hover-Ablauf.

use super::{FeatureStateManager, ScheduledTask};
use crate::app::scheduler::TimerId;
use crate::app::{FeatureSnapshot, InteractionEvent};
use crate::core::{FeatureHit, LngLat, MapFeature};
use crate::engine::{MapEngine, HOVER_STATE};

impl<E: MapEngine> FeatureStateManager<E> {
    /// Einzel-Hover eines Features.
    ///
    /// Ein ausstehender Hover-Timer des Features wird gelöscht. Andere
    /// gehoverte Features bleiben unverändert.
    pub fn on_feature_hover(
        &mut self,
        feature: &MapFeature,
        layer_id: &str,
        lng_lat: Option<LngLat>,
    ) {
        let Some(key) = self.apply_hover(feature, layer_id, lng_lat) else {
            return;
        };
        if let Some(snapshot) = self.store.snapshot(&key) {
            self.emit(InteractionEvent::FeatureHover {
                feature: snapshot,
                lng_lat,
            });
        }
    }

    /// Batch-Hover für überlappende Features unter einer Zeigerposition.
    ///
    /// Löscht zuerst alle bestehenden Hover, markiert dann den ganzen Batch
    /// und veröffentlicht genau ein `features-batch-hover`. Ein leerer Batch
    /// verhält sich wie `handle_map_mouse_leave()`, einer ohne gültige
    /// Einträge wird ignoriert.
    pub fn handle_feature_hovers(&mut self, hits: &[FeatureHit], lng_lat: Option<LngLat>) {
        if self.disposed {
            return;
        }
        if hits.is_empty() {
            self.handle_map_mouse_leave();
            return;
        }
        if !hits.iter().any(|h| self.identify(&h.feature, &h.layer_id).is_some()) {
            if self.debug {
                log::debug!("Hover-Batch ohne gültige Einträge ignoriert");
            }
            return;
        }

        self.clear_all_hovers();

        let mut keys: Vec<String> = Vec::with_capacity(hits.len());
        for hit in hits {
            let position = hit.lng_lat.or(lng_lat);
            if let Some(key) = self.apply_hover(&hit.feature, &hit.layer_id, position) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        let features: Vec<FeatureSnapshot> =
            keys.iter().filter_map(|k| self.store.snapshot(k)).collect();
        if self.debug {
            log::debug!("Batch-Hover: {} Features", features.len());
        }
        self.emit(InteractionEvent::FeaturesBatchHover { features, lng_lat });
    }

    /// Maus hat die Karte verlassen: alle Hover löschen.
    pub fn handle_map_mouse_leave(&mut self) {
        if self.disposed {
            return;
        }
        let cleared = self.clear_all_hovers();
        self.emit(InteractionEvent::MapMouseLeave { cleared });
    }

    /// Hover eines einzelnen Features beenden.
    pub fn on_feature_leave(&mut self, feature: &MapFeature, layer_id: &str) {
        let Some((_, key)) = self.identify(feature, layer_id) else {
            return;
        };
        if let Some(snapshot) = self.clear_hover(&key) {
            self.emit(InteractionEvent::FeatureLeave { feature: snapshot });
        }
    }

    /// Maus hat einen Engine-Layer verlassen: Hover des zugehörigen logischen Layers löschen.
    pub(super) fn on_engine_layer_leave(&mut self, engine_layer: &str) {
        let owners: Vec<String> = self
            .resolutions
            .iter()
            .filter(|(_, r)| r.is_resolved() && r.engine_layers.iter().any(|l| l == engine_layer))
            .map(|(id, _)| id.clone())
            .collect();
        for layer_id in owners {
            let hovered: Vec<String> = self
                .store
                .layer_entries(&layer_id)
                .filter(|(_, s)| s.is_hovered)
                .map(|(k, _)| k.clone())
                .collect();
            for key in hovered {
                if let Some(snapshot) = self.clear_hover(&key) {
                    self.emit(InteractionEvent::FeatureLeave { feature: snapshot });
                }
            }
        }
    }

    /// Hover-Timer ist abgelaufen.
    pub(super) fn expire_hover(&mut self, key: &str, timer: TimerId) {
        if self.hover_timers.get(key) != Some(&timer) {
            return;
        }
        if let Some(snapshot) = self.clear_hover(key) {
            if self.debug {
                log::debug!("Hover von '{}' abgelaufen", key);
            }
            self.emit(InteractionEvent::FeatureLeave { feature: snapshot });
        }
    }

    /// Markiert ein Feature als gehovert (ohne Event). Gibt den Composite-Key zurück.
    fn apply_hover(
        &mut self,
        feature: &MapFeature,
        layer_id: &str,
        lng_lat: Option<LngLat>,
    ) -> Option<String> {
        let (fid, key) = self.identify(feature, layer_id)?;
        self.cancel_hover_timer(&key);
        let now = self.clock.now();
        self.store.upsert(&key, layer_id, &fid, feature, lng_lat, now);
        self.update_hover_flag(&key, true);
        self.mirror(&key, HOVER_STATE, true);

        if let Some(timeout) = self.options.hover_timeout() {
            let timer = self.timers.schedule(
                now,
                timeout,
                ScheduledTask::HoverExpiry { key: key.clone() },
            );
            self.hover_timers.insert(key.clone(), timer);
        }
        if self.debug {
            log::debug!("Hover gesetzt: {}", key);
        }
        Some(key)
    }

    /// Löscht alle Hover (ohne Event) und gibt die betroffenen Features zurück.
    fn clear_all_hovers(&mut self) -> Vec<FeatureSnapshot> {
        self.store
            .hovered_keys()
            .iter()
            .filter_map(|key| self.clear_hover(key))
            .collect()
    }

    /// Löscht den Hover eines Features; `Some` falls es gehovert war.
    fn clear_hover(&mut self, key: &str) -> Option<FeatureSnapshot> {
        self.cancel_hover_timer(key);
        let was_hovered = self.store.get(key).is_some_and(|s| s.is_hovered);
        if !was_hovered {
            return None;
        }
        self.update_hover_flag(key, false);
        self.mirror(key, HOVER_STATE, false);
        self.store.snapshot(key)
    }

    /// Storniert einen ausstehenden Hover-Timer.
    pub(super) fn cancel_hover_timer(&mut self, key: &str) {
        if let Some(timer) = self.hover_timers.remove(key) {
            self.timers.cancel(timer);
        }
    }

    fn update_hover_flag(&mut self, key: &str, hovered: bool) {
        if self.store.set_hovered(key, hovered).is_none() {
            log::error!("Hover-Update für unbekannten Feature-Key '{}' abgebrochen", key);
        }
    }
}
