//! Feature-State-Tabelle mit synchron gehaltener Selektionsmenge.
//!
//! Invariante: `selected` enthält genau die Keys, deren Eintrag
//! `is_selected == true` hat. Alle Mutationen der Selektion gehen über
//! [`FeatureStore::set_selected`] bzw. die Entfernen-Methoden.

use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

use super::FeatureSnapshot;
use crate::core::{LngLat, MapFeature};

/// Zustand eines getrackten Features (pro Layer + Feature-ID).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureState {
    /// Zuletzt gesehenes Roh-Feature
    pub feature: MapFeature,
    /// Logische Layer-ID
    pub layer_id: String,
    /// Logische Feature-ID
    pub feature_id: String,
    /// Hover aktiv
    pub is_hovered: bool,
    /// Selektiert
    pub is_selected: bool,
    /// Letzte bekannte Position
    pub lng_lat: Option<LngLat>,
    /// Zeitpunkt der letzten Interaktion (Manager-Uhr)
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: Duration,
}

fn serialize_millis<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}

impl FeatureState {
    /// Ob der Eintrag beim Staleness-Sweep entfernt werden darf.
    pub fn is_stale(&self, now: Duration, threshold: Duration) -> bool {
        !self.is_hovered
            && !self.is_selected
            && now.saturating_sub(self.timestamp) > threshold
    }
}

/// Tabelle aller getrackten Features.
#[derive(Debug, Default)]
pub struct FeatureStore {
    states: IndexMap<String, FeatureState>,
    selected: IndexSet<String>,
}

impl FeatureStore {
    /// Erstellt eine leere Tabelle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Legt einen Eintrag an oder aktualisiert Feature, Position und Zeitstempel.
    pub fn upsert(
        &mut self,
        key: &str,
        layer_id: &str,
        feature_id: &str,
        feature: &MapFeature,
        lng_lat: Option<LngLat>,
        now: Duration,
    ) -> &mut FeatureState {
        let entry = self
            .states
            .entry(key.to_string())
            .or_insert_with(|| FeatureState {
                feature: feature.clone(),
                layer_id: layer_id.to_string(),
                feature_id: feature_id.to_string(),
                is_hovered: false,
                is_selected: false,
                lng_lat,
                timestamp: now,
            });
        entry.feature = feature.clone();
        if lng_lat.is_some() {
            entry.lng_lat = lng_lat;
        }
        entry.timestamp = now;
        entry
    }

    /// Setzt das Hover-Flag; `None` wenn der Key unbekannt ist, sonst ob sich etwas geändert hat.
    pub fn set_hovered(&mut self, key: &str, hovered: bool) -> Option<bool> {
        let state = self.states.get_mut(key)?;
        let changed = state.is_hovered != hovered;
        state.is_hovered = hovered;
        Some(changed)
    }

    /// Setzt das Selektions-Flag und hält die Selektionsmenge synchron.
    pub fn set_selected(&mut self, key: &str, selected: bool) -> Option<bool> {
        let state = self.states.get_mut(key)?;
        let changed = state.is_selected != selected;
        state.is_selected = selected;
        if selected {
            self.selected.insert(key.to_string());
        } else {
            self.selected.shift_remove(key);
        }
        Some(changed)
    }

    /// Liest einen Eintrag.
    pub fn get(&self, key: &str) -> Option<&FeatureState> {
        self.states.get(key)
    }

    /// Ob ein Key getrackt wird.
    pub fn contains(&self, key: &str) -> bool {
        self.states.contains_key(key)
    }

    /// Entfernt einen Eintrag (inkl. Selektion).
    pub fn remove(&mut self, key: &str) -> Option<FeatureState> {
        self.selected.shift_remove(key);
        self.states.shift_remove(key)
    }

    /// Keys aller Einträge eines Layers.
    pub fn keys_of_layer(&self, layer_id: &str) -> Vec<String> {
        self.states
            .iter()
            .filter(|(_, s)| s.layer_id == layer_id)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Einträge eines Layers in Einfügereihenfolge.
    pub fn layer_entries<'a>(
        &'a self,
        layer_id: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a FeatureState)> + 'a {
        self.states.iter().filter(move |(_, s)| s.layer_id == layer_id)
    }

    /// Keys aller gehoverten Einträge.
    pub fn hovered_keys(&self) -> Vec<String> {
        self.states
            .iter()
            .filter(|(_, s)| s.is_hovered)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Keys aller selektierten Einträge in Selektionsreihenfolge.
    pub fn selected_keys(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    /// Ob ein Key selektiert ist.
    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    /// Erster selektierter Key mit der logischen Feature-ID `feature_id`.
    pub fn find_selected_by_feature_id(&self, feature_id: &str) -> Option<String> {
        self.selected
            .iter()
            .find(|k| {
                self.states
                    .get(k.as_str())
                    .is_some_and(|s| s.feature_id == feature_id)
            })
            .cloned()
    }

    /// Keys aller Einträge, die beim Sweep entfernt werden dürfen.
    pub fn stale_keys(&self, now: Duration, threshold: Duration) -> Vec<String> {
        self.states
            .iter()
            .filter(|(_, s)| s.is_stale(now, threshold))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Momentaufnahme eines Eintrags für Event-Payloads.
    pub fn snapshot(&self, key: &str) -> Option<FeatureSnapshot> {
        let state = self.states.get(key)?;
        Some(FeatureSnapshot {
            key: key.to_string(),
            layer_id: state.layer_id.clone(),
            feature_id: state.feature_id.clone(),
            feature: state.feature.clone(),
            lng_lat: state.lng_lat,
        })
    }

    /// Anzahl der Einträge.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Ob keine Einträge vorhanden sind.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Alle Keys in Einfügereihenfolge.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.states.keys()
    }

    /// Leert die Tabelle.
    pub fn clear(&mut self) {
        self.states.clear();
        self.selected.clear();
    }

    /// Prüft die Selektions-Invariante in beide Richtungen.
    pub fn selection_is_consistent(&self) -> bool {
        let flagged = self.states.iter().filter(|(_, s)| s.is_selected).count();
        flagged == self.selected.len()
            && self
                .selected
                .iter()
                .all(|k| self.states.get(k).is_some_and(|s| s.is_selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn store_with(keys: &[&str]) -> FeatureStore {
        let mut store = FeatureStore::new();
        for key in keys {
            let (layer, fid) = key.split_once(':').expect("Composite-Key");
            store.upsert(key, layer, fid, &MapFeature::default(), None, ms(0));
        }
        store
    }

    #[test]
    fn test_selection_set_follows_flags() {
        let mut store = store_with(&["L:a", "L:b"]);
        assert_eq!(store.set_selected("L:a", true), Some(true));
        assert_eq!(store.set_selected("L:a", true), Some(false));
        assert_eq!(store.set_selected("missing", true), None);
        assert!(store.selection_is_consistent());
        assert_eq!(store.selected_keys(), vec!["L:a"]);

        store.remove("L:a");
        assert!(store.selected_keys().is_empty());
        assert!(store.selection_is_consistent());
    }

    #[test]
    fn test_upsert_keeps_flags_and_refreshes_timestamp() {
        let mut store = store_with(&["L:a"]);
        store.set_hovered("L:a", true);
        let state = store.upsert(
            "L:a",
            "L",
            "a",
            &MapFeature::default(),
            Some(LngLat::new(1.0, 2.0)),
            ms(500),
        );
        assert!(state.is_hovered);
        assert_eq!(state.timestamp, ms(500));
        assert_eq!(state.lng_lat, Some(LngLat::new(1.0, 2.0)));
    }

    #[test]
    fn test_stale_boundary() {
        let mut store = store_with(&["L:old", "L:selected", "L:hovered"]);
        store.set_selected("L:selected", true);
        store.set_hovered("L:hovered", true);
        let threshold = ms(300_000);

        assert!(store.stale_keys(threshold, threshold).is_empty());
        assert_eq!(store.stale_keys(threshold + ms(1), threshold), vec!["L:old"]);
    }

    #[test]
    fn test_find_selected_by_feature_id_ignores_unselected() {
        let mut store = store_with(&["A:f1", "B:f1"]);
        assert_eq!(store.find_selected_by_feature_id("f1"), None);
        store.set_selected("B:f1", true);
        assert_eq!(store.find_selected_by_feature_id("f1").as_deref(), Some("B:f1"));
    }
}
