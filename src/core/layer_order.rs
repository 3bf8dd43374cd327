//! Render-Reihenfolge: Zuordnung von Layer-Typen zu festen Slots.
//!
//! Die Slots bilden drei Bänder im Layer-Stack (unten → oben):
//! `bottom` (Raster), `middle` (Vektor), `top` (reserviert für Overlays).
//! Innerhalb eines Slots liegt ein früher konfigurierter Layer über
//! später konfigurierten: neue Layer werden an der Unterkante ihres Slots
//! eingefügt.

use serde::{Deserialize, Serialize};

use super::LayerType;

/// Engine-Layer-Typ, der einen Raster-Style-Layer kennzeichnet.
pub const RASTER_SUBLAYER_TYPE: &str = "raster";

/// Render-Band eines Layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Raster-Hintergründe
    Bottom,
    /// Vektor-Daten
    Middle,
    /// Overlays (derzeit von keinem Typ belegt)
    Top,
}

impl Slot {
    /// Slot-Name wie im Style verwendet.
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Bottom => "bottom",
            Slot::Middle => "middle",
            Slot::Top => "top",
        }
    }
}

/// Ermittelt den Slot für einen Layer-Typ.
///
/// Unbekannte Typen landen in `middle`; die Funktion ist rein und schlägt nie fehl.
pub fn slot_for_layer_type(layer_type: &str, sublayer_type: Option<&str>) -> Slot {
    if sublayer_type == Some(RASTER_SUBLAYER_TYPE) {
        return Slot::Bottom;
    }
    match layer_type {
        "tms" | "wmts" | "wms" | "img" | RASTER_SUBLAYER_TYPE => Slot::Bottom,
        "vector" | "geojson" | "csv" | "markers" => Slot::Middle,
        _ => Slot::Middle,
    }
}

impl LayerType {
    /// Slot dieses Layer-Typs (siehe [`slot_for_layer_type`]).
    pub fn slot(self, sublayer_type: Option<&str>) -> Slot {
        slot_for_layer_type(self.as_str(), sublayer_type)
    }
}

/// Eintrag im Layer-Stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry {
    /// Engine-Layer-ID
    pub id: String,
    /// Zugeordneter Slot
    pub slot: Slot,
}

/// Geordneter Layer-Stack (Index 0 = ganz unten).
#[derive(Debug, Clone, Default)]
pub struct LayerStack {
    entries: Vec<StackEntry>,
}

impl LayerStack {
    /// Erstellt einen leeren Stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index der Unterkante eines Slots (erste Position mit Slot >= `slot`).
    pub fn slot_boundary(&self, slot: Slot) -> usize {
        self.entries
            .iter()
            .position(|e| e.slot >= slot)
            .unwrap_or(self.entries.len())
    }

    /// Fügt eine Layer-Gruppe an der Unterkante ihres Slots ein.
    ///
    /// Die Reihenfolge innerhalb der Gruppe bleibt erhalten. Bereits
    /// vorhandene IDs werden vorher entfernt. Gibt den Einfüge-Index zurück.
    pub fn insert_group<S: AsRef<str>>(&mut self, ids: &[S], slot: Slot) -> usize {
        for id in ids {
            self.remove(id.as_ref());
        }
        let at = self.slot_boundary(slot);
        let group = ids.iter().map(|id| StackEntry {
            id: id.as_ref().to_string(),
            slot,
        });
        self.entries.splice(at..at, group);
        at
    }

    /// Entfernt einen Layer; `true` falls er vorhanden war.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    /// Position eines Layers (0 = ganz unten).
    pub fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// IDs von unten nach oben.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    /// Leert den Stack.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Anzahl der Layer.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Ob der Stack leer ist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_table() {
        assert_eq!(slot_for_layer_type("tms", None), Slot::Bottom);
        assert_eq!(slot_for_layer_type("wmts", None), Slot::Bottom);
        assert_eq!(slot_for_layer_type("wms", None), Slot::Bottom);
        assert_eq!(slot_for_layer_type("img", None), Slot::Bottom);
        assert_eq!(slot_for_layer_type("style", Some("raster")), Slot::Bottom);
        assert_eq!(slot_for_layer_type("geojson", None), Slot::Middle);
        assert_eq!(slot_for_layer_type("vector", None), Slot::Middle);
        assert_eq!(slot_for_layer_type("csv", None), Slot::Middle);
        assert_eq!(slot_for_layer_type("markers", None), Slot::Middle);
        assert_eq!(slot_for_layer_type("unknown-type", None), Slot::Middle);
        assert_eq!(slot_for_layer_type("style", Some("fill")), Slot::Middle);
    }

    #[test]
    fn test_no_type_maps_to_top() {
        for t in [
            "style", "vector", "tms", "wms", "wmts", "geojson", "csv", "markers", "img",
            "layer-group", "",
        ] {
            assert_ne!(slot_for_layer_type(t, None), Slot::Top, "{t}");
            assert_ne!(slot_for_layer_type(t, Some("raster")), Slot::Top, "{t}");
        }
    }

    #[test]
    fn test_layer_type_slot_delegates_to_table() {
        assert_eq!(LayerType::Tms.slot(None), Slot::Bottom);
        assert_eq!(LayerType::Geojson.slot(None), Slot::Middle);
        assert_eq!(LayerType::LayerGroup.slot(None), Slot::Middle);
    }

    #[test]
    fn test_earlier_configured_layer_stays_on_top_within_slot() {
        let mut stack = LayerStack::new();
        // Konfigurationsreihenfolge: A, B, C (alle Vektor) → A soll oben liegen.
        stack.insert_group(&["A"], Slot::Middle);
        stack.insert_group(&["B"], Slot::Middle);
        stack.insert_group(&["C"], Slot::Middle);
        assert_eq!(stack.ids().collect::<Vec<_>>(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_slots_stay_banded_regardless_of_insertion_order() {
        let mut stack = LayerStack::new();
        stack.insert_group(&["vec-1"], Slot::Middle);
        stack.insert_group(&["sat"], Slot::Bottom);
        stack.insert_group(&["overlay"], Slot::Top);
        stack.insert_group(&["vec-2"], Slot::Middle);
        stack.insert_group(&["osm"], Slot::Bottom);
        assert_eq!(
            stack.ids().collect::<Vec<_>>(),
            vec!["osm", "sat", "vec-2", "vec-1", "overlay"]
        );
    }

    #[test]
    fn test_group_keeps_internal_order() {
        let mut stack = LayerStack::new();
        stack.insert_group(&["a-fill", "a-line"], Slot::Middle);
        stack.insert_group(&["b-fill", "b-line"], Slot::Middle);
        assert_eq!(
            stack.ids().collect::<Vec<_>>(),
            vec!["b-fill", "b-line", "a-fill", "a-line"]
        );
        assert!(stack.position("a-line") > stack.position("b-line"));
    }

    #[test]
    fn test_reinserting_moves_instead_of_duplicating() {
        let mut stack = LayerStack::new();
        stack.insert_group(&["A"], Slot::Middle);
        stack.insert_group(&["B"], Slot::Middle);
        stack.insert_group(&["A"], Slot::Middle);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.ids().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
