//! In-Memory-Render-Engine für Tests und den Szenario-Runner.
//!
//! Bildet die Teile einer Vektor-Karten-Engine nach, die der State-Manager
//! benutzt: geordneter Style-Layer-Stack mit Slot-Einfügung, Listener-Registry
//! und Feature-State-Store inklusive der Ablehnungen einer echten Engine.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;

use super::{EngineError, FeatureTarget, ListenerId, MapEngine, MapEventKind, StyleLayer};
use crate::core::{slot_for_layer_type, LayerStack, Slot};

/// Registrierter Listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRecord {
    /// Ereignisart
    pub kind: MapEventKind,
    /// Engine-Layer (None = kartenweit)
    pub layer_id: Option<String>,
}

/// In-Memory-Implementierung von [`MapEngine`].
#[derive(Debug)]
pub struct InMemoryMapEngine {
    layers: IndexMap<String, StyleLayer>,
    stack: LayerStack,
    feature_states: HashMap<FeatureTarget, HashMap<String, bool>>,
    listeners: BTreeMap<ListenerId, ListenerRecord>,
    next_listener_id: u64,
    style_loaded: bool,
}

impl Default for InMemoryMapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMapEngine {
    /// Erstellt eine Engine mit leerem, geladenem Style.
    pub fn new() -> Self {
        Self {
            layers: IndexMap::new(),
            stack: LayerStack::new(),
            feature_states: HashMap::new(),
            listeners: BTreeMap::new(),
            next_listener_id: 1,
            style_loaded: true,
        }
    }

    /// Fügt die Engine-Layer eines logischen Layers als Gruppe ein.
    ///
    /// Der Slot wird aus dem deklarierten Layer-Typ und dem Engine-Typ des
    /// ersten Layers abgeleitet. Gibt den Slot zurück.
    pub fn add_layer_group(&mut self, layer_type: &str, layers: Vec<StyleLayer>) -> Slot {
        let sublayer_type = layers.first().map(|l| l.layer_type.clone());
        let slot = slot_for_layer_type(layer_type, sublayer_type.as_deref());
        self.insert_layers(layers, slot);
        slot
    }

    /// Fügt einen einzelnen Layer in einen expliziten Slot ein.
    pub fn add_layer(&mut self, layer: StyleLayer, slot: Slot) {
        self.insert_layers(vec![layer], slot);
    }

    fn insert_layers(&mut self, layers: Vec<StyleLayer>, slot: Slot) {
        let ids: Vec<String> = layers.iter().map(|l| l.id.clone()).collect();
        let at = self.stack.insert_group(&ids, slot);
        for layer in layers {
            self.layers.insert(layer.id.clone(), layer);
        }
        log::debug!(
            "Engine: {} Layer in Slot '{}' bei Index {} eingefügt",
            ids.len(),
            slot.as_str(),
            at
        );
    }

    /// Entfernt einen Layer; `true` falls vorhanden.
    pub fn remove_layer(&mut self, id: &str) -> bool {
        self.stack.remove(id);
        self.layers.shift_remove(id).is_some()
    }

    /// Simuliert ein Style-Reload: alle Layer und Feature-States verschwinden.
    ///
    /// Listener bleiben wie bei einer echten Engine an der Karte registriert.
    pub fn reload_style(&mut self) {
        self.layers.clear();
        self.stack.clear();
        self.feature_states.clear();
        log::debug!("Engine: Style verworfen");
    }

    /// Markiert den Style als (nicht) geladen.
    pub fn set_style_loaded(&mut self, loaded: bool) {
        self.style_loaded = loaded;
    }

    /// Engine-Layer-IDs von unten nach oben.
    pub fn render_order(&self) -> Vec<String> {
        self.stack.ids().map(str::to_string).collect()
    }

    /// Alle aktiven Listener.
    pub fn listeners(&self) -> impl Iterator<Item = (&ListenerId, &ListenerRecord)> {
        self.listeners.iter()
    }

    /// Anzahl aktiver Listener.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Ob ein Listener für Art und Layer registriert ist.
    pub fn has_listener(&self, kind: MapEventKind, layer_id: Option<&str>) -> bool {
        self.listeners
            .values()
            .any(|l| l.kind == kind && l.layer_id.as_deref() == layer_id)
    }

    /// Anzahl der Features mit mindestens einem State-Key.
    pub fn feature_state_count(&self) -> usize {
        self.feature_states.values().filter(|s| !s.is_empty()).count()
    }

    fn validate(&self, target: &FeatureTarget) -> Result<(), EngineError> {
        if !self.style_loaded {
            return Err(EngineError::StyleNotLoaded);
        }
        let mut known = false;
        let mut vector = false;
        for layer in self.layers.values() {
            if layer.source.as_deref() == Some(target.source.as_str()) {
                known = true;
                vector |= layer.source_layer.is_some();
            }
        }
        if !known {
            return Err(EngineError::UnknownSource(target.source.clone()));
        }
        if vector && target.source_layer.is_none() {
            return Err(EngineError::MissingSourceLayer(target.source.clone()));
        }
        Ok(())
    }
}

impl MapEngine for InMemoryMapEngine {
    fn style_layers(&self) -> Vec<StyleLayer> {
        self.stack
            .ids()
            .filter_map(|id| self.layers.get(id).cloned())
            .collect()
    }

    fn add_listener(&mut self, kind: MapEventKind, layer_id: Option<&str>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.insert(
            id,
            ListenerRecord {
                kind,
                layer_id: layer_id.map(str::to_string),
            },
        );
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn set_feature_state(
        &mut self,
        target: &FeatureTarget,
        key: &str,
        value: bool,
    ) -> Result<(), EngineError> {
        self.validate(target)?;
        self.feature_states
            .entry(target.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove_feature_state(
        &mut self,
        target: &FeatureTarget,
        key: Option<&str>,
    ) -> Result<(), EngineError> {
        self.validate(target)?;
        match key {
            Some(key) => {
                if let Some(state) = self.feature_states.get_mut(target) {
                    state.remove(key);
                    if state.is_empty() {
                        self.feature_states.remove(target);
                    }
                }
            }
            None => {
                self.feature_states.remove(target);
            }
        }
        Ok(())
    }

    fn feature_state(&self, target: &FeatureTarget, key: &str) -> Option<bool> {
        self.feature_states.get(target)?.get(key).copied()
    }
}
