//! Feature-Interaktions-State-Manager.
//!
//! Zentrale Zustandsmaschine für Hover/Selektion über dynamisch registrierte
//! Layer. Wird einmal in der Composition-Root erzeugt und per Referenz an
//! alle Konsumenten (Panels, Export, Suche) weitergereicht.
//!
//! Aufgeteilt nach Bereich:
//! - `hover` — Einzel-/Batch-Hover, Mouse-Leave, Hover-Timer
//! - `selection` — Batch-Klick, Schließen, Selektion aufheben
//! - `resolution` — Layer-Auflösung mit Retry, Style-Reload, Engine-Listener
//! - `mirror` — Spiegelung in den Feature-State-Store der Engine

mod hover;
mod mirror;
mod resolution;
mod selection;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;

use super::retry::{LayerResolution, ResolutionPhase, RetryPolicy};
use super::scheduler::{Clock, TimerId, TimerQueue};
use super::{
    CleanupReason, EventBus, FeatureSnapshot, FeatureState, FeatureStore, InteractionEvent,
    SubscriptionId,
};
use crate::core::{composite_key, feature_id, LayerConfig, MapFeature};
use crate::engine::{ListenerId, MapEngine, MapEvent, MapEventKind};
use crate::shared::InteractionOptions;

/// Über die Timer-Queue geplante Arbeit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Auflösungsversuch (`retry` = 0 für den ersten Versuch)
    Resolve {
        layer_id: String,
        generation: u64,
        retry: u32,
    },
    /// Periodischer Staleness-Sweep
    StalenessSweep,
    /// Hover-Ablauf eines Features
    HoverExpiry { key: String },
}

/// Registrierter Layer mit seinen aktuell getrackten Features.
#[derive(Debug, Clone)]
pub struct ActiveLayer {
    /// Layer-Konfiguration
    pub config: Arc<LayerConfig>,
    /// Feature-ID → Zustand (mit berechnetem `is_selected`)
    pub features: IndexMap<String, FeatureState>,
}

/// Feature-Interaktions-State-Manager.
pub struct FeatureStateManager<E: MapEngine> {
    engine: E,
    clock: Box<dyn Clock>,
    options: InteractionOptions,
    retry_policy: RetryPolicy,
    layers: IndexMap<String, Arc<LayerConfig>>,
    resolutions: HashMap<String, LayerResolution>,
    retry_attempts: HashMap<String, u32>,
    store: FeatureStore,
    hover_timers: HashMap<String, TimerId>,
    timers: TimerQueue<ScheduledTask>,
    sweep_timer: Option<TimerId>,
    map_listeners: Vec<ListenerId>,
    style_changing: bool,
    next_generation: u64,
    events: EventBus,
    debug: bool,
    disposed: bool,
}

impl<E: MapEngine> FeatureStateManager<E> {
    /// Erstellt den Manager, abonniert die Style-Lifecycle-Events der Engine
    /// und plant den ersten Staleness-Sweep ein.
    pub fn new(mut engine: E, clock: Box<dyn Clock>, options: InteractionOptions) -> Self {
        let map_listeners = vec![
            engine.add_listener(MapEventKind::StyleLoading, None),
            engine.add_listener(MapEventKind::StyleData, None),
            engine.add_listener(MapEventKind::MouseLeave, None),
        ];
        let mut manager = Self {
            engine,
            clock,
            retry_policy: RetryPolicy::from_options(&options.retry),
            debug: options.debug,
            events: EventBus::new(options.event_history),
            options,
            layers: IndexMap::new(),
            resolutions: HashMap::new(),
            retry_attempts: HashMap::new(),
            store: FeatureStore::new(),
            hover_timers: HashMap::new(),
            timers: TimerQueue::new(),
            sweep_timer: None,
            map_listeners,
            style_changing: false,
            next_generation: 0,
            disposed: false,
        };
        manager.schedule_sweep();
        manager
    }

    // ── Registrierung ───────────────────────────────────────────────

    /// Registriert einen Layer für Interaktion.
    ///
    /// Idempotent: eine bereits registrierte ID wird nur geloggt. Die
    /// Auflösung auf Engine-Layer läuft asynchron über die Timer-Queue,
    /// `layer-registered` wird sofort veröffentlicht.
    pub fn register_layer(&mut self, config: LayerConfig) {
        if self.disposed {
            log::warn!("register_layer('{}') nach dispose ignoriert", config.id);
            return;
        }
        if self.layers.contains_key(&config.id) {
            log::debug!("Layer '{}' ist bereits registriert", config.id);
            return;
        }
        let layer_id = config.id.clone();
        self.layers.insert(layer_id.clone(), Arc::new(config.clone()));
        self.resolutions
            .insert(layer_id.clone(), LayerResolution::default());
        self.start_resolution(&layer_id);
        log::info!(
            "Layer '{}' ({}) registriert",
            layer_id,
            config.layer_type
        );
        self.emit(InteractionEvent::LayerRegistered { layer_id, config });
    }

    /// Meldet einen Layer ab und entfernt alle seine Feature-States.
    ///
    /// Ausstehende Auflösungsversuche brechen beim nächsten Tick selbst ab.
    pub fn unregister_layer(&mut self, layer_id: &str) {
        if !self.layers.contains_key(layer_id) {
            return;
        }
        let keys = self.store.keys_of_layer(layer_id);
        for key in &keys {
            self.cancel_hover_timer(key);
            self.clear_visual_state(key);
            self.store.remove(key);
        }
        if let Some(resolution) = self.resolutions.remove(layer_id) {
            for listener in resolution.listeners {
                self.engine.remove_listener(listener);
            }
        }
        self.retry_attempts.remove(layer_id);
        self.layers.shift_remove(layer_id);
        log::info!(
            "Layer '{}' abgemeldet, {} Feature-States entfernt",
            layer_id,
            keys.len()
        );
        self.emit(InteractionEvent::LayerUnregistered {
            layer_id: layer_id.to_string(),
            removed_features: keys.len(),
        });
    }

    // ── Host-Schnittstelle ──────────────────────────────────────────

    /// Führt alle zum aktuellen Zeitpunkt fälligen Timer aus.
    ///
    /// Gibt die Anzahl ausgeführter Tasks zurück.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        while let Some((timer, task)) = self.timers.pop_due(now) {
            ran += 1;
            match task {
                ScheduledTask::Resolve {
                    layer_id,
                    generation,
                    retry,
                } => self.run_resolution(&layer_id, generation, retry),
                ScheduledTask::StalenessSweep => {
                    self.sweep_timer = None;
                    self.sweep_stale();
                    self.schedule_sweep();
                }
                ScheduledTask::HoverExpiry { key } => self.expire_hover(&key, timer),
            }
        }
        ran
    }

    /// Verarbeitet ein von der Engine gemeldetes Ereignis.
    pub fn handle_map_event(&mut self, event: &MapEvent) {
        if self.disposed {
            return;
        }
        match (event.kind, event.layer_id.as_deref()) {
            (MapEventKind::StyleLoading, None) => self.on_style_loading(),
            (MapEventKind::StyleData, None) => self.on_style_data(),
            (MapEventKind::MouseLeave, None) => self.handle_map_mouse_leave(),
            (MapEventKind::MouseLeave, Some(engine_layer)) => {
                self.on_engine_layer_leave(engine_layer)
            }
            (kind, layer) => {
                log::debug!("Ignoriere Engine-Ereignis {:?} für {:?}", kind, layer);
            }
        }
    }

    // ── Staleness-Sweep ─────────────────────────────────────────────

    /// Entfernt alle Einträge, die weder gehovert noch selektiert und älter
    /// als die Staleness-Schwelle sind. Gibt die Anzahl entfernter Einträge zurück.
    pub fn sweep_stale(&mut self) -> usize {
        let now = self.clock.now();
        let stale = self.store.stale_keys(now, self.options.stale_after());
        for key in &stale {
            self.cancel_hover_timer(key);
            self.store.remove(key);
        }
        if !stale.is_empty() {
            log::debug!("Staleness-Sweep: {} Feature-States entfernt", stale.len());
            self.emit(InteractionEvent::Cleanup {
                reason: CleanupReason::StaleSweep,
                removed: stale.clone(),
            });
        }
        stale.len()
    }

    fn schedule_sweep(&mut self) {
        let now = self.clock.now();
        let id = self.timers.schedule(
            now,
            self.options.sweep_interval(),
            ScheduledTask::StalenessSweep,
        );
        self.sweep_timer = Some(id);
    }

    // ── Teardown ────────────────────────────────────────────────────

    /// Baut den Manager ab: Sweep und Hover-Timer stoppen, Engine-Listener
    /// entfernen, alle Tabellen leeren. Weitere Aufrufe sind No-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if let Some(sweep) = self.sweep_timer.take() {
            self.timers.cancel(sweep);
        }
        for (_, timer) in self.hover_timers.drain() {
            self.timers.cancel(timer);
        }
        self.timers.clear();

        for listener in self.map_listeners.drain(..) {
            self.engine.remove_listener(listener);
        }
        for (_, resolution) in self.resolutions.drain() {
            for listener in resolution.listeners {
                self.engine.remove_listener(listener);
            }
        }

        let removed: Vec<String> = self.store.keys().cloned().collect();
        self.events.publish(InteractionEvent::Cleanup {
            reason: CleanupReason::Dispose,
            removed,
        });

        self.store.clear();
        self.layers.clear();
        self.retry_attempts.clear();
        self.style_changing = false;
        self.events.clear_subscribers();
        log::info!("Feature-State-Manager abgebaut");
    }

    /// Ob `dispose()` bereits aufgerufen wurde.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // ── Abfragen ────────────────────────────────────────────────────

    /// Alle getrackten Features eines Layers (Feature-ID → Zustand).
    pub fn get_layer_features(&self, layer_id: &str) -> IndexMap<String, FeatureState> {
        self.store
            .layer_entries(layer_id)
            .map(|(key, state)| {
                let mut view = state.clone();
                view.is_selected = self.store.is_selected(key);
                (state.feature_id.clone(), view)
            })
            .collect()
    }

    /// Alle registrierten Layer mit Konfiguration und Features.
    pub fn get_active_layers(&self) -> IndexMap<String, ActiveLayer> {
        self.layers
            .iter()
            .map(|(id, config)| {
                (
                    id.clone(),
                    ActiveLayer {
                        config: Arc::clone(config),
                        features: self.get_layer_features(id),
                    },
                )
            })
            .collect()
    }

    /// Konfiguration eines registrierten Layers.
    pub fn get_layer_config(&self, layer_id: &str) -> Option<Arc<LayerConfig>> {
        self.layers.get(layer_id).cloned()
    }

    /// Ob der Layer registriert und auf Engine-Layer aufgelöst ist.
    pub fn is_layer_interactive(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
            && self
                .resolutions
                .get(layer_id)
                .is_some_and(LayerResolution::is_resolved)
    }

    /// Ob ein Layer registriert ist.
    pub fn is_registered(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// IDs aller registrierten Layer in Registrierungsreihenfolge.
    pub fn registered_layer_ids(&self) -> Vec<String> {
        self.layers.keys().cloned().collect()
    }

    /// Zuletzt aufgelöste Engine-Layer-IDs eines Layers.
    pub fn resolved_layer_ids(&self, layer_id: &str) -> &[String] {
        self.resolutions
            .get(layer_id)
            .map(|r| r.engine_layers.as_slice())
            .unwrap_or(&[])
    }

    /// Phase der Layer-Auflösung.
    pub fn resolution_phase(&self, layer_id: &str) -> Option<ResolutionPhase> {
        self.resolutions.get(layer_id).map(|r| r.phase)
    }

    /// Bisherige Retries eines Layers (nur während eines laufenden Retry-Protokolls).
    pub fn retry_attempts(&self, layer_id: &str) -> Option<u32> {
        self.retry_attempts.get(layer_id).copied()
    }

    /// Ob für den Layer ein Auflösungs-Timer aussteht.
    pub fn has_pending_resolution(&self, layer_id: &str) -> bool {
        self.timers.pending().any(|task| {
            matches!(task, ScheduledTask::Resolve { layer_id: id, .. } if id == layer_id)
        })
    }

    /// Anzahl ausstehender Timer (Retry, Sweep, Hover).
    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Fälligkeit des nächsten ausstehenden Timers.
    pub fn next_timer_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Momentaufnahmen aller selektierten Features in Selektionsreihenfolge.
    pub fn selected_features(&self) -> Vec<FeatureSnapshot> {
        self.store
            .selected_keys()
            .iter()
            .filter_map(|k| self.store.snapshot(k))
            .collect()
    }

    /// Momentaufnahmen aller gehoverten Features.
    pub fn hovered_features(&self) -> Vec<FeatureSnapshot> {
        self.store
            .hovered_keys()
            .iter()
            .filter_map(|k| self.store.snapshot(k))
            .collect()
    }

    /// Read-only Zugriff auf die Feature-Tabelle.
    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    /// Logische Feature-ID eines Roh-Features.
    pub fn get_feature_id(&self, feature: &MapFeature, layer_id: &str) -> String {
        feature_id(feature, layer_id)
    }

    // ── Events & Diagnose ───────────────────────────────────────────

    /// Abonniert alle Events.
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&InteractionEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    /// Zugriff auf den Event-Bus (gefilterte Abos, Verlauf).
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutabler Zugriff auf den Event-Bus.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Schaltet ausführliches Logging um (kein Einfluss auf das Verhalten).
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        log::info!("Debug-Logging {}", if debug { "aktiviert" } else { "deaktiviert" });
    }

    /// Ob ausführliches Logging aktiv ist.
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Render-Engine (lesend).
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Render-Engine (schreibend, z.B. für Layer-Änderungen des Hosts).
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Aktuelle Zeit der Manager-Uhr.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    // ── Interne Helfer ──────────────────────────────────────────────

    fn emit(&mut self, event: InteractionEvent) {
        if self.debug {
            log::debug!("Event '{}'", event.name());
        }
        self.events.publish(event);
    }

    /// Prüft eine Eingabe (Layer-ID gesetzt und registriert) und liefert ID + Key.
    fn identify(&self, feature: &MapFeature, layer_id: &str) -> Option<(String, String)> {
        if self.disposed || layer_id.is_empty() {
            return None;
        }
        if !self.layers.contains_key(layer_id) {
            if self.debug {
                log::debug!("Feature auf nicht registriertem Layer '{}' ignoriert", layer_id);
            }
            return None;
        }
        let fid = feature_id(feature, layer_id);
        let key = composite_key(layer_id, &fid);
        Some((fid, key))
    }
}
