//! Interaction Controller: Composition-Root für Manager, Engine und Uhr.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::scenario::{Scenario, ScenarioStep, StyleLayerGroup};
use super::scheduler::{Clock, ManualClock};
use super::{FeatureStateManager, InteractionEvent};
use crate::engine::{InMemoryMapEngine, MapEvent, MapEventKind};
use crate::shared::InteractionOptions;

/// Besitzt genau einen State-Manager samt In-Memory-Engine und steuerbarer Uhr.
///
/// Übersetzt Szenario-Schritte in Manager-Aufrufe und zeichnet alle
/// veröffentlichten Events auf.
pub struct InteractionController {
    manager: FeatureStateManager<InMemoryMapEngine>,
    clock: ManualClock,
    recorded: Rc<RefCell<Vec<InteractionEvent>>>,
}

impl InteractionController {
    /// Erstellt einen Controller mit leerer Engine.
    pub fn new(options: InteractionOptions) -> Self {
        let clock = ManualClock::new();
        let mut manager =
            FeatureStateManager::new(InMemoryMapEngine::new(), Box::new(clock.clone()), options);
        let recorded = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&recorded);
        manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        Self {
            manager,
            clock,
            recorded,
        }
    }

    /// Fügt Engine-Layer-Gruppen in den Style ein.
    pub fn load_style(&mut self, groups: &[StyleLayerGroup]) {
        for group in groups {
            self.manager
                .engine_mut()
                .add_layer_group(&group.layer_type, group.layers.clone());
        }
    }

    /// Führt einen Szenario-Schritt aus und arbeitet danach fällige Timer ab.
    pub fn handle_step(&mut self, step: ScenarioStep) {
        log::debug!("Szenario-Schritt: {:?}", step);
        match step {
            ScenarioStep::Register { config } => self.manager.register_layer(config),
            ScenarioStep::Unregister { layer_id } => self.manager.unregister_layer(&layer_id),
            ScenarioStep::AddStyleLayers { layer_type, layers } => {
                self.manager
                    .engine_mut()
                    .add_layer_group(&layer_type, layers);
            }
            ScenarioStep::Hover {
                layer_id,
                feature,
                lng_lat,
            } => self.manager.on_feature_hover(&feature, &layer_id, lng_lat),
            ScenarioStep::HoverBatch { hits, lng_lat } => {
                self.manager.handle_feature_hovers(&hits, lng_lat)
            }
            ScenarioStep::Leave { layer_id, feature } => {
                self.manager.on_feature_leave(&feature, &layer_id)
            }
            ScenarioStep::MouseLeave => self.manager.handle_map_mouse_leave(),
            ScenarioStep::Click { hits } => self.manager.handle_feature_clicks(&hits),
            ScenarioStep::ClearSelections => {
                self.manager.clear_all_selections(false);
            }
            ScenarioStep::CloseSelected { feature_id } => {
                self.manager.close_selected_feature(&feature_id);
            }
            ScenarioStep::Advance { ms } => self.advance(Duration::from_millis(ms)),
            ScenarioStep::StyleReload { style } => self.reload_style(&style),
            ScenarioStep::Sweep => {
                self.manager.sweep_stale();
            }
        }
        self.manager.tick();
    }

    /// Führt ein komplettes Szenario aus und gibt die dabei entstandenen Events zurück.
    pub fn run(&mut self, scenario: Scenario) -> Vec<InteractionEvent> {
        log::info!(
            "Starte Szenario '{}' mit {} Schritten",
            scenario.name.as_deref().unwrap_or("unbenannt"),
            scenario.steps.len()
        );
        self.load_style(&scenario.style);
        for step in scenario.steps {
            self.handle_step(step);
        }
        self.take_events()
    }

    /// Spult die Uhr vor; fällige Timer laufen in ihrer Zeitreihenfolge.
    pub fn advance(&mut self, by: Duration) {
        let target = self.clock.now() + by;
        while let Some(due) = self.manager.next_timer_due() {
            if due > target {
                break;
            }
            self.clock.set(due.max(self.clock.now()));
            self.manager.tick();
        }
        self.clock.set(target);
        self.manager.tick();
    }

    /// Simuliert einen Style-Wechsel mit anschließend neuen Engine-Layern.
    fn reload_style(&mut self, style: &[StyleLayerGroup]) {
        self.manager.handle_map_event(&MapEvent::map(MapEventKind::StyleLoading));
        self.manager.engine_mut().reload_style();
        self.load_style(style);
        self.manager.handle_map_event(&MapEvent::map(MapEventKind::StyleData));
    }

    /// Entnimmt alle bisher aufgezeichneten Events.
    pub fn take_events(&mut self) -> Vec<InteractionEvent> {
        std::mem::take(&mut *self.recorded.borrow_mut())
    }

    /// Der verwaltete State-Manager.
    pub fn manager(&self) -> &FeatureStateManager<InMemoryMapEngine> {
        &self.manager
    }

    /// Der verwaltete State-Manager (schreibend).
    pub fn manager_mut(&mut self) -> &mut FeatureStateManager<InMemoryMapEngine> {
        &mut self.manager
    }

    /// Steuerbare Uhr des Managers.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionOptions::default())
    }
}
