//! Layer-Auflösung mit Retry/Backoff und Neu-Auflösung nach Style-Reload.

use std::time::Duration;

use super::{FeatureStateManager, ScheduledTask};
use crate::app::resolver::resolve_engine_layers;
use crate::app::retry::ResolutionPhase;
use crate::engine::{MapEngine, MapEventKind};

impl<E: MapEngine> FeatureStateManager<E> {
    /// Startet das Auflösungsprotokoll eines Layers neu.
    ///
    /// Ein ausstehender Timer wird storniert und die Generation erhöht,
    /// sodass pro Layer immer nur eine Versuchskette läuft.
    pub(super) fn start_resolution(&mut self, layer_id: &str) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let now = self.clock.now();
        let Some(resolution) = self.resolutions.get_mut(layer_id) else {
            return;
        };
        if let Some(pending) = resolution.pending.take() {
            self.timers.cancel(pending);
        }
        resolution.generation = generation;
        resolution.phase = ResolutionPhase::Resolving;
        self.retry_attempts.remove(layer_id);
        let timer = self.timers.schedule(
            now,
            Duration::ZERO,
            ScheduledTask::Resolve {
                layer_id: layer_id.to_string(),
                generation,
                retry: 0,
            },
        );
        resolution.pending = Some(timer);
    }

    /// Ein Auflösungsversuch (aus der Timer-Queue).
    pub(super) fn run_resolution(&mut self, layer_id: &str, generation: u64, retry: u32) {
        let Some(config) = self.layers.get(layer_id).cloned() else {
            log::debug!("Auflösung für abgemeldeten Layer '{}' abgebrochen", layer_id);
            return;
        };
        match self.resolutions.get_mut(layer_id) {
            Some(resolution) if resolution.generation == generation => {
                resolution.pending = None;
            }
            _ => {
                log::debug!("Veralteter Auflösungs-Timer für '{}' verworfen", layer_id);
                return;
            }
        }

        let style_layers = self.engine.style_layers();
        let found = resolve_engine_layers(&config, &style_layers);
        if !found.is_empty() {
            self.retry_attempts.remove(layer_id);
            self.wire_layer(layer_id, found);
            self.reapply_visual_state(layer_id);
            return;
        }

        let next = retry.saturating_add(1);
        let delay = if next > retry {
            self.retry_policy.delay_for(next)
        } else {
            None
        };
        match delay {
            Some(delay) => {
                self.retry_attempts.insert(layer_id.to_string(), next);
                let now = self.clock.now();
                let timer = self.timers.schedule(
                    now,
                    delay,
                    ScheduledTask::Resolve {
                        layer_id: layer_id.to_string(),
                        generation,
                        retry: next,
                    },
                );
                if let Some(resolution) = self.resolutions.get_mut(layer_id) {
                    resolution.phase = ResolutionPhase::Retrying(next);
                    resolution.pending = Some(timer);
                }
                if self.debug {
                    log::debug!(
                        "Layer '{}' noch nicht in der Engine, Retry {} in {:?}",
                        layer_id,
                        next,
                        delay
                    );
                }
            }
            None => {
                self.retry_attempts.remove(layer_id);
                if let Some(resolution) = self.resolutions.get_mut(layer_id) {
                    resolution.phase = ResolutionPhase::GaveUp;
                    resolution.engine_layers.clear();
                    for listener in resolution.listeners.drain(..) {
                        self.engine.remove_listener(listener);
                    }
                }
                log::error!(
                    "Layer '{}' nach {} Retries nicht auflösbar, gebe auf",
                    layer_id,
                    retry
                );
            }
        }
    }

    /// Übernimmt die aufgelösten Engine-Layer und verdrahtet deren Listener neu.
    fn wire_layer(&mut self, layer_id: &str, engine_layers: Vec<String>) {
        let Some(resolution) = self.resolutions.get_mut(layer_id) else {
            return;
        };
        for listener in resolution.listeners.drain(..) {
            self.engine.remove_listener(listener);
        }
        resolution.listeners = engine_layers
            .iter()
            .map(|id| self.engine.add_listener(MapEventKind::MouseLeave, Some(id)))
            .collect();
        log::info!(
            "Layer '{}' aufgelöst auf {} Engine-Layer: {:?}",
            layer_id,
            engine_layers.len(),
            engine_layers
        );
        resolution.engine_layers = engine_layers;
        resolution.phase = ResolutionPhase::Succeeded;
    }

    /// Style wird gleich neu geladen.
    pub(super) fn on_style_loading(&mut self) {
        self.style_changing = true;
        // Bisherige Auflösungen gelten bis zum nächsten style-data nicht mehr
        for resolution in self.resolutions.values_mut() {
            if resolution.phase == ResolutionPhase::Succeeded {
                resolution.phase = ResolutionPhase::Idle;
            }
        }
        if self.debug {
            log::debug!("Style-Wechsel angekündigt");
        }
    }

    /// Style-Daten haben sich gesetzt: nach einem Style-Wechsel alle Layer neu auflösen.
    pub(super) fn on_style_data(&mut self) {
        if !self.style_changing {
            return;
        }
        self.style_changing = false;
        let layer_ids: Vec<String> = self.layers.keys().cloned().collect();
        log::info!(
            "Style neu geladen, löse {} Layer erneut auf",
            layer_ids.len()
        );
        for layer_id in layer_ids {
            self.start_resolution(&layer_id);
        }
    }
}
