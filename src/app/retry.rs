//! Zustandsmaschine der Layer-Auflösung mit Retry/Backoff.
//!
//! `Idle → Resolving → Retrying(n) → Succeeded | GaveUp`
//!
//! Ein angekündigter Style-Wechsel setzt `Succeeded` zurück auf `Idle`.
//!
//! Pro Layer steht höchstens ein Timer aus; jeder Timer trägt die
//! Registrierungs-Generation, damit Timer einer früheren Registrierung
//! nach Unregister/Re-Register wirkungslos verfallen.

use std::time::Duration;

use super::scheduler::TimerId;
use crate::engine::ListenerId;
use crate::shared::RetryOptions;

/// Phase der Auflösung eines logischen Layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPhase {
    /// Kein Versuch geplant (frisch registriert oder Style-Wechsel angekündigt)
    #[default]
    Idle,
    /// Erster Versuch geplant bzw. läuft
    Resolving,
    /// n-ter Retry geplant
    Retrying(u32),
    /// Engine-Layer gefunden
    Succeeded,
    /// Retry-Budget erschöpft
    GaveUp,
}

/// Backoff-Regel: erst linear, dann fester Abstand, dann Aufgabe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    short_attempts: u32,
    short_step: Duration,
    long_attempts: u32,
    long_delay: Duration,
}

impl RetryPolicy {
    /// Baut die Regel aus den Optionen.
    pub fn from_options(options: &RetryOptions) -> Self {
        Self {
            short_attempts: options.short_attempts,
            short_step: Duration::from_millis(options.short_step_ms),
            long_attempts: options.long_attempts,
            long_delay: Duration::from_millis(options.long_delay_ms),
        }
    }

    /// Verzögerung vor Retry Nummer `retry` (1-basiert); `None` = aufgeben.
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry == 0 {
            return Some(Duration::ZERO);
        }
        if retry <= self.short_attempts {
            return Some(self.short_step.checked_mul(retry).unwrap_or(Duration::MAX));
        }
        if retry <= self.max_retries() {
            return Some(self.long_delay);
        }
        None
    }

    /// Gesamtzahl der Retries nach dem ersten Versuch.
    pub fn max_retries(&self) -> u32 {
        self.short_attempts.saturating_add(self.long_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_options(&RetryOptions::default())
    }
}

/// Auflösungs-Buchhaltung eines registrierten Layers.
#[derive(Debug, Default)]
pub struct LayerResolution {
    /// Registrierungs-Generation (steigt bei Style-Reload und Re-Register)
    pub generation: u64,
    /// Aktuelle Phase
    pub phase: ResolutionPhase,
    /// Ausstehender Auflösungs-Timer
    pub pending: Option<TimerId>,
    /// Zuletzt aufgelöste Engine-Layer-IDs
    pub engine_layers: Vec<String>,
    /// Vom Manager registrierte Engine-Listener dieses Layers
    pub listeners: Vec<ListenerId>,
}

impl LayerResolution {
    /// Ob der Layer aktuell interaktiv verdrahtet ist.
    pub fn is_resolved(&self) -> bool {
        self.phase == ResolutionPhase::Succeeded && !self.engine_layers.is_empty()
    }
}
