//! Zentrale Laufzeit-Konfiguration des Interaktions-Kerns.
//!
//! `InteractionOptions` enthält alle änderbaren Werte und wird als TOML
//! neben der Binary gespeichert. Die `const`-Werte bleiben als Fallback/Default erhalten.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Staleness-Sweep ─────────────────────────────────────────────────

/// Intervall des Staleness-Sweeps in Millisekunden.
pub const SWEEP_INTERVAL_MS: u64 = 60_000;
/// Alter, ab dem unbeteiligte Feature-States entfernt werden (Millisekunden).
pub const STALE_AFTER_MS: u64 = 5 * 60_000;

// ── Layer-Auflösung ─────────────────────────────────────────────────

/// Anzahl kurzer Retries mit linearem Backoff.
pub const RETRY_SHORT_ATTEMPTS: u32 = 3;
/// Schrittweite des linearen Backoffs (Versuch × Schritt).
pub const RETRY_SHORT_STEP_MS: u64 = 100;
/// Anzahl langfristiger Retries.
pub const RETRY_LONG_ATTEMPTS: u32 = 5;
/// Fester Abstand der langfristigen Retries.
pub const RETRY_LONG_DELAY_MS: u64 = 2_000;

// ── Diagnose ────────────────────────────────────────────────────────

/// Anzahl gemerkter Events im Event-Verlauf.
pub const EVENT_HISTORY: usize = 1_000;

/// Backoff-Parameter für die Auflösung logischer Layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryOptions {
    /// Kurze Retries (Verzögerung = Versuch × `short_step_ms`)
    pub short_attempts: u32,
    /// Schrittweite der kurzen Retries
    pub short_step_ms: u64,
    /// Langfristige Retries mit fester Verzögerung
    pub long_attempts: u32,
    /// Feste Verzögerung der langfristigen Retries
    pub long_delay_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            short_attempts: RETRY_SHORT_ATTEMPTS,
            short_step_ms: RETRY_SHORT_STEP_MS,
            long_attempts: RETRY_LONG_ATTEMPTS,
            long_delay_ms: RETRY_LONG_DELAY_MS,
        }
    }
}

/// Alle zur Laufzeit änderbaren Optionen.
/// Wird als `webgis_map_interaction.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractionOptions {
    /// Intervall des Staleness-Sweeps
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Staleness-Schwelle
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: u64,
    /// Hover-Ablauf; fehlt = Hover bleibt bis zum nächsten Hover/Leave/Klick
    #[serde(default)]
    pub hover_timeout_ms: Option<u64>,
    /// Ausführliches Logging aller Zustandsübergänge
    #[serde(default)]
    pub debug: bool,
    /// Größe des Event-Verlaufs
    #[serde(default = "default_event_history")]
    pub event_history: usize,
    /// Backoff der Layer-Auflösung (als letzte Tabelle im TOML)
    #[serde(default)]
    pub retry: RetryOptions,
}

impl Default for InteractionOptions {
    fn default() -> Self {
        Self {
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            stale_after_ms: STALE_AFTER_MS,
            hover_timeout_ms: None,
            debug: false,
            event_history: EVENT_HISTORY,
            retry: RetryOptions::default(),
        }
    }
}

/// Serde-Default für `sweep_interval_ms` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_sweep_interval_ms() -> u64 {
    SWEEP_INTERVAL_MS
}

fn default_stale_after_ms() -> u64 {
    STALE_AFTER_MS
}

fn default_event_history() -> usize {
    EVENT_HISTORY
}

impl InteractionOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("webgis_map_interaction"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("webgis_map_interaction.toml")
    }

    /// Intervall des Staleness-Sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }

    /// Staleness-Schwelle.
    pub fn stale_after(&self) -> Duration {
        Duration::from_millis(self.stale_after_ms)
    }

    /// Hover-Ablauf (falls aktiviert).
    pub fn hover_timeout(&self) -> Option<Duration> {
        self.hover_timeout_ms.map(Duration::from_millis)
    }
}
