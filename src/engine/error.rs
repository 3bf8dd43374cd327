//! Fehler der Render-Engine-Schnittstelle.

use thiserror::Error;

/// Ablehnung einer Operation durch die Render-Engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Die angegebene Source existiert im aktuellen Style nicht.
    #[error("Source '{0}' existiert im aktuellen Style nicht")]
    UnknownSource(String),
    /// Vektor-Source ohne Source-Layer angesprochen.
    #[error("Source '{0}' ist eine Vektor-Source, sourceLayer fehlt")]
    MissingSourceLayer(String),
    /// Der Style ist noch nicht geladen.
    #[error("Style ist noch nicht geladen")]
    StyleNotLoaded,
}
