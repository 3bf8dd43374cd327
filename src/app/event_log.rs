//! Begrenzter Verlauf der zuletzt veröffentlichten Events.

use super::InteractionEvent;

/// Speichert veröffentlichte Events in Reihenfolge.
pub struct EventLog {
    entries: Vec<InteractionEvent>,
    max_entries: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(crate::shared::options::EVENT_HISTORY)
    }
}

impl EventLog {
    /// Erstellt ein leeres Log mit maximaler Größe (mindestens 2).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: max_entries.max(2),
        }
    }

    /// Fügt ein Event hinzu.
    /// Begrenzt auf `max_entries`, die ältere Hälfte wird dann verworfen.
    pub fn record(&mut self, event: InteractionEvent) {
        if self.entries.len() >= self.max_entries {
            self.entries.drain(..self.max_entries / 2);
        }
        self.entries.push(event);
    }

    /// Gibt die Anzahl der geloggten Events zurück.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn keine Events vorhanden sind.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Liefert eine read-only Sicht auf alle Einträge.
    pub fn entries(&self) -> &[InteractionEvent] {
        &self.entries
    }

    /// Namen aller Einträge (praktisch für Assertions und Debug-Ausgaben).
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(InteractionEvent::name).collect()
    }

    /// Leert das Log.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave() -> InteractionEvent {
        InteractionEvent::MapMouseLeave {
            cleared: Vec::new(),
        }
    }

    #[test]
    fn test_drops_older_half_when_full() {
        let mut log = EventLog::new(4);
        for _ in 0..4 {
            log.record(leave());
        }
        assert_eq!(log.len(), 4);
        log.record(leave());
        assert_eq!(log.len(), 3);
    }
}
