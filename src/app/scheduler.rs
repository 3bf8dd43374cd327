//! Zeitquelle und Timer-Queue für Retry, Staleness-Sweep und Hover-Timer.
//!
//! Alles läuft single-threaded: Timer werden nur in `pop_due()` ausgelöst,
//! das der Host aus seiner Event-Loop heraus aufruft. Tests injizieren eine
//! [`ManualClock`] und spulen die Zeit explizit vor.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotone Zeitquelle (Zeit seit einem beliebigen Ursprung).
pub trait Clock {
    /// Aktuelle Zeit.
    fn now(&self) -> Duration;
}

/// Systemuhr, Ursprung = Erzeugungszeitpunkt.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Erstellt eine Systemuhr ab jetzt.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manuell gesteuerte Uhr; Klone teilen sich denselben Zeitwert.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Erstellt eine Uhr bei t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Setzt die aktuelle Zeit.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Spult die Zeit vor.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Handle eines geplanten Timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Deterministische Timer-Queue (Fälligkeit, dann Einplanungsreihenfolge).
#[derive(Debug)]
pub struct TimerQueue<T> {
    queue: BTreeMap<(Duration, u64), T>,
    due_by_id: HashMap<u64, Duration>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Erstellt eine leere Queue.
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            due_by_id: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Plant `task` für `now + delay` ein.
    pub fn schedule(&mut self, now: Duration, delay: Duration, task: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let due = now.saturating_add(delay);
        self.queue.insert((due, seq), task);
        self.due_by_id.insert(seq, due);
        TimerId(seq)
    }

    /// Storniert einen Timer; `true` falls er noch ausstand.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.due_by_id.remove(&id.0) {
            Some(due) => self.queue.remove(&(due, id.0)).is_some(),
            None => false,
        }
    }

    /// Entnimmt den nächsten fälligen Timer (Fälligkeit <= `now`).
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, T)> {
        let (&(due, seq), _) = self.queue.first_key_value()?;
        if due > now {
            return None;
        }
        let task = self.queue.remove(&(due, seq))?;
        self.due_by_id.remove(&seq);
        Some((TimerId(seq), task))
    }

    /// Ob ein Timer noch aussteht.
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.due_by_id.contains_key(&id.0)
    }

    /// Fälligkeit des nächsten Timers.
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|&(due, _)| due)
    }

    /// Ausstehende Timer in Fälligkeitsreihenfolge.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.queue.values()
    }

    /// Anzahl ausstehender Timer.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Ob keine Timer ausstehen.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Storniert alle Timer.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.due_by_id.clear();
    }
}
