//! Typisierter Publish/Subscribe-Kanal für [`InteractionEvent`]s.

use super::{EventLog, InteractionEvent};

/// Handle eines Abonnements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&InteractionEvent)>;

struct Subscriber {
    id: SubscriptionId,
    /// `None` = alle Events, sonst nur Events mit diesem Namen
    filter: Option<&'static str>,
    handler: Handler,
}

/// Event-Bus mit begrenztem Verlauf.
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
    history: EventLog,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::shared::options::EVENT_HISTORY)
    }
}

impl EventBus {
    /// Erstellt einen Bus mit Verlaufsgröße `history`.
    pub fn new(history: usize) -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 1,
            history: EventLog::new(history),
        }
    }

    /// Abonniert alle Events.
    pub fn subscribe(&mut self, handler: impl FnMut(&InteractionEvent) + 'static) -> SubscriptionId {
        self.add(None, Box::new(handler))
    }

    /// Abonniert nur Events mit dem Namen `name` (z.B. `"feature-click"`).
    pub fn subscribe_to(
        &mut self,
        name: &'static str,
        handler: impl FnMut(&InteractionEvent) + 'static,
    ) -> SubscriptionId {
        self.add(Some(name), Box::new(handler))
    }

    fn add(&mut self, filter: Option<&'static str>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            filter,
            handler,
        });
        id
    }

    /// Beendet ein Abonnement; `true` falls es existierte.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        before != self.subscribers.len()
    }

    /// Veröffentlicht ein Event an alle passenden Abonnenten.
    pub fn publish(&mut self, event: InteractionEvent) {
        let name = event.name();
        for subscriber in &mut self.subscribers {
            if subscriber.filter.is_none_or(|f| f == name) {
                (subscriber.handler)(&event);
            }
        }
        self.history.record(event);
    }

    /// Verlauf der veröffentlichten Events.
    pub fn history(&self) -> &EventLog {
        &self.history
    }

    /// Anzahl der Abonnenten.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Entfernt alle Abonnenten.
    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn leave() -> InteractionEvent {
        InteractionEvent::MapMouseLeave {
            cleared: Vec::new(),
        }
    }

    fn cleared() -> InteractionEvent {
        InteractionEvent::SelectionsCleared {
            cleared_features: Vec::new(),
        }
    }

    #[test]
    fn test_filtered_and_unfiltered_subscribers() {
        let mut bus = EventBus::new(10);
        let all = Rc::new(RefCell::new(Vec::new()));
        let only_leave = Rc::new(RefCell::new(0));

        let sink = all.clone();
        bus.subscribe(move |e| sink.borrow_mut().push(e.name()));
        let counter = only_leave.clone();
        bus.subscribe_to("map-mouse-leave", move |_| *counter.borrow_mut() += 1);

        bus.publish(leave());
        bus.publish(cleared());

        assert_eq!(*all.borrow(), vec!["map-mouse-leave", "selections-cleared"]);
        assert_eq!(*only_leave.borrow(), 1);
        assert_eq!(bus.history().len(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new(10);
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = bus.subscribe(move |_| *c.borrow_mut() += 1);
        bus.publish(leave());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(leave());
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
