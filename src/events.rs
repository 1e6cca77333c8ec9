//! Named fire-and-forget notifications.

use std::{collections::HashMap, hash::Hash};

/// Events the experience emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExperienceEvent {
    /// The scene has been populated and the frame loop may start.
    Ready,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut()>;

/// Listeners registered by event name, called in registration order.
pub struct EventBus<K> {
    listeners: HashMap<K, Vec<(ListenerId, Listener)>>,
    next_id: u64,
}

impl<K: Eq + Hash> EventBus<K> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn listen(&mut self, event: K, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners
            .entry(event)
            .or_default()
            .push((id, Box::new(listener)));
        id
    }

    /// Calls every listener of `event` and returns how many were called.
    pub fn dispatch(&mut self, event: &K) -> usize {
        match self.listeners.get_mut(event) {
            Some(listeners) => {
                listeners.iter_mut().for_each(|(_, listener)| listener());
                listeners.len()
            }
            None => 0,
        }
    }

    /// Removes one listener, or every listener of `event` when `listener` is `None`.
    pub fn remove(&mut self, event: &K, listener: Option<ListenerId>) {
        match listener {
            Some(id) => {
                if let Some(listeners) = self.listeners.get_mut(event) {
                    listeners.retain(|(other, _)| *other != id);
                    if listeners.is_empty() {
                        self.listeners.remove(event);
                    }
                }
            }
            None => {
                self.listeners.remove(event);
            }
        }
    }

    pub fn listener_count(&self, event: &K) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl<K: Eq + Hash> Default for EventBus<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn dispatch_reaches_every_listener_of_the_event() {
        let calls = Rc::new(Cell::new(0));
        let mut bus = EventBus::new();
        for _ in 0..2 {
            let calls = calls.clone();
            bus.listen(ExperienceEvent::Ready, move || calls.set(calls.get() + 1));
        }

        assert_eq!(bus.dispatch(&ExperienceEvent::Ready), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn remove_one_or_all() {
        let mut bus = EventBus::new();
        let first = bus.listen(ExperienceEvent::Ready, || {});
        bus.listen(ExperienceEvent::Ready, || {});

        bus.remove(&ExperienceEvent::Ready, Some(first));
        assert_eq!(bus.listener_count(&ExperienceEvent::Ready), 1);

        bus.remove(&ExperienceEvent::Ready, None);
        assert_eq!(bus.listener_count(&ExperienceEvent::Ready), 0);
        assert_eq!(bus.dispatch(&ExperienceEvent::Ready), 0);
    }
}
