//! Event and messaging system.
//!
//! This is a small typed, synchronous event bus.
//! - Physics: emits a `CollisionEvent` per confirmed contact each tick.
//! - Gameplay/diagnostics: subscribe with `on` and react inside the tick.
//!
//! Emitting with no subscribers is a no-op.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
};

type Handler<E> = Box<dyn FnMut(&E) + Send + Sync>;

/// Typed event bus.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    /// Registers a handler for events of type `E`. Handlers run in
    /// registration order.
    pub fn on<E, F>(&mut self, handler: F)
    where
        E: 'static,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        let list = self
            .handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<Handler<E>>::new()));
        if let Some(list) = list.downcast_mut::<Vec<Handler<E>>>() {
            list.push(Box::new(handler));
        }
    }

    /// Delivers an event to every handler of its type. Returns how many
    /// handlers saw it.
    pub fn emit<E: 'static>(&mut self, event: E) -> usize {
        match self
            .handlers
            .get_mut(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_mut::<Vec<Handler<E>>>())
        {
            Some(list) => {
                for handler in list.iter_mut() {
                    handler(&event);
                }
                list.len()
            }
            None => 0,
        }
    }

    pub fn handler_count<E: 'static>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .and_then(|boxed| boxed.downcast_ref::<Vec<Handler<E>>>())
            .map_or(0, Vec::len)
    }

    /// Drops every handler for `E`.
    pub fn clear<E: 'static>(&mut self) {
        self.handlers.remove(&TypeId::of::<E>());
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    #[test]
    fn handlers_receive_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::default();
        for tag in ["first", "second"] {
            let seen = seen.clone();
            bus.on(move |p: &Ping| seen.lock().unwrap().push((tag, p.0)));
        }
        assert_eq!(bus.emit(Ping(7)), 2);
        assert_eq!(*seen.lock().unwrap(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn emit_without_subscribers_is_fine() {
        let mut bus = EventBus::default();
        assert_eq!(bus.emit(Ping(1)), 0);
        assert_eq!(bus.handler_count::<Ping>(), 0);
    }

    #[test]
    fn event_types_are_isolated() {
        let mut bus = EventBus::default();
        bus.on(|_: &Ping| {});
        bus.on(|_: &String| {});
        bus.on(|_: &String| {});
        assert_eq!(bus.handler_count::<Ping>(), 1);
        assert_eq!(bus.handler_count::<String>(), 2);
        bus.clear::<String>();
        assert_eq!(bus.emit(String::from("x")), 0);
        assert_eq!(bus.emit(Ping(3)), 1);
    }
}
