use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use shared::events::{EventChannel, WidgetEvent};
use tracing::debug;

pub type EventCallback = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<EventChannel, Vec<EventCallback>>>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on<F>(&self, channel: EventChannel, callback: F)
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(channel)
            .or_default()
            .push(Arc::new(callback));
    }

    pub fn emit(&self, event: &WidgetEvent) {
        // Snapshot so callbacks may subscribe or emit without deadlocking.
        let callbacks = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.channel())
            .cloned()
            .unwrap_or_default();
        debug!(
            channel = ?event.channel(),
            subscribers = callbacks.len(),
            "events: emit"
        );
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn subscriber_count(&self, channel: EventChannel) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel)
            .map_or(0, Vec::len)
    }
}
