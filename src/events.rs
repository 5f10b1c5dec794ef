use std::sync::{
    Mutex,
    mpsc::{Receiver, Sender, channel},
};

use crate::models::menu::MenuConfig;

#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    MenuConfigChanged(MenuConfig),
}

/// Fan-out of typed events to every live subscriber.
///
/// Publishing is synchronous and never blocks; subscribers whose
/// receiver has been dropped are pruned on the next publish.
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<AppEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<AppEvent> {
        let (tx, rx) = channel();
        self.lock().push(tx);
        rx
    }

    /// Returns how many subscribers received the event
    pub fn publish(&self, event: AppEvent) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::debug!(delivered = subscribers.len(), ?event, "event published");
        subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<AppEvent>>> {
        // A panicking subscriber cannot leave the list half-written
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
