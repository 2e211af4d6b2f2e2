//! Broadcast event channel between the capture core and its host.
//!
//! The recorder and picker publish their step/completion events here instead
//! of taking raw callbacks; hosts subscribe and receive per-step events
//! synchronously with the commit that produced them.

use tokio::sync::broadcast;

pub struct EventEmitter<T> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventEmitter<T> {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Publish an event. Lagging or absent subscribers are not an error.
    pub fn emit(&self, event: T) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let emitter: EventEmitter<u32> = EventEmitter::new();
        emitter.emit(1);
    }

    #[test]
    fn test_subscribers_see_events_in_order() {
        let emitter: EventEmitter<u32> = EventEmitter::new();
        let mut rx = emitter.subscribe();
        emitter.emit(1);
        emitter.emit(2);
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap(), 2);
    }
}
