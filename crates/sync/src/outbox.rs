//! Capped FIFO queue for messages composed while disconnected.
//!
//! Flushed in order on reconnect. When full, the oldest message is dropped:
//! fog events are re-derivable from the store via reconcile, so losing the
//! oldest is recoverable while unbounded growth is not.

use std::collections::VecDeque;

use veilcast_shared::ClientMessage;

pub struct Outbox {
    queue: VecDeque<ClientMessage>,
    capacity: usize,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, message: ClientMessage) {
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            tracing::warn!(capacity = self.capacity, "outbox full, dropped oldest message");
        }
        self.queue.push_back(message);
    }

    /// Remove and return every queued message, oldest first.
    pub fn drain(&mut self) -> Vec<ClientMessage> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilcast_domain::SceneId;
    use veilcast_shared::EmptyData;

    fn join_msg() -> ClientMessage {
        ClientMessage::SceneJoin {
            scene_id: SceneId::new(),
            data: EmptyData::default(),
        }
    }

    #[test]
    fn test_drains_in_fifo_order() {
        let mut outbox = Outbox::new(8);
        let first = join_msg();
        let second = join_msg();
        outbox.push(first.clone());
        outbox.push(second.clone());

        let drained = outbox.drain();
        assert_eq!(drained, vec![first, second]);
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_drops_oldest_when_full() {
        let mut outbox = Outbox::new(2);
        let first = join_msg();
        let second = join_msg();
        let third = join_msg();
        outbox.push(first);
        outbox.push(second.clone());
        outbox.push(third.clone());

        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox.drain(), vec![second, third]);
    }
}
