//! Bounded store of raw protocol messages, oldest evicted first.

use std::collections::{HashMap, VecDeque};
use waproto::whatsapp::Message;

pub(crate) struct MessageCache {
    capacity: usize,
    order: VecDeque<String>,
    messages: HashMap<String, Message>,
}

impl MessageCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            messages: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: String, message: Message) {
        if self.messages.insert(id.clone(), message).is_some() {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.messages.remove(&old);
            }
        }
    }

    /// Insert only if `id` is not cached yet.
    pub(crate) fn insert_if_absent(&mut self, id: String, message: Message) {
        if !self.messages.contains_key(&id) {
            self.insert(id, message);
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }
}
