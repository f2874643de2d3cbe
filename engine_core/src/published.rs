//! A single-writer observable value.
//!
//! The owner writes through [`Published::set`]; readers call
//! [`Published::get`] or register a listener with [`Published::subscribe`].
//! Listeners run synchronously on the writer's context, in the order they
//! were registered.

use std::fmt;

/// Handle returned by [`Published::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(T) + Send>;

pub struct Published<T> {
    value:     T,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
    next_id:   u64,
}

impl<T: Copy + PartialEq> Published<T> {
    pub fn new(initial: T) -> Self {
        Published { value: initial, listeners: Vec::new(), next_id: 0 }
    }

    pub fn get(&self) -> T { self.value }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(T) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize { self.listeners.len() }

    /// Store `value` and notify listeners if it differs from the current one.
    pub(crate) fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        for (_, listener) in self.listeners.iter_mut() {
            listener(value);
        }
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Published")
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
