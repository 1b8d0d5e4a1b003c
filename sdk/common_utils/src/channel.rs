//! Buffered streams used for every UI facing event.

// std::sync::Mutex is fine here, the lock is never held across an .await point.
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::broadcast::{
    self,
    error::{RecvError, SendError, TryRecvError},
};

use crate::consts::EVENT_CHANNEL_CAPACITY;

#[derive(Debug)]
struct Backlog<T> {
    pending: VecDeque<T>,
    receivers: usize,
    capacity: usize,
}

impl<T> Backlog<T> {
    fn hold(&mut self, value: T) {
        self.pending.push_back(value);
        if self.pending.len() > self.capacity {
            self.pending.pop_front();
            tracing::warn!("event backlog full, dropping oldest event");
        }
    }
}

fn lock<T>(backlog: &Mutex<Backlog<T>>) -> MutexGuard<'_, Backlog<T>> {
    backlog.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stream with a bounded buffer that never loses items for lack of a subscriber.
///
/// Producers never wait. While at least one [`EventReceiver`] is alive items are broadcast and
/// slow receivers skip ahead once the buffer is full. While nobody is subscribed items are
/// held, oldest first out, and replayed to the next subscriber. Items a last receiver leaves
/// unread are held the same way.
#[derive(Debug)]
pub struct EventChannel<T> {
    sender: broadcast::Sender<T>,
    backlog: Arc<Mutex<Backlog<T>>>,
}

impl<T: Clone> EventChannel<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            backlog: Arc::new(Mutex::new(Backlog {
                pending: VecDeque::new(),
                receivers: 0,
                capacity,
            })),
        }
    }

    /// Publishes `value`. Returns `false` when it was held for a later subscriber instead.
    pub fn emit(&self, value: T) -> bool {
        let mut backlog = lock(&self.backlog);
        if backlog.receivers == 0 {
            backlog.hold(value);
            return false;
        }
        match self.sender.send(value) {
            Ok(_) => true,
            Err(SendError(value)) => {
                backlog.hold(value);
                false
            }
        }
    }

    /// Subscribes and receives everything held since the last receiver went away.
    pub fn subscribe(&self) -> EventReceiver<T> {
        let mut backlog = lock(&self.backlog);
        let receiver = self.sender.subscribe();
        backlog.receivers += 1;
        for value in backlog.pending.drain(..) {
            // The receiver above keeps the channel open.
            let _ = self.sender.send(value);
        }
        EventReceiver {
            receiver,
            backlog: self.backlog.clone(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        lock(&self.backlog).receivers
    }

    pub fn pending(&self) -> usize {
        lock(&self.backlog).pending.len()
    }
}

impl<T: Clone> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            backlog: self.backlog.clone(),
        }
    }
}

/// Receiving half of an [`EventChannel`].
#[derive(Debug)]
pub struct EventReceiver<T: Clone> {
    receiver: broadcast::Receiver<T>,
    backlog: Arc<Mutex<Backlog<T>>>,
}

impl<T: Clone> EventReceiver<T> {
    /// Receives the next item, skipping over anything lost to lag. `None` once the channel
    /// closed.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.receiver.recv().await {
                Ok(value) => return Some(value),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event receiver lagged, dropping oldest events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl<T: Clone> Drop for EventReceiver<T> {
    fn drop(&mut self) {
        let mut backlog = lock(&self.backlog);
        backlog.receivers = backlog.receivers.saturating_sub(1);
        if backlog.receivers > 0 {
            return;
        }
        loop {
            match self.receiver.try_recv() {
                Ok(value) => backlog.hold(value),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}
