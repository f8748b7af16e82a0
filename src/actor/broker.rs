//! Event broker actor.
//!
//! One task owns the subscriber registry. Handles only ever send
//! messages, so subscribe, unsubscribe and publish are serialized by the
//! mailbox and never race on the registry.
//!
//! Each subscriber gets a bounded channel. A subscriber whose channel is
//! full misses the event instead of stalling the others; a subscriber
//! whose receiver was dropped is removed on the next publish.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{Receiver, Sender, TrySendError, bounded};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use super::messages::{BrokerMsg, SubscriberId};
use crate::debug;

/// Events buffered per subscriber before new ones are dropped.
pub const SUBSCRIBER_CAPACITY: usize = 16;

/// Create a broker and a handle to reach it.
pub fn channel<E>() -> (BrokerHandle<E>, Broker<E>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = BrokerHandle {
        tx,
        next_id: Arc::new(AtomicU64::new(1)),
    };
    let broker = Broker {
        rx,
        subscribers: FxHashMap::default(),
    };
    (handle, broker)
}

/// Cloneable, non-blocking handle to the broker.
#[derive(Debug)]
pub struct BrokerHandle<E> {
    tx: mpsc::UnboundedSender<BrokerMsg<E>>,
    next_id: Arc<AtomicU64>,
}

impl<E> Clone for BrokerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<E> BrokerHandle<E> {
    /// Register a new subscriber.
    ///
    /// Events published after this call returns are delivered to `rx`.
    /// The channel is closed by `unsubscribe` or when the broker stops.
    pub fn subscribe(&self) -> (SubscriberId, Receiver<E>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = bounded(SUBSCRIBER_CAPACITY);
        // A stopped broker drops `tx` here, which closes `rx` right away.
        let _ = self.tx.send(BrokerMsg::Subscribe { id, tx });
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        let _ = self.tx.send(BrokerMsg::Unsubscribe(id));
    }

    pub fn publish(&self, event: E) {
        let _ = self.tx.send(BrokerMsg::Publish(event));
    }
}

/// The broker actor. Owns the registry; run it with [`Broker::run`].
pub struct Broker<E> {
    rx: mpsc::UnboundedReceiver<BrokerMsg<E>>,
    subscribers: FxHashMap<SubscriberId, Sender<E>>,
}

impl<E: Clone> Broker<E> {
    /// Process messages until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.handle(msg);
        }
        debug!("broker"; "stopped with {} subscribers", self.subscribers.len());
    }

    fn handle(&mut self, msg: BrokerMsg<E>) {
        match msg {
            BrokerMsg::Subscribe { id, tx } => {
                self.subscribers.insert(id, tx);
                debug!("broker"; "subscribed #{} ({} total)", id, self.subscribers.len());
            }
            BrokerMsg::Unsubscribe(id) => {
                if self.subscribers.remove(&id).is_some() {
                    debug!("broker"; "unsubscribed #{}", id);
                }
            }
            BrokerMsg::Publish(event) => self.broadcast(&event),
        }
    }

    fn broadcast(&mut self, event: &E) {
        self.subscribers
            .retain(|id, tx| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    debug!("broker"; "subscriber #{} is lagging, event dropped", id);
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Handle every queued message without waiting.
    #[cfg(test)]
    pub(crate) fn process_pending(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle(msg);
        }
    }
}
