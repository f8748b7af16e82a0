//! Actor message definitions.

use crossbeam::channel::Sender;

/// Identifier of one broker subscription.
pub type SubscriberId = u64;

/// Messages to the broker actor.
#[derive(Debug)]
pub enum BrokerMsg<E> {
    /// Register a subscriber channel.
    Subscribe { id: SubscriberId, tx: Sender<E> },
    /// Drop a subscriber, closing its channel.
    Unsubscribe(SubscriberId),
    /// Deliver an event to every subscriber.
    Publish(E),
}

/// Events published after the watcher finishes work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteEvent {
    /// The site was rebuilt successfully; `generation` counts rebuilds.
    Rebuilt { generation: u64 },
}
