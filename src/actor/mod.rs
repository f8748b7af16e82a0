//! Actor system for watch mode.
//!
//! ```text
//! notify ──► WatchActor ──(debounce)──► rebuild ──► Broker ──► SSE clients
//! ```
//!
//! - `messages` - Broker mailbox and published event types
//! - `broker` - Subscriber registry actor
//! - `watch` - Debounced filesystem watcher
//! - `coordinator` - Wires up and runs actors

pub mod broker;
pub mod coordinator;
pub mod messages;
pub mod watch;

pub use broker::BrokerHandle;
pub use coordinator::Coordinator;
pub use messages::SiteEvent;
