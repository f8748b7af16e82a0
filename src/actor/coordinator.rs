//! Actor coordinator: wires the broker and the watcher onto one runtime.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use super::broker::{self, Broker, BrokerHandle};
use super::messages::SiteEvent;
use super::watch::{Rebuild, WatchActor, WatchScope};
use crate::debug;

/// How often the shutdown signal is polled.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub struct Coordinator {
    scope: WatchScope,
    rebuilder: Arc<dyn Rebuild>,
    watch: bool,
    broker: BrokerHandle<SiteEvent>,
    broker_actor: Broker<SiteEvent>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(scope: WatchScope, rebuilder: Arc<dyn Rebuild>) -> Self {
        let (broker, broker_actor) = broker::channel();
        Self {
            scope,
            rebuilder,
            watch: true,
            broker,
            broker_actor,
            shutdown_rx: None,
        }
    }

    /// Run the watcher. Without it only the broker runs and nothing is published.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Stop when a value arrives on `rx`.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Handle for subscribers (the SSE endpoint).
    pub fn broker(&self) -> BrokerHandle<SiteEvent> {
        self.broker.clone()
    }

    /// Run the actors until shutdown, or until they stop on their own.
    pub async fn run(self) -> Result<()> {
        let broker_task = tokio::spawn(self.broker_actor.run());

        let watch_task = if self.watch {
            let actor = WatchActor::with_notify(self.scope, self.rebuilder, self.broker.clone())
                .context("failed to start file watcher")?;
            Some(tokio::spawn(actor.run()))
        } else {
            None
        };
        drop(self.broker);

        debug!("actor"; "start");
        match self.shutdown_rx {
            Some(rx) => loop {
                if rx.try_recv().is_ok() {
                    debug!("actor"; "shutdown signal received");
                    break;
                }
                tokio::time::sleep(SHUTDOWN_POLL).await;
            },
            None => {
                if let Some(task) = &watch_task {
                    while !task.is_finished() {
                        tokio::time::sleep(SHUTDOWN_POLL).await;
                    }
                }
            }
        }

        if let Some(task) = watch_task {
            task.abort();
        }
        broker_task.abort();
        debug!("actor"; "stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossbeam::channel::unbounded;
    use tempfile::TempDir;

    use super::*;

    fn scope(dir: &TempDir) -> WatchScope {
        WatchScope {
            src: dir.path().join("src"),
            target: dir.path().join("target"),
            roots: Vec::new(),
            debounce: Duration::from_millis(50),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_broker_runs_without_watcher() {
        let dir = TempDir::new().unwrap();
        let (shutdown_tx, shutdown_rx) = unbounded();
        let rebuilder = Arc::new(|| -> Result<()> { Ok(()) });
        let coordinator = Coordinator::new(scope(&dir), rebuilder)
            .with_watch(false)
            .with_shutdown_signal(shutdown_rx);

        let broker = coordinator.broker();
        let task = tokio::spawn(coordinator.run());

        let (_, rx) = broker.subscribe();
        broker.publish(SiteEvent::Rebuilt { generation: 7 });
        let received = tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(received, Ok(SiteEvent::Rebuilt { generation: 7 }));

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }
}
