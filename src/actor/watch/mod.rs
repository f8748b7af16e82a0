//! Debounced watcher actor.
//!
//! Rebuilds once at startup, then once per burst of relevant filesystem
//! events. After every rebuild attempt the non-recursive watches are
//! re-registered, since the rebuild walk may have revealed new source
//! directories. Only successful rebuilds are published to the broker.
//!
//! ```text
//! notify thread ──► mpsc ──► WatchActor ──(timer)──► spawn_blocking(rebuild)
//!                                                     │
//!                                   refresh watches ◄─┴─► Broker::publish
//! ```

mod debouncer;
mod scope;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::broker::BrokerHandle;
use super::messages::SiteEvent;
use crate::{debug, log, logger};

pub use scope::WatchScope;

use debouncer::Debouncer;

/// Events buffered between the notify thread and the actor.
const EVENT_BUFFER: usize = 256;

/// A full site rebuild, run on the blocking pool.
pub trait Rebuild: Send + Sync + 'static {
    fn rebuild(&self) -> anyhow::Result<()>;
}

impl<F> Rebuild for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn rebuild(&self) -> anyhow::Result<()> {
        self()
    }
}

/// Where watches are registered. One directory, one non-recursive watch.
pub trait WatchRegistry: Send + 'static {
    fn watch(&mut self, dir: &Path) -> notify::Result<()>;
    fn unwatch(&mut self, dir: &Path) -> notify::Result<()>;
}

impl WatchRegistry for RecommendedWatcher {
    fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        Watcher::watch(self, dir, RecursiveMode::NonRecursive)
    }

    fn unwatch(&mut self, dir: &Path) -> notify::Result<()> {
        Watcher::unwatch(self, dir)
    }
}

pub struct WatchActor<R> {
    events: mpsc::Receiver<notify::Event>,
    registry: R,
    watched: FxHashSet<PathBuf>,
    scope: WatchScope,
    rebuilder: Arc<dyn Rebuild>,
    broker: BrokerHandle<SiteEvent>,
    generation: u64,
}

impl WatchActor<RecommendedWatcher> {
    /// Actor fed by the platform watcher.
    ///
    /// notify delivers on its own thread through a std channel; a bridge
    /// thread forwards into the actor's tokio channel.
    pub fn with_notify(
        scope: WatchScope,
        rebuilder: Arc<dyn Rebuild>,
        broker: BrokerHandle<SiteEvent>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if event_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        Ok(Self::new(event_rx, watcher, scope, rebuilder, broker))
    }
}

impl<R: WatchRegistry> WatchActor<R> {
    pub fn new(
        events: mpsc::Receiver<notify::Event>,
        registry: R,
        scope: WatchScope,
        rebuilder: Arc<dyn Rebuild>,
        broker: BrokerHandle<SiteEvent>,
    ) -> Self {
        Self {
            events,
            registry,
            watched: FxHashSet::default(),
            scope,
            rebuilder,
            broker,
            generation: 0,
        }
    }

    /// Run until the event source closes.
    pub async fn run(mut self) {
        let mut debouncer = Debouncer::new(self.scope.debounce);
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        // The first rebuild does not wait for an event.
        debouncer.start();
        let mut open = self.rebuild(&mut debouncer).await;
        if let Some(deadline) = debouncer.finish(Instant::now()) {
            timer.as_mut().reset(deadline);
        }

        while open {
            tokio::select! {
                biased;
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    if let Some(deadline) = self.observe(&event, &mut debouncer) {
                        timer.as_mut().reset(deadline);
                    }
                }
                () = &mut timer, if debouncer.is_pending() => {
                    debouncer.start();
                    open = self.rebuild(&mut debouncer).await;
                    if let Some(deadline) = debouncer.finish(Instant::now()) {
                        timer.as_mut().reset(deadline);
                    }
                }
            }
        }

        debug!("watch"; "event source closed, watcher stopped");
    }

    /// Feed one event to the debouncer. Returns the deadline to arm, if any.
    fn observe(&self, event: &notify::Event, debouncer: &mut Debouncer) -> Option<Instant> {
        if !self.scope.is_relevant(event) {
            return None;
        }
        debug!("watch"; "{:?} {:?}", event.kind, event.paths);
        debouncer.on_event(Instant::now())
    }

    /// Rebuild on the blocking pool while still draining events, which mark
    /// the debouncer dirty instead of backing up the channel.
    ///
    /// Returns false once the event source has closed.
    async fn rebuild(&mut self, debouncer: &mut Debouncer) -> bool {
        let rebuilder = Arc::clone(&self.rebuilder);
        let started = std::time::Instant::now();
        let task = tokio::task::spawn_blocking(move || rebuilder.rebuild());
        tokio::pin!(task);

        let mut open = true;
        let result = loop {
            tokio::select! {
                result = &mut task => break result,
                event = self.events.recv(), if open => match event {
                    Some(event) => {
                        self.observe(&event, debouncer);
                    }
                    None => open = false,
                },
            }
        };

        self.refresh_watches();

        match result {
            Ok(Ok(())) => {
                self.generation += 1;
                self.broker.publish(SiteEvent::Rebuilt {
                    generation: self.generation,
                });
                logger::status_success(&format!(
                    "rebuilt in {}ms",
                    started.elapsed().as_millis()
                ));
            }
            Ok(Err(e)) => logger::status_error("rebuild failed", &format!("{e:#}")),
            Err(e) => log!("error"; "rebuild task failed: {}", e),
        }
        open
    }

    /// Point the registry at the current directory set.
    ///
    /// Every wanted directory is registered again, so a directory removed
    /// and recreated since the last rebuild is picked up too.
    fn refresh_watches(&mut self) {
        let wanted: FxHashSet<PathBuf> = self.scope.watch_dirs().into_iter().collect();

        for stale in self.watched.difference(&wanted) {
            let _ = self.registry.unwatch(stale);
        }

        self.watched.clear();
        for dir in wanted {
            match self.registry.watch(&dir) {
                Ok(()) => {
                    self.watched.insert(dir);
                }
                Err(e) => log!("watch"; "cannot watch {}: {}", dir.display(), e),
            }
        }
    }
}
