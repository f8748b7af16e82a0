//! Watcher actor tests with a recording registry and synthetic events.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crossbeam::channel::Receiver;
use notify::EventKind;
use notify::event::{DataChange, MetadataKind, ModifyKind};
use parking_lot::Mutex;
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::*;
use crate::actor::broker;
use crate::utils::path::normalize_path;

const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Clone, Default)]
struct RecordingRegistry {
    watched: Arc<Mutex<FxHashSet<PathBuf>>>,
}

impl WatchRegistry for RecordingRegistry {
    fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        self.watched.lock().insert(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> notify::Result<()> {
        self.watched.lock().remove(dir);
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    root: PathBuf,
    events: mpsc::Sender<notify::Event>,
    rebuilds: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    registry: RecordingRegistry,
    published: Receiver<SiteEvent>,
}

impl Harness {
    /// Spawn a watcher whose rebuild counts calls and runs `on_rebuild`.
    fn spawn(on_rebuild: impl Fn(&Path, usize) + Send + Sync + 'static) -> Self {
        let dir = TempDir::new().unwrap();
        let root = normalize_path(dir.path());
        fs::create_dir_all(root.join("src/blog")).unwrap();
        fs::create_dir_all(root.join("layouts")).unwrap();

        let scope = WatchScope {
            src: root.join("src"),
            target: root.join("target"),
            roots: vec![root.join("layouts"), root.join("data"), root.join("includes")],
            debounce: DEBOUNCE,
        };

        let rebuilds = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(false));
        let rebuilder = {
            let rebuilds = Arc::clone(&rebuilds);
            let fail = Arc::clone(&fail);
            let root = root.clone();
            move || {
                let n = rebuilds.fetch_add(1, Ordering::SeqCst) + 1;
                on_rebuild(&root, n);
                if fail.load(Ordering::SeqCst) {
                    anyhow::bail!("layout `base` not found");
                }
                Ok(())
            }
        };

        let (broker, broker_actor) = broker::channel();
        tokio::spawn(broker_actor.run());
        let (_, published) = broker.subscribe();

        let registry = RecordingRegistry::default();
        let (events, events_rx) = mpsc::channel(64);
        let actor = WatchActor::new(
            events_rx,
            registry.clone(),
            scope,
            Arc::new(rebuilder),
            broker,
        );
        tokio::spawn(actor.run());

        Self {
            _dir: dir,
            root,
            events,
            rebuilds,
            fail,
            registry,
            published,
        }
    }

    async fn send(&self, kind: EventKind, rel: &str) {
        let event = notify::Event {
            kind,
            paths: vec![self.root.join(rel)],
            attrs: Default::default(),
        };
        self.events.send(event).await.unwrap();
    }

    async fn touch(&self, rel: &str) {
        self.send(EventKind::Modify(ModifyKind::Data(DataChange::Content)), rel)
            .await;
    }

    fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }

    fn published(&self) -> Vec<SiteEvent> {
        self.published.try_iter().collect()
    }
}

async fn settle() {
    tokio::time::sleep(DEBOUNCE * 4).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_initial_rebuild_is_immediate() {
    let harness = Harness::spawn(|_, _| {});

    tokio::time::sleep(DEBOUNCE / 2).await;
    assert_eq!(harness.rebuilds(), 1);

    settle().await;
    assert_eq!(harness.rebuilds(), 1);
    assert_eq!(harness.published(), [SiteEvent::Rebuilt { generation: 1 }]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_coalesces_into_one_rebuild() {
    let harness = Harness::spawn(|_, _| {});
    settle().await;

    for i in 0..5 {
        harness.touch(&format!("src/page{i}.md")).await;
        tokio::time::sleep(DEBOUNCE / 10).await;
    }
    settle().await;

    assert_eq!(harness.rebuilds(), 2);
    assert_eq!(
        harness.published(),
        [
            SiteEvent::Rebuilt { generation: 1 },
            SiteEvent::Rebuilt { generation: 2 }
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spaced_events_rebuild_each_time() {
    let harness = Harness::spawn(|_, _| {});
    settle().await;

    for _ in 0..3 {
        harness.touch("src/index.md").await;
        settle().await;
    }

    assert_eq!(harness.rebuilds(), 4);
    assert_eq!(harness.published().len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_metadata_events_never_arm_timer() {
    let harness = Harness::spawn(|_, _| {});
    settle().await;

    for _ in 0..3 {
        harness
            .send(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                "src/index.md",
            )
            .await;
    }
    harness.touch("target/index.html").await;
    harness.touch("src/.index.md.swp").await;
    settle().await;

    assert_eq!(harness.rebuilds(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_rebuild_is_not_published() {
    let harness = Harness::spawn(|_, _| {});
    settle().await;
    assert_eq!(harness.published().len(), 1);

    harness.fail.store(true, Ordering::SeqCst);
    harness.touch("src/index.md").await;
    settle().await;

    assert_eq!(harness.rebuilds(), 2);
    assert!(harness.published().is_empty());

    // The watcher keeps going after a failure.
    harness.fail.store(false, Ordering::SeqCst);
    harness.touch("src/index.md").await;
    settle().await;

    assert_eq!(harness.rebuilds(), 3);
    assert_eq!(harness.published(), [SiteEvent::Rebuilt { generation: 2 }]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watches_follow_new_directories() {
    let harness = Harness::spawn(|root, n| {
        if n == 2 {
            fs::create_dir_all(root.join("src/blog/2024")).unwrap();
            fs::remove_dir_all(root.join("layouts")).unwrap();
        }
    });
    settle().await;

    let root = &harness.root;
    let watched = harness.registry.watched.lock().clone();
    let expected: FxHashSet<_> = [root.join("layouts"), root.join("src"), root.join("src/blog")]
        .into_iter()
        .collect();
    assert_eq!(watched, expected);

    harness.touch("src/blog/new.md").await;
    settle().await;

    let watched = harness.registry.watched.lock().clone();
    let expected: FxHashSet<_> = [
        root.join("src"),
        root.join("src/blog"),
        root.join("src/blog/2024"),
    ]
    .into_iter()
    .collect();
    assert_eq!(watched, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_during_rebuild_trigger_one_more() {
    let harness = Harness::spawn(|_, n| {
        if n == 2 {
            std::thread::sleep(DEBOUNCE * 2);
        }
    });
    settle().await;

    harness.touch("src/a.md").await;
    // Land inside the slow second rebuild.
    tokio::time::sleep(DEBOUNCE + DEBOUNCE / 2).await;
    harness.touch("src/b.md").await;
    harness.touch("src/c.md").await;

    tokio::time::sleep(DEBOUNCE * 6).await;
    assert_eq!(harness.rebuilds(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_drained_while_rebuilding() {
    let harness = Harness::spawn(|_, n| {
        if n == 2 {
            std::thread::sleep(DEBOUNCE * 5);
        }
    });
    settle().await;

    harness.touch("src/a.md").await;
    tokio::time::sleep(DEBOUNCE + DEBOUNCE / 2).await;
    assert_eq!(harness.rebuilds(), 2);

    // More events than the channel holds, all sent during the slow rebuild.
    let burst = async {
        for i in 0..200 {
            harness.touch(&format!("src/page{i}.md")).await;
        }
    };
    tokio::time::timeout(DEBOUNCE * 2, burst)
        .await
        .expect("watcher stopped reading events during a rebuild");

    tokio::time::sleep(DEBOUNCE * 8).await;
    assert_eq!(harness.rebuilds(), 3);
}
