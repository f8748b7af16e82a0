//! Development server with live reload support.
//!
//! Static files come from the target directory on a small thread pool.
//! `/_events/` streams a frame per successful rebuild; each such client
//! holds its own thread for as long as it stays connected.

mod events;
mod lifecycle;
mod path;
mod response;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Method, Request, Server};

use super::build::{build_site, run_build};
use crate::{
    actor::{BrokerHandle, Coordinator, SiteEvent, watch::WatchScope},
    config::SiteConfig,
    core::is_shutdown,
    debug,
    embed::serve::EVENTS_PATH,
    log,
};

/// Threads serving static files.
const REQUEST_THREADS: usize = 4;

/// `kiln serve`: bind, start the actors, and serve until Ctrl+C.
pub fn run_serve(config: Arc<SiteConfig>) -> Result<()> {
    // Without a watcher nothing else will ever build the site
    if !config.serve.watch {
        run_build(&config)?;
    }

    let bound = bind_server(&config)?;
    bound.run(config)
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop.
pub fn bind_server(config: &SiteConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    Ok(BoundServer {
        server,
        addr,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the actors and the request loop (blocking).
    pub fn run(self, config: Arc<SiteConfig>) -> Result<()> {
        let rebuild_config = Arc::clone(&config);
        let rebuilder = Arc::new(move || {
            build_site(&rebuild_config, rebuild_config.build_mode()).map(|_| ())
        });

        let coordinator = Coordinator::new(WatchScope::from_config(&config), rebuilder)
            .with_watch(config.serve.watch)
            .with_shutdown_signal(self.shutdown_rx);

        let state = Arc::new(ServeState {
            root: config.build.target.clone(),
            broker: coordinator.broker(),
            live_reload: config.build_mode().live_reload,
        });
        let actors = lifecycle::spawn_actors(coordinator);

        let result = run_request_loop(&self.server, &state);
        lifecycle::wait_for_shutdown(actors);
        debug!("serve"; "http://{} stopped", self.addr);
        result
    }
}

/// What request handlers need: where files live and where events come from.
struct ServeState {
    root: PathBuf,
    broker: BrokerHandle<SiteEvent>,
    /// Without live reload `/_events/` is an ordinary (missing) path.
    live_reload: bool,
}

fn run_request_loop(server: &Server, state: &Arc<ServeState>) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(REQUEST_THREADS)
        .thread_name(|i| format!("kiln-http-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(state);

        // Event streams never finish; keep them off the pool
        if state.live_reload && is_event_stream(request.url()) && !is_shutdown() {
            thread::spawn(move || events::respond_events(request, &state.broker));
            continue;
        }

        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single static file request.
fn handle_request(request: Request, state: &ServeState) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    if !matches!(request.method(), Method::Get | Method::Head) {
        return response::respond_method_not_allowed(request);
    }

    match path::resolve_path(request.url(), &state.root) {
        Some(path) => response::respond_file(request, &path),
        None => response::respond_not_found(request, &state.root),
    }
}

fn is_event_stream(url: &str) -> bool {
    let prefix = EVENTS_PATH.trim_end_matches('/');
    url.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
}
