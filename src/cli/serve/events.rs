//! Server-sent events bridge between the broker and browsers.
//!
//! Each client gets its own subscription and thread. Every broker event
//! becomes one `data\n\n` frame, flushed immediately. A comment frame is
//! written while idle so a vanished client is noticed on the next write.

use std::io::{self, Write};
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError};
use tiny_http::Request;

use crate::{
    actor::{BrokerHandle, SiteEvent},
    core::is_shutdown,
    debug,
    utils::mime::types::EVENT_STREAM,
};

/// Idle time before a keep-alive comment is sent.
pub const KEEPALIVE: Duration = Duration::from_secs(15);

const DATA_FRAME: &[u8] = b"data\n\n";
const PING_FRAME: &[u8] = b": ping\n\n";

/// Take over the connection and stream events until the client goes away.
pub fn respond_events(request: Request, broker: &BrokerHandle<SiteEvent>) {
    let peer = request.remote_addr().copied();
    let mut writer = request.into_writer();

    match serve_events(&mut writer, broker, KEEPALIVE) {
        Ok(()) => debug!("sse"; "{:?} closed", peer),
        Err(e) => debug!("sse"; "{:?} disconnected: {}", peer, e),
    }
}

/// Subscribe, stream, and always unsubscribe on the way out.
pub fn serve_events<W: Write + ?Sized>(
    writer: &mut W,
    broker: &BrokerHandle<SiteEvent>,
    keepalive: Duration,
) -> io::Result<()> {
    let (id, rx) = broker.subscribe();
    debug!("sse"; "subscriber #{} connected", id);
    let result = write_head(writer).and_then(|()| stream_events(writer, &rx, keepalive));
    broker.unsubscribe(id);
    result
}

fn write_head<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    write!(
        writer,
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {EVENT_STREAM}\r\n\
         Connection: keep-alive\r\n\
         Cache-Control: no-cache\r\n\
         Access-Control-Allow-Origin: *\r\n\
         \r\n"
    )?;
    writer.flush()
}

/// Forward events as frames until the channel closes or a write fails.
fn stream_events<W: Write + ?Sized>(
    writer: &mut W,
    rx: &Receiver<SiteEvent>,
    keepalive: Duration,
) -> io::Result<()> {
    loop {
        if is_shutdown() {
            return Ok(());
        }
        let frame = match rx.recv_timeout(keepalive) {
            Ok(_) => DATA_FRAME,
            Err(RecvTimeoutError::Timeout) => PING_FRAME,
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        };
        writer.write_all(frame)?;
        writer.flush()?;
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::actor::broker;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_head_carries_stream_headers() {
        let mut out = Vec::new();
        write_head(&mut out).unwrap();
        let head = String::from_utf8(out).unwrap();

        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/event-stream\r\n"));
        assert!(head.contains("Connection: keep-alive\r\n"));
        assert!(head.contains("Cache-Control: no-cache\r\n"));
        assert!(head.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_one_frame_per_event() {
        let (tx, rx) = crossbeam::channel::unbounded();
        tx.send(SiteEvent::Rebuilt { generation: 1 }).unwrap();
        tx.send(SiteEvent::Rebuilt { generation: 2 }).unwrap();
        drop(tx);

        let mut out = Vec::new();
        stream_events(&mut out, &rx, Duration::from_secs(5)).unwrap();
        assert_eq!(out, b"data\n\ndata\n\n");
    }

    #[test]
    fn test_idle_sends_ping() {
        let (tx, rx) = crossbeam::channel::unbounded::<SiteEvent>();
        let closer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(80));
            drop(tx);
        });

        let mut out = Vec::new();
        stream_events(&mut out, &rx, Duration::from_millis(20)).unwrap();
        closer.join().unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(": ping\n\n"));
        assert!(!text.contains("data"));
    }

    #[test]
    fn test_write_failure_unsubscribes() {
        let (handle, mut broker) = broker::channel::<SiteEvent>();

        let result = serve_events(&mut BrokenPipe, &handle, Duration::from_millis(10));
        assert!(result.is_err());

        broker.process_pending();
        assert_eq!(broker.subscriber_count(), 0);
    }
}
