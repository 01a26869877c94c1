//! Fire-and-forget persistence of recordings.
//!
//! # Architecture
//!
//! - [`SaveRequest`] is the serialised POST (JSON array of `{time, key}`)
//! - a [`Transport`] performs it off the main loop and reports a
//!   [`SaveOutcome`] on an mpsc channel
//! - [`Uploader`] owns the channel; the controller drains it on every tick
//!   and only logs what comes back
//!
//! Nothing here ever feeds back into the voice or recording state, and
//! failed saves are not retried.

use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::error::{PianoError, PianoResult};
use crate::recording::Recording;

pub const CONTENT_TYPE: &str = "application/json";

const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// An HTTP POST of a recording's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub url: String,
    pub body: String,
}

impl SaveRequest {
    pub fn for_recording(url: impl Into<String>, recording: &Recording) -> PianoResult<Self> {
        Ok(Self {
            url: url.into(),
            body: recording.to_json()?,
        })
    }
}

/// Completion report for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: u64,

    /// HTTP status on a completed exchange, or a description of the failure.
    pub result: Result<u16, String>,
}

impl SaveOutcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.result, Ok(status) if (200..300).contains(&status))
    }
}

/// Performs save requests without blocking the caller.
pub trait Transport {
    /// Start sending `request`; report on `done` when finished.
    fn send(&mut self, id: u64, request: SaveRequest, done: Sender<SaveOutcome>);
}

// ═══════════════════════════════════════════════════════════════════
// Uploader
// ═══════════════════════════════════════════════════════════════════

pub struct Uploader<T: Transport> {
    transport: T,
    next_id: u64,
    in_flight: usize,
    done_tx: Sender<SaveOutcome>,
    done_rx: Receiver<SaveOutcome>,
}

impl<T: Transport> Uploader<T> {
    pub fn new(transport: T) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            transport,
            next_id: 1,
            in_flight: 0,
            done_tx,
            done_rx,
        }
    }

    /// Hand `request` to the transport. Returns its id.
    pub fn submit(&mut self, request: SaveRequest) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        info!("saving recording #{} to {}", id, request.url);
        self.transport.send(id, request, self.done_tx.clone());
        self.in_flight += 1;
        id
    }

    /// Collect and log every outcome reported so far.
    pub fn drain(&mut self) -> Vec<SaveOutcome> {
        let outcomes: Vec<SaveOutcome> = self.done_rx.try_iter().collect();
        for outcome in &outcomes {
            self.in_flight = self.in_flight.saturating_sub(1);
            match &outcome.result {
                Ok(status) if outcome.is_success() => {
                    info!("recording #{} saved (HTTP {})", outcome.id, status)
                }
                Ok(status) => warn!("recording #{} rejected (HTTP {})", outcome.id, status),
                Err(e) => warn!("recording #{} not saved: {}", outcome.id, e),
            }
        }
        outcomes
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

// ═══════════════════════════════════════════════════════════════════
// Native HTTP transport
// ═══════════════════════════════════════════════════════════════════

/// Plain `http://` POST on a worker thread per request.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn send(&mut self, id: u64, request: SaveRequest, done: Sender<SaveOutcome>) {
        thread::spawn(move || {
            let result = post_json(&request).map_err(|e| e.to_string());
            // The receiver may be gone if the piano was dropped; nothing to do then
            let _ = done.send(SaveOutcome { id, result });
        });
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
    path: String,
}

impl Endpoint {
    fn parse(url: &str) -> PianoResult<Self> {
        let invalid = || PianoError::InvalidUrl(url.to_string());

        let rest = url.strip_prefix("http://").ok_or_else(invalid)?;
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }
}

fn post_json(request: &SaveRequest) -> PianoResult<u16> {
    let endpoint = Endpoint::parse(&request.url)?;
    let mut stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))?;
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;

    write!(
        stream,
        "POST {} HTTP/1.1\r\nHost: {}:{}\r\nAccept: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        endpoint.path,
        endpoint.host,
        endpoint.port,
        CONTENT_TYPE,
        CONTENT_TYPE,
        request.body.len()
    )?;
    stream.write_all(request.body.as_bytes())?;
    stream.flush()?;

    let mut status_line = String::new();
    BufReader::new(stream).read_line(&mut status_line)?;
    parse_status_line(&status_line)
}

fn parse_status_line(line: &str) -> PianoResult<u16> {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| {
            PianoError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("malformed status line: {:?}", line.trim_end()),
            ))
        })
}

// ═══════════════════════════════════════════════════════════════════
// Host-driven transport
// ═══════════════════════════════════════════════════════════════════

/// Queues requests for a host that performs the fetch itself (the browser
/// page) and reports completion back by id.
#[derive(Debug, Default)]
pub struct QueuedTransport {
    queue: VecDeque<(u64, SaveRequest)>,
    waiting: HashMap<u64, Sender<SaveOutcome>>,
}

impl QueuedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next request for the host to send.
    pub fn next_request(&mut self) -> Option<(u64, SaveRequest)> {
        self.queue.pop_front()
    }

    /// Report the result of a request taken with `next_request`.
    ///
    /// Returns `false` for unknown or already-completed ids.
    pub fn complete(&mut self, id: u64, result: Result<u16, String>) -> bool {
        match self.waiting.remove(&id) {
            Some(done) => {
                let _ = done.send(SaveOutcome { id, result });
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl Transport for QueuedTransport {
    fn send(&mut self, id: u64, request: SaveRequest, done: Sender<SaveOutcome>) {
        self.queue.push_back((id, request));
        self.waiting.insert(id, done);
    }
}
