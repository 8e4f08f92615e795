//! Gesture feed: JSON messages over a WebSocket (default) or over plain TCP,
//! one message per line.
//!
//! A background thread connects, reads messages, decodes them and publishes the
//! newest one into a [`LatestCell`]. Lost or refused connections are retried
//! with exponential backoff. Running without a producer is normal.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use pointmorph_core::{parse_message, FeedConfig, GestureMessage, LatestCell, Transport};
use pointmorph_platform::{GestureSource, Result, SourceStatus};
use tracing::{debug, info, warn};
use tungstenite::handshake::HandshakeError;
use tungstenite::{Message, WebSocket};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
const SLEEP_SLICE: Duration = Duration::from_millis(25);
/// Longest accepted line in line mode; longer ones drop the connection.
const MAX_LINE_BYTES: usize = 64 * 1024;
/// Undrained status events beyond this are discarded; `status()` stays current.
const STATUS_BACKLOG: usize = 32;

/// Doubling retry delay, capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self { initial, max, current: initial }
    }

    /// Delay before the next attempt; doubles the one after.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

struct Shared {
    stop: AtomicBool,
    status: Mutex<SourceStatus>,
    events: Sender<SourceStatus>,
}

impl Shared {
    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn report(&self, status: SourceStatus) {
        if let Ok(mut current) = self.status.lock() {
            *current = status.clone();
        }
        let _ = self.events.try_send(status);
    }

    /// Sleep for `total`, waking early when stop is requested.
    fn pause(&self, total: Duration) {
        let mut left = total;
        while !left.is_zero() && !self.stopping() {
            let slice = left.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            left -= slice;
        }
    }
}

pub struct GestureFeed {
    config: FeedConfig,
    cell: LatestCell<GestureMessage>,
    shared: Arc<Shared>,
    events: Receiver<SourceStatus>,
    worker: Option<JoinHandle<()>>,
}

impl GestureFeed {
    pub fn new(config: FeedConfig, cell: LatestCell<GestureMessage>) -> Self {
        let (sender, events) = crossbeam_channel::bounded(STATUS_BACKLOG);
        let shared = Arc::new(Shared {
            stop: AtomicBool::new(false),
            status: Mutex::new(SourceStatus::Idle),
            events: sender,
        });
        Self { config, cell, shared, events, worker: None }
    }

    /// Status changes, in order. Each clone sees every event once overall.
    pub fn events(&self) -> Receiver<SourceStatus> {
        self.events.clone()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl GestureSource for GestureFeed {
    fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Ok(());
        }
        self.shared.stop.store(false, Ordering::Relaxed);
        let config = self.config.clone();
        let cell = self.cell.clone();
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("gesture-feed".into())
            .spawn(move || run_feed(&config, &cell, &shared))?;
        self.worker = Some(handle);
        info!(address = %self.config.address, transport = ?self.config.transport, "gesture feed started");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| "gesture feed thread panicked")?;
            info!("gesture feed stopped");
        }
        Ok(())
    }

    fn status(&self) -> SourceStatus {
        self.shared
            .status
            .lock()
            .map(|s| s.clone())
            .unwrap_or(SourceStatus::Idle)
    }
}

impl Drop for GestureFeed {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("gesture feed shutdown: {e}");
        }
    }
}

enum Session {
    Lines(BufReader<TcpStream>),
    WebSocket(WebSocket<TcpStream>),
}

fn run_feed(config: &FeedConfig, cell: &LatestCell<GestureMessage>, shared: &Shared) {
    let mut backoff = Backoff::new(
        Duration::from_millis(config.initial_backoff_ms),
        Duration::from_millis(config.max_backoff_ms),
    );
    let read_timeout = Duration::from_millis(config.read_timeout_ms.max(1));
    let mut attempt = 0u32;

    while !shared.stopping() {
        attempt += 1;
        shared.report(SourceStatus::Connecting { attempt });
        let reason = match open(config, read_timeout, shared) {
            Ok((session, peer)) => {
                info!(%peer, "gesture feed connected");
                shared.report(SourceStatus::Connected { peer });
                backoff.reset();
                attempt = 0;
                match session {
                    Session::Lines(reader) => read_lines(reader, cell, shared),
                    Session::WebSocket(socket) => read_frames(socket, cell, shared),
                }
            }
            Err(reason) => reason,
        };
        if shared.stopping() {
            break;
        }
        let wait = backoff.next_delay();
        warn!(%reason, retry_in_ms = wait.as_millis() as u64, "gesture feed unavailable");
        shared.report(SourceStatus::Disconnected {
            reason,
            retry_in_ms: wait.as_millis() as u64,
        });
        shared.pause(wait);
    }
    shared.report(SourceStatus::Stopped);
}

fn connect(address: &str) -> std::io::Result<TcpStream> {
    let mut last_err = None;
    for addr in address.to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(ErrorKind::NotFound, format!("{address} resolved to no addresses"))
    }))
}

/// Connect and, for WebSocket, complete the upgrade. Returns the session and
/// the peer address.
fn open(
    config: &FeedConfig,
    read_timeout: Duration,
    shared: &Shared,
) -> std::result::Result<(Session, String), String> {
    let stream = connect(&config.address).map_err(|e| e.to_string())?;
    stream.set_read_timeout(Some(read_timeout)).map_err(|e| e.to_string())?;
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| config.address.clone());
    let session = match config.transport {
        Transport::Lines => Session::Lines(BufReader::new(stream)),
        Transport::WebSocket => Session::WebSocket(handshake(stream, &config.address, shared)?),
    };
    Ok((session, peer))
}

fn handshake(
    stream: TcpStream,
    address: &str,
    shared: &Shared,
) -> std::result::Result<WebSocket<TcpStream>, String> {
    let url = format!("ws://{address}/");
    let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
    let mut pending = tungstenite::client(url.as_str(), stream);
    loop {
        match pending {
            Ok((socket, _response)) => return Ok(socket),
            // The read timeout surfaces as an interrupted handshake; resume it.
            Err(HandshakeError::Interrupted(mid)) => {
                if shared.stopping() {
                    return Err("stopped".into());
                }
                if Instant::now() >= deadline {
                    return Err("websocket handshake timed out".into());
                }
                pending = mid.handshake();
            }
            Err(HandshakeError::Failure(e)) => return Err(format!("websocket handshake failed: {e}")),
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted)
}

fn deliver(text: &str, cell: &LatestCell<GestureMessage>) {
    match parse_message(text) {
        Ok(message) => {
            cell.publish(message);
        }
        Err(e) => debug!("skipping gesture message: {e}"),
    }
}

/// Read until the peer goes away or stop is requested. Returns why it ended.
fn read_lines(
    mut reader: BufReader<TcpStream>,
    cell: &LatestCell<GestureMessage>,
    shared: &Shared,
) -> String {
    let mut line = Vec::new();
    loop {
        if shared.stopping() {
            return "stopped".into();
        }
        // Never read past one byte over the cap; partial lines stay in `line`
        // across timeouts.
        let budget = (MAX_LINE_BYTES + 1 - line.len()) as u64;
        let read = (&mut reader).take(budget).read_until(b'\n', &mut line);
        let complete = line.last() == Some(&b'\n');
        if !complete && line.len() > MAX_LINE_BYTES {
            return format!("line exceeds {MAX_LINE_BYTES} bytes");
        }
        match read {
            Ok(0) => return "peer closed the connection".into(),
            Ok(_) if complete => {
                deliver(&String::from_utf8_lossy(&line), cell);
                line.clear();
            }
            Ok(_) => {}
            Err(e) if is_timeout(&e) => {}
            Err(e) => return e.to_string(),
        }
    }
}

fn read_frames(
    mut socket: WebSocket<TcpStream>,
    cell: &LatestCell<GestureMessage>,
    shared: &Shared,
) -> String {
    loop {
        if shared.stopping() {
            let _ = socket.close(None);
            return "stopped".into();
        }
        match socket.read() {
            Ok(Message::Text(text)) => deliver(&text, cell),
            Ok(Message::Binary(bytes)) => deliver(&String::from_utf8_lossy(&bytes), cell),
            Ok(Message::Close(_)) => return "peer closed the connection".into(),
            // Pings are answered by tungstenite on the next read.
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if is_timeout(&e) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                return "peer closed the connection".into()
            }
            Err(e) => return e.to_string(),
        }
    }
}
