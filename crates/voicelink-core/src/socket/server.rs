//! Unix domain socket server speaking newline-delimited JSON.
//!
//! Accepts connections from the native helper process, validates inbound
//! envelopes, and surfaces them as typed [`SocketEvent`]s. Outbound traffic
//! goes through [`SocketServer::broadcast`] / [`SocketServer::send_to_client`].

use crate::{
    CoreError, CoreResult,
    message::{Envelope, now_millis},
    socket::LineDecoder,
};

use std::{
    collections::HashMap,
    panic::Location,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use error_location::ErrorLocation;
use serde_json::Value;
use tokio::{
    io::AsyncWriteExt,
    net::UnixListener,
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

/// Typed notifications emitted by the socket server.
#[derive(Debug)]
pub enum SocketEvent {
    /// A client finished connecting.
    ClientConnected {
        /// Identifier of the new client.
        client_id: u64,
    },
    /// A client disconnected or was evicted.
    ClientDisconnected {
        /// Identifier of the removed client.
        client_id: u64,
    },
    /// A validated envelope arrived from a client.
    Message {
        /// Identifier of the sending client.
        client_id: u64,
        /// The decoded envelope.
        envelope: Envelope,
    },
}

/// Book-keeping for one live client connection.
///
/// Owned exclusively by the server; created on accept, destroyed on socket
/// close/error or write-failure eviction.
struct ClientRecord {
    outbound: mpsc::UnboundedSender<String>,
    connected_at: i64,
    last_activity: i64,
    reader: Option<JoinHandle<()>>,
}

type ClientTable = Arc<Mutex<HashMap<u64, ClientRecord>>>;

/// Newline-delimited JSON server over a Unix domain socket.
///
/// One socket path serves arbitrarily many concurrent clients; in practice
/// a single native helper connects. Constructed once at process startup and
/// passed by reference to the orchestrator.
pub struct SocketServer {
    path: PathBuf,
    clients: ClientTable,
    events: mpsc::UnboundedSender<SocketEvent>,
    next_client_id: Arc<AtomicU64>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl SocketServer {
    /// Create a server for `path` plus the receiver its events surface on.
    ///
    /// The receiver exists before [`SocketServer::start`] runs, so no event
    /// can be emitted without a subscriber wired up.
    pub fn new(path: PathBuf) -> (Self, mpsc::UnboundedReceiver<SocketEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let server = Self {
            path,
            clients: Arc::new(Mutex::new(HashMap::new())),
            events,
            next_client_id: Arc::new(AtomicU64::new(0)),
            accept_task: Mutex::new(None),
        };
        (server, events_rx)
    }

    /// The filesystem path this server binds.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Bind the socket and begin accepting clients.
    ///
    /// A stale socket file left behind by an unclean shutdown is removed
    /// before binding. Bind failures are returned to the caller and logged,
    /// not retried.
    #[instrument(skip(self))]
    pub async fn start(&self) -> CoreResult<PathBuf> {
        let mut accept_slot = self.accept_task.lock().await;
        if accept_slot.is_some() {
            return Ok(self.path.clone());
        }

        // Crash recovery: a prior unclean shutdown can leave the path occupied.
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = ?self.path, "Removed stale socket file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove stale socket file"),
        }

        let listener = UnixListener::bind(&self.path).map_err(|e| CoreError::SocketStartup {
            path: self.path.clone(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let clients = Arc::clone(&self.clients);
        let events = self.events.clone();
        let next_client_id = Arc::clone(&self.next_client_id);

        *accept_slot = Some(tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, _addr)) => {
                        let client_id = next_client_id.fetch_add(1, Ordering::SeqCst) + 1;
                        accept_client(client_id, stream, &clients, &events).await;
                    }
                    Err(e) => {
                        warn!(error = %e, "Socket accept failed");
                    }
                }
            }
        }));

        info!(path = ?self.path, "Socket server listening");

        Ok(self.path.clone())
    }

    /// Close every client, stop accepting, and remove the socket file.
    ///
    /// Idempotent: stopping a server that is not running is a no-op.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let mut accept_slot = self.accept_task.lock().await;
        if let Some(task) = accept_slot.take() {
            task.abort();
        }

        let mut table = self.clients.lock().await;
        for (client_id, record) in table.drain() {
            if let Some(reader) = record.reader {
                reader.abort();
            }
            debug!(client_id, "Closed client connection");
        }
        drop(table);

        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(path = ?self.path, "Socket server stopped"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = ?self.path, error = %e, "Failed to remove socket file"),
        }
    }

    /// Send an envelope to every connected client.
    ///
    /// The envelope is serialized once; a client whose outbound channel is
    /// gone is evicted without affecting the others. Returns the number of
    /// clients the message was queued for.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        let Some(line) = encode_line(envelope) else {
            return 0;
        };

        let mut table = self.clients.lock().await;
        let mut failed = Vec::new();
        let mut delivered = 0;

        for (client_id, record) in table.iter() {
            if record.outbound.send(line.clone()).is_ok() {
                delivered += 1;
            } else {
                failed.push(*client_id);
            }
        }

        for client_id in failed {
            evict_locked(&mut table, client_id, &self.events);
        }

        delivered
    }

    /// Send an envelope to one client.
    ///
    /// Returns `false` if the client is unknown or its outbound channel is
    /// gone (the client is evicted in that case).
    pub async fn send_to_client(&self, client_id: u64, envelope: &Envelope) -> bool {
        let Some(line) = encode_line(envelope) else {
            return false;
        };

        let mut table = self.clients.lock().await;
        let Some(record) = table.get(&client_id) else {
            return false;
        };

        if record.outbound.send(line).is_ok() {
            true
        } else {
            evict_locked(&mut table, client_id, &self.events);
            false
        }
    }

    /// Identifiers of the currently connected clients.
    pub async fn client_ids(&self) -> Vec<u64> {
        self.clients.lock().await.keys().copied().collect()
    }

    /// Connection timestamps `(connected_at, last_activity)` for a client.
    pub async fn client_activity(&self, client_id: u64) -> Option<(i64, i64)> {
        self.clients
            .lock()
            .await
            .get(&client_id)
            .map(|r| (r.connected_at, r.last_activity))
    }
}

fn encode_line(envelope: &Envelope) -> Option<String> {
    match serde_json::to_string(envelope) {
        Ok(mut line) => {
            line.push('\n');
            Some(line)
        }
        Err(e) => {
            warn!(error = %e, "Failed to serialize outbound envelope");
            None
        }
    }
}

fn evict_locked(
    table: &mut HashMap<u64, ClientRecord>,
    client_id: u64,
    events: &mpsc::UnboundedSender<SocketEvent>,
) {
    if let Some(record) = table.remove(&client_id) {
        if let Some(reader) = record.reader {
            reader.abort();
        }
        warn!(client_id, "Evicted client after write failure");
        let _ = events.send(SocketEvent::ClientDisconnected { client_id });
    }
}

async fn accept_client(
    client_id: u64,
    stream: tokio::net::UnixStream,
    clients: &ClientTable,
    events: &mpsc::UnboundedSender<SocketEvent>,
) {
    let (read_half, mut write_half) = stream.into_split();
    let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();

    // Writer task: owns the write half, ends when the record (and with it
    // the outbound sender) is dropped, or when a write fails.
    let writer_clients = Arc::clone(clients);
    let writer_events = events.clone();
    tokio::spawn(async move {
        while let Some(line) = outbound_rx.recv().await {
            if let Err(e) = write_half.write_all(line.as_bytes()).await {
                debug!(client_id, error = %e, "Client write failed");
                let mut table = writer_clients.lock().await;
                evict_locked(&mut table, client_id, &writer_events);
                break;
            }
        }
    });

    let now = now_millis();
    {
        let mut table = clients.lock().await;
        table.insert(
            client_id,
            ClientRecord {
                outbound,
                connected_at: now,
                last_activity: now,
                reader: None,
            },
        );
    }

    // Connected notification goes out before the reader starts, so no
    // message from this client can be observed ahead of it.
    info!(client_id, "Client connected");
    let _ = events.send(SocketEvent::ClientConnected { client_id });

    let reader = spawn_reader(client_id, read_half, Arc::clone(clients), events.clone());

    let mut table = clients.lock().await;
    match table.get_mut(&client_id) {
        Some(record) => record.reader = Some(reader),
        // Connection already gone; the reader has nothing left to serve.
        None => reader.abort(),
    }
}

fn spawn_reader(
    client_id: u64,
    read_half: tokio::net::unix::OwnedReadHalf,
    clients: ClientTable,
    events: mpsc::UnboundedSender<SocketEvent>,
) -> JoinHandle<()> {
    use tokio::io::AsyncReadExt;

    tokio::spawn(async move {
        let mut read_half = read_half;
        let mut decoder = LineDecoder::new();
        let mut buf = [0u8; 4096];

        loop {
            match read_half.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    {
                        let mut table = clients.lock().await;
                        if let Some(record) = table.get_mut(&client_id) {
                            record.last_activity = now_millis();
                        }
                    }

                    for line in decoder.push(&buf[..n]) {
                        dispatch_line(client_id, &line, &events);
                    }
                }
                Err(e) => {
                    debug!(client_id, error = %e, "Client read failed");
                    break;
                }
            }
        }

        let mut table = clients.lock().await;
        if table.remove(&client_id).is_some() {
            info!(client_id, "Client disconnected");
            let _ = events.send(SocketEvent::ClientDisconnected { client_id });
        }
    })
}

/// Parse and validate one protocol line, emitting a typed event on success.
///
/// A malformed line is a recoverable per-message error: it is logged and
/// discarded without touching the connection.
fn dispatch_line(client_id: u64, line: &str, events: &mpsc::UnboundedSender<SocketEvent>) {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            warn!(client_id, error = %e, "Discarding malformed protocol line");
            return;
        }
    };

    match Envelope::from_value(&value) {
        Some(envelope) => {
            let _ = events.send(SocketEvent::Message {
                client_id,
                envelope,
            });
        }
        None => {
            warn!(client_id, "Dropping envelope failing validation");
        }
    }
}
