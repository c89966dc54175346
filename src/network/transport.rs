//! WebSocket Transport
//!
//! One persistent connection per (room, player name). A reader task forwards
//! text frames, in arrival order, to a bounded channel; a writer task drains
//! outbound JSON onto the socket. Commands are fire-and-forget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, instrument, warn};

use crate::network::protocol::{ClientCommand, Handshake};

/// Transport failures. None of these are fatal to the process.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// No open connection.
    #[error("not connected")]
    NotConnected,

    /// Outbound queue is full.
    #[error("outbound queue full")]
    QueueFull,

    /// Command could not be encoded.
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Something the connection delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame from the server.
    Frame(String),
    /// The connection is gone; nothing more will arrive.
    Closed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Where outbound commands go.
///
/// The action submitter only needs this much of a connection, which keeps
/// it testable without a socket.
pub trait CommandSink {
    /// Whether commands can currently be delivered.
    fn is_connected(&self) -> bool;

    /// Queue a command for delivery.
    fn send(&self, command: &ClientCommand) -> Result<(), ConnectionError>;
}

/// A live connection to one room.
pub struct Transport {
    room_id: String,
    player_name: String,
    connected: Arc<AtomicBool>,
    outgoing: mpsc::Sender<String>,
    shutdown: Arc<Notify>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Transport {
    /// WebSocket URL for a room.
    pub fn room_url(server_url: &str, room_id: &str) -> String {
        format!("{}/ws/{}", server_url.trim_end_matches('/'), room_id)
    }

    /// Open the connection and send the join handshake.
    ///
    /// Returns the transport and the receiver of everything the server sends.
    #[instrument(skip(server_url, capacity))]
    pub async fn connect(
        server_url: &str,
        room_id: &str,
        player_name: &str,
        capacity: usize,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), ConnectionError> {
        let url = Self::room_url(server_url, room_id);
        info!("Connecting to {}...", url);

        let (mut ws_stream, _) = connect_async(url.as_str()).await?;

        let hello = Handshake {
            name: player_name.to_string(),
        };
        ws_stream.send(Message::Text(hello.to_json()?)).await?;
        info!("WebSocket connected, joined as {}", player_name);

        let (mut write, mut read) = ws_stream.split();
        let capacity = capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(capacity);
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(capacity);
        let connected = Arc::new(AtomicBool::new(true));
        let shutdown = Arc::new(Notify::new());

        // Reader task: forward frames in order
        let reader_connected = connected.clone();
        let reader = tokio::spawn(async move {
            let reason = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if event_tx.send(TransportEvent::Frame(text)).await.is_err() {
                            break "session dropped".to_string();
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "server closed connection".to_string());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("WebSocket read error: {}", e);
                        break e.to_string();
                    }
                    None => break "connection ended".to_string(),
                }
            };

            reader_connected.store(false, Ordering::SeqCst);
            info!("Reader task ended: {}", reason);
            let _ = event_tx.send(TransportEvent::Closed { reason }).await;
        });

        // Writer task: drain outbound queue
        let writer_connected = connected.clone();
        let writer_shutdown = shutdown.clone();
        let writer = tokio::spawn(async move {
            let mut draining = false;
            loop {
                let next = tokio::select! {
                    next = outgoing_rx.recv() => next,
                    _ = writer_shutdown.notified(), if !draining => {
                        // No new intake; recv() still yields what is queued.
                        outgoing_rx.close();
                        draining = true;
                        continue;
                    }
                };
                let Some(json) = next else {
                    break;
                };
                debug!("Sending: {}", json);
                if let Err(e) = write.send(Message::Text(json)).await {
                    error!("Failed to send message: {}", e);
                    writer_connected.store(false, Ordering::SeqCst);
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Writer loop ended");
        });

        Ok((
            Self {
                room_id: room_id.to_string(),
                player_name: player_name.to_string(),
                connected,
                outgoing: outgoing_tx,
                shutdown,
                reader,
                writer,
            },
            event_rx,
        ))
    }

    /// Room this connection belongs to.
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    /// Leave the room.
    ///
    /// New sends fail at once. Commands already queued are still written,
    /// then the socket is closed; the event channel reports `Closed` once
    /// the server acknowledges.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("{} leaving room {}", self.player_name, self.room_id);
        }
        self.shutdown.notify_one();
    }
}

impl CommandSink for Transport {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn send(&self, command: &ClientCommand) -> Result<(), ConnectionError> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }
        let json = command.to_json()?;
        self.outgoing.try_send(json).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                warn!("Outbound queue full, dropping {}", command.kind());
                ConnectionError::QueueFull
            }
            mpsc::error::TrySendError::Closed(_) => {
                self.connected.store(false, Ordering::SeqCst);
                ConnectionError::NotConnected
            }
        })
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}
