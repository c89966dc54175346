//! Game Session
//!
//! Ties one store to one connection. Inbound frames are decoded and applied
//! strictly one at a time; each is fully reduced before the next is read.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::game::reducer::Outcome;
use crate::game::state::SessionState;
use crate::game::store::SessionStore;
use crate::network::actions::ActionSubmitter;
use crate::network::protocol::{decode_event, ProtocolError};
use crate::network::transport::{CommandSink, TransportEvent};

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Transport reported the connection closed.
    Disconnected {
        /// Cause reported by the transport.
        reason: String,
    },
    /// Event channel dropped without a close notice.
    ChannelClosed,
}

/// A joined (or joining) room session.
pub struct GameSession<S: CommandSink> {
    store: SessionStore,
    sink: S,
    rejection: Option<String>,
}

impl<S: CommandSink> GameSession<S> {
    /// Wrap a store and the sink its actions go out on.
    pub fn new(store: SessionStore, sink: S) -> Self {
        Self {
            store,
            sink,
            rejection: None,
        }
    }

    /// Current aggregate.
    pub fn state(&self) -> &SessionState {
        self.store.state()
    }

    /// Underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Outbound sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Message from a server `error` frame, if one arrived.
    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    /// Submit local actions against this session.
    pub fn actions(&mut self) -> ActionSubmitter<'_, S> {
        ActionSubmitter::new(&mut self.store, &self.sink)
    }

    /// Decode and apply one text frame.
    ///
    /// Bad frames are logged and dropped; `None` means nothing reached the
    /// reducer.
    pub fn handle_frame(&mut self, text: &str) -> Option<Outcome> {
        match decode_event(text) {
            Ok(event) => Some(self.store.apply(&event)),
            Err(ProtocolError::ServerRejected(message)) => {
                warn!("Server rejected session: {}", message);
                self.rejection = Some(message);
                None
            }
            Err(e) => {
                warn!("Dropping frame: {}", e);
                debug!("Frame was: {}", text);
                None
            }
        }
    }

    /// Handle one transport event. Returns the end reason once the
    /// connection is gone.
    pub fn handle(&mut self, event: TransportEvent) -> Option<SessionEnd> {
        match event {
            TransportEvent::Frame(text) => {
                self.handle_frame(&text);
                None
            }
            TransportEvent::Closed { reason } => {
                info!("Session for room {} ended: {}", self.state().room_id, reason);
                Some(SessionEnd::Disconnected { reason })
            }
        }
    }

    /// Consume transport events until the connection ends.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<TransportEvent>) -> SessionEnd {
        while let Some(event) = events.recv().await {
            if let Some(end) = self.handle(event) {
                return end;
            }
        }
        info!("Event channel closed");
        SessionEnd::ChannelClosed
    }
}
