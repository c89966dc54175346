//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON `{type, data}` envelope. Inbound frames decode into
//! [`SessionEvent`]; outbound commands are [`ClientCommand`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::game::events::SessionEvent;
use crate::game::state::{PlayerId, Song, Vote};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// First frame on a new connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    /// Display name to join with.
    pub name: String,
}

impl Handshake {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Commands sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Submit our song for this round.
    SubmitSong(Song),

    /// Guess who submitted a song.
    SubmitVote(Vote),

    /// Host starts a new game.
    SubmitRestart(RestartRequest),

    /// We finished looking at the reveal.
    SubmitDoneReveal(DoneReveal),
}

/// New game request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRequest {
    /// Rounds in the new game.
    pub rounds: u32,
}

/// Reveal finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoneReveal {
    /// Local player.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

impl ClientCommand {
    /// Wire tag of this command.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientCommand::SubmitSong(_) => "submitSong",
            ClientCommand::SubmitVote(_) => "submitVote",
            ClientCommand::SubmitRestart(_) => "submitRestart",
            ClientCommand::SubmitDoneReveal(_) => "submitDoneReveal",
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Why an inbound frame was dropped.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Envelope has no string `type`.
    #[error("message has no type tag")]
    MissingType,

    /// `type` is outside the known event set.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// Known `type` whose `data` does not fit.
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        /// Event tag.
        kind: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// Server refused us (e.g. unknown room).
    #[error("server rejected connection: {0}")]
    ServerRejected(String),
}

/// Decode one inbound text frame.
///
/// The tag is checked against the closed event set before the payload is
/// looked at, so an unknown kind and a broken payload are told apart.
pub fn decode_event(text: &str) -> Result<SessionEvent, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    if kind == "error" {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no reason given")
            .to_string();
        return Err(ProtocolError::ServerRejected(message));
    }

    if !SessionEvent::is_known_kind(&kind) {
        return Err(ProtocolError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
}

/// Encode an event as the server would send it.
pub fn encode_event(event: &SessionEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
