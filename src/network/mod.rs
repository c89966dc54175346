//! Network Layer
//!
//! WebSocket client for one game room. Everything here feeds `game/`;
//! no state decisions are made in this layer.

pub mod actions;
pub mod catalog;
pub mod protocol;
pub mod session;
pub mod transport;

pub use actions::{ActionError, ActionSubmitter, ValidationError};
pub use catalog::{Catalog, CatalogError, TrackMetadata, TrackSummary};
pub use protocol::{decode_event, encode_event, ClientCommand, Handshake, ProtocolError};
pub use session::{GameSession, SessionEnd};
pub use transport::{CommandSink, ConnectionError, Transport, TransportEvent};
