//! # WhoChose Client
//!
//! Session synchronization core for the WhoChose music guessing game.
//! Holds the client's copy of the shared room state and keeps it in step
//! with the server's event stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    WHOCHOSE CLIENT                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/           - Pure session state                        │
//! │  ├── state.rs    - Players, songs, votes, session aggregate  │
//! │  ├── stage.rs    - Round stage machine                       │
//! │  ├── events.rs   - Server-pushed events                      │
//! │  ├── reducer.rs  - (state, event) -> state                   │
//! │  ├── store.rs    - Owner of the aggregate                    │
//! │  └── views.rs    - Leaderboard and reveal projections        │
//! │                                                              │
//! │  network/        - Connection to one room                    │
//! │  ├── protocol.rs - Wire envelope codec                       │
//! │  ├── transport.rs- WebSocket reader/writer tasks             │
//! │  ├── actions.rs  - Validated, optimistic user actions        │
//! │  ├── catalog.rs  - Music catalog boundary                    │
//! │  └── session.rs  - Event loop                                │
//! │                                                              │
//! │  config.rs       - Environment configuration                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! The server is authoritative. Every state change, server-pushed or
//! optimistic, goes through [`game::reduce`]:
//! - Roster, song and vote events are idempotent, so echoes are no-ops
//! - Scores are replaced, never added, so a replayed update changes nothing
//! - Events are applied one at a time in arrival order

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use config::{ClientConfig, ConfigError};
pub use game::state::{Player, PlayerId, SessionState, Song, SongId, Vote};
pub use game::stage::Stage;
pub use game::store::SessionStore;
pub use game::events::SessionEvent;
pub use network::session::{GameSession, SessionEnd};
pub use network::transport::Transport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Points for naming a song's submitter correctly.
pub const CORRECT_GUESS_REWARD: u32 = 5;

/// Points a submitter earns per player who guessed them.
pub const CORRECT_GUESS_RECIPIENT_REWARD: u32 = 10;
