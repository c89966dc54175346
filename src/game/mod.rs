//! Game State Module
//!
//! Everything that decides what the shared session looks like. Pure and
//! synchronous; no I/O happens here.
//!
//! ## Module Structure
//!
//! - `state`: Players, songs, votes and the session aggregate
//! - `stage`: Round stage machine
//! - `events`: Server-pushed events
//! - `reducer`: (state, event) -> state
//! - `store`: Owner of the aggregate
//! - `views`: Leaderboard and reveal projections

pub mod state;
pub mod stage;
pub mod events;
pub mod reducer;
pub mod store;
pub mod views;

// Re-export key types
pub use state::{Player, PlayerId, SessionState, Song, SongId, Vote};
pub use stage::Stage;
pub use events::SessionEvent;
pub use reducer::{reduce, IgnoreReason, Outcome, Reduction};
pub use store::SessionStore;
