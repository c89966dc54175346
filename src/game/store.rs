//! Session State Store
//!
//! Sole owner of the [`SessionState`]. Server events and optimistic local
//! actions both go through the same reducer, which is what makes a server
//! echo of an optimistic change a no-op.

use tracing::{debug, warn};

use crate::game::events::SessionEvent;
use crate::game::reducer::{reduce, Outcome};
use crate::game::state::SessionState;

/// Where an event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventSource {
    /// Pushed by the server.
    Server,
    /// Applied ahead of server confirmation.
    Optimistic,
}

/// Owns the session aggregate and swaps it whole on every update.
#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    applied: u64,
}

impl SessionStore {
    /// Store for a room we are about to join.
    pub fn new(room_id: impl Into<String>, local_player_name: impl Into<String>) -> Self {
        Self::from_state(SessionState::new(room_id, local_player_name))
    }

    /// Store seeded with an existing aggregate.
    pub fn from_state(state: SessionState) -> Self {
        Self { state, applied: 0 }
    }

    /// Current aggregate.
    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Number of events that changed state since creation.
    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    /// Apply a server-pushed event.
    pub fn apply(&mut self, event: &SessionEvent) -> Outcome {
        self.apply_from(event, EventSource::Server)
    }

    /// Apply an event produced locally before the server confirms it.
    pub fn apply_optimistic(&mut self, event: &SessionEvent) -> Outcome {
        self.apply_from(event, EventSource::Optimistic)
    }

    fn apply_from(&mut self, event: &SessionEvent, source: EventSource) -> Outcome {
        let reduction = reduce(&self.state, event);

        if let Some(mismatch) = reduction.stage_mismatch {
            warn!(
                "Server moved {} -> {} but round {}/{} expected {:?}",
                mismatch.from,
                mismatch.declared,
                reduction.state.current_round,
                reduction.state.rounds_limit,
                mismatch.expected,
            );
        }

        match reduction.outcome {
            Outcome::Applied => {
                debug!("Applied {} ({:?})", event.kind(), source);
                self.state = reduction.state;
                self.applied += 1;
            }
            Outcome::Ignored(reason) => {
                debug!("Ignored {} ({:?}): {}", event.kind(), source, reason);
            }
        }

        reduction.outcome
    }

    /// Copy of the aggregate, for rolling back an optimistic change.
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    /// Put back a snapshot taken with [`SessionStore::snapshot`].
    pub fn restore(&mut self, snapshot: SessionState) {
        self.state = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{JoinInfo, OtherJoinInfo};
    use crate::game::reducer::IgnoreReason;
    use crate::game::state::PlayerId;

    fn join_event() -> SessionEvent {
        SessionEvent::Join(JoinInfo {
            player_id: PlayerId::new(1),
            rounds: 3,
            genre_restriction: String::new(),
            host: true,
            existing_players: vec![],
        })
    }

    #[test]
    fn test_join_scenario() {
        let mut store = SessionStore::new("0", "Me");
        assert_eq!(store.apply(&join_event()), Outcome::Applied);

        let state = store.state();
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.rounds_limit, 3);
        assert!(state.is_host);
        assert_eq!(state.stage, crate::game::stage::Stage::SongSelect);
        assert_eq!(store.applied_count(), 1);
    }

    #[test]
    fn test_ignored_event_does_not_count() {
        let mut store = SessionStore::new("0", "Me");
        store.apply(&join_event());
        let bo = SessionEvent::OtherJoin(OtherJoinInfo {
            player_id: PlayerId::new(2),
            player_name: "Bo".to_string(),
        });
        store.apply(&bo);
        assert_eq!(
            store.apply_optimistic(&bo),
            Outcome::Ignored(IgnoreReason::DuplicatePlayer)
        );
        assert_eq!(store.applied_count(), 2);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut store = SessionStore::new("0", "Me");
        let before = store.snapshot();
        store.apply(&join_event());
        assert!(store.state().is_joined());
        store.restore(before);
        assert!(!store.state().is_joined());
    }
}
