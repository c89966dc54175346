//! Session Events
//!
//! The closed set of server-pushed events the reducer understands.
//! Wire shape is the `{type, data}` envelope; see [`crate::network::protocol`]
//! for how raw frames become these values.

use serde::{Deserialize, Serialize};

use crate::game::stage::Stage;
use crate::game::state::{Player, PlayerId, Song, Vote};

/// Every event kind the server may push, by wire tag.
pub const EVENT_KINDS: [&str; 9] = [
    "join",
    "otherJoin",
    "quit",
    "songSubmitted",
    "vote",
    "updateScores",
    "updateStage",
    "updateGenreRestriction",
    "restart",
];

/// A server-pushed event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Our own join was accepted.
    Join(JoinInfo),
    /// Another player joined.
    OtherJoin(OtherJoinInfo),
    /// A player left the room.
    Quit(QuitInfo),
    /// A player submitted a song.
    SongSubmitted(Song),
    /// A player cast a guess.
    Vote(Vote),
    /// Authoritative scores after a round.
    UpdateScores(ScoreUpdate),
    /// Server moved the round to a new stage.
    UpdateStage(StageUpdate),
    /// Genre filter for the coming round.
    UpdateGenreRestriction(GenreRestrictionUpdate),
    /// Host started a new game.
    Restart(RestartInfo),
}

impl SessionEvent {
    /// Wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Join(_) => "join",
            SessionEvent::OtherJoin(_) => "otherJoin",
            SessionEvent::Quit(_) => "quit",
            SessionEvent::SongSubmitted(_) => "songSubmitted",
            SessionEvent::Vote(_) => "vote",
            SessionEvent::UpdateScores(_) => "updateScores",
            SessionEvent::UpdateStage(_) => "updateStage",
            SessionEvent::UpdateGenreRestriction(_) => "updateGenreRestriction",
            SessionEvent::Restart(_) => "restart",
        }
    }

    /// Whether `tag` names one of the known event kinds.
    pub fn is_known_kind(tag: &str) -> bool {
        EVENT_KINDS.contains(&tag)
    }
}

/// Join confirmation for the local player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    /// Id the server assigned to us.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// Rounds in the game.
    pub rounds: u32,
    /// Genre filter for the first round.
    #[serde(rename = "genreRestriction", default)]
    pub genre_restriction: String,
    /// Whether we host the room.
    pub host: bool,
    /// Players already in the room, in their join order.
    #[serde(rename = "existingPlayers", default)]
    pub existing_players: Vec<Player>,
}

/// Another player joined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherJoinInfo {
    /// Their id.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// Their display name.
    #[serde(rename = "playerName")]
    pub player_name: String,
}

/// A player disconnected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuitInfo {
    /// Who left.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
}

/// One entry of a score update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player being scored.
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    /// Replacement score.
    #[serde(rename = "newScore")]
    pub new_score: u32,
}

/// Authoritative scores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    /// Replacement scores, one per player.
    #[serde(rename = "newScores")]
    pub new_scores: Vec<ScoreEntry>,
}

/// Stage change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageUpdate {
    /// Stage the server moved to.
    #[serde(rename = "newStage")]
    pub new_stage: Stage,
}

/// Genre filter change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRestrictionUpdate {
    /// New filter. Empty means none.
    #[serde(rename = "genreRestriction")]
    pub genre_restriction: String,
}

/// New game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartInfo {
    /// Rounds in the new game.
    pub rounds: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_serialized_tag() {
        let events = vec![
            SessionEvent::Quit(QuitInfo { player_id: PlayerId::new(3) }),
            SessionEvent::UpdateStage(StageUpdate { new_stage: Stage::Voting }),
            SessionEvent::UpdateGenreRestriction(GenreRestrictionUpdate {
                genre_restriction: "rock".to_string(),
            }),
            SessionEvent::Restart(RestartInfo { rounds: 2 }),
        ];

        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
            assert!(SessionEvent::is_known_kind(event.kind()));
        }
    }

    #[test]
    fn test_join_defaults_optional_fields() {
        let json = r#"{"type":"join","data":{"playerID":1,"rounds":3,"host":true}}"#;
        let event: SessionEvent = serde_json::from_str(json).unwrap();

        if let SessionEvent::Join(info) = event {
            assert!(info.existing_players.is_empty());
            assert!(info.genre_restriction.is_empty());
        } else {
            panic!("Wrong event type");
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(!SessionEvent::is_known_kind("submitSong"));
        assert!(!SessionEvent::is_known_kind("error"));
    }
}
