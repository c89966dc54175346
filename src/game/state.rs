//! Session State Definitions
//!
//! The shared aggregate every screen renders from, plus the entities it owns.
//! Collections keep arrival order; that order is the stable tie-break used by
//! the leaderboard.

use serde::{Deserialize, Serialize};

use crate::game::stage::Stage;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Player identifier, unique within a room.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// Create from the raw server-assigned number.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// Song identifier. This is the catalog track id, so it does not fit in 32 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub u64);

impl SongId {
    /// Create from a raw catalog track id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SongId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "song#{}", self.0)
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A player in the room.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Server-assigned id.
    #[serde(rename = "playerID")]
    pub id: PlayerId,
    /// Display name.
    #[serde(rename = "playerName")]
    pub name: String,
    /// Authoritative score, only ever written by `updateScores`.
    #[serde(default)]
    pub score: u32,
}

impl Player {
    /// A freshly joined player with no points.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            score: 0,
        }
    }
}

/// A track submitted for the current round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Catalog track id.
    #[serde(rename = "songID")]
    pub id: SongId,
    /// Track title.
    pub name: String,
    /// Artist credit.
    pub artist: String,
    /// Genres in catalog order.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Cover art URL.
    #[serde(default)]
    pub cover: String,
    /// Audio preview URL.
    #[serde(rename = "previewURL", default)]
    pub preview_url: String,
    /// Player who picked it.
    #[serde(rename = "submitterID")]
    pub submitter: PlayerId,
}

impl Song {
    /// Case-insensitive substring match of `restriction` against any genre.
    ///
    /// An empty restriction matches every song.
    pub fn matches_genre(&self, restriction: &str) -> bool {
        if restriction.is_empty() {
            return true;
        }
        let wanted = restriction.to_lowercase();
        self.genres
            .iter()
            .any(|genre| genre.to_lowercase().contains(&wanted))
    }
}

/// One player's guess of who submitted a song.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vote {
    /// Player casting the guess.
    #[serde(rename = "voterID")]
    pub voter: PlayerId,
    /// Player the voter thinks submitted the song.
    #[serde(rename = "voteRecipientID")]
    pub recipient: PlayerId,
    /// Song being guessed.
    #[serde(rename = "songID")]
    pub song: SongId,
}

impl Vote {
    /// Whether this vote names the song's real submitter.
    #[inline]
    pub fn is_correct_for(&self, song: &Song) -> bool {
        self.song == song.id && self.recipient == song.submitter
    }
}

// =============================================================================
// SESSION AGGREGATE
// =============================================================================

/// The single source of shared game truth on the client.
///
/// Only [`SessionStore`](crate::game::store::SessionStore) replaces it, and
/// only through the reducer, so a renderer never observes half an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Room identifier from the room code.
    pub room_id: String,
    /// Name the local player connected with.
    pub local_player_name: String,
    /// Local player's id, known once `join` arrives.
    pub local_player_id: Option<PlayerId>,
    /// Whether the local player hosts the room.
    pub is_host: bool,
    /// Current stage of the round.
    pub stage: Stage,
    /// Number of completed rounds.
    pub current_round: u32,
    /// Number of rounds in the game.
    pub rounds_limit: u32,
    /// Genre substring required of submissions. Empty means none.
    pub genre_restriction: String,
    /// Roster in join order.
    pub players: Vec<Player>,
    /// Songs submitted this round, in arrival order.
    pub songs: Vec<Song>,
    /// Votes cast this round, in arrival order.
    pub votes: Vec<Vote>,
}

impl SessionState {
    /// Empty session for a room, before the server has confirmed the join.
    pub fn new(room_id: impl Into<String>, local_player_name: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            local_player_name: local_player_name.into(),
            local_player_id: None,
            is_host: false,
            stage: Stage::SongSelect,
            current_round: 0,
            rounds_limit: 0,
            genre_restriction: String::new(),
            players: Vec::new(),
            songs: Vec::new(),
            votes: Vec::new(),
        }
    }

    /// Whether the server has confirmed our join.
    pub fn is_joined(&self) -> bool {
        self.local_player_id.is_some()
    }

    /// Look up a player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// The local player's roster entry.
    pub fn local_player(&self) -> Option<&Player> {
        self.local_player_id.and_then(|id| self.player(id))
    }

    /// Look up a song in the current round.
    pub fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// The song a player submitted this round, if any.
    pub fn song_by_submitter(&self, submitter: PlayerId) -> Option<&Song> {
        self.songs.iter().find(|s| s.submitter == submitter)
    }

    /// Whether `voter` already guessed on `song`.
    pub fn has_vote(&self, voter: PlayerId, song: SongId) -> bool {
        self.votes.iter().any(|v| v.voter == voter && v.song == song)
    }

    /// Whether a round can still follow the one just revealed.
    pub fn has_rounds_remaining(&self) -> bool {
        self.current_round < self.rounds_limit
    }
}
