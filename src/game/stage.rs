//! Round Stage Machine
//!
//! ```text
//! SongSelect → Voting → Reveal ─┬─► SongSelect   (rounds remain)
//!                               └─► Results      (limit reached)
//! Results ──restart──► SongSelect
//! ```
//!
//! Every forward transition is declared by the server. The client only uses
//! these helpers to check that what the server declares is plausible.

use serde::{Deserialize, Serialize};

/// Phase of the current round. Encoded on the wire as `0..=3`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Stage {
    /// Players pick a track.
    #[default]
    SongSelect = 0,
    /// Players guess who picked each track.
    Voting = 1,
    /// Submitters and guesses are shown.
    Reveal = 2,
    /// Final standings.
    Results = 3,
}

impl Stage {
    /// Get stage from its wire index.
    pub fn from_index(index: u8) -> Option<Stage> {
        match index {
            0 => Some(Stage::SongSelect),
            1 => Some(Stage::Voting),
            2 => Some(Stage::Reveal),
            3 => Some(Stage::Results),
            _ => None,
        }
    }

    /// Wire index.
    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The stage that should follow this one.
    ///
    /// `rounds_remaining` only matters when leaving `Reveal`, and must already
    /// count the round being revealed as completed.
    pub fn successor(self, rounds_remaining: bool) -> Option<Stage> {
        match self {
            Stage::SongSelect => Some(Stage::Voting),
            Stage::Voting => Some(Stage::Reveal),
            Stage::Reveal if rounds_remaining => Some(Stage::SongSelect),
            Stage::Reveal => Some(Stage::Results),
            Stage::Results => None,
        }
    }

    /// Whether entering `next` from here closes a round.
    #[inline]
    pub fn closes_round(self, next: Stage) -> bool {
        self == Stage::Reveal && next != Stage::Reveal
    }
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Stage::from_index(value).ok_or_else(|| format!("unknown stage index {}", value))
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage.index()
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::SongSelect => "song-select",
            Stage::Voting => "voting",
            Stage::Reveal => "reveal",
            Stage::Results => "results",
        };
        f.write_str(name)
    }
}
