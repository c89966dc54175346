//! Derived Views
//!
//! Read-only projections over the session aggregate, recomputed on every
//! call. Reward figures here are for display; the authoritative score is
//! whatever `updateScores` last set on each player.

use std::collections::BTreeMap;

use crate::game::state::{Player, PlayerId, SessionState, Song, SongId, Vote};
use crate::{CORRECT_GUESS_RECIPIENT_REWARD, CORRECT_GUESS_REWARD};

/// One row of the leaderboard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardEntry<'a> {
    /// 1-based position.
    pub place: usize,
    /// The player.
    pub player: &'a Player,
}

/// Players by score, highest first.
///
/// Ties keep roster order (join order, local player first), since the sort
/// is stable and there is no secondary key.
pub fn leaderboard(state: &SessionState) -> Vec<LeaderboardEntry<'_>> {
    let mut players: Vec<&Player> = state.players.iter().collect();
    players.sort_by(|a, b| b.score.cmp(&a.score));
    players
        .into_iter()
        .enumerate()
        .map(|(i, player)| LeaderboardEntry { place: i + 1, player })
        .collect()
}

/// A wrong guess on a song.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WrongGuess {
    /// Who guessed.
    pub voter: PlayerId,
    /// Who they named.
    pub guessed: PlayerId,
}

/// Reveal breakdown for one song.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealTally<'a> {
    /// The song.
    pub song: &'a Song,
    /// Its submitter, if still in the room.
    pub submitter: Option<&'a Player>,
    /// Voters who named the submitter, in vote order.
    pub correct: Vec<PlayerId>,
    /// Voters who named someone else.
    pub incorrect: Vec<WrongGuess>,
}

impl RevealTally<'_> {
    /// Points each correct guesser earns from this song.
    pub fn voter_reward(&self) -> u32 {
        CORRECT_GUESS_REWARD
    }

    /// Points the submitter earns from this song.
    pub fn submitter_reward(&self) -> u32 {
        CORRECT_GUESS_RECIPIENT_REWARD * self.correct.len() as u32
    }
}

/// Split a song's votes into correct and incorrect guesses.
pub fn reveal_tally(state: &SessionState, song_id: SongId) -> Option<RevealTally<'_>> {
    let song = state.song(song_id)?;
    let mut correct = Vec::new();
    let mut incorrect = Vec::new();

    for vote in state.votes.iter().filter(|v| v.song == song_id) {
        if vote.is_correct_for(song) {
            correct.push(vote.voter);
        } else {
            incorrect.push(WrongGuess {
                voter: vote.voter,
                guessed: vote.recipient,
            });
        }
    }

    Some(RevealTally {
        song,
        submitter: state.player(song.submitter),
        correct,
        incorrect,
    })
}

/// Points each player earned from the songs of the current round.
///
/// Every player on the roster gets an entry, zero included.
pub fn round_rewards(state: &SessionState) -> BTreeMap<PlayerId, u32> {
    let mut totals: BTreeMap<PlayerId, u32> =
        state.players.iter().map(|p| (p.id, 0)).collect();

    for song in &state.songs {
        if let Some(tally) = reveal_tally(state, song.id) {
            for voter in &tally.correct {
                *totals.entry(*voter).or_insert(0) += tally.voter_reward();
            }
            *totals.entry(song.submitter).or_insert(0) += tally.submitter_reward();
        }
    }

    totals
}

/// Votes cast by `voter` this round.
pub fn votes_by(state: &SessionState, voter: PlayerId) -> Vec<&Vote> {
    state.votes.iter().filter(|v| v.voter == voter).collect()
}

/// Whether `player` already has a song in the pool.
pub fn has_submitted(state: &SessionState, player: PlayerId) -> bool {
    state.song_by_submitter(player).is_some()
}

/// Whether `voter` already guessed on `song`.
pub fn has_voted(state: &SessionState, voter: PlayerId, song: SongId) -> bool {
    state.has_vote(voter, song)
}

/// Players `voter` may name: everyone but themselves.
pub fn vote_candidates(state: &SessionState, voter: PlayerId) -> Vec<&Player> {
    state.players.iter().filter(|p| p.id != voter).collect()
}

/// Whether every player on the roster has a song in the pool.
pub fn all_songs_in(state: &SessionState) -> bool {
    !state.players.is_empty() && state.players.iter().all(|p| has_submitted(state, p.id))
}
