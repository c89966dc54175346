//! Session Reducer
//!
//! Pure function from (aggregate, event) to a new aggregate.
//! Duplicate or contradictory events are ignored rather than rejected, so
//! applying the same `otherJoin`, `songSubmitted` or `vote` twice is the same
//! as applying it once.

use crate::game::events::{JoinInfo, SessionEvent};
use crate::game::stage::Stage;
use crate::game::state::{Player, SessionState, Song, Vote};

/// Why an event left the state untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `otherJoin` for a player already on the roster.
    DuplicatePlayer,
    /// `quit` for a player we never saw.
    UnknownPlayer,
    /// `songSubmitted` for a song id already in the pool.
    DuplicateSong,
    /// `songSubmitted` from a player who already has a song this round.
    SubmitterAlreadyHasSong,
    /// `songSubmitted` whose submitter already guessed on that song id.
    ConflictsWithVotes,
    /// `vote` for a (voter, song) pair already recorded.
    DuplicateVote,
    /// `vote` naming a player not on the roster.
    UnknownRecipient,
    /// `vote` cast by the song's own submitter.
    SelfVote,
    /// `updateStage` to the stage we are already in.
    SameStage,
    /// `updateStage` out of `Results`; only `restart` may do that.
    ResultsRequiresRestart,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            IgnoreReason::DuplicatePlayer => "player already on roster",
            IgnoreReason::UnknownPlayer => "unknown player",
            IgnoreReason::DuplicateSong => "song already in pool",
            IgnoreReason::SubmitterAlreadyHasSong => "submitter already has a song this round",
            IgnoreReason::ConflictsWithVotes => "submitter already voted on this song",
            IgnoreReason::DuplicateVote => "vote already recorded",
            IgnoreReason::UnknownRecipient => "vote recipient not on roster",
            IgnoreReason::SelfVote => "voter submitted this song",
            IgnoreReason::SameStage => "already in that stage",
            IgnoreReason::ResultsRequiresRestart => "results can only be left by restart",
        };
        f.write_str(text)
    }
}

/// What applying an event did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// State changed (or the event was a legitimate no-op such as an
    /// empty score update).
    Applied,
    /// State left as it was.
    Ignored(IgnoreReason),
}

/// A stage the server declared that the local bookkeeping did not expect.
///
/// The declared stage is applied anyway; this is informational.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageMismatch {
    /// Stage we were in.
    pub from: Stage,
    /// Stage the server declared.
    pub declared: Stage,
    /// Stage local round counters predicted.
    pub expected: Option<Stage>,
}

/// Result of one reducer step.
#[derive(Clone, Debug)]
pub struct Reduction {
    /// The new aggregate.
    pub state: SessionState,
    /// What happened.
    pub outcome: Outcome,
    /// Set when an applied `updateStage` disagreed with local expectations.
    pub stage_mismatch: Option<StageMismatch>,
}

impl Reduction {
    fn applied(state: SessionState) -> Self {
        Self {
            state,
            outcome: Outcome::Applied,
            stage_mismatch: None,
        }
    }

    fn ignored(state: &SessionState, reason: IgnoreReason) -> Self {
        Self {
            state: state.clone(),
            outcome: Outcome::Ignored(reason),
            stage_mismatch: None,
        }
    }
}

/// Apply one event, producing the next aggregate.
pub fn reduce(state: &SessionState, event: &SessionEvent) -> Reduction {
    match event {
        SessionEvent::Join(info) => Reduction::applied(apply_join(state, info)),

        SessionEvent::OtherJoin(info) => {
            if state.player(info.player_id).is_some() {
                return Reduction::ignored(state, IgnoreReason::DuplicatePlayer);
            }
            let mut next = state.clone();
            next.players.push(Player::new(info.player_id, info.player_name.clone()));
            Reduction::applied(next)
        }

        SessionEvent::Quit(info) => {
            let known = state.player(info.player_id).is_some()
                || state.song_by_submitter(info.player_id).is_some();
            if !known {
                return Reduction::ignored(state, IgnoreReason::UnknownPlayer);
            }
            let mut next = state.clone();
            next.players.retain(|p| p.id != info.player_id);
            next.songs.retain(|s| s.submitter != info.player_id);
            // Votes naming the player stay for the reveal.
            Reduction::applied(next)
        }

        SessionEvent::SongSubmitted(song) => match check_song(state, song) {
            Some(reason) => Reduction::ignored(state, reason),
            None => {
                let mut next = state.clone();
                next.songs.push(song.clone());
                Reduction::applied(next)
            }
        },

        SessionEvent::Vote(vote) => match check_vote(state, vote) {
            Some(reason) => Reduction::ignored(state, reason),
            None => {
                let mut next = state.clone();
                next.votes.push(*vote);
                Reduction::applied(next)
            }
        },

        SessionEvent::UpdateScores(update) => {
            let mut next = state.clone();
            for entry in &update.new_scores {
                if let Some(player) = next.players.iter_mut().find(|p| p.id == entry.player_id) {
                    player.score = entry.new_score;
                }
            }
            Reduction::applied(next)
        }

        SessionEvent::UpdateStage(update) => apply_stage(state, update.new_stage),

        SessionEvent::UpdateGenreRestriction(update) => {
            let mut next = state.clone();
            next.genre_restriction = update.genre_restriction.clone();
            Reduction::applied(next)
        }

        SessionEvent::Restart(info) => {
            let mut next = state.clone();
            next.votes.clear();
            next.songs.clear();
            next.current_round = 0;
            next.stage = Stage::SongSelect;
            next.rounds_limit = info.rounds;
            Reduction::applied(next)
        }
    }
}

/// Seed identity and roster. The local player always comes first.
fn apply_join(state: &SessionState, info: &JoinInfo) -> SessionState {
    let mut next = state.clone();
    next.local_player_id = Some(info.player_id);
    next.rounds_limit = info.rounds;
    next.is_host = info.host;
    next.genre_restriction = info.genre_restriction.clone();

    let own_score = info
        .existing_players
        .iter()
        .find(|p| p.id == info.player_id)
        .map(|p| p.score)
        .unwrap_or(0);

    let mut players = Vec::with_capacity(info.existing_players.len() + 1);
    players.push(Player {
        id: info.player_id,
        name: state.local_player_name.clone(),
        score: own_score,
    });
    for existing in &info.existing_players {
        if players.iter().all(|p| p.id != existing.id) {
            players.push(existing.clone());
        }
    }
    next.players = players;
    next
}

fn check_song(state: &SessionState, song: &Song) -> Option<IgnoreReason> {
    if state.song(song.id).is_some() {
        return Some(IgnoreReason::DuplicateSong);
    }
    if state.song_by_submitter(song.submitter).is_some() {
        return Some(IgnoreReason::SubmitterAlreadyHasSong);
    }
    if state.has_vote(song.submitter, song.id) {
        return Some(IgnoreReason::ConflictsWithVotes);
    }
    None
}

fn check_vote(state: &SessionState, vote: &Vote) -> Option<IgnoreReason> {
    if state.has_vote(vote.voter, vote.song) {
        return Some(IgnoreReason::DuplicateVote);
    }
    if state.player(vote.recipient).is_none() {
        return Some(IgnoreReason::UnknownRecipient);
    }
    // The song may still be in flight; `check_song` rejects it later if the
    // voter turns out to be its submitter.
    if state.song(vote.song).is_some_and(|song| song.submitter == vote.voter) {
        return Some(IgnoreReason::SelfVote);
    }
    None
}

fn apply_stage(state: &SessionState, declared: Stage) -> Reduction {
    let from = state.stage;
    if declared == from {
        return Reduction::ignored(state, IgnoreReason::SameStage);
    }
    if from == Stage::Results {
        return Reduction::ignored(state, IgnoreReason::ResultsRequiresRestart);
    }

    let mut next = state.clone();
    if from.closes_round(declared) {
        next.current_round = next.current_round.saturating_add(1);
        next.songs.clear();
        next.votes.clear();
    }

    let expected = from.successor(next.has_rounds_remaining());
    let stage_mismatch = if expected != Some(declared) {
        Some(StageMismatch { from, declared, expected })
    } else {
        None
    };

    next.stage = declared;
    Reduction {
        state: next,
        outcome: Outcome::Applied,
        stage_mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::{
        GenreRestrictionUpdate, OtherJoinInfo, QuitInfo, RestartInfo, ScoreEntry, ScoreUpdate,
        StageUpdate,
    };
    use crate::game::state::{PlayerId, SongId};
    use proptest::prelude::*;

    fn joined(existing: Vec<Player>) -> SessionState {
        let state = SessionState::new("0", "Me");
        let event = SessionEvent::Join(JoinInfo {
            player_id: PlayerId::new(1),
            rounds: 3,
            genre_restriction: String::new(),
            host: true,
            existing_players: existing,
        });
        reduce(&state, &event).state
    }

    fn song(id: u64, submitter: u32) -> Song {
        Song {
            id: SongId::new(id),
            name: format!("Track {}", id),
            artist: "Artist".to_string(),
            genres: vec!["pop".to_string()],
            cover: String::new(),
            preview_url: String::new(),
            submitter: PlayerId::new(submitter),
        }
    }

    fn vote(voter: u32, recipient: u32, song: u64) -> Vote {
        Vote {
            voter: PlayerId::new(voter),
            recipient: PlayerId::new(recipient),
            song: SongId::new(song),
        }
    }

    fn other_join(id: u32, name: &str) -> SessionEvent {
        SessionEvent::OtherJoin(OtherJoinInfo {
            player_id: PlayerId::new(id),
            player_name: name.to_string(),
        })
    }

    fn stage(new_stage: Stage) -> SessionEvent {
        SessionEvent::UpdateStage(StageUpdate { new_stage })
    }

    /// Three players, songs 10 (by 2) and 20 (by 3), in voting.
    fn voting_room() -> SessionState {
        let mut s = joined(vec![]);
        for event in [
            other_join(2, "Bo"),
            other_join(3, "Cy"),
            SessionEvent::SongSubmitted(song(10, 2)),
            SessionEvent::SongSubmitted(song(20, 3)),
            stage(Stage::Voting),
        ] {
            s = reduce(&s, &event).state;
        }
        s
    }

    #[test]
    fn test_join_seeds_roster() {
        let state = joined(vec![]);
        assert_eq!(state.players.len(), 1);
        assert_eq!(state.rounds_limit, 3);
        assert!(state.is_host);
        assert_eq!(state.stage, Stage::SongSelect);
        assert_eq!(state.local_player().unwrap().name, "Me");
    }

    #[test]
    fn test_join_does_not_duplicate_self() {
        let state = joined(vec![
            Player::new(PlayerId::new(0), "Host"),
            Player { id: PlayerId::new(1), name: "Stale".to_string(), score: 4 },
        ]);
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.players[0].id, PlayerId::new(1));
        assert_eq!(state.players[0].name, "Me");
        assert_eq!(state.players[0].score, 4);
    }

    #[test]
    fn test_other_join_is_idempotent() {
        let once = reduce(&joined(vec![]), &other_join(2, "Bo"));
        let twice = reduce(&once.state, &other_join(2, "Bo"));
        assert_eq!(once.state, twice.state);
        assert_eq!(twice.outcome, Outcome::Ignored(IgnoreReason::DuplicatePlayer));
    }

    #[test]
    fn test_quit_removes_player_and_songs_but_keeps_votes() {
        let mut s = voting_room();
        s = reduce(&s, &SessionEvent::Vote(vote(1, 2, 10))).state;
        let r = reduce(&s, &SessionEvent::Quit(QuitInfo { player_id: PlayerId::new(2) }));

        assert_eq!(r.outcome, Outcome::Applied);
        assert!(r.state.player(PlayerId::new(2)).is_none());
        assert!(r.state.song(SongId::new(10)).is_none());
        assert_eq!(r.state.votes.len(), 1);
    }

    #[test]
    fn test_quit_unknown_player_ignored() {
        let r = reduce(&joined(vec![]), &SessionEvent::Quit(QuitInfo { player_id: PlayerId::new(9) }));
        assert_eq!(r.outcome, Outcome::Ignored(IgnoreReason::UnknownPlayer));
    }

    #[test]
    fn test_duplicate_song_is_noop() {
        let s = joined(vec![]);
        let once = reduce(&s, &SessionEvent::SongSubmitted(song(10, 2))).state;
        let twice = reduce(&once, &SessionEvent::SongSubmitted(song(10, 2)));
        assert_eq!(twice.state.songs.len(), 1);
        assert_eq!(twice.outcome, Outcome::Ignored(IgnoreReason::DuplicateSong));
    }

    #[test]
    fn test_second_song_from_same_submitter_ignored() {
        let s = reduce(&joined(vec![]), &SessionEvent::SongSubmitted(song(10, 2))).state;
        let r = reduce(&s, &SessionEvent::SongSubmitted(song(11, 2)));
        assert_eq!(r.outcome, Outcome::Ignored(IgnoreReason::SubmitterAlreadyHasSong));
    }

    #[test]
    fn test_vote_rules() {
        let s = voting_room();
        let s = reduce(&s, &SessionEvent::Vote(vote(1, 2, 10))).state;

        let dup = reduce(&s, &SessionEvent::Vote(vote(1, 3, 10)));
        assert_eq!(dup.outcome, Outcome::Ignored(IgnoreReason::DuplicateVote));

        let own = reduce(&s, &SessionEvent::Vote(vote(2, 3, 10)));
        assert_eq!(own.outcome, Outcome::Ignored(IgnoreReason::SelfVote));

        let ghost = reduce(&s, &SessionEvent::Vote(vote(3, 42, 10)));
        assert_eq!(ghost.outcome, Outcome::Ignored(IgnoreReason::UnknownRecipient));

    }

    #[test]
    fn test_vote_ahead_of_its_song_is_kept() {
        let mut s = joined(vec![]);
        for event in [other_join(2, "Bo"), other_join(3, "Cy")] {
            s = reduce(&s, &event).state;
        }

        let early = reduce(&s, &SessionEvent::Vote(vote(3, 2, 10)));
        assert_eq!(early.outcome, Outcome::Applied);
        assert_eq!(early.state.votes, vec![vote(3, 2, 10)]);

        let s = reduce(&early.state, &SessionEvent::SongSubmitted(song(10, 2))).state;
        assert_eq!(s.songs.len(), 1);
        assert_eq!(s.votes.len(), 1);

        // Voter arriving as the submitter of the song they guessed on.
        let clash = reduce(&early.state, &SessionEvent::SongSubmitted(song(10, 3)));
        assert_eq!(clash.outcome, Outcome::Ignored(IgnoreReason::ConflictsWithVotes));
    }

    #[test]
    fn test_update_scores_overwrites() {
        let mut s = joined(vec![]);
        s.players[0].score = 5;
        let update = SessionEvent::UpdateScores(ScoreUpdate {
            new_scores: vec![
                ScoreEntry { player_id: PlayerId::new(1), new_score: 15 },
                ScoreEntry { player_id: PlayerId::new(77), new_score: 99 },
            ],
        });
        let r = reduce(&s, &update);
        assert_eq!(r.state.players.len(), 1);
        assert_eq!(r.state.players[0].score, 15);
    }

    #[test]
    fn test_leaving_reveal_closes_round() {
        let mut s = voting_room();
        s = reduce(&s, &SessionEvent::Vote(vote(1, 2, 10))).state;
        s = reduce(&s, &stage(Stage::Reveal)).state;
        assert_eq!(s.current_round, 0);
        assert_eq!(s.songs.len(), 2);

        let r = reduce(&s, &stage(Stage::SongSelect));
        assert_eq!(r.state.current_round, 1);
        assert!(r.state.songs.is_empty());
        assert!(r.state.votes.is_empty());
        assert!(r.stage_mismatch.is_none());
    }

    #[test]
    fn test_server_stage_wins_over_local_expectation() {
        let mut s = voting_room();
        s.rounds_limit = 1;
        s = reduce(&s, &stage(Stage::Reveal)).state;

        // One round played of one: we expect Results, server says SongSelect.
        let r = reduce(&s, &stage(Stage::SongSelect));
        assert_eq!(r.state.stage, Stage::SongSelect);
        let mismatch = r.stage_mismatch.unwrap();
        assert_eq!(mismatch.expected, Some(Stage::Results));
        assert_eq!(mismatch.declared, Stage::SongSelect);
    }

    #[test]
    fn test_results_left_only_by_restart() {
        let mut s = joined(vec![]);
        s.stage = Stage::Results;
        let r = reduce(&s, &stage(Stage::SongSelect));
        assert_eq!(r.outcome, Outcome::Ignored(IgnoreReason::ResultsRequiresRestart));
        assert_eq!(r.state.stage, Stage::Results);
    }

    #[test]
    fn test_same_stage_is_noop() {
        let r = reduce(&voting_room(), &stage(Stage::Voting));
        assert_eq!(r.outcome, Outcome::Ignored(IgnoreReason::SameStage));
    }

    #[test]
    fn test_genre_restriction_overwritten() {
        let r = reduce(
            &joined(vec![]),
            &SessionEvent::UpdateGenreRestriction(GenreRestrictionUpdate {
                genre_restriction: "film".to_string(),
            }),
        );
        assert_eq!(r.state.genre_restriction, "film");
    }

    #[test]
    fn test_restart_resets_round_but_not_scores() {
        let mut s = voting_room();
        s = reduce(&s, &SessionEvent::Vote(vote(1, 2, 10))).state;
        s.players[1].score = 20;
        s.current_round = 2;
        s.stage = Stage::Results;

        let r = reduce(&s, &SessionEvent::Restart(RestartInfo { rounds: 5 }));
        assert_eq!(r.state.stage, Stage::SongSelect);
        assert_eq!(r.state.current_round, 0);
        assert_eq!(r.state.rounds_limit, 5);
        assert!(r.state.songs.is_empty());
        assert!(r.state.votes.is_empty());
        assert_eq!(r.state.players, s.players);
    }

    fn arb_event() -> impl Strategy<Value = SessionEvent> {
        prop_oneof![
            (0u32..5, "[a-z]{1,6}").prop_map(|(id, name)| other_join(id, &name)),
            (0u64..6, 0u32..5).prop_map(|(id, by)| SessionEvent::SongSubmitted(song(id, by))),
            (0u32..5, 0u32..5, 0u64..6)
                .prop_map(|(voter, recipient, s)| SessionEvent::Vote(vote(voter, recipient, s))),
            (0u32..5).prop_map(|id| SessionEvent::Quit(QuitInfo { player_id: PlayerId::new(id) })),
        ]
    }

    proptest! {
        #[test]
        fn prop_roster_song_vote_events_are_idempotent(
            events in proptest::collection::vec(arb_event(), 0..20),
            last in arb_event(),
        ) {
            prop_assume!(!matches!(last, SessionEvent::Quit(_)));
            let mut s = joined(vec![]);
            for e in &events {
                s = reduce(&s, e).state;
            }
            let once = reduce(&s, &last).state;
            let twice = reduce(&once, &last).state;
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_vote_and_song_invariants_hold(
            events in proptest::collection::vec(arb_event(), 0..40),
        ) {
            let mut s = joined(vec![]);
            for e in &events {
                s = reduce(&s, e).state;

                for (i, a) in s.votes.iter().enumerate() {
                    for b in &s.votes[i + 1..] {
                        prop_assert!(!(a.voter == b.voter && a.song == b.song));
                    }
                    if let Some(song) = s.song(a.song) {
                        prop_assert_ne!(a.voter, song.submitter);
                    }
                }
                for (i, a) in s.songs.iter().enumerate() {
                    for b in &s.songs[i + 1..] {
                        prop_assert_ne!(a.submitter, b.submitter);
                    }
                }
            }
        }
    }
}
