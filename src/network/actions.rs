//! Action Submitter
//!
//! Turns user intents into protocol commands. Song and vote submissions are
//! applied to the store before the server confirms them, through the same
//! reducer that later sees the server's copy, so the echo is a no-op.
//! Restart and reveal completion wait for the server.

use thiserror::Error;
use tracing::{debug, info};

use crate::game::events::SessionEvent;
use crate::game::stage::Stage;
use crate::game::state::{PlayerId, Song, SongId, Vote};
use crate::game::store::SessionStore;
use crate::network::catalog::{Catalog, CatalogError};
use crate::network::protocol::{ClientCommand, DoneReveal, RestartRequest};
use crate::network::transport::{CommandSink, ConnectionError};

/// A local action broke a precondition. Nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The server has not confirmed our join yet.
    #[error("not joined to a room yet")]
    NotJoined,

    /// We already have a song this round.
    #[error("already submitted a song this round")]
    AlreadySubmitted,

    /// Someone else picked this track.
    #[error("{0} has already been submitted")]
    SongTaken(SongId),

    /// Song names another player as submitter.
    #[error("song must be submitted by the local player")]
    NotOwnSong,

    /// Song fails the round's genre filter.
    #[error("song must contain genre \"{required}\"; it has: {found}")]
    GenreMismatch {
        /// Active restriction.
        required: String,
        /// The song's genres, comma separated.
        found: String,
    },

    /// Voter named themselves.
    #[error("cannot vote for yourself")]
    SelfVote,

    /// Voter submitted the song being guessed.
    #[error("cannot vote on your own song")]
    OwnSong,

    /// Voter already guessed on this song.
    #[error("already voted on {0}")]
    DuplicateVote(SongId),

    /// Named player is not in the room.
    #[error("unknown {0}")]
    UnknownPlayer(PlayerId),

    /// Song is not in this round's pool.
    #[error("unknown {0}")]
    UnknownSong(SongId),

    /// Action belongs to another stage.
    #[error("only allowed during {expected}, currently {actual}")]
    WrongStage {
        /// Stage the action needs.
        expected: Stage,
        /// Stage we are in.
        actual: Stage,
    },
}

/// Why an action did not go out.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Precondition failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport could not take the command.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Catalog lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Submits actions against one store over one sink.
pub struct ActionSubmitter<'a, S: CommandSink + ?Sized> {
    store: &'a mut SessionStore,
    sink: &'a S,
}

impl<'a, S: CommandSink + ?Sized> ActionSubmitter<'a, S> {
    /// Borrow the store and the outbound sink.
    pub fn new(store: &'a mut SessionStore, sink: &'a S) -> Self {
        Self { store, sink }
    }

    fn ensure_connected(&self) -> Result<(), ConnectionError> {
        if self.sink.is_connected() {
            Ok(())
        } else {
            Err(ConnectionError::NotConnected)
        }
    }

    fn local_player(&self) -> Result<PlayerId, ValidationError> {
        self.store
            .state()
            .local_player_id
            .ok_or(ValidationError::NotJoined)
    }

    /// Check a song against this round's rules without sending it.
    pub fn validate_song(&self, song: &Song) -> Result<(), ValidationError> {
        let local = self.local_player()?;
        let state = self.store.state();

        if song.submitter != local {
            return Err(ValidationError::NotOwnSong);
        }
        if state.song_by_submitter(local).is_some() {
            return Err(ValidationError::AlreadySubmitted);
        }
        if state.song(song.id).is_some() {
            return Err(ValidationError::SongTaken(song.id));
        }
        if !song.matches_genre(&state.genre_restriction) {
            return Err(ValidationError::GenreMismatch {
                required: state.genre_restriction.clone(),
                found: song.genres.join(", "),
            });
        }
        Ok(())
    }

    /// Submit our song for the round.
    pub fn submit_song(&mut self, song: Song) -> Result<(), ActionError> {
        self.ensure_connected()?;
        self.validate_song(&song)?;

        let song_id = song.id;
        let command = ClientCommand::SubmitSong(song.clone());
        self.apply_and_send(SessionEvent::SongSubmitted(song), &command)?;

        info!("Submitted {}", song_id);
        Ok(())
    }

    /// Look a track up in the catalog and submit it as our song.
    pub async fn submit_catalog_track<C: Catalog + ?Sized>(
        &mut self,
        catalog: &C,
        track_id: SongId,
    ) -> Result<(), ActionError> {
        let local = self.local_player()?;
        let song = catalog.track(track_id).await?.into_song(local);
        self.submit_song(song)
    }

    /// Guess that `selected` submitted `song`.
    pub fn submit_vote(
        &mut self,
        selected: PlayerId,
        song: SongId,
        voter: PlayerId,
    ) -> Result<(), ActionError> {
        self.ensure_connected()?;

        let state = self.store.state();
        if !state.is_joined() {
            return Err(ValidationError::NotJoined.into());
        }
        if selected == voter {
            return Err(ValidationError::SelfVote.into());
        }
        if state.has_vote(voter, song) {
            return Err(ValidationError::DuplicateVote(song).into());
        }
        let target = state.song(song).ok_or(ValidationError::UnknownSong(song))?;
        if target.submitter == voter {
            return Err(ValidationError::OwnSong.into());
        }
        if state.player(selected).is_none() {
            return Err(ValidationError::UnknownPlayer(selected).into());
        }

        let vote = Vote {
            voter,
            recipient: selected,
            song,
        };
        self.apply_and_send(SessionEvent::Vote(vote), &ClientCommand::SubmitVote(vote))?;

        info!("Voted {} for {}", selected, song);
        Ok(())
    }

    /// Ask the server to start a new game. State resets when `restart` arrives.
    pub fn submit_restart(&mut self, rounds: u32) -> Result<(), ActionError> {
        self.ensure_connected()?;
        self.sink
            .send(&ClientCommand::SubmitRestart(RestartRequest { rounds }))?;
        info!("Requested restart with {} rounds", rounds);
        Ok(())
    }

    /// Tell the server we are done with the reveal.
    pub fn submit_done_reveal(&mut self) -> Result<(), ActionError> {
        self.ensure_connected()?;
        let player_id = self.local_player()?;
        let stage = self.store.state().stage;
        if stage != Stage::Reveal {
            return Err(ValidationError::WrongStage {
                expected: Stage::Reveal,
                actual: stage,
            }
            .into());
        }

        self.sink
            .send(&ClientCommand::SubmitDoneReveal(DoneReveal { player_id }))?;
        debug!("Reveal done, waiting for other players");
        Ok(())
    }

    /// Optimistically apply `event`, then send `command`. Rolls the store
    /// back if the send fails.
    fn apply_and_send(
        &mut self,
        event: SessionEvent,
        command: &ClientCommand,
    ) -> Result<(), ConnectionError> {
        let snapshot = self.store.snapshot();
        self.store.apply_optimistic(&event);

        if let Err(e) = self.sink.send(command) {
            self.store.restore(snapshot);
            return Err(e);
        }
        Ok(())
    }
}
