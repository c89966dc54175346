//! WhoChose Client
//!
//! Headless driver: joins a room and plays from stdin commands.
//!
//! ```text
//! song <json>                 submit a song (Song JSON, submitterID = you)
//! vote <songID> <playerID>    guess who submitted a song
//! done                        finished viewing the reveal
//! restart <rounds>            start a new game (host)
//! board                       print the leaderboard
//! ```

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use whochose::{
    game::views::{leaderboard, round_rewards},
    ClientConfig, GameSession, PlayerId, SessionEnd, SessionStore, Song, SongId, Transport,
    VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("WhoChose client v{}", VERSION);

    let config = ClientConfig::from_env()?;
    let room = config.room()?.to_string();

    let (transport, mut events) = Transport::connect(
        &config.server_url,
        &room,
        &config.player_name,
        config.channel_capacity,
    )
    .await
    .with_context(|| format!("failed to join room {}", room))?;

    let store = SessionStore::new(room, config.player_name.clone());
    let mut session = GameSession::new(store, transport);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let end = loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    break SessionEnd::ChannelClosed;
                };
                let before = (session.state().stage, session.state().players.len());
                if let Some(end) = session.handle(event) {
                    break end;
                }
                log_changes(&session, before);
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        if let Err(e) = run_command(&mut session, line.trim()) {
                            warn!("{}", e);
                        }
                    }
                    None => {
                        info!("stdin closed, leaving room");
                        stdin_open = false;
                        session.sink().close();
                    }
                }
            }
        }
    };

    info!("Session ended: {:?}", end);
    if let Some(message) = session.rejection() {
        bail!("server rejected session: {}", message);
    }
    Ok(())
}

fn log_changes(session: &GameSession<Transport>, (stage, players): (whochose::Stage, usize)) {
    let state = session.state();
    if state.stage != stage {
        info!(
            "Stage {} -> {} (round {}/{})",
            stage, state.stage, state.current_round, state.rounds_limit
        );
    }
    if state.players.len() != players {
        info!("{} players in room {}", state.players.len(), state.room_id);
    }
}

fn run_command(session: &mut GameSession<Transport>, line: &str) -> anyhow::Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "song" => {
            let song: Song = serde_json::from_str(rest).context("song expects Song JSON")?;
            session.actions().submit_song(song)?;
        }
        "vote" => {
            let mut args = rest.split_whitespace();
            let (Some(song), Some(player)) = (args.next(), args.next()) else {
                bail!("usage: vote <songID> <playerID>");
            };
            let song = SongId::new(song.parse().context("bad songID")?);
            let player = PlayerId::new(player.parse().context("bad playerID")?);
            let voter = session
                .state()
                .local_player_id
                .context("not joined yet")?;
            session.actions().submit_vote(player, song, voter)?;
        }
        "done" => session.actions().submit_done_reveal()?,
        "restart" => {
            let rounds: u32 = rest.parse().context("usage: restart <rounds>")?;
            session.actions().submit_restart(rounds)?;
        }
        "board" => {
            let state = session.state();
            let rewards = round_rewards(state);
            for entry in leaderboard(state) {
                let pending = rewards.get(&entry.player.id).copied().unwrap_or(0);
                info!(
                    "{}. {} - {} (+{} this round)",
                    entry.place, entry.player.name, entry.player.score, pending
                );
            }
        }
        other => bail!("unknown command: {}", other),
    }
    Ok(())
}
