mod commands;
mod terminal;

use crate::commands::{Cli, Command};
use crate::terminal::TerminalDisplay;
use clap::Parser;
use lyrebird_core::{
    load_manifest, progress_label, ClockMedia, CoreError, DurationExt, LoggingConfig,
    LyrebirdConfig, LyricsApply, LyricsDelivery, MediaElement, Player, PlayerEvent, SongTicket,
    SourceLoader,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "Lyrebird";

fn main() {
    let cli = Cli::parse();

    // The log file must be opened before the full config load can report errors
    let log_file = if file_logging_requested(&LyrebirdConfig::config_path()) {
        open_log_file()
    } else {
        None
    };
    init_tracing(log_file);

    let config = match LyrebirdConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            info!(
                "Created a config template at {}; continuing with defaults",
                path.display()
            );
            LyrebirdConfig::default()
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let manifest_location = cli
        .manifest
        .unwrap_or_else(|| config.library.manifest.clone());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let result = runtime.block_on(run(&config, &manifest_location, &cancel_token));

    // The stdin reader sits on a blocking thread that never finishes on its own
    runtime.shutdown_timeout(Duration::from_millis(100));

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
    info!("{APP_NAME} exited");
}

/// What the event loop does after a command
enum Flow {
    Continue,
    Quit,
}

async fn run(
    config: &LyrebirdConfig,
    manifest_location: &str,
    cancel_token: &CancellationToken,
) -> Result<(), CoreError> {
    let loader = Arc::new(SourceLoader::for_manifest(manifest_location)?);
    let manifest = load_manifest(loader.as_ref(), manifest_location).await?;

    let mut media = ClockMedia::new();
    if config.playback.require_audio_files {
        if let Some(dir) = local_manifest_dir(manifest_location) {
            media = media.with_file_check(dir);
        }
    }

    let mut player = Player::new(media, manifest, loader, config.lyrics.resolver());
    tokio::spawn(log_player_events(player.subscribe()));
    player.set_volume(config.playback.volume);

    let mut display = TerminalDisplay::new(
        config.display.viewport_rows,
        config.display.highlight_color,
    );
    let (lyrics_tx, mut lyrics_rx) = mpsc::channel::<LyricsDelivery>(8);

    let mut ticker = tokio::time::interval(config.playback.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    print_song_list(&player);
    println!("Type 'help' for commands.");

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,

            line = stdin_lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let flow = match Command::parse(&line) {
                        Ok(command) => handle_command(&mut player, &lyrics_tx, command).await,
                        Err(e) => {
                            println!("{e}");
                            Flow::Continue
                        }
                    };
                    if matches!(flow, Flow::Quit) {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed; commands disabled");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read from stdin: {}", e);
                    stdin_open = false;
                }
            },

            Some(delivery) = lyrics_rx.recv() => {
                if player.apply_lyrics(delivery) == LyricsApply::Failed {
                    println!("(no lyrics available)");
                }
            },

            _ = ticker.tick() => {
                if player.media_mut().take_ended() {
                    match player.on_ended().await {
                        Ok(ticket) => start_lyrics(&player, &lyrics_tx, ticket),
                        Err(e) => warn!("Failed to advance to the next song: {}", e),
                    }
                }

                if let Some(frame) = render_tick(&player, &mut display) {
                    println!("{frame}\n");
                }
            },
        }
    }

    Ok(())
}

async fn handle_command(
    player: &mut Player<ClockMedia>,
    lyrics_tx: &mpsc::Sender<LyricsDelivery>,
    command: Command,
) -> Flow {
    let started = match command {
        Command::Play { number } => player.play_song(number - 1).await,
        Command::Toggle => player.toggle_play_pause().await,
        Command::Next => player.next_song().await,
        Command::Loop => {
            player.toggle_loop();
            println!("{}", player.state().loop_status());
            Ok(None)
        }
        Command::Seek { position } => {
            if player.state().current_song().is_some() {
                player.seek(position);
            } else {
                println!("Nothing is playing");
            }
            Ok(None)
        }
        Command::Vol { percent } => {
            player.set_volume(percent);
            println!("Volume {percent}%");
            Ok(None)
        }
        Command::List => {
            print_song_list(player);
            Ok(None)
        }
        Command::Status => {
            print_status(player);
            Ok(None)
        }
        Command::Quit => return Flow::Quit,
    };

    match started {
        Ok(ticket) => start_lyrics(player, lyrics_tx, ticket),
        Err(e) => println!("{e}"),
    }
    Flow::Continue
}

/// Render the lyric window and progress row; `None` if nothing changed on screen
fn render_tick(player: &Player<ClockMedia>, display: &mut TerminalDisplay) -> Option<String> {
    player.state().current_song()?;

    player.on_time_update(display);
    let media = player.media();
    display.set_progress(media.current_time(), media.duration());
    display.take_frame()
}

/// Announce a newly started song and fetch its lyrics in the background.
/// The previous song's lines stay up until the new ones arrive.
fn start_lyrics(
    player: &Player<ClockMedia>,
    lyrics_tx: &mpsc::Sender<LyricsDelivery>,
    ticket: Option<SongTicket>,
) {
    let Some(ticket) = ticket else {
        return;
    };

    if let Some(song) = player.manifest().get(ticket.song_index) {
        println!("Now playing: {}", song.title);
    }

    let fetch = player.fetch_lyrics(ticket);
    let tx = lyrics_tx.clone();
    tokio::spawn(async move {
        // Receiver is gone only during shutdown
        let _ = tx.send(fetch.await).await;
    });
}

fn print_song_list(player: &Player<ClockMedia>) {
    let current = player.state().current_song();
    for (i, song) in player.manifest().songs().iter().enumerate() {
        let marker = if current == Some(i) { '*' } else { ' ' };
        println!("{marker} {:>2}. {}", i + 1, song.title);
    }
}

fn print_status(player: &Player<ClockMedia>) {
    let state = player.state();
    let Some(song) = state.current_song().and_then(|i| player.manifest().get(i)) else {
        println!("Nothing is playing");
        return;
    };

    let media = player.media();
    let progress = progress_label(media.current_time(), media.duration());
    let playing = if state.is_playing() { "Playing" } else { "Paused" };

    println!(
        "{playing}: {} [{progress}] {} | volume {:.0}%",
        song.title,
        state.loop_status(),
        media.volume() * 100.0
    );
}

/// Directory local audio files are checked against, for a manifest on disk
fn local_manifest_dir(manifest_location: &str) -> Option<PathBuf> {
    if manifest_location.starts_with("http://") || manifest_location.starts_with("https://") {
        return None;
    }
    Some(
        Path::new(manifest_location)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    )
}

/// Log player events
async fn log_player_events(mut rx: broadcast::Receiver<PlayerEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match &event {
                PlayerEvent::SongStarted { index, title } => {
                    info!("Song started: #{} {}", index + 1, title);
                }
                PlayerEvent::PlaybackPaused { position } => {
                    info!("Playback paused at {}", position.to_clock_string());
                }
                PlayerEvent::PlaybackResumed { position } => {
                    info!("Playback resumed at {}", position.to_clock_string());
                }
                PlayerEvent::PlaybackRejected { index, reason } => {
                    warn!("Playback rejected (song {:?}): {}", index, reason);
                }
                PlayerEvent::TrackEnded { index } => {
                    info!("Song #{} ended", index + 1);
                }
                PlayerEvent::LoopToggled { enabled } => {
                    info!("Looping {}", if *enabled { "on" } else { "off" });
                }
                PlayerEvent::VolumeChanged { volume } => {
                    debug!("Volume set to {:.2}", volume);
                }
                PlayerEvent::Seeked { position } => {
                    info!("Seek to {}", position.to_clock_string());
                }
                PlayerEvent::LyricsLoaded { index, lines } => {
                    debug!("Lyrics for song #{}: {} lines", index + 1, lines);
                }
                PlayerEvent::LyricsNotFound { index, reason } => {
                    info!("No lyrics for song #{}: {}", index + 1, reason);
                }
                PlayerEvent::StaleLyricsDiscarded { index } => {
                    debug!("Dropped late lyrics for song #{}", index + 1);
                }
                PlayerEvent::Progress { .. } => {
                    // Too frequent to log
                }
            },
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!("Event logger lagged by {} messages", n);
            }
        }
    }
}

/// Whether the config at `config_path` asks for a log file.
///
/// Only the `[logging]` table is read so a config with errors elsewhere still
/// gets its log file, where those errors are then reported.
fn file_logging_requested(config_path: &Path) -> bool {
    #[derive(serde::Deserialize)]
    struct LoggingOnly {
        #[serde(default)]
        logging: LoggingConfig,
    }

    std::fs::read_to_string(config_path)
        .ok()
        .and_then(|content| toml::from_str::<LoggingOnly>(&content).ok())
        .is_some_and(|c| c.logging.enabled)
}

/// Truncate and open the log file in the cache directory
fn open_log_file() -> Option<File> {
    let log_path = lyrebird_core::log_file_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    match File::create(&log_path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to create log file at {}: {e}", log_path.display());
            None
        }
    }
}

/// Logs go to stderr, keeping stdout for the lyric frames, plus `log_file` when given
fn init_tracing(log_file: Option<File>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
}
