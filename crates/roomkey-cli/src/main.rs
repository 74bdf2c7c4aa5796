//! Room reader terminal emulator.
//!
//! Runs the terminal core against a real backend over HTTP, with a simulated
//! card reader and mode button driven from stdin. The LCD is redrawn on
//! stdout whenever its content changes.
//!
//! ```text
//! $ roomkey --config terminal.toml
//! > card 04abcdef 101
//! > tap 04abcdef
//! +----------------+
//! |Door Unlocked!  |
//! |Room: 101       |
//! +----------------+
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use roomkey_hardware::LocalInput;
use roomkey_hardware::mock::{MockTransceiver, MockTransceiverHandle};
use roomkey_network::{Backend, HttpBackend, HttpBackendConfig};
use roomkey_terminal::{Terminal, TerminalConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::Command;

/// roomkey - hotel room reader terminal emulator
#[derive(Parser, Debug)]
#[command(name = "roomkey")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reader identity (overrides the file)
    #[arg(long)]
    reader_id: Option<String>,

    /// Initial assigned room (overrides the file)
    #[arg(long)]
    room: Option<String>,

    /// Backend base URL (overrides the file)
    #[arg(long)]
    server_url: Option<String>,

    /// Log level filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn load_config(&self) -> Result<TerminalConfig> {
        let mut config = match &self.config {
            Some(path) => TerminalConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => TerminalConfig::default(),
        };
        if let Some(reader_id) = &self.reader_id {
            config.reader_id.clone_from(reader_id);
        }
        if let Some(room) = &self.room {
            config.room_id.clone_from(room);
        }
        if let Some(url) = &self.server_url {
            config.server_url.clone_from(url);
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.load_config()?;
    let backend = HttpBackend::new(HttpBackendConfig {
        base_url: config.server_url.clone(),
        timeout: config.backend_timeout(),
    })
    .context("failed to create backend client")?;

    let (reader, cards) = MockTransceiver::new();
    let terminal = Terminal::new(&config, reader, backend)?;

    info!(
        reader = %config.reader_id,
        room = %config.room_id,
        server = %config.server_url,
        "Terminal started"
    );
    println!("{}", commands::HELP);
    println!("{}", terminal.display());

    run(terminal, cards, &config).await
}

async fn run<B: Backend>(
    mut terminal: Terminal<MockTransceiver, B>,
    cards: MockTransceiverHandle,
    config: &TerminalConfig,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(config.loop_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shown = terminal.display().to_string();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                terminal.tick().await;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                match commands::parse(&line) {
                    Ok(Some(Command::Quit)) => break,
                    Ok(Some(command)) => execute(command, &mut terminal, &cards).await,
                    Ok(None) => {}
                    Err(e) => println!("error: {e:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
        }

        let frame = terminal.display().to_string();
        if frame != shown {
            println!("{frame}");
            shown = frame;
        }
    }
    Ok(())
}

async fn execute<B: Backend>(
    command: Command,
    terminal: &mut Terminal<MockTransceiver, B>,
    cards: &MockTransceiverHandle,
) {
    match command {
        Command::Card { uid, room } => {
            cards.add_card(uid.to_bytes(), room.clone());
            match room {
                Some(room) => println!("card {uid} registered, holds room {room}"),
                None => println!("card {uid} registered, blank"),
            }
        }
        Command::Tap(uid) => {
            if let Err(e) = cards.present_card(uid.to_bytes()).await {
                warn!(%uid, error = %e, "Card not presented");
                println!("error: {e} (register it first with `card {uid}`)");
            }
        }
        Command::Toggle => terminal.handle_input(LocalInput::ToggleMode),
        Command::Room(raw) => terminal.handle_input(LocalInput::SetRoom(raw)),
        Command::Status => println!("{}", terminal.status()),
        Command::Display => println!("{}", terminal.display()),
        Command::Help => println!("{}", commands::HELP),
        Command::Quit => {}
    }
}
