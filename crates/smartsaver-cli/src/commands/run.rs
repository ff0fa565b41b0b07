use std::path::PathBuf;

use clap::Args;
use smartsaver_core::desktop::{CommandSoundPlayer, DesktopNotifier, ScreenSaverActuator};
use smartsaver_core::runtime::{forward_changes, run_loop, Button, LoopEvent, TokioTimers};
use smartsaver_core::{Collaborators, FileSettings, Settings, SettingsStore, SmartSaver};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{info, warn};

use super::menu::menu_json;

#[derive(Args)]
pub struct RunArgs {
    /// Settings file (defaults to ~/.config/monitor-smart-saver/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print controller events as JSON lines on stdout
    #[arg(long)]
    json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(daemon(args));
    // The stdin reader may still be blocked on a read.
    rt.shutdown_background();
    result
}

async fn daemon(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = match args.config {
        Some(path) => path,
        None => Settings::path()?,
    };
    let mut store = FileSettings::open(&path)?;
    store.watch()?;
    let player = store.snapshot().sound_player;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let parts = Collaborators {
        settings: Box::new(store),
        timers: Box::new(TokioTimers::new(tx.clone())),
        notifier: Box::new(DesktopNotifier::spawn()?),
        actuator: Box::new(ScreenSaverActuator::connect().await?),
        sound: Box::new(CommandSoundPlayer::new(player)),
    };
    let mut saver = SmartSaver::new(parts, forward_changes(tx.clone()));

    tokio::spawn(read_presses(tx.clone()));
    let shutdown = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown.send(LoopEvent::Shutdown);
        }
    });
    drop(tx);

    info!(config = %path.display(), "smartsaver running");
    let json = args.json;
    run_loop(
        &mut saver,
        &mut rx,
        || match menu_json() {
            Ok(menu) => println!("{menu}"),
            Err(e) => warn!("cannot render menu: {e}"),
        },
        |event| {
            if json {
                match serde_json::to_string(event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => warn!("cannot serialize event: {e}"),
                }
            }
        },
    )
    .await;
    Ok(())
}

/// Forward stdin lines (`primary`, `secondary`, `quit`, ...) into the loop.
async fn read_presses(tx: UnboundedSender<LoopEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        match line.parse::<Button>() {
            Ok(button) => {
                if tx.send(LoopEvent::Press(button)).is_err() {
                    return;
                }
            }
            Err(e) => warn!("{e}"),
        }
    }
    let _ = tx.send(LoopEvent::Shutdown);
}
