use std::path::Path;

use tokio::process::Command;
use tracing::{debug, warn};

use super::SoundPlayer;

/// Plays a file by spawning an external player such as `paplay`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct CommandSoundPlayer {
    program: String,
}

impl CommandSoundPlayer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play_from_file(&self, path: &Path) {
        let mut child = match Command::new(&self.program).arg(path).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %self.program, "failed to start sound player: {e}");
                return;
            }
        };
        let path = path.display().to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!(%path, "sound played"),
                Ok(status) => warn!(%path, %status, "sound player exited with failure"),
                Err(e) => warn!(%path, "sound player failed: {e}"),
            }
        });
    }
}
