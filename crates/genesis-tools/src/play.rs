use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use genesis_engine::{MonotonicClock, Player, SoundChips};
use tracing::{info, warn};

pub struct PlayOptions {
    pub looping: bool,
    /// Total passes through a looping track, including the first.
    pub plays: Option<u32>,
}

pub fn run(board: &mut dyn SoundChips, files: &[PathBuf], options: &PlayOptions) -> Result<()> {
    let mut player = Player::new(board, MonotonicClock::new());
    player.set_looping(options.looping || options.plays.is_some());
    player.set_loop_limit(options.plays.map(|n| n - 1));

    for file in files {
        player
            .play_path(file)
            .with_context(|| format!("failed to play: {}", file.display()))?;
        info!(
            file = %file.display(),
            duration = ?player.duration(),
            looping = player.looping() && player.has_loop(),
            "playing"
        );

        while player.is_playing() {
            player.update();
            thread::yield_now();
        }

        if let Some(e) = player.last_error() {
            warn!(file = %file.display(), error = %e, "playback ended early");
        }
        info!(
            file = %file.display(),
            position = ?player.position(),
            loops = player.loop_count(),
            "finished"
        );
    }

    player.stop();
    Ok(())
}
