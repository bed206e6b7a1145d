//! Cooperative playback scheduler.
//!
//! `Player` owns the sound board for the length of a session and paces the
//! parsed command stream against a [`Clock`]. It never sleeps: the host calls
//! [`Player::update`] as often as it can, and each call catches playback up
//! to the number of 44.1 kHz samples that should have elapsed by now.
//!
//! ```text
//! Stopped --play--> Playing --pause--> Paused --resume--> Playing
//! Playing --end of stream--> Finished (or back to the loop point)
//! any --stop--> Stopped
//! ```
mod clock;

pub use clock::{Clock, MonotonicClock};

use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::ParseError;
use crate::board::SoundChips;
use crate::source::{ByteSource, open_path};
use crate::vgm::{Command, VGM_SAMPLE_RATE, VgmHeader, VgmParser, samples_to_duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
    Finished,
}

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("failed to open source: {0}")]
    Open(#[source] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

type BoxedParser = VgmParser<Box<dyn ByteSource>>;

pub struct Player<D, C> {
    board: D,
    clock: C,
    parser: Option<BoxedParser>,
    header: Option<VgmHeader>,
    state: PlaybackState,
    looping: bool,
    loop_limit: Option<u32>,
    start: Duration,
    paused_at: Duration,
    samples_played: u64,
    pending_wait: u64,
    /// `samples_played` at the last loop seek.
    loop_mark: Option<u64>,
    last_error: Option<ParseError>,
}

impl<D: SoundChips, C: Clock> Player<D, C> {
    pub fn new(board: D, clock: C) -> Self {
        Player {
            board,
            clock,
            parser: None,
            header: None,
            state: PlaybackState::Stopped,
            looping: false,
            loop_limit: None,
            start: Duration::ZERO,
            paused_at: Duration::ZERO,
            samples_played: 0,
            pending_wait: 0,
            loop_mark: None,
            last_error: None,
        }
    }

    /// Start playing `source` from the beginning, stopping any current track.
    ///
    /// On error the source is closed and the player stays `Stopped`.
    pub fn play<S: ByteSource + 'static>(&mut self, source: S) -> Result<(), PlayError> {
        self.play_boxed(Box::new(source))
    }

    /// Play a `.vgm` or `.vgz` file.
    pub fn play_path(&mut self, path: impl AsRef<Path>) -> Result<(), PlayError> {
        self.play_boxed(open_path(path))
    }

    fn play_boxed(&mut self, mut source: Box<dyn ByteSource>) -> Result<(), PlayError> {
        if !self.is_stopped() {
            self.stop();
        }
        self.last_error = None;

        source.open().map_err(PlayError::Open)?;
        let mut parser = VgmParser::new(source);
        let header = match parser.parse_header() {
            Ok(header) => header,
            Err(e) => {
                parser.into_source().close();
                return Err(e.into());
            }
        };

        debug!(
            duration = ?header.duration(),
            looping = self.looping && header.has_loop(),
            "playback started"
        );
        self.header = Some(header);
        self.parser = Some(parser);
        self.samples_played = 0;
        self.pending_wait = 0;
        self.loop_mark = None;
        self.start = self.clock.now();
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Execute every command due by now. Does nothing unless playing.
    pub fn update(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }

        let elapsed = self.clock.now().saturating_sub(self.start);
        let target =
            (elapsed.as_nanos() * VGM_SAMPLE_RATE as u128 / 1_000_000_000) as u64;

        while self.samples_played < target {
            if self.pending_wait > 0 {
                let step = self.pending_wait.min(target - self.samples_played);
                self.pending_wait -= step;
                self.samples_played += step;
                continue;
            }

            let Some(parser) = self.parser.as_mut() else {
                self.finish();
                return;
            };

            if parser.is_finished() {
                if !self.restart_loop() {
                    self.finish();
                    return;
                }
                continue;
            }

            match parser.next_command() {
                Ok(command) => {
                    self.pending_wait = command.wait_samples() as u64;
                    self.dispatch(&command);
                }
                Err(e) => {
                    warn!(error = %e, "playback aborted");
                    self.last_error = Some(e);
                    self.finish();
                    return;
                }
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.paused_at = self.clock.now();
            self.state = PlaybackState::Paused;
            debug!(position = ?self.position(), "paused");
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlaybackState::Paused {
            let paused_for = self.clock.now().saturating_sub(self.paused_at);
            self.start += paused_for;
            self.state = PlaybackState::Playing;
            debug!(?paused_for, "resumed");
        }
    }

    /// Silence the chips and release the source. Valid from any state.
    pub fn stop(&mut self) {
        self.board.end_dac_stream();
        self.board.mute_all();
        if let Some(parser) = self.parser.take() {
            parser.into_source().close();
        }
        self.header = None;
        self.samples_played = 0;
        self.pending_wait = 0;
        self.loop_mark = None;
        if self.state != PlaybackState::Stopped {
            debug!(from = ?self.state, "stopped");
        }
        self.state = PlaybackState::Stopped;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Stop looping after the track has looped `limit` times. `None` loops
    /// for as long as looping is enabled.
    pub fn set_loop_limit(&mut self, limit: Option<u32>) {
        self.loop_limit = limit;
    }

    pub fn loop_limit(&self) -> Option<u32> {
        self.loop_limit
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.state == PlaybackState::Stopped
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    /// Playback position, counting every pass through a loop.
    pub fn position(&self) -> Duration {
        samples_to_duration(self.samples_played)
    }

    pub fn position_samples(&self) -> u64 {
        self.samples_played
    }

    /// Length of one pass through the current track.
    pub fn duration(&self) -> Option<Duration> {
        self.header.as_ref().map(VgmHeader::duration)
    }

    pub fn loop_count(&self) -> u32 {
        self.parser.as_ref().map_or(0, VgmParser::loop_count)
    }

    pub fn has_loop(&self) -> bool {
        self.header.as_ref().is_some_and(VgmHeader::has_loop)
    }

    pub fn has_fm(&self) -> bool {
        self.header.as_ref().is_some_and(VgmHeader::has_fm)
    }

    pub fn has_psg(&self) -> bool {
        self.header.as_ref().is_some_and(VgmHeader::has_psg)
    }

    pub fn header(&self) -> Option<&VgmHeader> {
        self.header.as_ref()
    }

    /// The parse error that ended the last track, if any.
    pub fn last_error(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    pub fn board(&self) -> &D {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut D {
        &mut self.board
    }

    /// Stop playback and hand the board back.
    pub fn into_board(mut self) -> D {
        self.stop();
        self.board
    }

    fn dispatch(&mut self, command: &Command) {
        trace!(?command, samples = self.samples_played, "dispatch");
        match *command {
            Command::PsgWrite(value) => {
                if self.has_psg() {
                    self.board.write_psg(value);
                }
            }
            Command::FmWrite {
                port,
                register,
                value,
            } => {
                if self.has_fm() {
                    self.board.write_fm_or_dac(port, register, value);
                }
            }
            Command::DacWrite { sample, .. } => {
                if self.has_fm() {
                    self.board.write_dac(sample);
                }
            }
            _ => {}
        }
    }

    /// Seek back to the loop point if looping applies. Returns `false` when
    /// the track should end instead.
    fn restart_loop(&mut self) -> bool {
        let Some(parser) = self.parser.as_mut() else {
            return false;
        };
        if !self.looping || !parser.has_loop() {
            return false;
        }
        if let Some(limit) = self.loop_limit
            && parser.loop_count() >= limit
        {
            return false;
        }
        // A loop body without waits would spin forever inside one update.
        if self.loop_mark == Some(self.samples_played) {
            warn!("loop section has no waits");
            return false;
        }

        match parser.seek_to_loop() {
            Ok(()) => {
                self.loop_mark = Some(self.samples_played);
                true
            }
            Err(e) => {
                warn!(error = %e, "cannot loop");
                false
            }
        }
    }

    fn finish(&mut self) {
        self.board.end_dac_stream();
        self.state = PlaybackState::Finished;
        debug!(
            samples = self.samples_played,
            loops = self.loop_count(),
            "playback finished"
        );
    }
}
