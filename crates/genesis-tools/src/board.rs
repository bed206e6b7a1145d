use anyhow::Result;
use genesis_engine::board::TraceIo;
use genesis_engine::{BoardConfig, GenesisBoard, SoundChips};
use tracing::info;

/// Bring up the board and hand it to `f`.
///
/// Without the `rpi` feature every run is a dry run.
pub fn with_board<R>(
    config: &BoardConfig,
    dry_run: bool,
    f: impl FnOnce(&mut dyn SoundChips) -> Result<R>,
) -> Result<R> {
    if dry_run {
        return with_trace_board(f);
    }

    #[cfg(feature = "rpi")]
    {
        use anyhow::Context;
        use genesis_engine::board::RppalIo;

        let io = RppalIo::open(config).context("failed to initialise board hardware")?;
        info!(board_id = config.board_id, "hardware board ready");
        let mut board = GenesisBoard::begin(io);
        let result = f(&mut board);
        board.mute_all();
        result
    }

    #[cfg(not(feature = "rpi"))]
    {
        tracing::warn!(
            board_id = config.board_id,
            "built without the rpi feature, using the trace back end"
        );
        with_trace_board(f)
    }
}

fn with_trace_board<R>(f: impl FnOnce(&mut dyn SoundChips) -> Result<R>) -> Result<R> {
    let mut board = GenesisBoard::begin(TraceIo::new());
    let result = f(&mut board);
    let stats = board.io().stats();
    info!(
        line_changes = stats.line_changes,
        bytes_shifted = stats.bytes_shifted,
        bus_time_us = stats.delayed_us,
        "dry run finished"
    );
    result
}
