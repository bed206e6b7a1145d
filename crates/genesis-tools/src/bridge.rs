use std::net::TcpListener;
use std::path::PathBuf;

use anyhow::{Context, Result};
use genesis_engine::{BridgeSession, SoundChips};
use tracing::{info, warn};

pub enum Listen {
    Tcp(u16),
    Unix(PathBuf),
}

/// Serve bridge peers one at a time until the listener fails.
pub fn run(board: &mut dyn SoundChips, listen: &Listen, board_id: u8) -> Result<()> {
    match listen {
        Listen::Tcp(port) => {
            let listener = TcpListener::bind(("0.0.0.0", *port))
                .with_context(|| format!("failed to listen on port {port}"))?;
            info!(port, "bridge listening on tcp");
            for stream in listener.incoming() {
                let stream = stream.context("accept failed")?;
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(error = %e, "failed to set TCP_NODELAY");
                }
                let peer = stream
                    .peer_addr()
                    .map_or_else(|_| "unknown".to_string(), |a| a.to_string());
                serve(board, stream, board_id, &peer);
            }
        }
        #[cfg(unix)]
        Listen::Unix(path) => {
            use std::os::unix::net::UnixListener;

            if path.exists() {
                std::fs::remove_file(path)
                    .with_context(|| format!("failed to remove stale socket: {}", path.display()))?;
            }
            let listener = UnixListener::bind(path)
                .with_context(|| format!("failed to bind: {}", path.display()))?;
            info!(path = %path.display(), "bridge listening on unix socket");
            for stream in listener.incoming() {
                let stream = stream.context("accept failed")?;
                serve(board, stream, board_id, "unix");
            }
        }
        #[cfg(not(unix))]
        Listen::Unix(_) => anyhow::bail!("unix sockets are not supported on this platform"),
    }
    Ok(())
}

fn serve<T: std::io::Read + std::io::Write>(
    board: &mut dyn SoundChips,
    stream: T,
    board_id: u8,
    peer: &str,
) {
    info!(peer, "peer connected");
    match BridgeSession::new(board, stream).with_board_id(board_id).run() {
        Ok(stats) => info!(
            peer,
            handshakes = stats.handshakes,
            psg_writes = stats.psg_writes,
            fm_writes = stats.fm_writes,
            protocol_errors = stats.protocol_errors,
            "peer disconnected"
        ),
        Err(e) => warn!(peer, error = %e, "session ended with error"),
    }
}
