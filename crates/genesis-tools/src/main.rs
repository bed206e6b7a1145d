use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use genesis_engine::BoardConfig;
use genesis_engine::bridge::{DEFAULT_TCP_PORT, DEFAULT_UNIX_SOCKET};
use tracing_subscriber::EnvFilter;

mod board;
mod bridge;
mod hw_test;
mod info;
mod play;

/// genesis sound board tools
#[derive(Parser)]
#[command(
    name = "genesis",
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    /// Board wiring file (TOML); defaults to the reference board
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header fields and command statistics for a VGM file (.vgm or .vgz)
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Play VGM files on the board, one after another
    Play {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
        /// Loop tracks that have a loop point until interrupted
        #[arg(long = "loop")]
        looping: bool,
        /// Play each looping track this many times, then move on
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        plays: Option<u32>,
        /// Drive a logging back end instead of the hardware
        #[arg(long)]
        dry_run: bool,
    },
    /// Accept emulator bridge connections and forward their writes to the board
    Bridge {
        /// TCP port to listen on
        #[arg(long, default_value_t = DEFAULT_TCP_PORT)]
        port: u16,
        /// Listen on a Unix socket instead of TCP
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_UNIX_SOCKET)]
        unix: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Reset the board and play a short PSG beep and FM tone
    HwTest {
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&PathBuf>) -> Result<BoardConfig> {
    match path {
        Some(path) => BoardConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display())),
        None => Ok(BoardConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { file } => {
            info::run(&file)?;
        }
        Commands::Play {
            files,
            looping,
            plays,
            dry_run,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let options = play::PlayOptions { looping, plays };
            board::with_board(&config, dry_run, |chips| {
                play::run(chips, &files, &options)
            })?;
        }
        Commands::Bridge {
            port,
            unix,
            dry_run,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let listen = match unix {
                Some(path) => bridge::Listen::Unix(path),
                None => bridge::Listen::Tcp(port),
            };
            board::with_board(&config, dry_run, |chips| {
                bridge::run(chips, &listen, config.board_id)
            })?;
        }
        Commands::HwTest { dry_run } => {
            let config = load_config(cli.config.as_ref())?;
            board::with_board(&config, dry_run, hw_test::run)?;
        }
    }

    Ok(())
}
