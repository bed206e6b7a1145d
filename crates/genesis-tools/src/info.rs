use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::NOTHING};
use genesis_engine::vgm::VGM_SAMPLE_RATE;
use genesis_engine::{ByteSource, Command, FmPort, VgmHeader, VgmParser, open_path};

#[derive(Debug, Default)]
struct CommandStats {
    psg_writes: u64,
    fm_writes: [u64; 2],
    dac_writes: u64,
    waits: u64,
    wait_samples: u64,
    data_blocks: u64,
    pcm_bytes: u64,
    pcm_seeks: u64,
    skipped: u64,
}

impl CommandStats {
    fn record(&mut self, command: &Command) {
        match command {
            Command::PsgWrite(_) => self.psg_writes += 1,
            Command::FmWrite { port, .. } => self.fm_writes[port.index() as usize] += 1,
            Command::Wait(_) => self.waits += 1,
            Command::DataBlock { data_type, size } => {
                self.data_blocks += 1;
                if *data_type == 0 {
                    self.pcm_bytes += *size as u64;
                }
            }
            Command::PcmSeek(_) => self.pcm_seeks += 1,
            Command::DacWrite { .. } => self.dac_writes += 1,
            Command::Skipped { .. } => self.skipped += 1,
            Command::EndOfStream => {}
        }
        self.wait_samples += command.wait_samples() as u64;
    }
}

/// Print the header and walk the command stream once.
pub fn run(path: &Path) -> Result<()> {
    let mut source = open_path(path);
    source
        .open()
        .with_context(|| format!("failed to open: {}", path.display()))?;
    let mut parser = VgmParser::new(source);
    let header = parser
        .parse_header()
        .with_context(|| format!("failed to parse VGM header: {}", path.display()))?;

    let mut stats = CommandStats::default();
    for command in parser.by_ref() {
        let command = command.with_context(|| format!("failed to parse: {}", path.display()))?;
        stats.record(&command);
    }
    let pcm_bank = parser.pcm_bank().len();
    parser.into_source().close();

    println!("{}", header_table(path, &header));
    println!();
    println!("{}", stats_table(&stats, pcm_bank));
    Ok(())
}

fn new_table(title: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(title), Cell::new("")]);
    table
}

fn offset(position: Option<u64>) -> String {
    position.map_or_else(|| "-".to_string(), |p| format!("0x{p:08X}"))
}

fn clock(hz: u32) -> String {
    if hz == 0 {
        "-".to_string()
    } else {
        format!("{hz} Hz")
    }
}

fn header_table(path: &Path, header: &VgmHeader) -> Table {
    let mut table = new_table("Header");
    table.add_row(vec![Cell::new("File"), Cell::new(path.display())]);
    table.add_row(vec![
        Cell::new("Version"),
        Cell::new(header.version_string()),
    ]);
    table.add_row(vec![Cell::new("SN76489"), Cell::new(clock(header.psg_clock))]);
    let fm_clock = if header.has_fm() { header.fm_clock } else { 0 };
    table.add_row(vec![Cell::new("YM2612"), Cell::new(clock(fm_clock))]);
    table.add_row(vec![
        Cell::new("Duration"),
        Cell::new(format!(
            "{:.2?} ({} samples)",
            header.duration(),
            header.total_samples
        )),
    ]);
    let looped = if header.has_loop() {
        format!(
            "{:.2?} ({} samples)",
            header.loop_duration(),
            header.loop_samples
        )
    } else {
        "none".to_string()
    };
    table.add_row(vec![Cell::new("Loop"), Cell::new(looped)]);
    table.add_row(vec![
        Cell::new("Loop offset"),
        Cell::new(offset(header.loop_start())),
    ]);
    table.add_row(vec![
        Cell::new("Data offset"),
        Cell::new(offset(Some(header.data_start()))),
    ]);
    table.add_row(vec![
        Cell::new("GD3 offset"),
        Cell::new(offset(header.gd3_position())),
    ]);
    table.add_row(vec![
        Cell::new("EOF offset"),
        Cell::new(offset(header.eof_position())),
    ]);
    if header.rate != 0 {
        table.add_row(vec![
            Cell::new("Rate"),
            Cell::new(format!("{} Hz", header.rate)),
        ]);
    }
    table
}

fn stats_table(stats: &CommandStats, pcm_bank: usize) -> Table {
    let mut table = new_table("Commands");
    let rows: [(&str, String); 9] = [
        ("PSG writes", stats.psg_writes.to_string()),
        (
            "FM writes",
            format!(
                "{} (port 0: {}, port 1: {})",
                stats.fm_writes.iter().sum::<u64>(),
                stats.fm_writes[FmPort::Port0.index() as usize],
                stats.fm_writes[FmPort::Port1.index() as usize]
            ),
        ),
        ("DAC writes", stats.dac_writes.to_string()),
        ("Waits", stats.waits.to_string()),
        (
            "Stream length",
            format!(
                "{} samples ({:.2} s)",
                stats.wait_samples,
                stats.wait_samples as f64 / VGM_SAMPLE_RATE as f64
            ),
        ),
        ("Data blocks", stats.data_blocks.to_string()),
        (
            "PCM data",
            format!("{} bytes in blocks, {} in bank", stats.pcm_bytes, pcm_bank),
        ),
        ("PCM seeks", stats.pcm_seeks.to_string()),
        ("Other chips", stats.skipped.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table
}
