use std::thread;
use std::time::Duration;

use anyhow::Result;
use genesis_engine::board::REG_KEY_ON_OFF;
use genesis_engine::{FmPort, SoundChips};

const TONE: Duration = Duration::from_millis(500);

/// Channel 0 tone at full volume.
const PSG_BEEP: [u8; 3] = [0x8F, 0x0A, 0x90];

/// Channel 1 as a single sine carrier (algorithm 7, operator 4) at A4.
const FM_TONE: [(u8, u8); 9] = [
    (0xB0, 0x07),
    (0x3C, 0x01),
    (0x4C, 0x00),
    (0x5C, 0x1F),
    (0x6C, 0x00),
    (0x7C, 0x00),
    (0x8C, 0x0F),
    (0xA4, 0x22),
    (0xA0, 0x69),
];

pub fn run(board: &mut dyn SoundChips) -> Result<()> {
    board.reset();
    println!("reset done");

    println!("PSG: you should hear a beep");
    for byte in PSG_BEEP {
        board.write_psg(byte);
    }
    thread::sleep(TONE);
    board.write_psg(0x9F);

    println!("YM2612: you should hear an FM tone");
    for (register, value) in FM_TONE {
        board.write_fm(FmPort::Port0, register, value);
    }
    board.write_fm(FmPort::Port0, REG_KEY_ON_OFF, 0xF0);
    thread::sleep(TONE);
    board.write_fm(FmPort::Port0, REG_KEY_ON_OFF, 0x00);

    board.mute_all();
    println!("hardware test complete");
    Ok(())
}
