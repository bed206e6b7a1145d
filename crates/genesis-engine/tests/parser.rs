mod common;

use common::VgmImage;
use genesis_engine::ParseError;
use genesis_engine::source::MemorySource;
use genesis_engine::vgm::{Command, FmPort, VgmHeader, VgmParser};

fn parser(bytes: Vec<u8>) -> VgmParser<MemorySource> {
    let mut parser = VgmParser::new(MemorySource::new(bytes));
    parser.parse_header().expect("header");
    parser
}

fn collect(parser: &mut VgmParser<MemorySource>) -> Vec<Command> {
    parser.map(|c| c.expect("command")).collect()
}

#[test]
fn test_psg_write_without_fm_is_not_remapped() {
    let mut p = parser(VgmImage::psg_only().psg(0x9F).psg(0x90).end().build());
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x90));
}

#[test]
fn test_psg_write_with_both_chips_is_remapped() {
    let mut p = parser(VgmImage::new().psg(0x90).psg(0xDF).psg(0x8F).end().build());
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x92));
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0xDF));
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x8F));
}

#[test]
fn test_short_wait() {
    let mut p = parser(VgmImage::new().raw(&[0x7A]).end().build());
    let cmd = p.next_command().unwrap();
    assert_eq!(cmd, Command::Wait(11));
    assert_eq!(cmd.wait_samples(), 11);
}

#[test]
fn test_wait_commands() {
    let mut p = parser(
        VgmImage::new()
            .wait(0x1234)
            .raw(&[0x62, 0x63, 0x70, 0x7F])
            .end()
            .build(),
    );
    let waits: Vec<u32> = collect(&mut p).iter().map(Command::wait_samples).collect();
    assert_eq!(waits, vec![0x1234, 735, 882, 1, 16]);
}

#[test]
fn test_fm_writes() {
    let mut p = parser(
        VgmImage::new()
            .fm(FmPort::Port0, 0x28, 0xF0)
            .fm(FmPort::Port1, 0xA4, 0x22)
            .end()
            .build(),
    );
    assert_eq!(
        collect(&mut p),
        vec![
            Command::FmWrite {
                port: FmPort::Port0,
                register: 0x28,
                value: 0xF0
            },
            Command::FmWrite {
                port: FmPort::Port1,
                register: 0xA4,
                value: 0x22
            },
        ]
    );
}

#[test]
fn test_dac_write_reads_pcm_bank() {
    let mut p = parser(VgmImage::new().pcm_block(&[0x42, 0x43]).raw(&[0x8C]).end().build());
    assert_eq!(
        p.next_command().unwrap(),
        Command::DataBlock {
            data_type: 0,
            size: 2
        }
    );
    assert_eq!(p.pcm_bank().len(), 2);

    let cmd = p.next_command().unwrap();
    assert_eq!(
        cmd,
        Command::DacWrite {
            sample: 0x42,
            wait: 12
        }
    );
    assert_eq!(cmd.wait_samples(), 12);
    assert_eq!(p.pcm_bank().position(), 1);
}

#[test]
fn test_dac_write_past_bank_end_is_silent() {
    let mut p = parser(VgmImage::new().raw(&[0x80, 0x81]).end().build());
    assert_eq!(
        p.next_command().unwrap(),
        Command::DacWrite {
            sample: 0x80,
            wait: 0
        }
    );
    assert_eq!(
        p.next_command().unwrap(),
        Command::DacWrite {
            sample: 0x80,
            wait: 1
        }
    );
}

#[test]
fn test_pcm_seek_and_append() {
    let mut p = parser(
        VgmImage::new()
            .pcm_block(&[1, 2])
            .pcm_block(&[3, 4])
            .raw(&[0xE0, 0x03, 0x00, 0x00, 0x00, 0x80])
            .end()
            .build(),
    );
    let cmds = collect(&mut p);
    assert_eq!(cmds[2], Command::PcmSeek(3));
    assert_eq!(
        cmds[3],
        Command::DacWrite {
            sample: 4,
            wait: 0
        }
    );
    assert_eq!(p.pcm_bank().len(), 4);
}

#[test]
fn test_non_pcm_data_block_is_skipped() {
    let mut p = parser(
        VgmImage::new()
            .raw(&[0x67, 0x66, 0x81, 0x03, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xCC])
            .psg(0x9F)
            .end()
            .build(),
    );
    assert_eq!(
        p.next_command().unwrap(),
        Command::DataBlock {
            data_type: 0x81,
            size: 3
        }
    );
    assert!(p.pcm_bank().is_empty());
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
}

#[test]
fn test_other_chips_are_skipped_in_alignment() {
    let mut p = parser(
        VgmImage::new()
            .raw(&[0x4F, 0xFF])
            .raw(&[0x51, 0x20, 0x30])
            .raw(&[0xB4, 0x01, 0x02])
            .raw(&[0xC0, 0x01, 0x02, 0x03])
            .raw(&[0xE1, 0x01, 0x02, 0x03, 0x04])
            .raw(&[0x93, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .raw(&[0x68, 0x66, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])
            .psg(0x9F)
            .end()
            .build(),
    );
    let cmds = collect(&mut p);
    assert_eq!(
        &cmds[..7],
        &[
            Command::Skipped { opcode: 0x4F },
            Command::Skipped { opcode: 0x51 },
            Command::Skipped { opcode: 0xB4 },
            Command::Skipped { opcode: 0xC0 },
            Command::Skipped { opcode: 0xE1 },
            Command::Skipped { opcode: 0x93 },
            Command::Skipped { opcode: 0x68 },
        ]
    );
    assert_eq!(cmds[7], Command::PsgWrite(0x9F));
    assert_eq!(cmds.len(), 8);
}

#[test]
fn test_end_of_stream_is_sticky() {
    let mut p = parser(VgmImage::new().end().psg(0x9F).build());
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
    assert!(p.is_finished());
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
}

#[test]
fn test_exhausted_source_ends_stream() {
    let mut p = parser(VgmImage::new().psg(0x9F).without_eof().build());
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
    assert!(p.is_finished());
}

#[test]
fn test_declared_eof_stops_before_trailing_bytes() {
    let mut bytes = VgmImage::new().psg(0x9F).build();
    // trailing bytes past the declared EOF (e.g. a GD3 tag)
    bytes.extend_from_slice(&[0x50, 0xBF]);
    let mut p = parser(bytes);
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
}

#[test]
fn test_truncated_operands() {
    let mut p = parser(VgmImage::new().raw(&[0x52, 0x28]).without_eof().build());
    match p.next_command() {
        Err(ParseError::UnexpectedEof { opcode, offset }) => {
            assert_eq!(opcode, 0x52);
            assert_eq!(offset, 0x40);
        }
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
    assert!(p.is_finished());
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
}

#[test]
fn test_truncated_data_block() {
    let mut p = parser(
        VgmImage::new()
            .raw(&[0x67, 0x66, 0x00, 0x10, 0x00, 0x00, 0x00, 0x01])
            .without_eof()
            .build(),
    );
    match p.next_command() {
        Err(ParseError::UnexpectedEof { opcode: 0x67, .. }) => {}
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_header_fields() {
    let bytes = VgmImage::new()
        .total_samples(44_100)
        .mark_loop()
        .wait(100)
        .end()
        .build();
    let mut p = VgmParser::new(MemorySource::new(bytes));
    let header = p.parse_header().unwrap();
    assert!(header.has_fm());
    assert!(header.has_psg());
    assert!(header.has_loop());
    assert_eq!(header.loop_start(), Some(0x40));
    assert_eq!(header.eof_position(), Some(0x44));
    assert_eq!(header.total_samples, 44_100);
    assert_eq!(p.position(), 0x40);
    assert_eq!(p.header(), Some(&header));
    assert!(p.has_loop());
}

#[test]
fn test_custom_data_offset() {
    let header = VgmHeader {
        version: 0x0171,
        psg_clock: common::NTSC_PSG_CLOCK,
        data_offset: 0x4C,
        ..Default::default()
    };
    let mut bytes = header.to_bytes();
    bytes.resize(0x80, 0);
    bytes.extend_from_slice(&[0x50, 0x9F, 0x66]);

    let mut p = parser(bytes);
    assert_eq!(p.position(), 0x80);
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
}

#[test]
fn test_invalid_data_offset() {
    let header = VgmHeader {
        data_offset: 0x04,
        ..Default::default()
    };
    let mut p = VgmParser::new(MemorySource::new(header.to_bytes()));
    match p.parse_header() {
        Err(ParseError::InvalidDataOffset(0x38)) => {}
        other => panic!("expected InvalidDataOffset, got {:?}", other),
    }

    let header = VgmHeader {
        data_offset: 0x1000,
        ..Default::default()
    };
    let mut p = VgmParser::new(MemorySource::new(header.to_bytes()));
    match p.parse_header() {
        Err(ParseError::InvalidDataOffset(_)) => {}
        other => panic!("expected InvalidDataOffset, got {:?}", other),
    }
}

#[test]
fn test_bad_magic_and_short_header() {
    let mut bytes = VgmImage::new().end().build();
    bytes[0..4].copy_from_slice(b"RIFF");
    let mut p = VgmParser::new(MemorySource::new(bytes));
    match p.parse_header() {
        Err(ParseError::InvalidIdent(id)) => assert_eq!(&id, b"RIFF"),
        other => panic!("expected InvalidIdent, got {:?}", other),
    }

    let mut p = VgmParser::new(MemorySource::new(b"Vgm \x00\x00".to_vec()));
    match p.parse_header() {
        Err(ParseError::HeaderTooShort { available: 6 }) => {}
        other => panic!("expected HeaderTooShort, got {:?}", other),
    }
}

#[test]
fn test_seek_to_loop() {
    let bytes = VgmImage::new()
        .psg(0x9F)
        .mark_loop()
        .psg(0xBF)
        .end()
        .build();
    let mut p = parser(bytes);
    assert_eq!(collect(&mut p), vec![Command::PsgWrite(0x9F), Command::PsgWrite(0xBF)]);
    assert!(p.is_finished());

    p.seek_to_loop().unwrap();
    assert!(!p.is_finished());
    assert_eq!(p.loop_count(), 1);
    assert_eq!(collect(&mut p), vec![Command::PsgWrite(0xBF)]);

    p.seek_to_loop().unwrap();
    assert_eq!(p.loop_count(), 2);
}

#[test]
fn test_seek_to_loop_without_loop_point() {
    let mut p = parser(VgmImage::new().psg(0x9F).end().build());
    assert_eq!(p.next_command().unwrap(), Command::PsgWrite(0x9F));
    let pos = p.position();
    match p.seek_to_loop() {
        Err(ParseError::NoLoopPoint) => {}
        other => panic!("expected NoLoopPoint, got {:?}", other),
    }
    assert_eq!(p.position(), pos);
    assert_eq!(p.loop_count(), 0);
    assert!(!p.is_finished());
    assert_eq!(p.next_command().unwrap(), Command::EndOfStream);
}
