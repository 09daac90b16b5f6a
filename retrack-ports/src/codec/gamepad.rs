/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Gamepad and multitap field codecs.
use retrack_core::controls::{Controls, CONTROLLER_CONTROLS, MAX_CONTROLLERS_PER_PORT};

use super::{decode_button, encode_button, field_end, next_field, DecodeError, PortCodec};

/// One glyph per gamepad button, in control number order.
pub const GAMEPAD_GLYPHS: [u8; CONTROLLER_CONTROLS] =
    [b'u', b'd', b'l', b'r', b'A', b'B', b'X', b'Y', b'L', b'R', b's', b'S'];

pub(crate) fn decode_block(field: &[u8], port: usize, controller: usize,
                           controls: &mut Controls) -> Result<(), DecodeError>
{
    if field.len() > CONTROLLER_CONTROLS {
        return Err(DecodeError::BadPortField);
    }
    for (control, glyph) in GAMEPAD_GLYPHS.iter().enumerate() {
        let value = decode_button(field.get(control).copied(), *glyph)?;
        controls.set(port, controller, control, value);
    }
    Ok(())
}

pub(crate) fn encode_block(out: &mut String, port: usize, controller: usize,
                           controls: &Controls)
{
    for (control, glyph) in GAMEPAD_GLYPHS.iter().enumerate() {
        encode_button(out, controls.get(port, controller, control), *glyph as char);
    }
}

/// The codec of a single gamepad.
pub struct GamepadCodec;

impl PortCodec for GamepadCodec {
    fn decode(&self, port: usize, line: &str, pos: usize, controls: &mut Controls)
        -> Result<usize, DecodeError>
    {
        let end = field_end(line, pos);
        decode_block(&line.as_bytes()[pos.min(end)..end], port, 0, controls)?;
        Ok(next_field(line, end))
    }

    fn encode(&self, port: usize, out: &mut String, controls: &Controls) {
        encode_block(out, port, 0, controls);
    }
}

/// The codec of a multitap: four gamepad blocks, one field per device.
pub struct MultitapCodec;

impl PortCodec for MultitapCodec {
    fn decode(&self, port: usize, line: &str, mut pos: usize, controls: &mut Controls)
        -> Result<usize, DecodeError>
    {
        for controller in 0..MAX_CONTROLLERS_PER_PORT {
            let end = field_end(line, pos);
            decode_block(&line.as_bytes()[pos.min(end)..end], port, controller, controls)?;
            pos = next_field(line, end);
        }
        Ok(pos)
    }

    fn encode(&self, port: usize, out: &mut String, controls: &Controls) {
        for controller in 0..MAX_CONTROLLERS_PER_PORT {
            if controller != 0 {
                out.push('|');
            }
            encode_block(out, port, controller, controls);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrack_core::controls::gamepad as pad;

    #[test]
    fn block_rejects_wrong_glyph_position() {
        let mut c = Controls::new();
        // 'A' belongs at position 4, not 0.
        assert_eq!(decode_block(b"A", 0, 0, &mut c), Err(DecodeError::BadPortField));
        assert!(decode_block(b"    A", 0, 0, &mut c).is_ok());
        assert_eq!(c.get(0, 0, pad::A), 1);
    }

    #[test]
    fn multitap_reads_four_blocks() {
        let mut c = Controls::new();
        let line = "u|d|l|r";
        let next = MultitapCodec.decode(0, line, 0, &mut c).unwrap();
        assert_eq!(next, line.len());
        assert_eq!(c.get(0, 0, pad::UP), 1);
        assert_eq!(c.get(0, 1, pad::DOWN), 1);
        assert_eq!(c.get(0, 2, pad::LEFT), 1);
        assert_eq!(c.get(0, 3, pad::RIGHT), 1);
    }

    #[test]
    fn multitap_encodes_four_blocks() {
        let mut c = Controls::new();
        c.set(0, 3, pad::START, 1);
        let mut out = String::new();
        MultitapCodec.encode(0, &mut out, &c);
        assert_eq!(out.matches('|').count(), 3);
        assert!(out.ends_with('S'));
    }
}
