/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Mouse field codec.
use core::fmt::Write;

use retrack_core::controls::{mouse, Controls};

use super::{decode_button, encode_button, field_end, next_field, parse_axis,
    DecodeError, PortCodec};

/// The codec of a mouse: two signed decimal axes and two button glyphs.
pub struct MouseCodec;

impl PortCodec for MouseCodec {
    fn decode(&self, port: usize, line: &str, pos: usize, controls: &mut Controls)
        -> Result<usize, DecodeError>
    {
        let end = field_end(line, pos);
        let field = &line.as_bytes()[pos.min(end)..end];
        // A wholly absent field reads as neutral.
        if field.is_empty() {
            return Ok(next_field(line, end));
        }
        let mut p = 0;
        controls.set(port, 0, mouse::X, parse_axis(field, &mut p)?);
        controls.set(port, 0, mouse::Y, parse_axis(field, &mut p)?);
        if field.len() > p + 2 {
            return Err(DecodeError::BadPortField);
        }
        controls.set(port, 0, mouse::LEFT, decode_button(field.get(p).copied(), b'L')?);
        controls.set(port, 0, mouse::RIGHT, decode_button(field.get(p + 1).copied(), b'R')?);
        Ok(next_field(line, end))
    }

    fn encode(&self, port: usize, out: &mut String, controls: &Controls) {
        let _ = write!(out, "{} {}",
            controls.get(port, 0, mouse::X), controls.get(port, 0, mouse::Y));
        encode_button(out, controls.get(port, 0, mouse::LEFT), 'L');
        encode_button(out, controls.get(port, 0, mouse::RIGHT), 'R');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_axes_roundtrip() {
        let mut c = Controls::new();
        c.set(1, 0, mouse::X, -32768);
        c.set(1, 0, mouse::Y, 32767);
        c.set(1, 0, mouse::RIGHT, 1);
        let mut out = String::new();
        MouseCodec.encode(1, &mut out, &c);
        assert_eq!(out, "-32768 32767 R");
        let mut back = Controls::new();
        MouseCodec.decode(1, &out, 0, &mut back).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn missing_buttons_read_released() {
        let mut c = Controls::new();
        MouseCodec.decode(0, "3 -4", 0, &mut c).unwrap();
        assert_eq!(c.get(0, 0, mouse::X), 3);
        assert_eq!(c.get(0, 0, mouse::Y), -4);
        assert_eq!(c.get(0, 0, mouse::LEFT), 0);
    }

    #[test]
    fn garbage_axes_are_rejected() {
        let mut c = Controls::new();
        assert_eq!(MouseCodec.decode(0, "twelve 4", 0, &mut c),
                   Err(DecodeError::BadPortField));
        assert_eq!(MouseCodec.decode(0, "1 2LRx", 0, &mut c),
                   Err(DecodeError::BadPortField));
    }
}
