/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Super Scope field codec.
use core::fmt::Write;

use retrack_core::controls::{superscope, Controls};

use super::{decode_button, encode_button, field_end, next_field, parse_axis,
    DecodeError, PortCodec};

const GLYPHS: [(usize, u8); 4] = [
    (superscope::TRIGGER, b'T'),
    (superscope::CURSOR, b'C'),
    (superscope::TURBO, b't'),
    (superscope::PAUSE, b'P')
];

/// The codec of a Super Scope: two coordinate decimals and four buttons.
pub struct SuperscopeCodec;

impl PortCodec for SuperscopeCodec {
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
        controls.set(port, 0, superscope::X, parse_axis(field, &mut p)?);
        controls.set(port, 0, superscope::Y, parse_axis(field, &mut p)?);
        if field.len() > p + GLYPHS.len() {
            return Err(DecodeError::BadPortField);
        }
        for (i, (control, glyph)) in GLYPHS.iter().enumerate() {
            let value = decode_button(field.get(p + i).copied(), *glyph)?;
            controls.set(port, 0, *control, value);
        }
        Ok(next_field(line, end))
    }

    fn encode(&self, port: usize, out: &mut String, controls: &Controls) {
        let _ = write!(out, "{} {}",
            controls.get(port, 0, superscope::X), controls.get(port, 0, superscope::Y));
        for (control, glyph) in GLYPHS.iter() {
            encode_button(out, controls.get(port, 0, *control), *glyph as char);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_buttons_roundtrip() {
        let mut c = Controls::new();
        c.set(1, 0, superscope::X, 128);
        c.set(1, 0, superscope::Y, 96);
        c.set(1, 0, superscope::TRIGGER, 1);
        c.set(1, 0, superscope::PAUSE, 1);
        let mut out = String::new();
        SuperscopeCodec.encode(1, &mut out, &c);
        assert_eq!(out, "128 96T  P");
        let mut back = Controls::new();
        SuperscopeCodec.decode(1, &out, 0, &mut back).unwrap();
        assert_eq!(back, c);
    }
}
