/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Justifier field codecs.
use core::fmt::Write;

use retrack_core::controls::{justifier, Controls};

use super::{decode_button, encode_button, field_end, next_field, parse_axis,
    DecodeError, PortCodec};

const GLYPHS: [(usize, u8); 2] = [
    (justifier::TRIGGER, b'T'),
    (justifier::START, b'S')
];

fn decode_block(field: &[u8], port: usize, controller: usize, controls: &mut Controls)
    -> Result<(), DecodeError>
{
    // A wholly absent field reads as neutral.
    if field.is_empty() {
        return Ok(());
    }
    let mut p = 0;
    controls.set(port, controller, justifier::X, parse_axis(field, &mut p)?);
    controls.set(port, controller, justifier::Y, parse_axis(field, &mut p)?);
    if field.len() > p + GLYPHS.len() {
        return Err(DecodeError::BadPortField);
    }
    for (i, (control, glyph)) in GLYPHS.iter().enumerate() {
        let value = decode_button(field.get(p + i).copied(), *glyph)?;
        controls.set(port, controller, *control, value);
    }
    Ok(())
}

fn encode_block(out: &mut String, port: usize, controller: usize, controls: &Controls) {
    let _ = write!(out, "{} {}",
        controls.get(port, controller, justifier::X),
        controls.get(port, controller, justifier::Y));
    for (control, glyph) in GLYPHS.iter() {
        encode_button(out, controls.get(port, controller, *control), *glyph as char);
    }
}

/// The codec of a single justifier.
pub struct JustifierCodec;

impl PortCodec for JustifierCodec {
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

/// The codec of a justifier pair: one field per device.
pub struct JustifiersCodec;

impl PortCodec for JustifiersCodec {
    fn decode(&self, port: usize, line: &str, mut pos: usize, controls: &mut Controls)
        -> Result<usize, DecodeError>
    {
        for controller in 0..2 {
            let end = field_end(line, pos);
            decode_block(&line.as_bytes()[pos.min(end)..end], port, controller, controls)?;
            pos = next_field(line, end);
        }
        Ok(pos)
    }

    fn encode(&self, port: usize, out: &mut String, controls: &Controls) {
        for controller in 0..2 {
            if controller != 0 {
                out.push('|');
            }
            encode_block(out, port, controller, controls);
        }
    }
}
