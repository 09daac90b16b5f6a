/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Text codecs for the external form of one subframe.
//!
//! A subframe is one line of fields separated by `|`. The leading field is
//! the system field: an `F` marker when the subframe starts a frame,
//! followed by `R <hi> <lo>` when the subframe requests a delayed reset.
//! The remaining fields encode each port's devices in port order. Buttons
//! are fixed glyphs (space = released), axes signed decimals.
use core::fmt;
use core::fmt::Write;

use retrack_core::controls::{Controls,
    CONTROL_SYSTEM_RESET, CONTROL_SYSTEM_RESET_CYCLES_HI, CONTROL_SYSTEM_RESET_CYCLES_LO};

use crate::types::PortType;

pub mod gamepad;
pub mod justifier;
pub mod mouse;
pub mod superscope;

/// The system field version written by the encoders.
pub const WRITE_CONTROL_VERSION: u32 = 0;

/// An error from decoding a subframe line.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// A field does not match its port's grammar.
    BadPortField
}

impl std::error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bad input field in movie data")
    }
}

/// What a field encoder produced.
#[derive(Debug, PartialEq, Eq)]
pub enum EncodeOutput {
    /// A field was written; the caller appends the field terminator.
    Field,
    /// Nothing was written and the field terminator is suppressed too.
    NoOutput
}

/// The paired decoder/encoder of one port type.
///
/// Decoders read exactly one field (never past it) and return the starting
/// position of the next field, or the end of the line. Encoders append
/// exactly one field and are inverse to their decoder on all valid inputs.
/// Port types spanning several devices read and write one `|`-separated
/// block per device.
pub trait PortCodec: Sync {
    fn decode(&self, port: usize, line: &str, pos: usize, controls: &mut Controls)
        -> Result<usize, DecodeError>;
    fn encode(&self, port: usize, out: &mut String, controls: &Controls);
}

pub(crate) fn codec_for(ptype: PortType) -> &'static dyn PortCodec {
    match ptype {
        PortType::None => &NoneCodec,
        PortType::Gamepad => &gamepad::GamepadCodec,
        PortType::Multitap => &gamepad::MultitapCodec,
        PortType::Mouse => &mouse::MouseCodec,
        PortType::Superscope => &superscope::SuperscopeCodec,
        PortType::Justifier => &justifier::JustifierCodec,
        PortType::Justifiers => &justifier::JustifiersCodec
    }
}

/// The codec of an empty port: writes an empty field, accepts only one.
struct NoneCodec;

impl PortCodec for NoneCodec {
    fn decode(&self, _port: usize, line: &str, pos: usize, _controls: &mut Controls)
        -> Result<usize, DecodeError>
    {
        let end = field_end(line, pos);
        if line[pos..end].bytes().any(|b| b != b' ') {
            return Err(DecodeError::BadPortField);
        }
        Ok(next_field(line, end))
    }

    fn encode(&self, _port: usize, _out: &mut String, _controls: &Controls) {}
}

/// Encodes the system field. Unlike the port encoders this may produce
/// [EncodeOutput::NoOutput] for versions with no system fields to emit;
/// version 0 always emits the field, empty on a plain continuation subframe.
pub fn encode_system(out: &mut String, controls: &Controls, _version: u32) -> EncodeOutput {
    if controls.is_sync() {
        out.push('F');
    }
    if controls[CONTROL_SYSTEM_RESET] != 0 {
        let hi = controls[CONTROL_SYSTEM_RESET_CYCLES_HI];
        let lo = controls[CONTROL_SYSTEM_RESET_CYCLES_LO];
        let _ = write!(out, "R {} {}", hi, lo);
    }
    EncodeOutput::Field
}

/// Decodes the system field. The frame sync flag is conveyed by the
/// presence of the leading `F` marker; reset fields default to zero when
/// absent. Decoders accept layouts of older versions.
pub fn decode_system(line: &str, pos: usize, controls: &mut Controls, _version: u32)
    -> Result<usize, DecodeError>
{
    let end = field_end(line, pos);
    let field = line[pos..end].as_bytes();
    let mut p = 0;
    if field.first() == Some(&b'F') {
        controls.set_sync(true);
        p = 1;
    }
    if field.get(p) == Some(&b'R') {
        p += 1;
        let hi = parse_axis(field, &mut p)?;
        let lo = parse_axis(field, &mut p)?;
        controls[CONTROL_SYSTEM_RESET] = 1;
        controls[CONTROL_SYSTEM_RESET_CYCLES_HI] = hi;
        controls[CONTROL_SYSTEM_RESET_CYCLES_LO] = lo;
    }
    while field.get(p) == Some(&b' ') {
        p += 1;
    }
    if p != field.len() {
        return Err(DecodeError::BadPortField);
    }
    Ok(next_field(line, end))
}

/// Encodes one subframe as a line of `|`-separated fields.
pub fn encode_line(controls: &Controls, ports: [PortType; 2], version: u32) -> String {
    let mut out = String::new();
    let mut need_separator = match encode_system(&mut out, controls, version) {
        EncodeOutput::Field => true,
        EncodeOutput::NoOutput => false
    };
    for (port, ptype) in ports.iter().enumerate() {
        if need_separator {
            out.push('|');
        }
        ptype.codec().encode(port, &mut out, controls);
        need_separator = true;
    }
    out
}

/// Decodes one subframe from a line of `|`-separated fields.
///
/// Missing trailing fields read as released; malformed fields fail with
/// [DecodeError::BadPortField].
pub fn decode_line(line: &str, ports: [PortType; 2], version: u32)
    -> Result<Controls, DecodeError>
{
    let mut controls = Controls::new();
    let mut pos = decode_system(line, 0, &mut controls, version)?;
    for (port, ptype) in ports.iter().enumerate() {
        pos = ptype.codec().decode(port, line, pos, &mut controls)?;
    }
    Ok(controls)
}

/// Returns the end of the field starting at `pos`: the position of the next
/// `|` separator, or the end of the line.
pub(crate) fn field_end(line: &str, pos: usize) -> usize {
    let pos = pos.min(line.len());
    match memchr::memchr(b'|', &line.as_bytes()[pos..]) {
        Some(offset) => pos + offset,
        None => line.len()
    }
}

/// Returns the starting position of the field after the one ending at `end`.
pub(crate) fn next_field(line: &str, end: usize) -> usize {
    if end < line.len() { end + 1 } else { end }
}

/// Decodes one button glyph: space or nothing is released, the canonical
/// glyph is pressed, anything else is malformed.
pub(crate) fn decode_button(byte: Option<u8>, glyph: u8) -> Result<i16, DecodeError> {
    match byte {
        None | Some(b' ') => Ok(0),
        Some(b) if b == glyph => Ok(1),
        _ => Err(DecodeError::BadPortField)
    }
}

/// Appends one button glyph.
#[inline]
pub(crate) fn encode_button(out: &mut String, value: i16, glyph: char) {
    out.push(if value != 0 { glyph } else { ' ' });
}

/// Parses a signed decimal axis value at `*pos`, skipping leading spaces.
pub(crate) fn parse_axis(field: &[u8], pos: &mut usize) -> Result<i16, DecodeError> {
    while field.get(*pos) == Some(&b' ') {
        *pos += 1;
    }
    let start = *pos;
    if field.get(*pos) == Some(&b'-') {
        *pos += 1;
    }
    while matches!(field.get(*pos).copied(), Some(b'0'..=b'9')) {
        *pos += 1;
    }
    core::str::from_utf8(&field[start..*pos]).ok()
        .and_then(|s| s.parse().ok())
        .ok_or(DecodeError::BadPortField)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrack_core::controls::{gamepad as pad, mouse as ms};

    const TWO_PADS: [PortType; 2] = [PortType::Gamepad, PortType::Gamepad];

    #[test]
    fn system_field_marks_sync_and_reset() {
        let mut c = Controls::sync();
        c.set_reset_delay(Some(30007));
        let line = encode_line(&c, TWO_PADS, WRITE_CONTROL_VERSION);
        assert_eq!(line, "FR 3 7|            |            ");
        let back = decode_line(&line, TWO_PADS, WRITE_CONTROL_VERSION).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn continuation_subframe_has_empty_system_field() {
        let c = Controls::new();
        let line = encode_line(&c, TWO_PADS, WRITE_CONTROL_VERSION);
        assert!(line.starts_with('|'));
        assert_eq!(decode_line(&line, TWO_PADS, WRITE_CONTROL_VERSION).unwrap(), c);
    }

    #[test]
    fn gamepad_glyphs_roundtrip() {
        let mut c = Controls::sync();
        c.set(0, 0, pad::UP, 1);
        c.set(0, 0, pad::START, 1);
        c.set(1, 0, pad::B, 1);
        let line = encode_line(&c, TWO_PADS, WRITE_CONTROL_VERSION);
        assert_eq!(line, "F|u          S|     B      ");
        assert_eq!(decode_line(&line, TWO_PADS, WRITE_CONTROL_VERSION).unwrap(), c);
    }

    #[test]
    fn every_port_type_roundtrips() {
        use crate::types::DeviceType;
        use retrack_core::controls::{justifier as jst, superscope as scope};

        for ptype in PortType::ALL.iter().copied() {
            let ports = [if ptype.valid_port1() { ptype } else { PortType::Gamepad },
                         ptype];
            let mut c = Controls::sync();
            for controller in 0..ptype.device_count() {
                let axis = -((controller as i16 + 1) * 100);
                match ptype.device_type() {
                    DeviceType::Gamepad => {
                        c.set(1, controller, pad::A, 1);
                        c.set(1, controller, pad::START, 1);
                    }
                    DeviceType::Mouse => {
                        c.set(1, controller, ms::X, axis);
                        c.set(1, controller, ms::Y, 5);
                        c.set(1, controller, ms::LEFT, 1);
                    }
                    DeviceType::Superscope => {
                        c.set(1, controller, scope::X, axis);
                        c.set(1, controller, scope::Y, 17);
                        c.set(1, controller, scope::TRIGGER, 1);
                        c.set(1, controller, scope::PAUSE, 1);
                    }
                    DeviceType::Justifier => {
                        c.set(1, controller, jst::X, axis);
                        c.set(1, controller, jst::Y, 3);
                        c.set(1, controller, jst::START, 1);
                    }
                    DeviceType::None => {}
                }
            }
            let line = encode_line(&c, ports, WRITE_CONTROL_VERSION);
            let back = decode_line(&line, ports, WRITE_CONTROL_VERSION).unwrap();
            assert_eq!(back, c, "port type {}", ptype);
        }
    }

    #[test]
    fn mouse_axes_encode_signed_decimals() {
        let ports = [PortType::Mouse, PortType::None];
        let mut c = Controls::new();
        c.set(0, 0, ms::X, -137);
        c.set(0, 0, ms::Y, 42);
        c.set(0, 0, ms::LEFT, 1);
        let line = encode_line(&c, ports, WRITE_CONTROL_VERSION);
        assert_eq!(line, "|-137 42L |");
        assert_eq!(decode_line(&line, ports, WRITE_CONTROL_VERSION).unwrap(), c);
    }

    #[test]
    fn malformed_fields_are_rejected() {
        assert_eq!(decode_line("F|xxxxxxxxxxxx|            ", TWO_PADS, 0),
                   Err(DecodeError::BadPortField));
        assert_eq!(decode_line("Q|            |            ", TWO_PADS, 0),
                   Err(DecodeError::BadPortField));
        assert_eq!(decode_line("FR x 7|            |            ", TWO_PADS, 0),
                   Err(DecodeError::BadPortField));
        let ports = [PortType::Mouse, PortType::None];
        assert_eq!(decode_line("|12 flop|", ports, 0), Err(DecodeError::BadPortField));
    }

    #[test]
    fn missing_trailing_fields_read_released() {
        let c = decode_line("F", TWO_PADS, WRITE_CONTROL_VERSION).unwrap();
        assert!(c.is_sync());
        assert_eq!(c.get(1, 0, pad::B), 0);
    }

    #[test]
    fn decoder_stops_at_its_own_separator() {
        // The first pad field is shorter than 12 glyphs; the second still
        // decodes from the right position.
        let mut expected = Controls::sync();
        expected.set(0, 0, pad::UP, 1);
        expected.set(1, 0, pad::DOWN, 1);
        let c = decode_line("F|u| d", TWO_PADS, WRITE_CONTROL_VERSION).unwrap();
        assert_eq!(c, expected);
    }
}
