/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Live controls: the working control record edited by the host, with
//! autohold and autofire masks merged over it.
use core::fmt;
use core::fmt::Write;

use retrack_core::controls::{control_index, Controls};

use crate::mapping::PortAssignment;
use crate::types::{Button, DeviceType};

/// An error from a controller-level action.
#[derive(Debug, PartialEq, Eq)]
pub enum ControllerError {
    /// The logical controller slot has no device.
    NoSuchController,
    /// The device has no such button.
    InvalidButton,
    /// The analog slot has no device.
    NoSuchAnalogSlot,
    /// An autofire specification with no frames.
    EmptyAutofirePattern,
    /// An autofire button entry that does not parse.
    BadButtonSpec
}

impl std::error::Error for ControllerError {}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            ControllerError::NoSuchController => "No such controller",
            ControllerError::InvalidButton => "Invalid button for this device",
            ControllerError::NoSuchAnalogSlot => "No analog controller in this slot",
            ControllerError::EmptyAutofirePattern => "Need at least one frame for autofire",
            ControllerError::BadButtonSpec => "Invalid button specification"
        })
    }
}

/// The live control state: the current controls as pressed by the user, an
/// autohold mask and a periodic autofire pattern.
///
/// The record a frame actually sees is
/// `current ^ autohold ^ pattern[frame % pattern_len]`. The pattern is never
/// empty; autofire-off is a single blank snapshot, so the modulo is always
/// defined.
#[derive(Clone, Debug)]
pub struct LiveControls {
    assignment: PortAssignment,
    current: Controls,
    autohold: Controls,
    autofire: Vec<Controls>
}

impl Default for LiveControls {
    fn default() -> Self {
        LiveControls::new(PortAssignment::default())
    }
}

impl LiveControls {
    /// Creates a live control state over the given port configuration.
    pub fn new(assignment: PortAssignment) -> Self {
        LiveControls {
            assignment,
            current: Controls::new(),
            autohold: Controls::new(),
            autofire: vec![Controls::new()]
        }
    }
    /// Returns the port configuration.
    pub fn assignment(&self) -> &PortAssignment {
        &self.assignment
    }
    /// Replaces the port configuration. Raw control state is kept.
    pub fn set_assignment(&mut self, assignment: PortAssignment) {
        self.assignment = assignment;
    }
    /// Returns the raw current controls.
    pub fn controls(&self) -> &Controls {
        &self.current
    }
    /// Returns the autohold mask.
    pub fn autohold(&self) -> &Controls {
        &self.autohold
    }
    /// Returns the autofire pattern; never empty.
    pub fn autofire(&self) -> &[Controls] {
        &self.autofire
    }
    /// Returns the controls in effect for the given frame number.
    pub fn effective(&self, frame: u64) -> Controls {
        let pattern = &self.autofire[(frame % self.autofire.len() as u64) as usize];
        self.current.clone() ^ self.autohold.clone() ^ pattern.clone()
    }
    /// Presses or releases a button on a logical controller.
    pub fn set_button(&mut self, logical: usize, button: Button, pressed: bool)
        -> Result<(), ControllerError>
    {
        let index = self.button_index(logical, button)?;
        self.current[index] = pressed as i16;
        Ok(())
    }
    /// Toggles the autohold state of a button on a logical controller and
    /// returns the new hold state.
    pub fn toggle_hold(&mut self, logical: usize, button: Button)
        -> Result<bool, ControllerError>
    {
        let index = self.button_index(logical, button)?;
        self.autohold[index] ^= 1;
        Ok(self.autohold[index] != 0)
    }
    /// Returns the autohold state of a button on a logical controller.
    pub fn is_held(&self, logical: usize, button: Button) -> Result<bool, ControllerError> {
        let index = self.button_index(logical, button)?;
        Ok(self.autohold[index] != 0)
    }
    /// Routes coordinates to the analog device in the given analog slot.
    ///
    /// Mice take origin-relative movements, scopes and justifiers absolute
    /// screen positions; [PortAssignment::analog_is_mouse] tells the caller
    /// which conversion applies.
    pub fn send_analog(&mut self, slot: usize, x: i16, y: i16) -> Result<(), ControllerError> {
        let slots = self.assignment.analog_slots();
        let slot = slots.get(slot).ok_or(ControllerError::NoSuchAnalogSlot)?;
        let (port, controller) = self.assignment.physical_of_logical(slot.logical)
            .ok_or(ControllerError::NoSuchAnalogSlot)?;
        self.current[control_index(port, controller, 0)] = x;
        self.current[control_index(port, controller, 1)] = y;
        Ok(())
    }
    /// Requests a delayed reset on the next frame, or cancels the request.
    pub fn set_reset(&mut self, delay: Option<u32>) {
        self.current.set_reset_delay(delay);
    }
    /// Replaces the autofire pattern. An empty pattern is stored as a
    /// single blank snapshot, keeping the pattern length positive.
    pub fn set_autofire(&mut self, mut pattern: Vec<Controls>) {
        if pattern.is_empty() {
            pattern.push(Controls::new());
        }
        self.autofire = pattern;
    }
    /// Parses an autofire specification into a pattern.
    ///
    /// The specification is a whitespace-separated list of frames; each
    /// frame is `-` for nothing held or a comma-separated list of
    /// `<controller><button>` entries, e.g. `1A,2start -`. Controller
    /// numbers are 1-based logical slots.
    pub fn parse_autofire(&self, spec: &str) -> Result<Vec<Controls>, ControllerError> {
        let mut pattern = Vec::new();
        for frame_spec in spec.split_whitespace() {
            if frame_spec == "-" {
                pattern.push(Controls::new());
                continue;
            }
            let mut frame = Controls::new();
            for entry in frame_spec.split(',') {
                let (logical, button) = parse_button_spec(entry)
                    .ok_or(ControllerError::BadButtonSpec)?;
                let index = self.button_index(logical, button)?;
                frame[index] = 1;
            }
            pattern.push(frame);
        }
        if pattern.is_empty() {
            return Err(ControllerError::EmptyAutofirePattern);
        }
        Ok(pattern)
    }

    fn button_index(&self, logical: usize, button: Button) -> Result<usize, ControllerError> {
        let device = self.assignment.device_type_of_logical(logical);
        if device == DeviceType::None {
            return Err(ControllerError::NoSuchController);
        }
        let control = button.control_of(device).ok_or(ControllerError::InvalidButton)?;
        let (port, controller) = self.assignment.physical_of_logical(logical)
            .ok_or(ControllerError::NoSuchController)?;
        Ok(control_index(port, controller, control))
    }
}

fn parse_button_spec(entry: &str) -> Option<(usize, Button)> {
    let mut chars = entry.chars();
    let digit = chars.next()?.to_digit(10)?;
    if digit == 0 {
        return None;
    }
    let button = Button::from_name(chars.as_str())?;
    Some((digit as usize - 1, button))
}

/// Renders the effective button and axis values of one logical controller
/// the way status displays show them, or `None` when the slot is empty.
pub fn controller_status(assignment: &PortAssignment, logical: usize, controls: &Controls)
    -> Option<String>
{
    let (port, controller) = assignment.physical_of_logical(logical)?;
    let c = |control: usize| controls.get(port, controller, control);
    let glyph = |control: usize, glyph: char| if c(control) != 0 { glyph } else { ' ' };
    let mut out = String::new();
    match assignment.device_type_of_logical(logical) {
        DeviceType::Gamepad => {
            for (control, g) in "udlrABXYLRsS".chars().enumerate() {
                out.push(glyph(control, g));
            }
        }
        DeviceType::Mouse => {
            let _ = write!(out, "{} {} ", c(0), c(1));
            out.push(glyph(2, 'L'));
            out.push(glyph(3, 'R'));
        }
        DeviceType::Superscope => {
            let _ = write!(out, "{} {} ", c(0), c(1));
            out.push(glyph(2, 'T'));
            out.push(glyph(3, 'C'));
            out.push(glyph(4, 't'));
            out.push(glyph(5, 'P'));
        }
        DeviceType::Justifier => {
            let _ = write!(out, "{} {} ", c(0), c(1));
            out.push(glyph(2, 'T'));
            out.push(glyph(3, 'S'));
        }
        DeviceType::None => return None
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PortType;
    use retrack_core::controls::gamepad as pad;

    fn two_pads() -> LiveControls {
        LiveControls::new(PortAssignment::new(PortType::Gamepad, PortType::Gamepad).unwrap())
    }

    #[test]
    fn buttons_land_on_the_right_slots() {
        let mut live = two_pads();
        live.set_button(0, Button::A, true).unwrap();
        live.set_button(1, Button::Start, true).unwrap();
        assert_eq!(live.controls().get(0, 0, pad::A), 1);
        assert_eq!(live.controls().get(1, 0, pad::START), 1);
        assert_eq!(live.set_button(2, Button::A, true),
                   Err(ControllerError::NoSuchController));
        assert_eq!(live.set_button(0, Button::Trigger, true),
                   Err(ControllerError::InvalidButton));
    }

    #[test]
    fn autohold_merges_by_xor() {
        let mut live = two_pads();
        assert!(live.toggle_hold(0, Button::B).unwrap());
        let c = live.effective(0);
        assert_eq!(c.get(0, 0, pad::B), 1);
        // Pressing the held button releases it for the duration.
        live.set_button(0, Button::B, true).unwrap();
        let c = live.effective(0);
        assert_eq!(c.get(0, 0, pad::B), 0);
        assert!(!live.toggle_hold(0, Button::B).unwrap());
    }

    #[test]
    fn autofire_alternates_by_frame() {
        let mut live = two_pads();
        let pattern = live.parse_autofire("1A -").unwrap();
        live.set_autofire(pattern);
        assert_eq!(live.effective(0).get(0, 0, pad::A), 1);
        assert_eq!(live.effective(1).get(0, 0, pad::A), 0);
        assert_eq!(live.effective(2).get(0, 0, pad::A), 1);
    }

    #[test]
    fn empty_autofire_pattern_stays_nonempty() {
        let mut live = two_pads();
        live.set_autofire(Vec::new());
        assert_eq!(live.autofire().len(), 1);
        // The modulo never divides by zero.
        assert_eq!(live.effective(12345), Controls::new());
        assert_eq!(live.parse_autofire("  "),
                   Err(ControllerError::EmptyAutofirePattern));
    }

    #[test]
    fn autofire_spec_errors() {
        let live = two_pads();
        assert_eq!(live.parse_autofire("1flurb"), Err(ControllerError::BadButtonSpec));
        assert_eq!(live.parse_autofire("0A"), Err(ControllerError::BadButtonSpec));
        assert_eq!(live.parse_autofire("3A"), Err(ControllerError::NoSuchController));
        assert!(live.parse_autofire("1A,1B,2start").is_ok());
    }

    #[test]
    fn analog_routing() {
        let mut live = LiveControls::new(
            PortAssignment::new(PortType::Mouse, PortType::Superscope).unwrap());
        live.send_analog(0, -5, 7).unwrap();
        live.send_analog(1, 100, 50).unwrap();
        assert_eq!(live.controls().get(0, 0, 0), -5);
        assert_eq!(live.controls().get(0, 0, 1), 7);
        assert_eq!(live.controls().get(1, 0, 0), 100);
        assert_eq!(live.controls().get(1, 0, 1), 50);
        assert_eq!(live.send_analog(2, 0, 0), Err(ControllerError::NoSuchAnalogSlot));
    }

    #[test]
    fn reset_request_sets_system_fields() {
        let mut live = two_pads();
        live.set_reset(Some(30007));
        assert_eq!(live.controls().reset_delay(), Some(30007));
        live.set_reset(None);
        assert_eq!(live.controls().reset_delay(), None);
    }

    #[test]
    fn status_rendering() {
        let mut live = two_pads();
        live.set_button(0, Button::Up, true).unwrap();
        live.set_button(0, Button::Start, true).unwrap();
        let text = controller_status(live.assignment(), 0, &live.effective(0)).unwrap();
        assert_eq!(text, "u          S");
        let a = PortAssignment::new(PortType::Gamepad, PortType::Mouse).unwrap();
        let mut c = Controls::new();
        c.set(1, 0, 0, -3);
        c.set(1, 0, 2, 1);
        assert_eq!(controller_status(&a, 1, &c).unwrap(), "-3 0 L ");
        assert_eq!(controller_status(&a, 5, &c), None);
    }
}
