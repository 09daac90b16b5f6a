/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Port and device type enumerations and their static metadata.
use core::fmt;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use retrack_core::controls::{gamepad, justifier, mouse, superscope};

use crate::codec::{self, PortCodec};

/// An error from port type lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum PortTypeError {
    /// The name does not match any port type.
    UnknownName,
    /// The port type can only be connected to port 2.
    NotValidForPort1
}

impl std::error::Error for PortTypeError {}

impl fmt::Display for PortTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", match self {
            PortTypeError::UnknownName => "Invalid port type name",
            PortTypeError::NotValidForPort1 => "Port type is not valid for port 1"
        })
    }
}

/// The type of a device connected to a controller slot.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceType {
    None,
    /// A gamepad; multitap devices are gamepads too.
    Gamepad,
    Mouse,
    Superscope,
    /// A justifier; the justifiers port type carries two of these.
    Justifier
}

/// The type of equipment connected to a controller port.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortType {
    /// Nothing connected to the port.
    None,
    Gamepad,
    /// A multitap with 4 gamepads connected.
    Multitap,
    Mouse,
    /// A Super Scope; port 2 only.
    Superscope,
    /// A justifier; port 2 only.
    Justifier,
    /// Two justifiers; port 2 only.
    Justifiers
}

impl Default for PortType {
    fn default() -> Self {
        PortType::Gamepad
    }
}

impl PortType {
    /// All port types, in wire-value order.
    pub const ALL: [PortType; 7] = [
        PortType::None, PortType::Gamepad, PortType::Multitap, PortType::Mouse,
        PortType::Superscope, PortType::Justifier, PortType::Justifiers
    ];
    /// Returns the canonical name of the port type.
    pub fn name(self) -> &'static str {
        match self {
            PortType::None => "none",
            PortType::Gamepad => "gamepad",
            PortType::Multitap => "multitap",
            PortType::Mouse => "mouse",
            PortType::Superscope => "superscope",
            PortType::Justifier => "justifier",
            PortType::Justifiers => "justifiers"
        }
    }
    /// Looks a port type up by name. With `port2` false, types valid only
    /// for port 2 are rejected.
    pub fn lookup(name: &str, port2: bool) -> Result<Self, PortTypeError> {
        let ptype = PortType::ALL.iter().copied()
            .find(|pt| pt.name() == name)
            .ok_or(PortTypeError::UnknownName)?;
        if !port2 && !ptype.valid_port1() {
            return Err(PortTypeError::NotValidForPort1);
        }
        Ok(ptype)
    }
    /// Returns the number of devices the port type connects.
    pub fn device_count(self) -> usize {
        match self {
            PortType::None => 0,
            PortType::Multitap => 4,
            PortType::Justifiers => 2,
            _ => 1
        }
    }
    /// Returns the type of the connected devices.
    pub fn device_type(self) -> DeviceType {
        match self {
            PortType::None => DeviceType::None,
            PortType::Gamepad | PortType::Multitap => DeviceType::Gamepad,
            PortType::Mouse => DeviceType::Mouse,
            PortType::Superscope => DeviceType::Superscope,
            PortType::Justifier | PortType::Justifiers => DeviceType::Justifier
        }
    }
    /// Returns `true` if the port type may be connected to port 1.
    pub fn valid_port1(self) -> bool {
        match self {
            PortType::Superscope | PortType::Justifier | PortType::Justifiers => false,
            _ => true
        }
    }
    /// Returns the text codec of the port type.
    pub fn codec(self) -> &'static dyn PortCodec {
        codec::codec_for(self)
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A button or control of a physical controller, in host-facing terms.
///
/// Which buttons a device actually has depends on its [DeviceType]; see
/// [Button::control_of].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
    Up,
    Down,
    A,
    B,
    X,
    Y,
    L,
    R,
    Select,
    Start,
    /// Super Scope and justifier trigger.
    Trigger,
    /// Super Scope and justifier cursor.
    Cursor,
    /// Super Scope pause.
    Pause,
    /// Super Scope turbo.
    Turbo
}

impl Button {
    /// All buttons, in name-table order.
    pub const ALL: [Button; 16] = [
        Button::Left, Button::Right, Button::Up, Button::Down,
        Button::A, Button::B, Button::X, Button::Y,
        Button::L, Button::R, Button::Select, Button::Start,
        Button::Trigger, Button::Cursor, Button::Pause, Button::Turbo
    ];
    /// Returns the name used in command syntax like `autofire 1A,2start`.
    pub fn name(self) -> &'static str {
        match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Up => "up",
            Button::Down => "down",
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::L => "L",
            Button::R => "R",
            Button::Select => "select",
            Button::Start => "start",
            Button::Trigger => "trigger",
            Button::Cursor => "cursor",
            Button::Pause => "pause",
            Button::Turbo => "turbo"
        }
    }
    /// Looks a button up by its command-syntax name.
    pub fn from_name(name: &str) -> Option<Self> {
        Button::ALL.iter().copied().find(|b| b.name() == name)
    }
    /// Returns the control number of this button on a device of the given
    /// type, or `None` if the device has no such button.
    pub fn control_of(self, device: DeviceType) -> Option<usize> {
        match device {
            DeviceType::Gamepad => Some(match self {
                Button::Up => gamepad::UP,
                Button::Down => gamepad::DOWN,
                Button::Left => gamepad::LEFT,
                Button::Right => gamepad::RIGHT,
                Button::A => gamepad::A,
                Button::B => gamepad::B,
                Button::X => gamepad::X,
                Button::Y => gamepad::Y,
                Button::L => gamepad::L,
                Button::R => gamepad::R,
                Button::Select => gamepad::SELECT,
                Button::Start => gamepad::START,
                _ => return None
            }),
            DeviceType::Mouse => Some(match self {
                Button::L => mouse::LEFT,
                Button::R => mouse::RIGHT,
                _ => return None
            }),
            DeviceType::Superscope => Some(match self {
                Button::Trigger => superscope::TRIGGER,
                Button::Cursor => superscope::CURSOR,
                Button::Turbo => superscope::TURBO,
                Button::Pause => superscope::PAUSE,
                _ => return None
            }),
            DeviceType::Justifier => Some(match self {
                Button::Trigger => justifier::TRIGGER,
                Button::Start => justifier::START,
                _ => return None
            }),
            DeviceType::None => None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(PortType::lookup("multitap", false).unwrap(), PortType::Multitap);
        assert_eq!(PortType::lookup("justifiers", true).unwrap(), PortType::Justifiers);
        assert_eq!(PortType::lookup("superscope", false),
                   Err(PortTypeError::NotValidForPort1));
        assert_eq!(PortType::lookup("trackball", true), Err(PortTypeError::UnknownName));
    }

    #[test]
    fn device_metadata() {
        assert_eq!(PortType::None.device_count(), 0);
        assert_eq!(PortType::Multitap.device_count(), 4);
        assert_eq!(PortType::Justifiers.device_count(), 2);
        assert_eq!(PortType::Multitap.device_type(), DeviceType::Gamepad);
        assert_eq!(PortType::Justifiers.device_type(), DeviceType::Justifier);
    }

    #[test]
    fn buttons_map_per_device() {
        assert_eq!(Button::from_name("select"), Some(Button::Select));
        assert_eq!(Button::from_name("Select"), None);
        assert_eq!(Button::Start.control_of(DeviceType::Gamepad), Some(11));
        assert_eq!(Button::Start.control_of(DeviceType::Justifier), Some(3));
        assert_eq!(Button::Start.control_of(DeviceType::Superscope), None);
        assert_eq!(Button::Trigger.control_of(DeviceType::Gamepad), None);
    }
}
