/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Stable logical controller numbering over the physical port configuration.
use arrayvec::ArrayVec;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::types::{DeviceType, PortType, PortTypeError};

/// The number of logical controller slots.
pub const MAX_LOGICAL_CONTROLLERS: usize = 8;

/// A logical controller slot carrying an analog device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalogSlot {
    /// The logical controller number.
    pub logical: usize,
    /// `true` for mice (origin-relative coordinates), `false` for scopes
    /// and justifiers (absolute coordinates).
    pub is_mouse: bool
}

/// The current port configuration, mapping logical controller numbers to
/// physical `(port, controller)` slots.
///
/// Logical numbering is stable under the configured types: port 1's devices
/// come first, then port 2's, except that with a multitap on port 1 the
/// first multitap device stays logical 0 and port 2's devices are numbered
/// before the remaining three multitap devices.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortAssignment {
    port1: PortType,
    port2: PortType
}

impl Default for PortAssignment {
    fn default() -> Self {
        PortAssignment { port1: PortType::Gamepad, port2: PortType::Gamepad }
    }
}

impl PortAssignment {
    /// Creates an assignment, rejecting types not valid for port 1.
    pub fn new(port1: PortType, port2: PortType) -> Result<Self, PortTypeError> {
        if !port1.valid_port1() {
            return Err(PortTypeError::NotValidForPort1);
        }
        Ok(PortAssignment { port1, port2 })
    }
    /// Returns the type connected to the given port.
    pub fn port_type(&self, port: usize) -> PortType {
        if port == 0 { self.port1 } else { self.port2 }
    }
    /// Returns both port types, in port order.
    pub fn port_types(&self) -> [PortType; 2] {
        [self.port1, self.port2]
    }
    /// Maps a logical controller number to its physical `(port, controller)`
    /// slot, or `None` when out of range for the configuration.
    pub fn physical_of_logical(&self, logical: usize) -> Option<(usize, usize)> {
        let p1devs = self.port1.device_count();
        let p2devs = self.port2.device_count();
        if logical >= p1devs + p2devs {
            return None;
        }
        let combined = if self.port1 != PortType::Multitap {
            if logical < p1devs { logical } else { 4 + logical - p1devs }
        }
        else if logical == 0 {
            0
        }
        else if logical < 5 {
            logical + 3
        }
        else {
            logical - 4
        };
        Some((combined >> 2, combined & 3))
    }
    /// Returns the device type behind a logical controller number.
    pub fn device_type_of_logical(&self, logical: usize) -> DeviceType {
        match self.physical_of_logical(logical) {
            Some((port, controller)) => {
                let ptype = self.port_type(port);
                if controller < ptype.device_count() {
                    ptype.device_type()
                }
                else {
                    DeviceType::None
                }
            }
            None => DeviceType::None
        }
    }
    /// Enumerates the logical controllers carrying analog devices, at most
    /// three under any configuration.
    pub fn analog_slots(&self) -> ArrayVec<[AnalogSlot; 3]> {
        let mut slots = ArrayVec::new();
        for logical in 0..MAX_LOGICAL_CONTROLLERS {
            let is_mouse = match self.device_type_of_logical(logical) {
                DeviceType::Mouse => true,
                DeviceType::Superscope | DeviceType::Justifier => false,
                DeviceType::None | DeviceType::Gamepad => continue
            };
            if slots.is_full() {
                break;
            }
            slots.push(AnalogSlot { logical, is_mouse });
        }
        slots
    }
    /// Returns `true` if the analog slot holds a mouse.
    pub fn analog_is_mouse(&self, slot: usize) -> bool {
        self.analog_slots().get(slot).map_or(false, |s| s.is_mouse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_pads_number_in_port_order() {
        let a = PortAssignment::new(PortType::Gamepad, PortType::Gamepad).unwrap();
        assert_eq!(a.physical_of_logical(0), Some((0, 0)));
        assert_eq!(a.physical_of_logical(1), Some((1, 0)));
        assert_eq!(a.physical_of_logical(2), None);
        assert_eq!(a.device_type_of_logical(1), DeviceType::Gamepad);
        assert_eq!(a.device_type_of_logical(2), DeviceType::None);
    }

    #[test]
    fn port1_multitap_interleaves_port2() {
        // First multitap device stays logical 0; port 2's devices come
        // before the remaining multitap devices.
        let a = PortAssignment::new(PortType::Multitap, PortType::Multitap).unwrap();
        assert_eq!(a.physical_of_logical(0), Some((0, 0)));
        assert_eq!(a.physical_of_logical(1), Some((1, 0)));
        assert_eq!(a.physical_of_logical(2), Some((1, 1)));
        assert_eq!(a.physical_of_logical(3), Some((1, 2)));
        assert_eq!(a.physical_of_logical(4), Some((1, 3)));
        assert_eq!(a.physical_of_logical(5), Some((0, 1)));
        assert_eq!(a.physical_of_logical(6), Some((0, 2)));
        assert_eq!(a.physical_of_logical(7), Some((0, 3)));
    }

    #[test]
    fn multitap_with_single_pad_leaves_gaps() {
        let a = PortAssignment::new(PortType::Multitap, PortType::Gamepad).unwrap();
        // Five devices total: logical slots 2..=4 land on empty port 2
        // controller slots.
        assert_eq!(a.device_type_of_logical(1), DeviceType::Gamepad);
        assert_eq!(a.physical_of_logical(2), Some((1, 1)));
        assert_eq!(a.device_type_of_logical(2), DeviceType::None);
        assert_eq!(a.physical_of_logical(5), None);
    }

    #[test]
    fn superscope_is_port2_only() {
        assert_eq!(PortAssignment::new(PortType::Superscope, PortType::Gamepad),
                   Err(PortTypeError::NotValidForPort1));
        let a = PortAssignment::new(PortType::Gamepad, PortType::Superscope).unwrap();
        assert_eq!(a.device_type_of_logical(1), DeviceType::Superscope);
    }

    #[test]
    fn analog_slot_enumeration() {
        let a = PortAssignment::new(PortType::Mouse, PortType::Justifiers).unwrap();
        let slots = a.analog_slots();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0], AnalogSlot { logical: 0, is_mouse: true });
        assert_eq!(slots[1], AnalogSlot { logical: 1, is_mouse: false });
        assert_eq!(slots[2], AnalogSlot { logical: 2, is_mouse: false });
        assert!(a.analog_is_mouse(0));
        assert!(!a.analog_is_mouse(1));
        assert!(!a.analog_is_mouse(5));

        let b = PortAssignment::new(PortType::Gamepad, PortType::Gamepad).unwrap();
        assert!(b.analog_slots().is_empty());
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn serde_roundtrip() {
        let a = PortAssignment::new(PortType::Multitap, PortType::Justifiers).unwrap();
        let json = serde_json::to_string(&a).unwrap();
        let back: PortAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
