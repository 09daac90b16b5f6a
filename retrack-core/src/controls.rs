/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! A fixed-shape record of one subframe's control values.
use core::fmt;
use core::ops::{BitXor, BitXorAssign, Index, IndexMut};

#[cfg(feature = "snapshot")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
#[cfg(feature = "snapshot")]
use serde::de::{self, SeqAccess, Visitor};
#[cfg(feature = "snapshot")]
use serde::ser::SerializeSeq;

/// The control index of the frame sync flag.
pub const CONTROL_FRAME_SYNC: usize = 0;
/// The control index of the system reset request.
pub const CONTROL_SYSTEM_RESET: usize = 1;
/// The control index of the high part of the reset delay (multiplier 10000).
pub const CONTROL_SYSTEM_RESET_CYCLES_HI: usize = 2;
/// The control index of the low part of the reset delay (multiplier 1).
pub const CONTROL_SYSTEM_RESET_CYCLES_LO: usize = 3;
/// The number of system controls preceding the per-controller slots.
pub const MAX_SYSTEM_CONTROLS: usize = 4;
/// The number of controller ports.
pub const MAX_PORTS: usize = 2;
/// The number of controllers a multitap can connect to a single port.
pub const MAX_CONTROLLERS_PER_PORT: usize = 4;
/// The number of controls on the largest supported controller.
pub const CONTROLLER_CONTROLS: usize = 12;
/// The total number of control slots in a [Controls] record.
pub const TOTAL_CONTROLS: usize = MAX_SYSTEM_CONTROLS
    + MAX_PORTS * MAX_CONTROLLERS_PER_PORT * CONTROLLER_CONTROLS;

/// Gamepad button control numbers, in wire order.
pub mod gamepad {
    pub const UP: usize     = 0;
    pub const DOWN: usize   = 1;
    pub const LEFT: usize   = 2;
    pub const RIGHT: usize  = 3;
    pub const A: usize      = 4;
    pub const B: usize      = 5;
    pub const X: usize      = 6;
    pub const Y: usize      = 7;
    pub const L: usize      = 8;
    pub const R: usize      = 9;
    pub const SELECT: usize = 10;
    pub const START: usize  = 11;
}

/// Mouse control numbers.
pub mod mouse {
    pub const X: usize     = 0;
    pub const Y: usize     = 1;
    pub const LEFT: usize  = 2;
    pub const RIGHT: usize = 3;
}

/// Super Scope control numbers.
pub mod superscope {
    pub const X: usize       = 0;
    pub const Y: usize       = 1;
    pub const TRIGGER: usize = 2;
    pub const CURSOR: usize  = 3;
    pub const TURBO: usize   = 4;
    pub const PAUSE: usize   = 5;
}

/// Justifier control numbers.
pub mod justifier {
    pub const X: usize       = 0;
    pub const Y: usize       = 1;
    pub const TRIGGER: usize = 2;
    pub const START: usize   = 3;
}

/// Returns the flat control index of the `(port, controller, control)` tuple.
///
/// # Panics
/// Panics if `port`, `controller` or `control` is out of range.
#[inline]
pub fn control_index(port: usize, controller: usize, control: usize) -> usize {
    try_control_index(port, controller, control)
        .expect("port, controller or control out of range")
}

/// Returns the flat control index of the `(port, controller, control)` tuple
/// or `None` if any component is out of range.
#[inline]
pub fn try_control_index(port: usize, controller: usize, control: usize) -> Option<usize> {
    if port < MAX_PORTS && controller < MAX_CONTROLLERS_PER_PORT
                        && control < CONTROLLER_CONTROLS {
        Some(MAX_SYSTEM_CONTROLS
             + port * MAX_CONTROLLERS_PER_PORT * CONTROLLER_CONTROLS
             + controller * CONTROLLER_CONTROLS
             + control)
    }
    else {
        None
    }
}

/// Control values for a single subframe or instant of time.
///
/// A fixed-width record of signed 16-bit values: a system prefix of
/// [MAX_SYSTEM_CONTROLS] slots followed by [CONTROLLER_CONTROLS] slots for
/// each of the [MAX_CONTROLLERS_PER_PORT] controllers on each of the
/// [MAX_PORTS] ports. Buttons read as 0 (released) or nonzero (pressed),
/// axes as signed values.
///
/// This is a plain value type: clone it freely, compare it for equality and
/// combine records with `^` for autohold or autofire style toggling.
#[derive(Clone, PartialEq, Eq)]
pub struct Controls {
    controls: [i16; TOTAL_CONTROLS]
}

impl Default for Controls {
    fn default() -> Self {
        Controls { controls: [0; TOTAL_CONTROLS] }
    }
}

impl Controls {
    /// Creates a new record with all buttons released and all axes neutral.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }
    /// Creates a new blank record marking the first subframe of a frame.
    #[inline]
    pub fn sync() -> Self {
        let mut c = Controls::new();
        c.controls[CONTROL_FRAME_SYNC] = 1;
        c
    }
    /// Returns `true` if this record marks the first subframe of a frame.
    #[inline]
    pub fn is_sync(&self) -> bool {
        self.controls[CONTROL_FRAME_SYNC] != 0
    }
    /// Sets or clears the frame sync flag.
    #[inline]
    pub fn set_sync(&mut self, sync: bool) {
        self.controls[CONTROL_FRAME_SYNC] = sync as i16;
    }
    /// Returns the value of the control at `(port, controller, control)`.
    ///
    /// # Panics
    /// Panics if the tuple is out of range.
    #[inline]
    pub fn get(&self, port: usize, controller: usize, control: usize) -> i16 {
        self.controls[control_index(port, controller, control)]
    }
    /// Sets the value of the control at `(port, controller, control)`.
    ///
    /// # Panics
    /// Panics if the tuple is out of range.
    #[inline]
    pub fn set(&mut self, port: usize, controller: usize, control: usize, value: i16) {
        self.controls[control_index(port, controller, control)] = value;
    }
    /// Returns the requested delayed reset amount in cycles, or `None` when
    /// this record does not request a reset.
    ///
    /// The amount is `RESET_CYCLES_HI * 10000 + RESET_CYCLES_LO`; 0 means an
    /// immediate reset at the start of the frame.
    pub fn reset_delay(&self) -> Option<u32> {
        if self.controls[CONTROL_SYSTEM_RESET] != 0 {
            let hi = self.controls[CONTROL_SYSTEM_RESET_CYCLES_HI] as u32;
            let lo = self.controls[CONTROL_SYSTEM_RESET_CYCLES_LO] as u32;
            Some(hi * 10000 + lo)
        }
        else {
            None
        }
    }
    /// Requests a reset delayed by the given number of cycles, or clears any
    /// pending request when `delay` is `None`.
    pub fn set_reset_delay(&mut self, delay: Option<u32>) {
        match delay {
            Some(cycles) => {
                self.controls[CONTROL_SYSTEM_RESET] = 1;
                self.controls[CONTROL_SYSTEM_RESET_CYCLES_HI] = (cycles / 10000) as i16;
                self.controls[CONTROL_SYSTEM_RESET_CYCLES_LO] = (cycles % 10000) as i16;
            }
            None => {
                self.controls[CONTROL_SYSTEM_RESET] = 0;
                self.controls[CONTROL_SYSTEM_RESET_CYCLES_HI] = 0;
                self.controls[CONTROL_SYSTEM_RESET_CYCLES_LO] = 0;
            }
        }
    }
    /// Returns the raw control slots.
    #[inline]
    pub fn as_slice(&self) -> &[i16] {
        &self.controls
    }
}

impl Index<usize> for Controls {
    type Output = i16;
    #[inline]
    fn index(&self, index: usize) -> &i16 {
        &self.controls[index]
    }
}

impl IndexMut<usize> for Controls {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut i16 {
        &mut self.controls[index]
    }
}

impl BitXor for Controls {
    type Output = Controls;
    fn bitxor(mut self, other: Controls) -> Controls {
        self ^= other;
        self
    }
}

impl BitXorAssign for Controls {
    fn bitxor_assign(&mut self, other: Controls) {
        for (a, b) in self.controls.iter_mut().zip(other.controls.iter()) {
            *a ^= *b;
        }
    }
}

impl<'a> BitXorAssign<&'a Controls> for Controls {
    fn bitxor_assign(&mut self, other: &Controls) {
        for (a, b) in self.controls.iter_mut().zip(other.controls.iter()) {
            *a ^= *b;
        }
    }
}

impl fmt::Debug for Controls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.controls.iter()).finish()
    }
}

#[cfg(feature = "snapshot")]
impl Serialize for Controls {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(TOTAL_CONTROLS))?;
        for v in self.controls.iter() {
            seq.serialize_element(v)?;
        }
        seq.end()
    }
}

#[cfg(feature = "snapshot")]
impl<'de> Deserialize<'de> for Controls {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ControlsVisitor;

        impl<'de> Visitor<'de> for ControlsVisitor {
            type Value = Controls;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "a sequence of {} control values", TOTAL_CONTROLS)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Controls, A::Error> {
                let mut res = Controls::new();
                for i in 0..TOTAL_CONTROLS {
                    res.controls[i] = seq.next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                }
                if seq.next_element::<i16>()?.is_some() {
                    return Err(de::Error::invalid_length(TOTAL_CONTROLS + 1, &self));
                }
                Ok(res)
            }
        }

        deserializer.deserialize_seq(ControlsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_layout() {
        assert_eq!(TOTAL_CONTROLS, 100);
        assert_eq!(control_index(0, 0, 0), MAX_SYSTEM_CONTROLS);
        assert_eq!(control_index(1, 0, 0), MAX_SYSTEM_CONTROLS + 48);
        assert_eq!(control_index(1, 3, 11), TOTAL_CONTROLS - 1);
        assert_eq!(try_control_index(2, 0, 0), None);
        assert_eq!(try_control_index(0, 4, 0), None);
        assert_eq!(try_control_index(0, 0, 12), None);
    }

    #[test]
    fn sync_and_reset_fields() {
        let mut c = Controls::sync();
        assert!(c.is_sync());
        assert_eq!(c.reset_delay(), None);
        c.set_reset_delay(Some(30007));
        assert_eq!(c[CONTROL_SYSTEM_RESET], 1);
        assert_eq!(c[CONTROL_SYSTEM_RESET_CYCLES_HI], 3);
        assert_eq!(c[CONTROL_SYSTEM_RESET_CYCLES_LO], 7);
        assert_eq!(c.reset_delay(), Some(30007));
        c.set_reset_delay(None);
        assert_eq!(c.reset_delay(), None);
    }

    #[test]
    fn xor_toggles_controls() {
        let mut a = Controls::new();
        let mut b = Controls::new();
        a.set(0, 0, gamepad::A, 1);
        b.set(0, 0, gamepad::A, 1);
        b.set(0, 0, gamepad::B, 1);
        let c = a.clone() ^ b.clone();
        assert_eq!(c.get(0, 0, gamepad::A), 0);
        assert_eq!(c.get(0, 0, gamepad::B), 1);
        assert_eq!(c.clone() ^ b, a);
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn serde_roundtrip() {
        let mut c = Controls::sync();
        c.set(1, 2, gamepad::START, 1);
        c.set(0, 0, mouse::X, -137);
        let json = serde_json::to_string(&c).unwrap();
        let back: Controls = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
