/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Per-control poll counters with data-ready flags.
use core::fmt;

#[cfg(feature = "snapshot")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};
#[cfg(feature = "snapshot")]
use serde::de::{self, SeqAccess, Visitor};
#[cfg(feature = "snapshot")]
use serde::ser::SerializeSeq;

use crate::controls::TOTAL_CONTROLS;

const POLLS_MASK: u32 = 0x7FFF_FFFF;
const READY_MASK: u32 = 0x8000_0000;

/// The poll counter of a single control: how many times the control has been
/// polled since the start of the current frame, and whether fresh data is
/// ready to be polled.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
struct PollCounter {
    polls: u32,
    ready: bool
}

impl PollCounter {
    #[inline]
    fn combined(self) -> u32 {
        self.polls & POLLS_MASK | if self.ready { READY_MASK } else { 0 }
    }

    #[inline]
    fn from_combined(value: u32) -> Self {
        PollCounter {
            polls: value & POLLS_MASK,
            ready: value & READY_MASK != 0
        }
    }
}

/// The poll counter table of the movie logic bridge.
///
/// Each control has a 31-bit poll counter, reset at frame boundaries, and a
/// data-ready flag set at subframe boundaries and cleared when the control is
/// first read within the current polling pass. The table also keeps a
/// frame-level flag recording that the frame-start system poll was issued.
///
/// The in-memory representation keeps the counter and the flag apart; the
/// combined 32-bit layout (high bit = data ready) appears only in the movie
/// state snapshot, via [PollCounters::combined] and
/// [PollCounters::set_combined].
#[derive(Clone, PartialEq, Eq)]
pub struct PollCounters {
    counters: [PollCounter; TOTAL_CONTROLS],
    frame_pending: bool
}

impl Default for PollCounters {
    fn default() -> Self {
        PollCounters {
            counters: [PollCounter::default(); TOTAL_CONTROLS],
            frame_pending: false
        }
    }
}

impl PollCounters {
    /// Creates a new table with all counters zero and all flags clear.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }
    /// Zeroes every counter and clears every data-ready flag, marking the
    /// start of a new frame.
    pub fn next_frame(&mut self) {
        for c in self.counters.iter_mut() {
            *c = PollCounter::default();
        }
        self.frame_pending = true;
    }
    /// Sets every data-ready flag.
    pub fn set_all_ready(&mut self) {
        for c in self.counters.iter_mut() {
            c.ready = true;
        }
    }
    /// Returns the data-ready flag of `control`.
    #[inline]
    pub fn is_ready(&self, control: usize) -> bool {
        self.counters[control].ready
    }
    /// Clears the data-ready flag of `control`.
    #[inline]
    pub fn clear_ready(&mut self, control: usize) {
        self.counters[control].ready = false;
    }
    /// Returns the poll count of `control` for the current frame.
    #[inline]
    pub fn polls(&self, control: usize) -> u32 {
        self.counters[control].polls
    }
    /// Increments the poll count of `control`, saturating at the 31-bit
    /// capacity.
    #[inline]
    pub fn increment(&mut self, control: usize) {
        let c = &mut self.counters[control];
        if c.polls < POLLS_MASK {
            c.polls += 1;
        }
    }
    /// Overrides the poll count of `control`.
    #[inline]
    pub fn set_polls(&mut self, control: usize, polls: u32) {
        self.counters[control].polls = polls & POLLS_MASK;
    }
    /// Returns the largest poll count across all controls.
    pub fn max_polls(&self) -> u32 {
        self.counters.iter().map(|c| c.polls).max().unwrap_or(0)
    }
    /// Returns `true` if the frame-start system poll has been issued but no
    /// continuation subframe has been entered yet.
    #[inline]
    pub fn is_frame_pending(&self) -> bool {
        self.frame_pending
    }
    /// Clears the frame-start pending flag.
    #[inline]
    pub fn clear_frame_pending(&mut self) {
        self.frame_pending = false;
    }
    /// Returns the combined on-disk representation of `control`: the poll
    /// count in the low 31 bits and the data-ready flag in the high bit.
    #[inline]
    pub fn combined(&self, control: usize) -> u32 {
        self.counters[control].combined()
    }
    /// Replaces the counter of `control` from its combined representation.
    #[inline]
    pub fn set_combined(&mut self, control: usize, value: u32) {
        self.counters[control] = PollCounter::from_combined(value);
    }
}

impl fmt::Debug for PollCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.counters.iter().map(|c| c.combined()))
            .finish()
    }
}

#[cfg(feature = "snapshot")]
impl Serialize for PollCounters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(TOTAL_CONTROLS))?;
        for c in self.counters.iter() {
            seq.serialize_element(&c.combined())?;
        }
        seq.end()
    }
}

#[cfg(feature = "snapshot")]
impl<'de> Deserialize<'de> for PollCounters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountersVisitor;

        impl<'de> Visitor<'de> for CountersVisitor {
            type Value = PollCounters;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "a sequence of {} poll counter words", TOTAL_CONTROLS)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<PollCounters, A::Error> {
                let mut res = PollCounters::new();
                for i in 0..TOTAL_CONTROLS {
                    let value: u32 = seq.next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &self))?;
                    res.set_combined(i, value);
                }
                if seq.next_element::<u32>()?.is_some() {
                    return Err(de::Error::invalid_length(TOTAL_CONTROLS + 1, &self));
                }
                Ok(res)
            }
        }

        deserializer.deserialize_seq(CountersVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_and_flags() {
        let mut pc = PollCounters::new();
        assert_eq!(pc.max_polls(), 0);
        pc.increment(4);
        pc.increment(4);
        pc.increment(7);
        assert_eq!(pc.polls(4), 2);
        assert_eq!(pc.polls(7), 1);
        assert_eq!(pc.max_polls(), 2);
        pc.set_all_ready();
        assert!(pc.is_ready(4));
        pc.clear_ready(4);
        assert!(!pc.is_ready(4));
        assert!(pc.is_ready(5));
        pc.next_frame();
        assert_eq!(pc.max_polls(), 0);
        assert!(!pc.is_ready(5));
        assert!(pc.is_frame_pending());
        pc.clear_frame_pending();
        assert!(!pc.is_frame_pending());
    }

    #[test]
    fn combined_layout() {
        let mut pc = PollCounters::new();
        pc.increment(3);
        pc.set_all_ready();
        assert_eq!(pc.combined(3), 0x8000_0001);
        pc.set_combined(3, 0x8000_0005);
        assert_eq!(pc.polls(3), 5);
        assert!(pc.is_ready(3));
        pc.set_combined(3, 7);
        assert_eq!(pc.polls(3), 7);
        assert!(!pc.is_ready(3));
    }
}
