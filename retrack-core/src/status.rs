/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! A read-only projection of the movie engine state for status displays.
use core::fmt;

use bitflags::bitflags;
#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::movie::Movie;

bitflags! {
    /// Mode and condition flags of the engine.
    #[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "snapshot", serde(from = "u8", into = "u8"))]
    #[derive(Default)]
    pub struct StatusFlags: u8 {
        /// Read-only (replay) mode.
        const PLAY    = 0b0001;
        /// Read/write (record) mode.
        const RECORD  = 0b0010;
        /// An audio/video dump is in progress.
        const CAPTURE = 0b0100;
        /// The emulated system state is unusable.
        const CORRUPT = 0b1000;
    }
}

impl From<u8> for StatusFlags {
    fn from(bits: u8) -> Self {
        StatusFlags::from_bits_truncate(bits)
    }
}

impl From<StatusFlags> for u8 {
    fn from(flags: StatusFlags) -> u8 {
        flags.bits()
    }
}

/// Where within a frame the engine currently is.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollLocation {
    /// At the start of a frame, before any polls.
    FrameStart,
    /// At a savepoint.
    Savepoint,
    /// At a video refresh.
    VideoRefresh,
    /// Mid-frame; the ordinal the next poll would have.
    Polls(u32)
}

impl fmt::Display for PollLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollLocation::FrameStart => write!(f, "0"),
            PollLocation::Savepoint => write!(f, "S"),
            PollLocation::VideoRefresh => write!(f, "V"),
            PollLocation::Polls(n) => write!(f, "{}", n)
        }
    }
}

/// A snapshot-style status record, computed on demand.
///
/// Capturing never mutates the engine; hosts render it in status bars or
/// log lines. The conventional frame line reads
/// `current(location;lag)/length`, e.g. `1042(5;17)/36000`.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieStatus {
    /// The current frame number.
    pub current_frame: u64,
    /// The position within the current frame.
    pub location: PollLocation,
    /// The number of lag frames so far.
    pub lag_frames: u64,
    /// The movie length in frames.
    pub frame_count: u64,
    /// Mode and condition flags.
    pub flags: StatusFlags
}

impl MovieStatus {
    /// Captures the status of `movie`.
    ///
    /// `location` overrides the mid-frame poll ordinal when the host knows
    /// it is at a special point (frame start, savepoint, video refresh);
    /// `capturing` and `corrupt` merge host-side conditions into the flags.
    pub fn capture(movie: &Movie, location: Option<PollLocation>,
                   capturing: bool, corrupt: bool) -> Self
    {
        let location = location
            .unwrap_or_else(|| PollLocation::Polls(movie.next_poll_number()));
        let mut flags = if movie.readonly() { StatusFlags::PLAY } else { StatusFlags::RECORD };
        if capturing {
            flags |= StatusFlags::CAPTURE;
        }
        if corrupt {
            flags |= StatusFlags::CORRUPT;
        }
        MovieStatus {
            current_frame: movie.current_frame(),
            location,
            lag_frames: movie.lag_frames(),
            frame_count: movie.frame_count(),
            flags
        }
    }
    /// Renders the flags the way status bars conventionally show them.
    pub fn flags_line(&self) -> String {
        let mut line = String::new();
        if self.flags.contains(StatusFlags::PLAY) {
            line.push_str("PLAY ");
        }
        if self.flags.contains(StatusFlags::RECORD) {
            line.push_str("REC ");
        }
        if self.flags.contains(StatusFlags::CAPTURE) {
            line.push_str("CAP ");
        }
        if self.flags.contains(StatusFlags::CORRUPT) {
            line.push_str("CORRUPT ");
        }
        line
    }
}

impl fmt::Display for MovieStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({};{})/{}",
            self.current_frame, self.location, self.lag_frames, self.frame_count)
    }
}
