/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Game type and region metadata.
use core::fmt;
use core::time::Duration;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

/// The video region the emulated console runs in.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemRegion {
    Ntsc,
    Pal
}

impl SystemRegion {
    /// Returns the nominal framerate as a `(numerator, denominator)` pair
    /// of frames per second.
    pub fn fps(self) -> (u32, u32) {
        match self {
            SystemRegion::Ntsc => (10_738_636, 178_683),
            SystemRegion::Pal => (322_445, 6_448)
        }
    }
    /// Returns the nominal duration of a single frame.
    pub fn frame_duration(self) -> Duration {
        let (num, den) = self.fps();
        Duration::from_nanos(1_000_000_000u64 * den as u64 / num as u64)
    }
}

/// The type and region of the game a movie was made for.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameType {
    SnesNtsc,
    SnesPal,
    BsxSlotted,
    Bsx,
    SufamiTurbo,
    SgbNtsc,
    SgbPal
}

impl GameType {
    /// All game types, in wire-value order.
    pub const ALL: [GameType; 7] = [
        GameType::SnesNtsc, GameType::SnesPal, GameType::BsxSlotted,
        GameType::Bsx, GameType::SufamiTurbo, GameType::SgbNtsc, GameType::SgbPal
    ];
    /// Returns the canonical name of the game type.
    pub fn name(self) -> &'static str {
        match self {
            GameType::SnesNtsc => "snes_ntsc",
            GameType::SnesPal => "snes_pal",
            GameType::BsxSlotted => "bsxslotted",
            GameType::Bsx => "bsx",
            GameType::SufamiTurbo => "sufamiturbo",
            GameType::SgbNtsc => "sgb_ntsc",
            GameType::SgbPal => "sgb_pal"
        }
    }
    /// Looks a game type up by name.
    pub fn lookup(name: &str) -> Option<Self> {
        GameType::ALL.iter().copied().find(|gt| gt.name() == name)
    }
    /// Returns the region the game type runs in.
    pub fn region(self) -> SystemRegion {
        match self {
            GameType::SnesPal | GameType::SgbPal => SystemRegion::Pal,
            _ => SystemRegion::Ntsc
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
