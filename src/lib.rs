/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players for deterministic emulated consoles.

    RETRACK is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License (LGPL) as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    RETRACK is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Lesser General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.

    Author contact information: see Cargo.toml file, section [package.authors].
*/
/*! RETRACK is a library for building rerecording movie recorders and players
for deterministic emulated consoles.

The engine captures a player's inputs frame-accurately into an indexed,
editable input track, replays them bit-for-bit, and supports seeking
backward and re-recording from any point via movie state snapshots. Movies
are stored in an archive format together with authorship metadata, ROM
identity hashes and, for savestate movies, the emulator core state.

The emulator drives the engine through [movie::MovieLogic]: once per frame
via [movie::MovieLogic::new_frame_starting] and once per control poll via
[movie::MovieLogic::input_poll]. Everything else - mode switches, movie
file I/O, status projection - happens between frames.
*/
pub mod controls;
pub mod counters;
pub mod movie;
pub mod status;
pub mod track;
#[cfg(feature = "formats")]
pub mod formats;
#[cfg(feature = "ports")]
pub mod ports;
