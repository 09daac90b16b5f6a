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
//! The core components of the RETRACK library.
pub mod controls;
pub mod counters;
pub mod movie;
pub mod state;
pub mod status;
pub mod track;

pub use controls::{Controls, control_index,
    CONTROL_FRAME_SYNC, CONTROL_SYSTEM_RESET,
    CONTROL_SYSTEM_RESET_CYCLES_HI, CONTROL_SYSTEM_RESET_CYCLES_LO,
    MAX_SYSTEM_CONTROLS, MAX_PORTS, MAX_CONTROLLERS_PER_PORT,
    CONTROLLER_CONTROLS, TOTAL_CONTROLS};
pub use counters::PollCounters;
pub use movie::{ControlSource, FixedControls, Movie, MovieError, MovieLogic};
pub use state::MOVIE_STATE_SIZE;
pub use status::{MovieStatus, PollLocation, StatusFlags};
pub use track::InputTrack;
