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
//! Controller port types, the per-port text codecs and the controller
//! mapping layer of the RETRACK library.
pub mod codec;
pub mod controller;
pub mod mapping;
pub mod system;
pub mod types;

pub use codec::{decode_line, decode_system, encode_line, encode_system,
    DecodeError, EncodeOutput, PortCodec, WRITE_CONTROL_VERSION};
pub use controller::{controller_status, ControllerError, LiveControls};
pub use mapping::{AnalogSlot, PortAssignment, MAX_LOGICAL_CONTROLLERS};
pub use system::{GameType, SystemRegion};
pub use types::{Button, DeviceType, PortType, PortTypeError};
