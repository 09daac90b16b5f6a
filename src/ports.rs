/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! Controller port types, text codecs and the controller mapping layer.
pub use retrack_ports::*;
