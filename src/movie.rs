/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! The movie logic bridge and its state snapshot codec.
pub use retrack_core::movie::*;
pub use retrack_core::state::MOVIE_STATE_SIZE;
