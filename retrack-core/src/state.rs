/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! The movie state snapshot codec.
//!
//! Layout of the self-describing byte string:
//!
//! | offset | size | description                                    |
//! |--------|------|------------------------------------------------|
//! |      0 |   32 | SHA-256 of the project ID                      |
//! |     32 |    8 | current frame number, big-endian               |
//! |     40 |  400 | poll counters, 4 bytes each, big-endian        |
//! |    440 |    8 | lag frame count, big-endian (high bit masked)  |
//! |    448 |   32 | movie hash over the input polled so far        |
//! |    480 |   32 | SHA-256 over all of the above                  |
//!
//! Total size: `512` bytes.
//!
//! The movie hash covers every prior frame's canonical subframes (trailing
//! rows equal to their predecessor collapse) followed by, for each control,
//! the values that would have been polled so far in the current frame. It is
//! computed in a fixed canonical order regardless of actual poll order, so
//! a snapshot can be validated against the track it was taken from.
use sha2::{Digest, Sha256};

use crate::controls::{Controls, CONTROL_FRAME_SYNC, TOTAL_CONTROLS};
use crate::counters::PollCounters;
use crate::movie::{Movie, MovieError, Result};
use crate::track::InputTrack;

/// The exact size of a serialized movie state snapshot.
pub const MOVIE_STATE_SIZE: usize = 112 + 4 * TOTAL_CONTROLS;

const HASH_SIZE: usize = 32;

#[inline]
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])
}

#[inline]
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_be_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
}

fn hash_str(s: &str) -> [u8; HASH_SIZE] {
    let mut ctx = Sha256::new();
    ctx.update(s.as_bytes());
    ctx.finalize().into()
}

fn hash_subframe(ctx: &mut Sha256, controls: &Controls) {
    let mut buf = [0u8; 2 * TOTAL_CONTROLS];
    for (chunk, value) in buf.chunks_exact_mut(2).zip(controls.as_slice()) {
        chunk.copy_from_slice(&(*value as u16).to_be_bytes());
    }
    ctx.update(&buf[..]);
}

// Hashes one frame in canonical form and returns the starting subframe of
// the next frame. Trailing subframes identical to their predecessor do not
// contribute, so equivalent tracks hash equal.
fn hash_frame(ctx: &mut Sha256, data: &InputTrack, first_subframe: u64) -> u64 {
    if first_subframe >= data.len() {
        // Hash an empty frame.
        hash_subframe(ctx, &Controls::sync());
        return first_subframe;
    }
    let mut subframes_to_hash = 1;
    let mut last_differing = 1;
    let mut prev = data[first_subframe].clone();
    prev[CONTROL_FRAME_SYNC] = 0;
    while first_subframe + subframes_to_hash < data.len()
            && !data[first_subframe + subframes_to_hash].is_sync() {
        if data[first_subframe + subframes_to_hash] != prev {
            last_differing = subframes_to_hash + 1;
        }
        prev = data[first_subframe + subframes_to_hash].clone();
        subframes_to_hash += 1;
    }
    let next = first_subframe + subframes_to_hash;
    for i in 0..last_differing {
        hash_subframe(ctx, &data[first_subframe + i]);
    }
    next
}

fn hash_movie(current_frame: u64, counters: &PollCounters, data: &InputTrack) -> [u8; HASH_SIZE] {
    let mut ctx = Sha256::new();
    // Before the first frame the hash is empty.
    if current_frame == 0 {
        return ctx.finalize().into();
    }
    // Hash past frames.
    let mut current_subframe = 0;
    for _ in 1..current_frame {
        current_subframe = hash_frame(&mut ctx, data, current_subframe);
    }
    // The current frame is hashed per control, up to its own poll count.
    for i in 0..TOTAL_CONTROLS {
        let polls = counters.polls(i) as u64;
        let mut last_seen: i16 = 0;
        for j in 0..polls {
            if current_subframe + j < data.len() && !data[current_subframe + j].is_sync() {
                last_seen = data[current_subframe + j][i];
            }
            ctx.update(&(last_seen as u16).to_be_bytes());
        }
    }
    ctx.finalize().into()
}

impl Movie {
    /// Serializes the state of the movie logic.
    pub fn save_state(&self) -> Vec<u8> {
        let mut ret = Vec::with_capacity(MOVIE_STATE_SIZE);
        ret.extend_from_slice(&hash_str(&self.project_id));
        ret.extend_from_slice(&self.current_frame.to_be_bytes());
        for i in 0..TOTAL_CONTROLS {
            ret.extend_from_slice(&self.counters.combined(i).to_be_bytes());
        }
        ret.extend_from_slice(&self.lag_frames.to_be_bytes());
        ret.extend_from_slice(&hash_movie(self.current_frame, &self.counters, &self.data));
        let mut ctx = Sha256::new();
        ctx.update(&ret);
        let check: [u8; HASH_SIZE] = ctx.finalize().into();
        ret.extend_from_slice(&check);
        ret
    }
    /// Restores previously serialized state of the movie logic and leaves
    /// the movie in the mode given by `readonly`.
    ///
    /// The snapshot must come from this project and must be consistent with
    /// the current input track up to the restored position; otherwise the
    /// movie is left untouched and an error is returned. Entering read/write
    /// mode applies the usual track truncation.
    pub fn restore_state(&mut self, state: &[u8], readonly: bool) -> Result<()> {
        if state.len() != MOVIE_STATE_SIZE {
            return Err(MovieError::CorruptMovie("movie state has wrong length"));
        }
        let mut ctx = Sha256::new();
        ctx.update(&state[..state.len() - HASH_SIZE]);
        let check: [u8; HASH_SIZE] = ctx.finalize().into();
        if check[..] != state[state.len() - HASH_SIZE..] {
            return Err(MovieError::CorruptMovie("movie state checksum does not match"));
        }
        let mut ptr = 0;
        if hash_str(&self.project_id)[..] != state[ptr..ptr + HASH_SIZE] {
            return Err(MovieError::HashMismatch("state is not from this project"));
        }
        ptr += HASH_SIZE;
        let current_frame = read_u64(&state[ptr..]);
        ptr += 8;
        let mut first_subframe = 0u64;
        for _ in 1..current_frame {
            first_subframe += self.data.count_changes(first_subframe) as u64;
        }
        let mut counters = PollCounters::new();
        for i in 0..TOTAL_CONTROLS {
            counters.set_combined(i, read_u32(&state[ptr..]));
            ptr += 4;
        }
        let lag_frames = read_u64(&state[ptr..]) & 0x7FFF_FFFF_FFFF_FFFF;
        ptr += 8;
        if hash_movie(current_frame, &counters, &self.data)[..] != state[ptr..ptr + HASH_SIZE] {
            return Err(MovieError::HashMismatch("state is not from this movie"));
        }
        // All checks pass. Restore in read-only mode so the normal mode
        // switch performs the read/write truncation.
        self.readonly = true;
        self.current_frame = current_frame;
        self.current_frame_first_subframe = first_subframe;
        self.counters = counters;
        self.lag_frames = lag_frames;
        self.set_readonly(readonly);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_two_frames() -> Movie {
        let mut m = Movie::new();
        m.set_project_id("test project".to_string());
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        m.set_controls(c.clone());
        m.next_input(4).unwrap();
        m.next_frame();
        c[4] = 2;
        m.set_controls(c);
        m.next_input(4).unwrap();
        m
    }

    #[test]
    fn state_size_is_fixed() {
        let m = record_two_frames();
        assert_eq!(m.save_state().len(), MOVIE_STATE_SIZE);
        assert_eq!(MOVIE_STATE_SIZE, 512);
    }

    #[test]
    fn restore_roundtrip_preserves_position() {
        let mut m = record_two_frames();
        let state = m.save_state();
        // Wander off and come back.
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 9;
        m.set_controls(c);
        m.next_input(4).unwrap();
        m.restore_state(&state, false).unwrap();
        assert_eq!(m.current_frame(), 2);
        assert_eq!(m.lag_frames(), 0);
        assert_eq!(m.counters.polls(4), 1);
        assert_eq!(m.save_state(), state);
    }

    #[test]
    fn restore_rejects_tampering() {
        let mut m = record_two_frames();
        let state = m.save_state();

        let err = m.restore_state(&state[1..], true).unwrap_err();
        assert!(matches!(err, MovieError::CorruptMovie(_)));

        let mut bad = state.clone();
        bad[40] ^= 1;
        let err = m.restore_state(&bad, true).unwrap_err();
        assert!(matches!(err, MovieError::CorruptMovie(_)));

        // A failed restore leaves the movie untouched.
        assert_eq!(m.current_frame(), 2);
    }

    #[test]
    fn restore_rejects_foreign_project() {
        let mut m = record_two_frames();
        let state = m.save_state();
        m.set_project_id("another project".to_string());
        let err = m.restore_state(&state, true).unwrap_err();
        assert!(matches!(err, MovieError::HashMismatch(_)));
    }

    #[test]
    fn restore_rejects_diverged_track() {
        let mut m = record_two_frames();
        let state = m.save_state();
        // Rewrite history: the polled value of frame 1 changes.
        let mut other = Movie::new();
        other.set_project_id("test project".to_string());
        other.set_readonly(false);
        other.next_frame();
        let mut c = Controls::new();
        c[4] = 5;
        other.set_controls(c.clone());
        other.next_input(4).unwrap();
        other.next_frame();
        c[4] = 2;
        other.set_controls(c);
        other.next_input(4).unwrap();
        let err = other.restore_state(&state, true).unwrap_err();
        assert!(matches!(err, MovieError::HashMismatch(_)));
    }

    #[test]
    fn canonical_hash_ignores_trailing_duplicates() {
        // Two tracks equal up to trailing duplicate subframes in a past
        // frame hash the same.
        let mut a = Movie::new();
        a.set_readonly(false);
        a.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        a.set_controls(c.clone());
        a.next_input(4).unwrap();
        a.next_input(4).unwrap();
        a.next_frame();

        let mut b = Movie::new();
        b.set_readonly(false);
        b.next_frame();
        b.set_controls(c);
        b.next_input(4).unwrap();
        b.next_frame();

        assert_eq!(a.save_state(), b.save_state());
    }
}
