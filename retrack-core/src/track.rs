/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! The input track: an indexed, growable sequence of control snapshots.
use core::cell::Cell;
use core::ops::Index;

#[cfg(feature = "snapshot")]
use serde::{Serialize, Deserialize};

use crate::controls::Controls;

/// An ordered sequence of [Controls] snapshots, one per subframe.
///
/// Subframe index is the position in the sequence. Frames are counted from 1:
/// a snapshot with the frame sync flag set starts a new frame and every
/// following snapshot without the flag belongs to the same frame. Frame 0
/// means "before the start of the track".
///
/// Invariant: if the track is not empty, its first snapshot has the frame
/// sync flag set.
#[cfg_attr(feature = "snapshot", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct InputTrack {
    data: Vec<Controls>,
    frames: u64,
    // Forward scan cursor: the first subframe index of cached_frame.
    #[cfg_attr(feature = "snapshot", serde(skip))]
    cached_frame: Cell<u64>,
    #[cfg_attr(feature = "snapshot", serde(skip))]
    cached_subframe: Cell<u64>
}

impl InputTrack {
    /// Creates a new empty track.
    pub fn new() -> Self {
        let track = InputTrack {
            data: Vec::new(),
            frames: 0,
            cached_frame: Cell::new(0),
            cached_subframe: Cell::new(0)
        };
        track.clear_cache();
        track
    }
    /// Creates a track from raw snapshots, counting the frames they contain.
    ///
    /// The first snapshot, if any, should have the frame sync flag set;
    /// callers validate this before constructing a track.
    pub fn from_snapshots(data: Vec<Controls>) -> Self {
        let frames = data.iter().filter(|c| c.is_sync()).count() as u64;
        let track = InputTrack { data, frames, ..InputTrack::new() };
        track.clear_cache();
        track
    }
    /// Returns the number of subframes in the track.
    #[inline]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }
    /// Returns `true` if the track contains no subframes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Returns the number of frames in the track.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
    /// Returns the snapshot at the given subframe index, if present.
    pub fn snapshot(&self, index: u64) -> Option<&Controls> {
        self.data.get(index as usize)
    }
    /// Appends a snapshot, starting a new frame when its sync flag is set.
    pub fn append(&mut self, snapshot: Controls) {
        if snapshot.is_sync() {
            self.frames += 1;
        }
        self.data.push(snapshot);
    }
    /// Replaces the snapshot at the given subframe index.
    ///
    /// Callers enforce the write-mode and playhead rules; this only keeps
    /// the frame count and the scan cursor consistent.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn set_snapshot(&mut self, index: u64, snapshot: Controls) {
        let changed = self.data[index as usize].is_sync() != snapshot.is_sync();
        if changed {
            if snapshot.is_sync() {
                self.frames += 1;
            }
            else {
                self.frames -= 1;
            }
            self.clear_cache();
        }
        self.data[index as usize] = snapshot;
    }
    /// Shortens the track to `len` subframes, recomputing the frame count.
    pub fn truncate(&mut self, len: u64) {
        if len < self.len() {
            self.data.truncate(len as usize);
            self.frames = self.data.iter().filter(|c| c.is_sync()).count() as u64;
            self.clear_cache();
        }
    }
    /// Removes all subframes.
    pub fn clear(&mut self) {
        self.data.clear();
        self.frames = 0;
        self.clear_cache();
    }
    /// Counts the subframes of the frame starting at the given subframe
    /// index: the run of consecutive snapshots up to, but not including, the
    /// next snapshot with the sync flag set. Returns 0 past the end of the
    /// track.
    pub fn count_changes(&self, first_subframe: u64) -> u32 {
        let first_subframe = first_subframe as usize;
        if first_subframe >= self.data.len() {
            return 0;
        }
        let mut ret = 1;
        while first_subframe + ret < self.data.len()
                && !self.data[first_subframe + ret].is_sync() {
            ret += 1;
        }
        ret as u32
    }
    /// Returns the number of subframes stored for the 1-based `frame`, or 0
    /// if the frame is beyond the track.
    pub fn subframes_in_frame(&self, frame: u64) -> u64 {
        if frame == 0 {
            return 0;
        }
        let p = self.seek(frame);
        self.count_changes(p) as u64
    }
    /// Returns the snapshot of the 1-based `frame` at logical sub-index
    /// `subframe`.
    ///
    /// A sub-index at or past the recorded run repeats the last recorded
    /// snapshot of the frame. A frame beyond the track reads as a blank
    /// sync snapshot.
    pub fn read_subframe(&self, frame: u64, subframe: u64) -> Controls {
        if frame == 0 {
            return Controls::sync();
        }
        let p = self.seek(frame);
        let max = self.count_changes(p) as u64;
        if max == 0 {
            return Controls::sync();
        }
        let subframe = subframe.min(max - 1);
        self.data[(p + subframe) as usize].clone()
    }
    /// Propagates `value` into the control slot of every subframe from
    /// `from` to the end of the track.
    pub(crate) fn propagate_control(&mut self, from: u64, control: usize, value: i16) {
        for c in self.data[from as usize..].iter_mut() {
            c[control] = value;
        }
    }
    /// Copies the control slot of the subframe at `source` into every
    /// subframe of `range`.
    pub(crate) fn fill_control(&mut self, range: core::ops::Range<u64>, control: usize, source: u64) {
        let value = self.data[source as usize][control];
        for c in self.data[range.start as usize..range.end as usize].iter_mut() {
            c[control] = value;
        }
    }
    pub(crate) fn set_control(&mut self, index: u64, control: usize, value: i16) {
        self.data[index as usize][control] = value;
    }
    /// Returns a clone of the whole sequence.
    pub fn to_snapshots(&self) -> Vec<Controls> {
        self.data.clone()
    }
    /// Returns the first subframe index of the 1-based `frame`, advancing
    /// the forward scan cursor.
    fn seek(&self, frame: u64) -> u64 {
        // A zeroed cursor (as left by deserialization) is out of range:
        // frames are counted from 1.
        if frame < self.cached_frame.get() || self.cached_frame.get() == 0 {
            self.clear_cache();
        }
        let mut p = self.cached_subframe.get();
        for _ in self.cached_frame.get()..frame {
            p += self.count_changes(p) as u64;
        }
        self.cached_frame.set(frame);
        self.cached_subframe.set(p);
        p
    }
    pub(crate) fn clear_cache(&self) {
        self.cached_frame.set(1);
        self.cached_subframe.set(0);
    }
}

impl Index<u64> for InputTrack {
    type Output = Controls;
    #[inline]
    fn index(&self, index: u64) -> &Controls {
        &self.data[index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sync: bool, control: usize, value: i16) -> Controls {
        let mut c = if sync { Controls::sync() } else { Controls::new() };
        c[control] = value;
        c
    }

    #[test]
    fn frame_counting() {
        let mut track = InputTrack::new();
        assert_eq!(track.frame_count(), 0);
        track.append(snapshot(true, 4, 1));
        track.append(snapshot(false, 4, 2));
        track.append(snapshot(false, 4, 3));
        track.append(snapshot(true, 4, 4));
        assert_eq!(track.len(), 4);
        assert_eq!(track.frame_count(), 2);
        assert_eq!(track.subframes_in_frame(1), 3);
        assert_eq!(track.subframes_in_frame(2), 1);
        assert_eq!(track.subframes_in_frame(3), 0);
    }

    #[test]
    fn read_subframe_clamps_and_defaults() {
        let mut track = InputTrack::new();
        track.append(snapshot(true, 4, 1));
        track.append(snapshot(false, 4, 2));
        track.append(snapshot(true, 4, 3));
        assert_eq!(track.read_subframe(1, 0)[4], 1);
        assert_eq!(track.read_subframe(1, 1)[4], 2);
        assert_eq!(track.read_subframe(1, 7)[4], 2);
        assert_eq!(track.read_subframe(2, 0)[4], 3);
        let blank = track.read_subframe(5, 0);
        assert!(blank.is_sync());
        assert_eq!(blank[4], 0);
    }

    #[test]
    fn backwards_reads_reset_the_cursor() {
        let mut track = InputTrack::new();
        for f in 0..4 {
            track.append(snapshot(true, 4, f * 10));
            track.append(snapshot(false, 4, f * 10 + 1));
        }
        assert_eq!(track.read_subframe(4, 0)[4], 30);
        assert_eq!(track.read_subframe(2, 1)[4], 11);
        assert_eq!(track.read_subframe(3, 0)[4], 20);
    }

    #[test]
    fn truncate_recounts_frames() {
        let mut track = InputTrack::new();
        track.append(snapshot(true, 4, 1));
        track.append(snapshot(false, 4, 2));
        track.append(snapshot(true, 4, 3));
        track.append(snapshot(true, 4, 4));
        track.truncate(2);
        assert_eq!(track.len(), 2);
        assert_eq!(track.frame_count(), 1);
        assert_eq!(track.subframes_in_frame(1), 2);
    }

    #[test]
    fn set_snapshot_adjusts_frame_count() {
        let mut track = InputTrack::new();
        track.append(snapshot(true, 4, 1));
        track.append(snapshot(false, 4, 2));
        track.set_snapshot(1, snapshot(true, 4, 2));
        assert_eq!(track.frame_count(), 2);
        track.set_snapshot(1, snapshot(false, 4, 2));
        assert_eq!(track.frame_count(), 1);
    }
}
