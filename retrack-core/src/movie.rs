/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! The movie logic bridge: the state machine mediating between the emulated
//! machine's per-poll input requests and the input track.
use core::fmt;

use crate::controls::{Controls, try_control_index,
    CONTROL_FRAME_SYNC, CONTROL_SYSTEM_RESET,
    CONTROL_SYSTEM_RESET_CYCLES_HI, CONTROL_SYSTEM_RESET_CYCLES_LO,
    MAX_SYSTEM_CONTROLS, MAX_PORTS, MAX_CONTROLLERS_PER_PORT,
    CONTROLLER_CONTROLS, TOTAL_CONTROLS};
use crate::counters::PollCounters;
use crate::track::InputTrack;

/// An error from the movie logic bridge or the movie state codecs.
#[derive(Debug)]
pub enum MovieError {
    /// A control index or `(port, controller, control)` tuple is out of range.
    InvalidControlIndex,
    /// A write-mode edit targeted a subframe earlier than the playhead allows.
    CannotEditPast,
    /// A mutating operation was attempted in read-only mode.
    ReadOnly,
    /// Structurally invalid movie data.
    CorruptMovie(&'static str),
    /// A movie state snapshot does not belong to this project or track.
    HashMismatch(&'static str),
    /// A bad user-supplied value.
    InvalidArgument(&'static str)
}

impl std::error::Error for MovieError {}

impl fmt::Display for MovieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieError::InvalidControlIndex => write!(f, "Control index is out of range"),
            MovieError::CannotEditPast => write!(f, "Input earlier than the playhead can't be edited"),
            MovieError::ReadOnly => write!(f, "Movie is in read-only mode"),
            MovieError::CorruptMovie(what) => write!(f, "Corrupt movie data: {}", what),
            MovieError::HashMismatch(what) => write!(f, "{}", what),
            MovieError::InvalidArgument(what) => write!(f, "{}", what)
        }
    }
}

pub type Result<T> = core::result::Result<T, MovieError>;

/// A movie being played back or recorded.
///
/// The bridge exclusively owns the active input track and the poll counter
/// table. The emulated machine drives it through [Movie::next_frame] at each
/// frame boundary and [Movie::next_input] for every control poll; in
/// read-only mode polls replay the track, in read/write mode they record the
/// live controls into it.
#[derive(Clone, Debug, Default)]
pub struct Movie {
    pub(crate) readonly: bool,
    // Movie (not global) rerecord count.
    pub(crate) rerecords: String,
    pub(crate) project_id: String,
    pub(crate) data: InputTrack,
    // Current frame + 1; 0 before the first next_frame() call.
    pub(crate) current_frame: u64,
    // First subframe of the current frame (data.len() if none stored yet).
    pub(crate) current_frame_first_subframe: u64,
    pub(crate) counters: PollCounters,
    // Live controls, updated by the host between polls.
    pub(crate) current_controls: Controls,
    pub(crate) lag_frames: u64
}

impl Movie {
    /// Creates a new empty movie in read/write mode.
    pub fn new() -> Self {
        Movie { rerecords: "0".to_string(), ..Default::default() }
    }
    /// Returns `true` if the movie is in read-only (replay) mode.
    #[inline]
    pub fn readonly(&self) -> bool {
        self.readonly
    }
    /// Switches between read-only and read/write mode.
    ///
    /// Entering read/write mode truncates the track so that no control's
    /// visible data exceeds what has been polled in the current frame, then
    /// backfills the remaining subframes of the current frame with the last
    /// polled value of each control. A playhead past the end of the track
    /// extends it with blank synced frames first.
    pub fn set_readonly(&mut self, enable: bool) {
        let was_readonly = self.readonly;
        self.readonly = enable;
        if !was_readonly || enable {
            return;
        }
        self.data.clear_cache();
        // At before-first-frame there is nothing to keep.
        if self.current_frame == 0 {
            self.data.clear();
            return;
        }
        // The current frame may not be in the track at all; extend with
        // blank synced frames so it is.
        if self.current_frame_first_subframe >= self.data.len() {
            while self.data.frame_count() < self.current_frame {
                self.data.append(Controls::sync());
            }
            self.current_frame_first_subframe = self.data.len() - 1;
        }
        // Keep subframes up to the furthest position any control has read,
        // then propagate values with smaller poll counts forward.
        let next_frame_first_subframe = self.current_frame_first_subframe
            + self.data.count_changes(self.current_frame_first_subframe) as u64;
        let mut max_readable = self.current_frame_first_subframe;
        for i in 0..TOTAL_CONTROLS {
            let limit = self.current_frame_first_subframe + self.counters.polls(i) as u64;
            if limit >= next_frame_first_subframe {
                max_readable = next_frame_first_subframe;
            }
            else if limit > max_readable {
                max_readable = limit;
            }
        }
        self.data.truncate(max_readable);
        let next_frame_first_subframe = max_readable;
        for i in 1..TOTAL_CONTROLS {
            let polls = (self.counters.polls(i) as u64).max(1);
            let from = self.current_frame_first_subframe + polls;
            if from < next_frame_first_subframe {
                self.data.fill_control(from..next_frame_first_subframe, i, from - 1);
            }
        }
    }
    /// Returns the movie rerecord count (not the global count).
    pub fn rerecords(&self) -> &str {
        &self.rerecords
    }
    /// Sets the movie rerecord count.
    pub fn set_rerecords(&mut self, count: String) {
        self.rerecords = count;
    }
    /// Returns the project ID.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
    /// Sets the project ID.
    pub fn set_project_id(&mut self, id: String) {
        self.project_id = id;
    }
    /// Returns the number of frames in the movie.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.data.frame_count()
    }
    /// Returns the current frame number. The first frame is 1; 0 means
    /// "before the first frame".
    #[inline]
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }
    /// Returns the number of lag frames so far.
    #[inline]
    pub fn lag_frames(&self) -> u64 {
        self.lag_frames
    }
    /// Returns a read-only view of the input track.
    #[inline]
    pub fn input_track(&self) -> &InputTrack {
        &self.data
    }
    /// Advances to the next frame, discarding unused subframes.
    ///
    /// A frame during which no real control was polled and no reset was
    /// committed counts as a lag frame (frame 0 never does); in read/write
    /// mode a lag frame gets a synthetic subframe recording the live
    /// controls, so the track keeps one record per frame.
    pub fn next_frame(&mut self) {
        let mut this_frame_lag = (MAX_SYSTEM_CONTROLS..TOTAL_CONTROLS)
            .all(|i| self.counters.polls(i) == 0);
        // Reset frames are not lag, no matter what the poll counters say;
        // commit_reset marks them via the reset poll counter.
        if self.counters.polls(CONTROL_SYSTEM_RESET) != 0 {
            this_frame_lag = false;
        }
        if self.current_frame != 0 && this_frame_lag {
            self.lag_frames += 1;
            if !self.readonly {
                // The record lands at data.len() which is exactly where the
                // first subframe pointer will advance to.
                let mut c = self.current_controls.clone();
                c.set_sync(true);
                self.data.append(c);
            }
        }
        self.counters.next_frame();
        // First subframe is undefined for frame 0 and 0 for frame 1.
        if self.current_frame != 0 {
            self.current_frame_first_subframe +=
                self.data.count_changes(self.current_frame_first_subframe) as u64;
        }
        else {
            self.current_frame_first_subframe = 0;
        }
        self.current_frame += 1;
    }
    /// Returns the data ready flag of the given control index.
    ///
    /// On a new frame all data ready flags are unset; polling a control
    /// unsets its flag.
    pub fn data_ready(&self, control: usize) -> Result<bool> {
        if control >= TOTAL_CONTROLS {
            return Err(MovieError::InvalidControlIndex);
        }
        Ok(self.counters.is_ready(control))
    }
    /// Returns the data ready flag of the `(port, controller, control)` tuple.
    pub fn data_ready_for(&self, port: usize, controller: usize, control: usize) -> Result<bool> {
        let index = try_control_index(port, controller, control)
            .ok_or(MovieError::InvalidControlIndex)?;
        self.data_ready(index)
    }
    /// Sets all data ready flags.
    pub fn set_all_data_ready(&mut self) {
        self.counters.set_all_ready();
    }
    /// Marks that a continuation subframe has been entered, clearing the
    /// frame-start pending flag.
    pub fn subframe_entered(&mut self) {
        self.counters.clear_frame_pending();
    }
    /// Polls the next value of the given control index.
    ///
    /// The frame sync index always reads as released. In read-only mode the
    /// track is never mutated; polls past the recorded subframes of the
    /// frame repeat the last recorded value and polls past the end of the
    /// track read released. In read/write mode the poll stores the live
    /// control value into the track, appending subframes as needed.
    pub fn next_input(&mut self, control: usize) -> Result<i16> {
        if control == CONTROL_FRAME_SYNC {
            return Ok(0);
        }
        if control >= TOTAL_CONTROLS {
            return Err(MovieError::InvalidControlIndex);
        }
        self.counters.clear_ready(control);

        if self.readonly {
            // Past the end of the movie: released, but still count the poll.
            if self.current_frame_first_subframe >= self.data.len() {
                self.counters.increment(control);
                return Ok(0);
            }
            // Before the beginning: released, without counting.
            if self.current_frame == 0 {
                return Ok(0);
            }
            let changes = self.data.count_changes(self.current_frame_first_subframe);
            let polls = self.counters.polls(control);
            self.counters.increment(control);
            let index = if changes > polls { polls } else { changes - 1 };
            Ok(self.data[self.current_frame_first_subframe + index as u64][control])
        }
        else {
            // Before the beginning: released; frame 0 is never recorded.
            if self.current_frame == 0 {
                return Ok(0);
            }
            // At the end of the movie: insert a complete record with the
            // sync flag set, making this the frame's first subframe.
            if self.current_frame_first_subframe >= self.data.len() {
                let mut c = self.current_controls.clone();
                c.set_sync(true);
                self.data.append(c);
                self.counters.increment(control);
                return Ok(self.data[self.current_frame_first_subframe][control]);
            }
            let new_value = self.current_controls[control];
            // The current frame is the last one in the track.
            let polls = self.counters.polls(control) as u64;
            let index = self.current_frame_first_subframe + polls;
            if index < self.data.len() {
                // Within the existing subframes: change the value and
                // propagate it to all subsequent subframes of the frame.
                self.data.propagate_control(index, control, new_value);
            }
            else if new_value != self.data[self.data.len() - 1][control] {
                // Outside and the value differs: extend the frame by
                // cloning its last subframe.
                while index >= self.data.len() {
                    let mut c = self.data[self.data.len() - 1].clone();
                    c.set_sync(false);
                    self.data.append(c);
                }
                self.data.set_control(index, control, new_value);
            }
            self.counters.increment(control);
            Ok(new_value)
        }
    }
    /// Polls the next value of the `(port, controller, control)` tuple.
    pub fn next_input_for(&mut self, port: usize, controller: usize, control: usize) -> Result<i16> {
        let index = try_control_index(port, controller, control)
            .ok_or(MovieError::InvalidControlIndex)?;
        self.next_input(index)
    }
    /// Sets the live control values, read by polls in read/write mode.
    pub fn set_controls(&mut self, controls: Controls) {
        self.current_controls = controls;
    }
    /// Returns the control values currently in effect.
    ///
    /// In read/write mode these are the live controls; in read-only mode the
    /// values the track would supply at each control's current poll count.
    pub fn effective_controls(&self) -> Controls {
        if !self.readonly {
            return self.current_controls.clone();
        }
        let mut c = Controls::new();
        if self.current_frame == 0 {
            return c;
        }
        let changes = self.data.count_changes(self.current_frame_first_subframe);
        if changes == 0 {
            // End of movie.
            return c;
        }
        for i in 0..TOTAL_CONTROLS {
            let polls = self.counters.polls(i);
            let index = if changes > polls { polls } else { changes - 1 };
            c[i] = self.data[self.current_frame_first_subframe + index as u64][i];
        }
        c
    }
    /// Returns the live control values as set by the host.
    #[inline]
    pub fn controls(&self) -> &Controls {
        &self.current_controls
    }
    /// Loads a movie. The playback pointer is positioned to the start and
    /// read-only mode is enabled.
    pub fn load(&mut self, rerecords: String, project_id: String, input: Vec<Controls>)
        -> Result<()>
    {
        if let Some(first) = input.first() {
            if !first.is_sync() {
                return Err(MovieError::CorruptMovie(
                    "first subframe must have the frame sync flag set"));
            }
        }
        self.readonly = true;
        self.rerecords = rerecords;
        self.project_id = project_id;
        self.current_frame = 0;
        self.current_frame_first_subframe = 0;
        self.counters = PollCounters::new();
        self.lag_frames = 0;
        self.data = InputTrack::from_snapshots(input);
        Ok(())
    }
    /// Returns a copy of the recorded input sequence.
    pub fn save(&self) -> Vec<Controls> {
        self.data.to_snapshots()
    }
    /// Commits a delayed reset into the current frame's first subframe.
    ///
    /// No-op in read-only mode or with a negative delay. If the current
    /// frame has no record yet (it would be lag), one is created first. The
    /// three reset counters are pinned to 1 so later edits cannot rewrite
    /// the committed values and the frame is never considered lag.
    pub fn commit_reset(&mut self, delay: i64) {
        if self.readonly || delay < 0 {
            return;
        }
        let this_frame_lag = (MAX_SYSTEM_CONTROLS..TOTAL_CONTROLS)
            .all(|i| self.counters.polls(i) == 0)
            && self.counters.polls(CONTROL_SYSTEM_RESET) == 0;
        if this_frame_lag {
            let mut c = self.current_controls.clone();
            c.set_sync(true);
            self.data.append(c);
            // current_frame_first_subframe is already correct.
        }
        self.counters.set_polls(CONTROL_SYSTEM_RESET, 1);
        self.counters.set_polls(CONTROL_SYSTEM_RESET_CYCLES_HI, 1);
        self.counters.set_polls(CONTROL_SYSTEM_RESET_CYCLES_LO, 1);
        // The current frame is always the last one in read/write mode.
        let first = self.current_frame_first_subframe;
        self.data.set_control(first, CONTROL_SYSTEM_RESET, 1);
        self.data.set_control(first, CONTROL_SYSTEM_RESET_CYCLES_HI, (delay / 10000) as i16);
        self.data.set_control(first, CONTROL_SYSTEM_RESET_CYCLES_LO, (delay % 10000) as i16);
    }
    /// Returns the reset status of the current frame: `-1` when the frame
    /// has no reset, otherwise the number of cycles to delay the reset by
    /// (0 is an immediate reset at frame start).
    ///
    /// Reading a pending reset pins the reset poll counters to 1.
    pub fn reset_status(&mut self) -> i64 {
        if self.current_frame == 0 || self.current_frame_first_subframe >= self.data.len() {
            return -1;
        }
        let first = self.current_frame_first_subframe;
        if self.data[first][CONTROL_SYSTEM_RESET] == 0 {
            return -1;
        }
        self.counters.set_polls(CONTROL_SYSTEM_RESET, 1);
        self.counters.set_polls(CONTROL_SYSTEM_RESET_CYCLES_HI, 1);
        self.counters.set_polls(CONTROL_SYSTEM_RESET_CYCLES_LO, 1);
        let hi = self.data[first][CONTROL_SYSTEM_RESET_CYCLES_HI] as i64;
        let lo = self.data[first][CONTROL_SYSTEM_RESET_CYCLES_LO] as i64;
        hi * 10000 + lo
    }
    /// Returns the ordinal the next poll in the frame would have.
    pub fn next_poll_number(&self) -> u32 {
        self.counters.max_polls() + 1
    }
    /// Returns the number of subframes stored for the 1-based `frame`.
    pub fn frame_subframes(&self, frame: u64) -> u64 {
        self.data.subframes_in_frame(frame)
    }
    /// Reads the stored snapshot of the 1-based `frame` at `subframe`,
    /// clamped to the frame's recorded run.
    pub fn read_subframe(&self, frame: u64, subframe: u64) -> Controls {
        self.data.read_subframe(frame, subframe)
    }
    /// Replaces the snapshot at the given subframe index.
    ///
    /// Requires read/write mode. A control's value may only change at or
    /// after the position it has been polled up to in the current frame;
    /// earlier changes fail with [MovieError::CannotEditPast].
    pub fn edit_subframe(&mut self, index: u64, snapshot: Controls) -> Result<()> {
        if self.readonly {
            return Err(MovieError::ReadOnly);
        }
        let old = self.data.snapshot(index)
            .ok_or(MovieError::InvalidArgument("subframe index is out of range"))?;
        for i in 0..TOTAL_CONTROLS {
            if old[i] != snapshot[i]
                    && index < self.current_frame_first_subframe + self.counters.polls(i) as u64 {
                return Err(MovieError::CannotEditPast);
            }
        }
        self.data.set_snapshot(index, snapshot);
        Ok(())
    }
}

/// The source of live control values for [MovieLogic].
///
/// The host implements this to merge UI state (autohold, autofire, queued
/// resets) into the controls record handed to the bridge; `subframe` is
/// `true` for a mid-frame update and `false` at a frame boundary.
pub trait ControlSource {
    fn update_controls(&mut self, subframe: bool) -> Controls;
}

/// A control source supplying a fixed record, for hosts without live input.
#[derive(Clone, Debug, Default)]
pub struct FixedControls(pub Controls);

impl ControlSource for FixedControls {
    fn update_controls(&mut self, _subframe: bool) -> Controls {
        self.0.clone()
    }
}

/// Bridge logic between the emulated machine's callbacks and the movie.
#[derive(Debug)]
pub struct MovieLogic<S> {
    movie: Movie,
    source: S
}

impl<S: ControlSource> MovieLogic<S> {
    /// Creates a new bridge driving `movie` with controls from `source`.
    pub fn new(movie: Movie, source: S) -> Self {
        MovieLogic { movie, source }
    }
    /// Returns the movie instance.
    #[inline]
    pub fn movie(&self) -> &Movie {
        &self.movie
    }
    /// Returns the movie instance for mutation.
    #[inline]
    pub fn movie_mut(&mut self) -> &mut Movie {
        &mut self.movie
    }
    /// Returns the control source.
    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }
    /// Returns the control source for mutation.
    #[inline]
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
    /// Destructs the bridge into the movie and the control source.
    pub fn into_parts(self) -> (Movie, S) {
        (self.movie, self.source)
    }
    /// Notifies the bridge that a new frame is starting and returns the
    /// reset status for that frame (`-1` = no reset).
    ///
    /// With `dont_poll` the frame's controls are marked ready up front, for
    /// hosts that run a frame without issuing polls.
    pub fn new_frame_starting(&mut self, dont_poll: bool) -> i64 {
        self.movie.next_frame();
        let c = self.source.update_controls(false);
        if !self.movie.readonly() {
            self.movie.set_controls(c);
            if dont_poll {
                self.movie.set_all_data_ready();
            }
            if let Some(delay) = self.movie.controls().reset_delay() {
                self.movie.commit_reset(delay as i64);
            }
        }
        self.movie.reset_status()
    }
    /// Polls one control on behalf of the emulated machine.
    ///
    /// Out-of-range controllers and controls read as released. When a
    /// control is polled a second time within a frame, the live controls
    /// are refreshed first, starting a new subframe.
    pub fn input_poll(&mut self, port: usize, controller: usize, control: usize) -> Result<i16> {
        if port >= MAX_PORTS || controller >= MAX_CONTROLLERS_PER_PORT
                             || control >= CONTROLLER_CONTROLS {
            return Ok(0);
        }
        if !self.movie.data_ready_for(port, controller, control)? {
            let c = self.source.update_controls(true);
            self.movie.set_controls(c);
            self.movie.set_all_data_ready();
            self.movie.subframe_entered();
        }
        self.movie.next_input_for(port, controller, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_movie_is_before_start() {
        let m = Movie::new();
        assert_eq!(m.current_frame(), 0);
        assert_eq!(m.frame_count(), 0);
        assert_eq!(m.lag_frames(), 0);
        assert!(!m.readonly());
        assert_eq!(m.rerecords(), "0");
    }

    #[test]
    fn next_frame_zeroes_counters_and_increments_frame() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        m.set_controls(c);
        m.next_input(4).unwrap();
        assert_eq!(m.next_poll_number(), 2);
        m.next_frame();
        assert_eq!(m.current_frame(), 2);
        assert_eq!(m.next_poll_number(), 1);
    }

    #[test]
    fn sync_index_always_reads_released() {
        let mut m = Movie::new();
        m.next_frame();
        assert_eq!(m.next_input(CONTROL_FRAME_SYNC).unwrap(), 0);
        assert!(m.next_input(TOTAL_CONTROLS).is_err());
    }

    #[test]
    fn readonly_poll_does_not_mutate_track() {
        let mut m = Movie::new();
        let mut first = Controls::sync();
        first[4] = 7;
        m.load("0".to_string(), "proj".to_string(), vec![first]).unwrap();
        assert!(m.readonly());
        m.next_frame();
        assert_eq!(m.next_input(4).unwrap(), 7);
        assert_eq!(m.next_input(4).unwrap(), 7);
        assert_eq!(m.next_input(5).unwrap(), 0);
        assert_eq!(m.input_track().len(), 1);
        // Past the end everything reads released.
        m.next_frame();
        assert_eq!(m.next_input(4).unwrap(), 0);
        assert_eq!(m.input_track().len(), 1);
    }

    #[test]
    fn readwrite_poll_appends_and_propagates() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        c[5] = 2;
        m.set_controls(c.clone());
        assert_eq!(m.next_input(4).unwrap(), 1);
        assert_eq!(m.next_input(5).unwrap(), 2);
        assert_eq!(m.input_track().len(), 1);
        // Second poll of control 4 with a new value forks a subframe.
        c[4] = 3;
        m.set_controls(c);
        assert_eq!(m.next_input(4).unwrap(), 3);
        assert_eq!(m.input_track().len(), 2);
        let second = m.input_track().snapshot(1).unwrap().clone();
        assert!(!second.is_sync());
        assert_eq!(second[4], 3);
        assert_eq!(second[5], 2);
    }

    #[test]
    fn repolling_same_value_does_not_extend() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        m.set_controls(c);
        m.next_input(4).unwrap();
        m.next_input(4).unwrap();
        m.next_input(4).unwrap();
        assert_eq!(m.input_track().len(), 1);
    }

    #[test]
    fn lag_frame_is_counted_and_recorded() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        m.set_controls(c);
        m.next_input(4).unwrap();
        // No polls during frame 2.
        m.next_frame();
        m.next_frame();
        assert_eq!(m.lag_frames(), 1);
        assert_eq!(m.frame_count(), 2);
        assert!(m.input_track().snapshot(1).unwrap().is_sync());
    }

    #[test]
    fn frame_zero_is_not_lag() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        assert_eq!(m.lag_frames(), 0);
    }

    #[test]
    fn delayed_reset_commit_and_status() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c.set_reset_delay(Some(30007));
        m.set_controls(c);
        m.commit_reset(30007);
        assert_eq!(m.reset_status(), 30007);
        let first = m.input_track().snapshot(0).unwrap();
        assert_eq!(first[CONTROL_SYSTEM_RESET], 1);
        assert_eq!(first[CONTROL_SYSTEM_RESET_CYCLES_HI], 3);
        assert_eq!(first[CONTROL_SYSTEM_RESET_CYCLES_LO], 7);
        // Reset poll counters are pinned at 1.
        assert_eq!(m.counters.polls(CONTROL_SYSTEM_RESET), 1);
        // A reset frame is not lag.
        m.next_frame();
        assert_eq!(m.lag_frames(), 0);
    }

    #[test]
    fn data_ready_tracks_polls() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        m.set_all_data_ready();
        assert!(m.data_ready(4).unwrap());
        m.set_controls(Controls::new());
        m.next_input(4).unwrap();
        assert!(!m.data_ready(4).unwrap());
        assert!(m.data_ready(5).unwrap());
    }

    #[test]
    fn load_requires_sync_on_first_subframe() {
        let mut m = Movie::new();
        let err = m.load("0".into(), "p".into(), vec![Controls::new()]).unwrap_err();
        assert!(matches!(err, MovieError::CorruptMovie(_)));
        assert!(m.load("0".into(), "p".into(), vec![Controls::sync()]).is_ok());
        assert_eq!(m.frame_count(), 1);
        assert_eq!(m.current_frame(), 0);
        assert!(m.readonly());
    }

    #[test]
    fn edit_subframe_guards_the_playhead() {
        let mut m = Movie::new();
        m.set_readonly(false);
        m.next_frame();
        let mut c = Controls::new();
        c[4] = 1;
        m.set_controls(c);
        m.next_input(4).unwrap();
        m.next_frame();
        let mut replacement = m.read_subframe(1, 0);
        replacement[4] = 9;
        // Frame 1 is behind the playhead now; control 4 was polled there.
        let err = m.edit_subframe(0, replacement).unwrap_err();
        assert!(matches!(err, MovieError::CannotEditPast));
    }

    #[test]
    fn movie_logic_polls_through_the_source() {
        let m = Movie::new();
        let mut pressed = Controls::new();
        pressed.set(0, 0, 4, 1);
        let mut logic = MovieLogic::new(m, FixedControls(pressed));
        assert_eq!(logic.new_frame_starting(false), -1);
        assert_eq!(logic.input_poll(0, 0, 4).unwrap(), 1);
        assert_eq!(logic.input_poll(0, 0, 5).unwrap(), 0);
        // Out of range tuples read as released.
        assert_eq!(logic.input_poll(2, 0, 0).unwrap(), 0);
        assert_eq!(logic.input_poll(0, 7, 0).unwrap(), 0);
    }

    #[test]
    fn movie_logic_commits_reset_from_source() {
        let m = Movie::new();
        let mut c = Controls::new();
        c.set_reset_delay(Some(30007));
        let mut logic = MovieLogic::new(m, FixedControls(c));
        assert_eq!(logic.new_frame_starting(false), 30007);
        let first = logic.movie().input_track().snapshot(0).unwrap().clone();
        assert_eq!(first[CONTROL_SYSTEM_RESET], 1);
    }
}
