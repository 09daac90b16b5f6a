/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
//! The rerecord-identity set.
//!
//! Every emulator session that loads a project from a savestate or edits
//! past the playhead inserts a fresh random identifier; the size of the set
//! is the rerecord count shown to users. Loading a movie unions the movie's
//! set into the session's set.
use core::fmt;
use std::collections::BTreeSet;
use std::io::{self, Read, Write};

use rand::RngCore;

use crate::ReadExactEx;

/// The size of one identifier in bytes.
pub const ID_BYTES: usize = 32;

/// One opaque session identifier, ordered numerically big-endian.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id([u8; ID_BYTES]);

impl Id {
    /// Wraps raw identifier bytes.
    pub fn new(bytes: [u8; ID_BYTES]) -> Self {
        Id(bytes)
    }
    /// Generates a fresh random identifier from the given generator.
    pub fn generate<R: RngCore>(rng: &mut R) -> Self {
        let mut bytes = [0; ID_BYTES];
        rng.fill_bytes(&mut bytes);
        Id(bytes)
    }
    /// Generates a fresh random identifier.
    pub fn random() -> Self {
        Id::generate(&mut rand::thread_rng())
    }
    /// Returns the raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }
    /// Returns the identifier numerically one above this one, wrapping at
    /// the 256-bit capacity.
    pub fn successor(mut self) -> Self {
        for byte in self.0.iter_mut().rev() {
            let (value, carry) = byte.overflowing_add(1);
            *byte = value;
            if !carry {
                break;
            }
        }
        self
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// A set of rerecord identifiers with run-compressed serialization.
///
/// The wire form is a sequence of records over the numerically sorted
/// identifiers: a 32-byte base followed by a big-endian `u32` holding
/// `run_length - 1`, where a run is a maximal chain of identifiers whose
/// numeric increments are 1.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdSet {
    ids: BTreeSet<Id>
}

impl IdSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Default::default()
    }
    /// Returns the number of identifiers, i.e. the rerecord count.
    pub fn len(&self) -> u64 {
        self.ids.len() as u64
    }
    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
    /// Returns `true` if the set contains `id`.
    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }
    /// Inserts an identifier; returns `true` if it was not present yet.
    pub fn insert(&mut self, id: Id) -> bool {
        self.ids.insert(id)
    }
    /// Generates a fresh random identifier and inserts it, bumping the
    /// rerecord count. Hosts call this when a project is loaded from a
    /// savestate or when input is edited behind the playhead.
    pub fn insert_fresh(&mut self) -> Id {
        let id = Id::random();
        self.ids.insert(id);
        id
    }
    /// Writes the compressed representation of the set and returns the
    /// number of identifiers written.
    pub fn serialize<W: Write>(&self, mut sink: W) -> io::Result<u64> {
        let mut run: Option<(Id, Id, u32)> = None;
        for id in self.ids.iter().copied() {
            run = Some(match run {
                Some((base, prev, count)) if id == prev.successor() && count < u32::MAX => {
                    (base, id, count + 1)
                }
                Some((base, _prev, count)) => {
                    write_record(&mut sink, &base, count)?;
                    (id, id, 0)
                }
                None => (id, id, 0)
            });
        }
        if let Some((base, _prev, count)) = run {
            write_record(&mut sink, &base, count)?;
        }
        Ok(self.len())
    }
    /// Reads a compressed representation and unions it into the set.
    /// Returns the number of identifiers not previously present.
    pub fn union_from<R: Read>(&mut self, mut source: R) -> io::Result<u64> {
        let mut added = 0;
        let mut base = [0u8; ID_BYTES];
        while source.read_exact_or_none(&mut base)? {
            let mut word = [0u8; 4];
            source.read_exact(&mut word)?;
            let mut id = Id::new(base);
            for _ in 0..=u32::from_be_bytes(word) {
                if self.ids.insert(id) {
                    added += 1;
                }
                id = id.successor();
            }
        }
        Ok(added)
    }
    /// Returns the compressed representation as a byte vector.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail.
        let _ = self.serialize(&mut buf);
        buf
    }
}

fn write_record<W: Write>(sink: &mut W, base: &Id, count: u32) -> io::Result<()> {
    sink.write_all(base.as_bytes())?;
    sink.write_all(&count.to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(tail: u8) -> Id {
        let mut bytes = [0; ID_BYTES];
        bytes[ID_BYTES - 1] = tail;
        Id::new(bytes)
    }

    #[test]
    fn successor_carries() {
        let mut bytes = [0; ID_BYTES];
        bytes[ID_BYTES - 1] = 0xFF;
        bytes[ID_BYTES - 2] = 0xFF;
        let next = Id::new(bytes).successor();
        assert_eq!(next.as_bytes()[ID_BYTES - 1], 0);
        assert_eq!(next.as_bytes()[ID_BYTES - 2], 0);
        assert_eq!(next.as_bytes()[ID_BYTES - 3], 1);
    }

    #[test]
    fn consecutive_ids_compress_to_one_record() {
        let mut set = IdSet::new();
        for tail in 5..10 {
            set.insert(id(tail));
        }
        let bytes = set.to_bytes();
        assert_eq!(bytes.len(), ID_BYTES + 4);
        assert_eq!(bytes[ID_BYTES - 1], 5);
        assert_eq!(&bytes[ID_BYTES..], &[0, 0, 0, 4]);
    }

    #[test]
    fn disjoint_runs_make_separate_records() {
        let mut set = IdSet::new();
        set.insert(id(1));
        set.insert(id(2));
        set.insert(id(7));
        let bytes = set.to_bytes();
        assert_eq!(bytes.len(), 2 * (ID_BYTES + 4));
    }

    #[test]
    fn union_roundtrip() {
        let mut set = IdSet::new();
        for tail in [1u8, 2, 3, 9, 200].iter() {
            set.insert(id(*tail));
        }
        let bytes = set.to_bytes();
        let mut other = IdSet::new();
        other.insert(id(9));
        let added = other.union_from(&bytes[..]).unwrap();
        assert_eq!(added, 4);
        assert_eq!(other, set);
        assert_eq!(other.len(), 5);
        // A second union adds nothing.
        assert_eq!(other.union_from(&bytes[..]).unwrap(), 0);
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut set = IdSet::new();
        set.insert(id(1));
        let mut bytes = set.to_bytes();
        bytes.truncate(ID_BYTES + 2);
        let mut other = IdSet::new();
        assert!(other.union_from(&bytes[..]).is_err());
    }

    #[test]
    fn random_ids_are_distinct() {
        let a = Id::random();
        let b = Id::random();
        assert_ne!(a, b);
        let mut set = IdSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(a));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn fresh_inserts_count_rerecords() {
        let mut set = IdSet::new();
        let a = set.insert_fresh();
        let b = set.insert_fresh();
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }
}
