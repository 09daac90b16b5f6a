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
//! Movie file format codecs and related utilities for the RETRACK library.
use std::io::{self, Read};

pub mod rrdata;
pub mod rtm;
pub mod subtitle;

pub use rrdata::{Id, IdSet};
pub use rtm::{LoadMode, MovieFile, MovieFileError, SavestateBundle, SYSTEM_ID};
pub use subtitle::MovieSubtitle;

/// A trait that extends [Read] with methods that ease reading from chunked
/// streams.
pub trait ReadExactEx: Read {
    /// Reads all bytes to fill `buf` or until EOF. If successful, returns
    /// the total number of bytes read.
    fn read_exact_or_to_end(&mut self, mut buf: &mut [u8]) -> io::Result<usize> {
        let orig_len = buf.len();
        while !buf.is_empty() {
            match self.read(buf) {
                Ok(0) => break,
                Ok(n) => buf = &mut buf[n..],
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(orig_len - buf.len())
    }
    /// Reads the exact number of bytes required to fill `buf` and returns
    /// `Ok(true)`, or returns `Ok(false)` if exactly zero bytes were read.
    /// In this instance, `buf` will be left unmodified.
    fn read_exact_or_none(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        let bytes_read = self.read_exact_or_to_end(buf)?;
        if bytes_read == 0 {
            Ok(false)
        }
        else if bytes_read == buf.len() {
            Ok(true)
        }
        else {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "failed to fill whole buffer"))
        }
    }
}

impl<R: Read> ReadExactEx for R {}
