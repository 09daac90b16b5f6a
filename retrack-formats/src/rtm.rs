/*
    Copyright (C) 2023-2026  RETRACK project contributors

    This file is part of RETRACK, a Rust library for building rerecording
    movie recorders and players.

    For the full copyright notice, see the lib.rs file.
*/
/*! **RTM** movie file format utilities.

An RTM movie is a deflate ZIP archive of member streams:

| member                   | contents                                | required |
|--------------------------|-----------------------------------------|----------|
| `version`                | control structure version, decimal      | yes      |
| `systemid`               | system tag, [SYSTEM_ID]                 | yes      |
| `coreversion`            | emulator core identifier string         | yes      |
| `gametype`               | game type name                          | yes      |
| `port1`, `port2`         | port type names                         | yes      |
| `projectid`              | opaque project identity string          | yes      |
| `rerecords`              | decimal count, derived from `rrdata`    | yes      |
| `gamename`               | game name                               | no       |
| `authors`                | one author per line, full name and nick | no       |
| `rom.sha256` &c.         | cartridge identity hashes, lowercase hex| no       |
| `movie_sram/<name>`      | initial SRAM of the named chip, raw     | no       |
| `input`                  | one text line per subframe              | yes¹     |
| `savestate`, `hostmemory`, `screenshot`, `moviestate` | savestate bundle | together |
| `sram/<name>`            | SRAM at save time, raw                  | no       |
| `rrdata`                 | compressed rerecord-identity set        | yes      |
| `rtc.second`, `rtc.subsecond` | RTC at save time, decimal          | yes      |
| `movie_rtc.second`, `movie_rtc.subsecond` | initial RTC, decimal   | yes      |
| `subtitles`              | subtitle track                          | no       |

¹ may be absent in a savestate file.
*/
use core::fmt;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use retrack_core::controls::Controls;
use retrack_core::movie::{Movie, MovieError};
use retrack_ports::codec::{decode_line, encode_line, DecodeError, WRITE_CONTROL_VERSION};
use retrack_ports::system::GameType;
use retrack_ports::types::PortType;

use crate::rrdata::IdSet;
use crate::subtitle::{self, MovieSubtitle};

/// The system tag written to and required in the `systemid` member.
pub const SYSTEM_ID: &str = "retrack-rr1";

/// An error from reading or writing a movie file.
#[derive(Debug)]
pub enum MovieFileError {
    /// A required member is missing from the archive.
    MissingMember(&'static str),
    /// A member has structurally invalid contents.
    Corrupt(&'static str),
    /// An input line does not decode.
    BadInput(DecodeError),
    /// The movie data is inconsistent with the engine's requirements.
    Movie(MovieError),
    Io(io::Error)
}

impl std::error::Error for MovieFileError {}

impl fmt::Display for MovieFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieFileError::MissingMember(name) => {
                write!(f, "Corrupt movie: member {} is missing", name)
            }
            MovieFileError::Corrupt(what) => write!(f, "Corrupt movie: {}", what),
            MovieFileError::BadInput(err) => err.fmt(f),
            MovieFileError::Movie(err) => err.fmt(f),
            MovieFileError::Io(err) => err.fmt(f)
        }
    }
}

impl From<io::Error> for MovieFileError {
    fn from(err: io::Error) -> Self {
        MovieFileError::Io(err)
    }
}

impl From<DecodeError> for MovieFileError {
    fn from(err: DecodeError) -> Self {
        MovieFileError::BadInput(err)
    }
}

impl From<MovieError> for MovieFileError {
    fn from(err: MovieError) -> Self {
        MovieFileError::Movie(err)
    }
}

impl From<ZipError> for MovieFileError {
    fn from(err: ZipError) -> Self {
        match err {
            ZipError::Io(err) => MovieFileError::Io(err),
            _ => MovieFileError::Corrupt("damaged archive")
        }
    }
}

impl From<MovieFileError> for io::Error {
    fn from(err: MovieFileError) -> Self {
        match err {
            MovieFileError::Io(err) => err,
            e => io::Error::new(io::ErrorKind::InvalidData, e)
        }
    }
}

/// The savestate bundle of a savestate movie.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavestateBundle {
    /// The emulator core savestate blob.
    pub savestate: Vec<u8>,
    /// Host memory at save time.
    pub host_memory: Vec<u8>,
    /// Screenshot at save time.
    pub screenshot: Vec<u8>,
    /// Serialized movie logic state.
    pub movie_state: Vec<u8>,
    /// SRAM contents at save time, by chip name.
    pub sram: BTreeMap<String, Vec<u8>>
}

/// How a movie file is applied to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// Load the savestate and continue in read/write mode.
    State,
    /// Load the savestate and continue in read-only mode.
    ReadOnly,
    /// Keep the current input track, only restoring the savestate position.
    Preserve,
    /// Load the movie from the beginning, ignoring any savestate.
    Movie
}

/// Parsed representation of a movie file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieFile {
    /// The ROM type and region.
    pub gametype: GameType,
    /// What is in port #1.
    pub port1: PortType,
    /// What is in port #2.
    pub port2: PortType,
    /// Emulator core version string.
    pub coreversion: String,
    /// Name of the game.
    pub gamename: String,
    /// Identifies whether two movies are from the same project.
    pub projectid: String,
    /// Rerecord count; derived from [MovieFile::rrdata] when saving.
    pub rerecords: String,
    /// SHA-256 of the main ROM, lowercase hex; empty if none.
    pub rom_sha256: String,
    /// SHA-256 of the main ROM mapping XML; empty if none.
    pub romxml_sha256: String,
    /// SHA-256 of the slot A ROM; empty if none.
    pub slota_sha256: String,
    /// SHA-256 of the slot A mapping XML; empty if none.
    pub slotaxml_sha256: String,
    /// SHA-256 of the slot B ROM; empty if none.
    pub slotb_sha256: String,
    /// SHA-256 of the slot B mapping XML; empty if none.
    pub slotbxml_sha256: String,
    /// Authors of the run: `(full name, nickname)` pairs.
    pub authors: Vec<(String, String)>,
    /// SRAM contents at initial powerup, by chip name.
    pub movie_sram: BTreeMap<String, Vec<u8>>,
    /// The savestate bundle if this is a savestate, `None` for plain movies.
    pub savestate: Option<SavestateBundle>,
    /// The subtitle track.
    pub subtitles: Vec<MovieSubtitle>,
    /// RTC at save time.
    pub rtc_second: i64,
    pub rtc_subsecond: i64,
    /// RTC at initial powerup.
    pub movie_rtc_second: i64,
    pub movie_rtc_subsecond: i64,
    /// The rerecord-identity set.
    pub rrdata: IdSet,
    /// Input for each subframe.
    pub input: Vec<Controls>
}

impl Default for MovieFile {
    fn default() -> Self {
        MovieFile {
            gametype: GameType::SnesNtsc,
            port1: PortType::Gamepad,
            port2: PortType::None,
            coreversion: String::new(),
            gamename: String::new(),
            projectid: String::new(),
            rerecords: "0".to_string(),
            rom_sha256: String::new(),
            romxml_sha256: String::new(),
            slota_sha256: String::new(),
            slotaxml_sha256: String::new(),
            slotb_sha256: String::new(),
            slotbxml_sha256: String::new(),
            authors: Vec::new(),
            movie_sram: BTreeMap::new(),
            savestate: None,
            subtitles: Vec::new(),
            rtc_second: 1_000_000_000,
            rtc_subsecond: 0,
            movie_rtc_second: 1_000_000_000,
            movie_rtc_subsecond: 0,
            rrdata: IdSet::new(),
            input: Vec::new()
        }
    }
}

impl MovieFile {
    /// Constructs an empty movie with default settings.
    pub fn new() -> Self {
        Default::default()
    }
    /// Returns `true` if this file carries a savestate bundle.
    pub fn is_savestate(&self) -> bool {
        self.savestate.is_some()
    }
    /// Returns the number of frames in the movie.
    pub fn frame_count(&self) -> u64 {
        self.input.iter().filter(|c| c.is_sync()).count() as u64
    }
    /// Returns the length of the movie at the game type's nominal framerate.
    pub fn duration(&self) -> core::time::Duration {
        let (num, den) = self.gametype.region().fps();
        let nanos = self.frame_count() as u128 * 1_000_000_000u128 * den as u128 / num as u128;
        core::time::Duration::from_nanos(nanos as u64)
    }
    /// Loads a movie or savestate file from a path.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, MovieFileError> {
        let file = fs::File::open(path)?;
        MovieFile::read_from(io::BufReader::new(file))
    }
    /// Parses a movie or savestate archive.
    pub fn read_from<R: Read + Seek>(reader: R) -> Result<Self, MovieFileError> {
        let mut zip = ZipArchive::new(reader)?;
        let mut movie = MovieFile::new();

        let version: u32 = parse_number(&required_string(&mut zip, "version")?)?;
        if version > WRITE_CONTROL_VERSION {
            return Err(MovieFileError::Corrupt("unsupported control version"));
        }
        if required_string(&mut zip, "systemid")? != SYSTEM_ID {
            return Err(MovieFileError::Corrupt("unsupported system id"));
        }
        movie.coreversion = required_string(&mut zip, "coreversion")?;
        movie.gametype = GameType::lookup(&required_string(&mut zip, "gametype")?)
            .ok_or(MovieFileError::Corrupt("unknown game type"))?;
        movie.port1 = PortType::lookup(&required_string(&mut zip, "port1")?, false)
            .map_err(|_| MovieFileError::Corrupt("bad port 1 type"))?;
        movie.port2 = PortType::lookup(&required_string(&mut zip, "port2")?, true)
            .map_err(|_| MovieFileError::Corrupt("bad port 2 type"))?;
        movie.projectid = required_string(&mut zip, "projectid")?;
        movie.rerecords = required_string(&mut zip, "rerecords")?;
        parse_number::<u64>(&movie.rerecords)?;

        movie.gamename = member_string(&mut zip, "gamename")?.unwrap_or_default();
        movie.rom_sha256 = hash_member(&mut zip, "rom.sha256")?;
        movie.romxml_sha256 = hash_member(&mut zip, "rom_xml.sha256")?;
        movie.slota_sha256 = hash_member(&mut zip, "slota.sha256")?;
        movie.slotaxml_sha256 = hash_member(&mut zip, "slota_xml.sha256")?;
        movie.slotb_sha256 = hash_member(&mut zip, "slotb.sha256")?;
        movie.slotbxml_sha256 = hash_member(&mut zip, "slotb_xml.sha256")?;

        if let Some(member) = member_string(&mut zip, "authors")? {
            for line in member.lines().filter(|l| !l.is_empty()) {
                let (full, nick) = match line.split_once('|') {
                    Some((full, nick)) => (full.to_string(), nick.to_string()),
                    None => (line.to_string(), String::new())
                };
                movie.authors.push((full, nick));
            }
        }

        movie.rtc_second = parse_number(&required_string(&mut zip, "rtc.second")?)?;
        movie.rtc_subsecond = parse_number(&required_string(&mut zip, "rtc.subsecond")?)?;
        movie.movie_rtc_second = parse_number(&required_string(&mut zip, "movie_rtc.second")?)?;
        movie.movie_rtc_subsecond =
            parse_number(&required_string(&mut zip, "movie_rtc.subsecond")?)?;

        if let Some(member) = member_string(&mut zip, "subtitles")? {
            movie.subtitles = subtitle::parse(&member)
                .ok_or(MovieFileError::Corrupt("bad subtitle member"))?;
        }

        match member_bytes(&mut zip, "rrdata")? {
            Some(bytes) => { movie.rrdata.union_from(&bytes[..])?; }
            None => return Err(MovieFileError::MissingMember("rrdata"))
        }

        let names: Vec<String> = zip.file_names().map(str::to_string).collect();
        for name in names.iter() {
            if let Some(chip) = name.strip_prefix("movie_sram/") {
                let bytes = member_bytes(&mut zip, name)?.unwrap_or_default();
                movie.movie_sram.insert(chip.to_string(), bytes);
            }
            else if !KNOWN_MEMBERS.contains(&name.as_str()) && !name.starts_with("sram/") {
                warn!("ignoring unknown movie member {}", name);
            }
        }

        let savestate = member_bytes(&mut zip, "savestate")?;
        let host_memory = member_bytes(&mut zip, "hostmemory")?;
        let screenshot = member_bytes(&mut zip, "screenshot")?;
        let movie_state = member_bytes(&mut zip, "moviestate")?;
        movie.savestate = match (savestate, host_memory, screenshot, movie_state) {
            (Some(savestate), Some(host_memory), Some(screenshot), Some(movie_state)) => {
                let mut sram = BTreeMap::new();
                for name in names.iter() {
                    if let Some(chip) = name.strip_prefix("sram/") {
                        let bytes = member_bytes(&mut zip, name)?.unwrap_or_default();
                        sram.insert(chip.to_string(), bytes);
                    }
                }
                Some(SavestateBundle { savestate, host_memory, screenshot, movie_state, sram })
            }
            (None, None, None, None) => None,
            _ => return Err(MovieFileError::Corrupt("incomplete savestate bundle"))
        };

        match member_string(&mut zip, "input")? {
            Some(member) => {
                let ports = [movie.port1, movie.port2];
                for line in member.lines() {
                    movie.input.push(decode_line(line, ports, version)?);
                }
            }
            None if movie.is_savestate() => {}
            None => return Err(MovieFileError::MissingMember("input"))
        }
        if let Some(first) = movie.input.first() {
            if !first.is_sync() {
                return Err(MovieFileError::Corrupt(
                    "first subframe must have the frame sync flag set"));
            }
        }

        debug!("loaded movie: {} frames, {} rerecords", movie.frame_count(), movie.rrdata.len());
        Ok(movie)
    }
    /// Saves the movie to a file. Writes go to a temporary sibling that is
    /// renamed over `path` on success, so a failed save leaves no partial
    /// file behind. `compression` is the deflate level 0-9, 0 uncompressed.
    pub fn save<P: AsRef<Path>>(&self, path: P, compression: u32) -> Result<(), MovieFileError> {
        let path = path.as_ref();
        let mut tmp_name: OsString = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        let result = (|| -> Result<(), MovieFileError> {
            let file = fs::File::create(&tmp)?;
            self.write_to(&file, compression)?;
            file.sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }
    /// Serializes the movie as an archive into `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W, compression: u32)
        -> Result<(), MovieFileError>
    {
        let options = if compression == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        }
        else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(compression.min(9) as i64))
        };
        let mut zip = ZipWriter::new(writer);
        let mut text = |zip: &mut ZipWriter<W>, name: &str, value: &str|
            -> Result<(), MovieFileError>
        {
            zip.start_file(name, options.clone())?;
            zip.write_all(value.as_bytes())?;
            if !value.ends_with('\n') {
                zip.write_all(b"\n")?;
            }
            Ok(())
        };

        text(&mut zip, "version", &WRITE_CONTROL_VERSION.to_string())?;
        text(&mut zip, "systemid", SYSTEM_ID)?;
        text(&mut zip, "coreversion", &self.coreversion)?;
        text(&mut zip, "gametype", self.gametype.name())?;
        text(&mut zip, "port1", self.port1.name())?;
        text(&mut zip, "port2", self.port2.name())?;
        text(&mut zip, "projectid", &self.projectid)?;
        let rerecords = if self.rrdata.is_empty() {
            self.rerecords.clone()
        }
        else {
            self.rrdata.len().to_string()
        };
        text(&mut zip, "rerecords", &rerecords)?;
        if !self.gamename.is_empty() {
            text(&mut zip, "gamename", &self.gamename)?;
        }
        for (name, value) in [
            ("rom.sha256", &self.rom_sha256),
            ("rom_xml.sha256", &self.romxml_sha256),
            ("slota.sha256", &self.slota_sha256),
            ("slota_xml.sha256", &self.slotaxml_sha256),
            ("slotb.sha256", &self.slotb_sha256),
            ("slotb_xml.sha256", &self.slotbxml_sha256)
        ].iter() {
            if !value.is_empty() {
                text(&mut zip, name, value)?;
            }
        }
        if !self.authors.is_empty() {
            let mut member = String::new();
            for (full, nick) in self.authors.iter() {
                if nick.is_empty() {
                    member.push_str(full);
                }
                else {
                    member.push_str(&format!("{}|{}", full, nick));
                }
                member.push('\n');
            }
            text(&mut zip, "authors", &member)?;
        }
        text(&mut zip, "rtc.second", &self.rtc_second.to_string())?;
        text(&mut zip, "rtc.subsecond", &self.rtc_subsecond.to_string())?;
        text(&mut zip, "movie_rtc.second", &self.movie_rtc_second.to_string())?;
        text(&mut zip, "movie_rtc.subsecond", &self.movie_rtc_subsecond.to_string())?;
        if !self.subtitles.is_empty() {
            text(&mut zip, "subtitles", &subtitle::serialize(&self.subtitles))?;
        }
        for (chip, bytes) in self.movie_sram.iter() {
            zip.start_file(format!("movie_sram/{}", chip), options.clone())?;
            zip.write_all(bytes)?;
        }
        zip.start_file("rrdata", options.clone())?;
        zip.write_all(&self.rrdata.to_bytes())?;
        if let Some(bundle) = &self.savestate {
            zip.start_file("savestate", options.clone())?;
            zip.write_all(&bundle.savestate)?;
            zip.start_file("hostmemory", options.clone())?;
            zip.write_all(&bundle.host_memory)?;
            zip.start_file("screenshot", options.clone())?;
            zip.write_all(&bundle.screenshot)?;
            zip.start_file("moviestate", options.clone())?;
            zip.write_all(&bundle.movie_state)?;
            for (chip, bytes) in bundle.sram.iter() {
                zip.start_file(format!("sram/{}", chip), options.clone())?;
                zip.write_all(bytes)?;
            }
        }
        let ports = [self.port1, self.port2];
        let mut member = String::new();
        for controls in self.input.iter() {
            member.push_str(&encode_line(controls, ports, WRITE_CONTROL_VERSION));
            member.push('\n');
        }
        text(&mut zip, "input", &member)?;
        zip.finish()?;
        debug!("saved movie: {} frames", self.frame_count());
        Ok(())
    }
    /// Applies this file to a movie engine.
    ///
    /// All-or-nothing: the engine is only replaced when every step
    /// succeeds. The savestate modes fall back to [LoadMode::Movie] when the
    /// file has no savestate bundle. [LoadMode::Preserve] keeps the engine's
    /// current input track and only restores the playback position, which
    /// requires the savestate to be consistent with that track.
    pub fn load_into(&self, movie: &mut Movie, mode: LoadMode) -> Result<(), MovieFileError> {
        if let (LoadMode::Preserve, Some(bundle)) = (mode, &self.savestate) {
            let mut m = movie.clone();
            m.restore_state(&bundle.movie_state, false)?;
            *movie = m;
            return Ok(());
        }
        let mut m = Movie::new();
        m.load(self.rerecords.clone(), self.projectid.clone(), self.input.clone())?;
        match (mode, &self.savestate) {
            (LoadMode::State, Some(bundle)) => m.restore_state(&bundle.movie_state, false)?,
            (LoadMode::ReadOnly, Some(bundle)) => m.restore_state(&bundle.movie_state, true)?,
            _ => {}
        }
        *movie = m;
        Ok(())
    }
}

const KNOWN_MEMBERS: [&str; 27] = [
    "version", "systemid", "coreversion", "gametype", "port1", "port2",
    "projectid", "rerecords", "gamename", "authors", "input", "rrdata",
    "savestate", "hostmemory", "screenshot", "moviestate", "subtitles",
    "rtc.second", "rtc.subsecond", "movie_rtc.second", "movie_rtc.subsecond",
    "rom.sha256", "rom_xml.sha256", "slota.sha256", "slota_xml.sha256",
    "slotb.sha256", "slotb_xml.sha256"
];

fn member_bytes<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str)
    -> Result<Option<Vec<u8>>, MovieFileError>
{
    match zip.by_name(name) {
        Ok(mut file) => {
            let mut bytes = Vec::new();
            file.read_to_end(&mut bytes)?;
            Ok(Some(bytes))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into())
    }
}

fn member_string<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str)
    -> Result<Option<String>, MovieFileError>
{
    match member_bytes(zip, name)? {
        Some(bytes) => {
            let mut text = String::from_utf8(bytes)
                .map_err(|_| MovieFileError::Corrupt("member is not valid UTF-8"))?;
            while text.ends_with('\n') || text.ends_with('\r') {
                text.pop();
            }
            Ok(Some(text))
        }
        None => Ok(None)
    }
}

fn required_string<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &'static str)
    -> Result<String, MovieFileError>
{
    member_string(zip, name)?.ok_or(MovieFileError::MissingMember(name))
}

fn parse_number<T: core::str::FromStr>(text: &str) -> Result<T, MovieFileError> {
    text.trim().parse()
        .map_err(|_| MovieFileError::Corrupt("member is not a valid number"))
}

fn hash_member<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str)
    -> Result<String, MovieFileError>
{
    let text = match member_string(zip, name)? {
        Some(text) => text,
        None => return Ok(String::new())
    };
    let ok = text.len() == 64
        && text.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        && hex::decode(&text).is_ok();
    if !ok {
        return Err(MovieFileError::Corrupt("hash member is not lowercase hex"));
    }
    Ok(text)
}
