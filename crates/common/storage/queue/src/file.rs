// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Overflow file store.
//!
//! ## On-Disk Format
//!
//! Each overflow file holds exactly one spilled batch:
//!
//! ```text
//! ┌─────────────────┬──────────────────────┬─────────────────┐
//! │  Length (4B)    │   Payload (variable) │   CRC32 (4B)    │
//! │  little-endian  │   codec output       │   little-endian │
//! └─────────────────┴──────────────────────┴─────────────────┘
//! ```
//!
//! The payload is whatever the [`Codec`] produced. A batch is written to a
//! temporary name, synced, then renamed into place, so a crash never leaves
//! a half-written file under a name the bootstrap scan would pick up.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use snafu::{OptionExt, ResultExt};

use crate::{
    Codec, Result,
    crc::{calculate_frame_crc, verify_frame_crc},
    error::{BatchTooLargeSnafu, EncodeSnafu, ReadOverflowSnafu, RemoveOverflowSnafu, WriteOverflowSnafu},
    path::FileNaming,
};

pub(crate) const FRAME_LENGTH_SIZE: usize = 4;
pub(crate) const FRAME_CRC_SIZE: usize = 4;

const TEMP_SUFFIX: &str = ".tmp";
const QUARANTINE_SUFFIX: &str = ".corrupt";

/// Outcome of reading one overflow file back.
#[derive(Debug)]
pub enum BatchRead<T> {
    Loaded(Vec<T>),
    /// The file vanished before it could be consumed.
    Missing,
    /// The frame or the codec payload could not be decoded.
    Corrupt { reason: String },
}

/// Creates, reads and deletes sequence-numbered overflow files in one
/// directory.
pub struct OverflowStore<C> {
    dir:    PathBuf,
    naming: FileNaming,
    codec:  C,
}

impl<C> OverflowStore<C> {
    pub fn new<P: Into<PathBuf>>(dir: P, naming: FileNaming, codec: C) -> Self {
        Self {
            dir: dir.into(),
            naming,
            codec,
        }
    }

    pub fn path(&self, sequence: u64) -> PathBuf { self.naming.file_path(&self.dir, sequence) }

    /// Encodes `batch` and writes it as overflow file `sequence`.
    pub fn write_batch<T>(&self, sequence: u64, batch: &[T]) -> Result<PathBuf>
    where
        C: Codec<T>,
    {
        let payload = self.codec.encode(batch).context(EncodeSnafu)?;
        let length = u32::try_from(payload.len())
            .ok()
            .context(BatchTooLargeSnafu { len: payload.len() })?;

        let mut frame = Vec::with_capacity(FRAME_LENGTH_SIZE + payload.len() + FRAME_CRC_SIZE);
        frame.extend_from_slice(&length.to_le_bytes());
        frame.extend_from_slice(&payload);
        frame.extend_from_slice(&calculate_frame_crc(length, &payload).to_le_bytes());

        let path = self.path(sequence);
        write_atomically(&path, &frame).context(WriteOverflowSnafu { path: path.clone() })?;
        Ok(path)
    }

    /// Reads overflow file `sequence` in full. The file is left on disk.
    pub fn read_batch<T>(&self, sequence: u64) -> Result<BatchRead<T>>
    where
        C: Codec<T>,
    {
        let path = self.path(sequence);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BatchRead::Missing),
            Err(e) => return Err(e).context(ReadOverflowSnafu { path }),
        };

        let payload = match unframe(&bytes) {
            Ok(payload) => payload,
            Err(reason) => return Ok(BatchRead::Corrupt { reason }),
        };

        Ok(match self.codec.decode(payload) {
            Ok(items) => BatchRead::Loaded(items),
            Err(e) => BatchRead::Corrupt {
                reason: format!("codec: {e}"),
            },
        })
    }

    /// Deletes overflow file `sequence`. A file that is already gone is not
    /// an error.
    pub fn remove(&self, sequence: u64) -> Result<()> {
        let path = self.path(sequence);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(RemoveOverflowSnafu { path }),
        }
    }

    /// Renames overflow file `sequence` out of the naming convention so it is
    /// kept for inspection but never loaded again.
    pub fn quarantine(&self, sequence: u64) -> Result<PathBuf> {
        let path = self.path(sequence);
        let target = with_suffix(&path, QUARANTINE_SUFFIX);
        fs::rename(&path, &target).context(RemoveOverflowSnafu { path })?;
        Ok(target)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp = with_suffix(path, TEMP_SUFFIX);

    let result = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&temp, path));

    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}

/// Validates the frame and returns the codec payload.
fn unframe(bytes: &[u8]) -> std::result::Result<&[u8], String> {
    let Some((length_bytes, rest)) = bytes.split_first_chunk::<FRAME_LENGTH_SIZE>() else {
        return Err(format!("{} bytes is shorter than the frame header", bytes.len()));
    };
    let length = u32::from_le_bytes(*length_bytes);

    let Some((payload, crc_bytes)) = rest.split_at_checked(length as usize) else {
        return Err(format!("truncated payload: expected {length} bytes, found {}", rest.len()));
    };
    let Ok(crc_bytes) = <[u8; FRAME_CRC_SIZE]>::try_from(crc_bytes) else {
        return Err(format!("expected a {FRAME_CRC_SIZE} byte checksum, found {} bytes", crc_bytes.len()));
    };

    if !verify_frame_crc(length, payload, u32::from_le_bytes(crc_bytes)) {
        return Err("checksum mismatch".to_string());
    }
    Ok(payload)
}
