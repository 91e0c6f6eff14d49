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

use std::{io, path::PathBuf};

use snafu::Snafu;

/// Boxed error produced by a [`Codec`](crate::Codec) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Queue operation errors.
///
/// Only storage faults surface here. A missing overflow file is skipped and a
/// batch that fails to decode is quarantined, so neither is ever returned.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum QueueError {
    /// Creating or writing an overflow file failed during a spill.
    #[snafu(display("Failed to write overflow file {}: {source}", path.display()))]
    WriteOverflow { path: PathBuf, source: io::Error },

    /// Reading an overflow file failed during a refill.
    #[snafu(display("Failed to read overflow file {}: {source}", path.display()))]
    ReadOverflow { path: PathBuf, source: io::Error },

    /// Deleting a consumed or cleared overflow file failed.
    #[snafu(display("Failed to remove overflow file {}: {source}", path.display()))]
    RemoveOverflow { path: PathBuf, source: io::Error },

    /// The codec could not encode a spill batch.
    #[snafu(display("Failed to encode spill batch: {source}"))]
    Encode { source: BoxError },

    /// The encoded batch does not fit in the frame's length field.
    #[snafu(display("Encoded batch of {len} bytes exceeds the frame limit"))]
    BatchTooLarge { len: usize },
}

/// Result type for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
