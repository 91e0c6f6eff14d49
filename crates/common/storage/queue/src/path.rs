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

//! Overflow file naming: `<prefix><sequence><extension>`, e.g. `failover7.log`.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileNaming {
    prefix:    String,
    extension: String,
}

impl FileNaming {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix:    prefix.into(),
            extension: extension.into(),
        }
    }

    pub fn file_name(&self, sequence: u64) -> String {
        format!("{}{sequence}{}", self.prefix, self.extension)
    }

    pub fn file_path<P: AsRef<Path>>(&self, dir: P, sequence: u64) -> PathBuf {
        dir.as_ref().join(self.file_name(sequence))
    }

    /// Extracts the sequence number from a conforming file name.
    ///
    /// The part between prefix and extension must be non-empty decimal
    /// digits; anything else (temporary or quarantined files included) is
    /// not an overflow file.
    pub fn parse_sequence(&self, file_name: &str) -> Option<u64> {
        let digits = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.extension.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Lists the sequence numbers of overflow files directly inside `dir`,
/// ascending.
pub fn scan_overflow_files<P: AsRef<Path>>(dir: P, naming: &FileNaming) -> std::io::Result<Vec<u64>> {
    let mut sequences = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(sequence) = entry
            .file_name()
            .to_str()
            .and_then(|name| naming.parse_sequence(name))
        {
            sequences.push(sequence);
        }
    }

    sequences.sort_unstable();
    Ok(sequences)
}
