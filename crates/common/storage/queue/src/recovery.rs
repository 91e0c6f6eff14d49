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

//! Startup discovery of overflow files left by a previous process.
//!
//! Bootstrap never fails queue construction. A directory that does not exist
//! yet is created so later spills can succeed; anything unreadable degrades to
//! an empty index with a warning.

use std::path::Path;

use tracing::{info, warn};

use crate::{
    index::OverflowIndex,
    path::{FileNaming, scan_overflow_files},
};

/// Scans `dir` for overflow files and seeds an [`OverflowIndex`] from them.
pub fn recover(dir: &Path, naming: &FileNaming) -> OverflowIndex {
    if !dir.exists() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!(path = ?dir, error = %e, "Failed to create overflow directory");
        }
        info!(path = ?dir, "No overflow directory found, starting fresh");
        return OverflowIndex::default();
    }

    if !dir.is_dir() {
        warn!(path = ?dir, "Overflow path is not a directory, ignoring prior files");
        return OverflowIndex::default();
    }

    match scan_overflow_files(dir, naming) {
        Ok(mut sequences) => {
            if sequences.last() == Some(&u64::MAX) {
                sequences.pop();
                warn!(
                    path = ?naming.file_path(dir, u64::MAX),
                    "Overflow file at the last sequence number, leaving it on disk"
                );
            }
            let index = OverflowIndex::from_discovered(sequences);
            info!(
                path = ?dir,
                outstanding = index.len(),
                next_sequence = index.next_sequence(),
                "Overflow recovery complete"
            );
            index
        }
        Err(e) => {
            warn!(path = ?dir, error = %e, "Failed to scan overflow directory");
            OverflowIndex::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempfile::TempDir;

    use super::*;

    fn naming() -> FileNaming { FileNaming::new("failover", ".log") }

    #[test]
    fn test_recovery_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let index = recover(temp_dir.path(), &naming());
        assert!(index.is_empty());
        assert_eq!(index.next_sequence(), 1);
    }

    #[test]
    fn test_recovery_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("overflow");

        let index = recover(&dir, &naming());
        assert!(index.is_empty());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_recovery_from_non_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain-file");
        File::create(&path).unwrap();

        let index = recover(&path, &naming());
        assert!(index.is_empty());
    }

    #[test]
    fn test_recovery_orders_discovered_files() {
        let temp_dir = TempDir::new().unwrap();
        for name in [
            "failover3.log",
            "failover11.log",
            "failover7.log",
            "failover2.log.corrupt",
            "readme.md",
        ] {
            File::create(temp_dir.path().join(name)).unwrap();
        }

        let mut index = recover(temp_dir.path(), &naming());
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![3, 7, 11]);
        assert_eq!(index.allocate(), 12);
    }

    #[test]
    fn test_recovery_skips_last_sequence_number() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("failover2.log")).unwrap();
        File::create(temp_dir.path().join(format!("failover{}.log", u64::MAX))).unwrap();

        let mut index = recover(temp_dir.path(), &naming());
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(index.allocate(), 3);
    }
}
