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

//! Registry of outstanding overflow files.
//!
//! Every spill writes the items that were resident longest, so a file with a
//! lower sequence number always holds items enqueued before any file with a
//! higher one. Consuming the minimum outstanding sequence is therefore what
//! keeps the queue FIFO across the memory/disk boundary.

use std::collections::BTreeSet;

#[derive(Debug)]
pub struct OverflowIndex {
    outstanding:   BTreeSet<u64>,
    /// Sequence number handed to the next spill. Never reused, even after
    /// the file it named has been consumed.
    next_sequence: u64,
}

impl Default for OverflowIndex {
    fn default() -> Self { Self::from_discovered(std::iter::empty()) }
}

impl OverflowIndex {
    /// Seeds the index from sequences discovered on disk.
    ///
    /// Numbering resumes after the largest discovered sequence rather than
    /// the number of files, so a gap left by consumed files cannot lead to a
    /// name collision with a file that is still outstanding.
    ///
    /// `u64::MAX` has no successor to resume from and is dropped; the
    /// bootstrap scan reports such files before they get here.
    pub fn from_discovered<I: IntoIterator<Item = u64>>(sequences: I) -> Self {
        let outstanding: BTreeSet<u64> = sequences
            .into_iter()
            .filter(|&sequence| sequence != u64::MAX)
            .collect();
        let next_sequence = outstanding.last().map_or(1, |max| max + 1);
        Self {
            outstanding,
            next_sequence,
        }
    }

    pub fn allocate(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }

    pub fn insert(&mut self, sequence: u64) {
        self.outstanding.insert(sequence);
        if let Some(next) = sequence.checked_add(1) {
            self.next_sequence = self.next_sequence.max(next);
        }
    }

    /// Removes and returns the oldest outstanding sequence.
    pub fn pop_oldest(&mut self) -> Option<u64> { self.outstanding.pop_first() }

    pub fn len(&self) -> usize { self.outstanding.len() }

    pub fn is_empty(&self) -> bool { self.outstanding.is_empty() }

    pub const fn next_sequence(&self) -> u64 { self.next_sequence }

    /// Outstanding sequences, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ { self.outstanding.iter().copied() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index_starts_at_one() {
        let mut index = OverflowIndex::default();
        assert!(index.is_empty());
        assert_eq!(index.allocate(), 1);
        assert_eq!(index.allocate(), 2);
    }

    #[test]
    fn test_numbering_resumes_after_max() {
        let mut index = OverflowIndex::from_discovered([3, 9]);
        assert_eq!(index.len(), 2);
        assert_eq!(index.allocate(), 10);
    }

    #[test]
    fn test_pop_oldest_regardless_of_insert_order() {
        let mut index = OverflowIndex::from_discovered([5, 2]);
        let a = index.allocate();
        let b = index.allocate();
        index.insert(b);
        index.insert(a);

        let order: Vec<u64> = std::iter::from_fn(|| index.pop_oldest()).collect();
        assert_eq!(order, vec![2, 5, 6, 7]);
        assert!(index.pop_oldest().is_none());
    }

    #[test]
    fn test_consumed_sequences_are_not_reused() {
        let mut index = OverflowIndex::default();
        let first = index.allocate();
        index.insert(first);
        assert_eq!(index.pop_oldest(), Some(first));
        assert_eq!(index.allocate(), first + 1);
    }

    #[test]
    fn test_max_sequence_is_not_indexed() {
        let mut index = OverflowIndex::from_discovered([4, u64::MAX]);
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![4]);
        assert_eq!(index.allocate(), 5);

        let mut only_max = OverflowIndex::from_discovered([u64::MAX]);
        assert!(only_max.is_empty());
        assert_eq!(only_max.allocate(), 1);
    }

    #[test]
    fn test_iter_is_ascending() {
        let index = OverflowIndex::from_discovered([8, 1, 4]);
        assert_eq!(index.iter().collect::<Vec<_>>(), vec![1, 4, 8]);
        assert_eq!(index.next_sequence(), 9);
    }
}
