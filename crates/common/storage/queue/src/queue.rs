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

//! The overflow queue and its coordination.
//!
//! [`OverflowQueue`] keeps items in a memory buffer and moves the oldest ones
//! to disk when the buffer grows past capacity:
//!
//! ```text
//!            push                                     popw
//!             │                                        ▲
//!             ▼                                        │
//! ┌───────────────────────┐   refill (oldest file)  ┌──┴───────────────────┐
//! │ overflow files on disk│ ──────────────────────► │ front of buffer      │
//! │ failover1, failover2… │                         │                      │
//! └───────────────────────┘ ◄────────────────────── │ tail of buffer ◄─────┘
//!                            spill (oldest resident)
//! ```
//!
//! A spill always takes the items at the front of the buffer. A refill always
//! loads the lowest-numbered file and puts its items, in their original
//! order, ahead of whatever is resident. Files are therefore consumed in the
//! order they were written and no item is lost or duplicated, but items that
//! stayed resident can be delivered before older items that were spilled:
//! with capacity 10, pushing `0..20` pops `10..=17`, then `0..=9`, then
//! `18, 19`.
//!
//! ## Concurrency
//!
//! One mutex guards all state and is held for the full duration of every
//! operation, file I/O included. `popw` is the only operation that waits.
//!
//! ## Usage
//!
//! ```ignore
//! let queue = QueueBuilder::new("/var/spool/events").capacity(1000).build::<Event>();
//!
//! queue.push(event)?;
//! while let Some(event) = queue.popw()? {
//!     handle(event);
//! }
//! ```

use std::{
    collections::VecDeque,
    path::PathBuf,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    BincodeCodec, Codec, QueueConfig, Result, WakePolicy,
    file::{BatchRead, OverflowStore},
    index::OverflowIndex,
    path::FileNaming,
    recovery,
};

/// Everything the queue lock protects.
struct State<T> {
    /// Resident items, oldest first. Its length is the resident count.
    buffer:      VecDeque<T>,
    /// `None` once capacity enforcement is disabled.
    capacity:    Option<usize>,
    index:       OverflowIndex,
    quarantined: Vec<PathBuf>,
}

/// A thread-safe queue that spills to disk past its capacity.
///
/// Resident size is a soft bound: a push only checks capacity before
/// appending, so the buffer can hold `capacity + 1` items until the next
/// push spills.
pub struct OverflowQueue<T, C = BincodeCodec> {
    state:       Mutex<State<T>>,
    /// Signalled when a consumer may be able to make progress.
    not_empty:   Condvar,
    store:       OverflowStore<C>,
    low_water:   usize,
    spill_batch: usize,
    wake_policy: WakePolicy,
}

impl<T, C: Codec<T>> OverflowQueue<T, C> {
    /// Create a queue over `config.base_path`, picking up any overflow files
    /// a previous instance left behind.
    pub(crate) fn new(config: QueueConfig, codec: C) -> Self {
        let naming = FileNaming::new(config.file_prefix, config.file_extension);
        let index = recovery::recover(&config.base_path, &naming);

        let policy_capacity = config.capacity.unwrap_or(0);
        let low_water = config.low_water.resolve(policy_capacity);
        let spill_batch = config.spill_batch.resolve(policy_capacity).max(1);

        info!(
            path = ?config.base_path,
            capacity = ?config.capacity,
            low_water,
            spill_batch,
            outstanding = index.len(),
            "Overflow queue initialized"
        );

        Self {
            state: Mutex::new(State {
                buffer: VecDeque::new(),
                capacity: config.capacity,
                index,
                quarantined: Vec::new(),
            }),
            not_empty: Condvar::new(),
            store: OverflowStore::new(config.base_path, naming, codec),
            low_water,
            spill_batch,
            wake_policy: config.wake_policy,
        }
    }

    /// Append an item, spilling the oldest resident items to a new overflow
    /// file first if the buffer is already over capacity.
    ///
    /// # Errors
    ///
    /// Returns an error if the spill batch cannot be encoded or written. The
    /// buffer is left as it was and `item` is not enqueued.
    pub fn push(&self, item: T) -> Result<()> {
        let mut state = self.state.lock();
        if state
            .capacity
            .is_some_and(|capacity| state.buffer.len() > capacity)
        {
            self.spill(&mut state)?;
        }
        state.buffer.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Pop the oldest item, waiting until one is available.
    ///
    /// Returns `Ok(None)` only when nothing is resident or on disk and
    /// capacity enforcement is disabled (see [`clear`](Self::clear)).
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deleting an overflow file fails.
    pub fn popw(&self) -> Result<Option<T>> { self.pop_until(None) }

    /// Like [`popw`](Self::popw), but gives up with `Ok(None)` once `timeout`
    /// has elapsed. A timeout too large to represent as a deadline waits
    /// without bound.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deleting an overflow file fails.
    pub fn popw_timeout(&self, timeout: Duration) -> Result<Option<T>> {
        self.pop_until(Instant::now().checked_add(timeout))
    }

    /// Pop the oldest item without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deleting an overflow file fails.
    pub fn try_pop(&self) -> Result<Option<T>> {
        let mut state = self.state.lock();
        self.fill(&mut state)?;
        Ok(state.buffer.pop_front())
    }

    /// Drop every resident item and stop enforcing capacity. With
    /// `delete_files`, outstanding overflow files are deleted as well.
    ///
    /// # Errors
    ///
    /// Returns an error if an overflow file cannot be deleted. Files not yet
    /// deleted stay outstanding.
    pub fn clear(&self, delete_files: bool) -> Result<()> {
        let mut state = self.state.lock();
        let dropped = state.buffer.len();
        state.buffer.clear();
        state.capacity = None;

        let result = if delete_files {
            self.delete_outstanding(&mut state)
        } else {
            Ok(())
        };

        info!(
            dropped,
            delete_files,
            outstanding = state.index.len(),
            "Overflow queue cleared"
        );
        self.wake(usize::MAX);
        result
    }

    fn pop_until(&self, deadline: Option<Instant>) -> Result<Option<T>> {
        let mut state = self.state.lock();
        loop {
            self.fill(&mut state)?;
            if let Some(item) = state.buffer.pop_front() {
                return Ok(Some(item));
            }
            if state.capacity.is_none() {
                // Pass the wake-up on so every waiter observes the cleared state.
                self.not_empty.notify_one();
                return Ok(None);
            }

            match deadline {
                None => self.not_empty.wait(&mut state),
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut state, deadline).timed_out() {
                        self.fill(&mut state)?;
                        return Ok(state.buffer.pop_front());
                    }
                }
            }
        }
    }

    /// Move the oldest `spill_batch` resident items into a new overflow file.
    fn spill(&self, state: &mut State<T>) -> Result<()> {
        let count = self.spill_batch.min(state.buffer.len());
        let batch: Vec<T> = state.buffer.drain(..count).collect();
        let sequence = state.index.allocate();

        match self.store.write_batch(sequence, &batch) {
            Ok(path) => {
                state.index.insert(sequence);
                debug!(
                    sequence,
                    path = ?path,
                    count,
                    resident = state.buffer.len(),
                    "Spilled batch to overflow file"
                );
                Ok(())
            }
            Err(e) => {
                for item in batch.into_iter().rev() {
                    state.buffer.push_front(item);
                }
                Err(e)
            }
        }
    }

    /// Load overflow files, oldest first, while the resident count is at or
    /// below the low-water mark.
    fn fill(&self, state: &mut State<T>) -> Result<()> {
        while state.buffer.len() <= self.low_water {
            let Some(sequence) = state.index.pop_oldest() else {
                break;
            };

            let items = match self.store.read_batch::<T>(sequence) {
                Ok(BatchRead::Loaded(items)) => items,
                Ok(BatchRead::Missing) => {
                    warn!(
                        sequence,
                        path = ?self.store.path(sequence),
                        "Overflow file missing, skipping"
                    );
                    continue;
                }
                Ok(BatchRead::Corrupt { reason }) => {
                    self.quarantine(state, sequence, &reason);
                    continue;
                }
                Err(e) => {
                    state.index.insert(sequence);
                    return Err(e);
                }
            };

            if let Err(e) = self.store.remove(sequence) {
                state.index.insert(sequence);
                return Err(e);
            }

            let loaded = items.len();
            let mut refilled = VecDeque::from(items);
            refilled.append(&mut state.buffer);
            state.buffer = refilled;

            debug!(
                sequence,
                loaded,
                resident = state.buffer.len(),
                "Refilled from overflow file"
            );
            self.wake(loaded);
        }
        Ok(())
    }

    fn delete_outstanding(&self, state: &mut State<T>) -> Result<()> {
        while let Some(sequence) = state.index.pop_oldest() {
            if let Err(e) = self.store.remove(sequence) {
                state.index.insert(sequence);
                return Err(e);
            }
        }
        Ok(())
    }

    fn quarantine(&self, state: &mut State<T>, sequence: u64, reason: &str) {
        match self.store.quarantine(sequence) {
            Ok(path) => {
                error!(sequence, path = ?path, reason, "Corrupt overflow batch quarantined");
                state.quarantined.push(path);
            }
            Err(e) => {
                let path = self.store.path(sequence);
                error!(
                    sequence,
                    path = ?path,
                    reason,
                    error = %e,
                    "Corrupt overflow batch could not be renamed, skipping"
                );
                state.quarantined.push(path);
            }
        }
    }
}

impl<T, C> OverflowQueue<T, C> {
    /// Number of resident items. Items in overflow files are not counted.
    #[must_use]
    pub fn size(&self) -> usize { self.state.lock().buffer.len() }

    /// Whether nothing is resident. Overflow files may still hold items.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.state.lock().buffer.is_empty() }

    /// Current capacity, `None` when enforcement is disabled.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> { self.state.lock().capacity }

    #[must_use]
    pub fn outstanding_files(&self) -> usize { self.state.lock().index.len() }

    /// Paths of outstanding overflow files, oldest first.
    #[must_use]
    pub fn failover_files(&self) -> Vec<PathBuf> {
        let state = self.state.lock();
        state.index.iter().map(|sequence| self.store.path(sequence)).collect()
    }

    /// Paths of batches that failed to decode and were set aside.
    #[must_use]
    pub fn quarantined_files(&self) -> Vec<PathBuf> { self.state.lock().quarantined.clone() }

    fn wake(&self, ready: usize) {
        match self.wake_policy {
            WakePolicy::All if ready > 1 => {
                self.not_empty.notify_all();
            }
            _ => {
                self.not_empty.notify_one();
            }
        }
    }
}
