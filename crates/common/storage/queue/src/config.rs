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

use std::path::PathBuf;

/// Default prefix of overflow file names.
pub const DEFAULT_FILE_PREFIX: &str = "failover";

/// Default extension of overflow file names, including the dot.
pub const DEFAULT_FILE_EXTENSION: &str = ".log";

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub base_path:      PathBuf,
    /// `None` disables capacity enforcement: pushes never spill.
    pub capacity:       Option<usize>,
    pub low_water:      Threshold,
    pub spill_batch:    Threshold,
    pub file_prefix:    String,
    pub file_extension: String,
    pub wake_policy:    WakePolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            base_path:      PathBuf::from("./queue_data"),
            capacity:       Some(1024),
            low_water:      Threshold::Fraction(0.25),
            spill_batch:    Threshold::Fraction(0.5),
            file_prefix:    DEFAULT_FILE_PREFIX.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            wake_policy:    WakePolicy::One,
        }
    }
}

/// An item count derived from the queue capacity.
///
/// Used for the low-water mark (refill when resident size is at or below it)
/// and for the number of items moved per spill.
#[derive(Debug, Clone, Copy)]
pub enum Threshold {
    /// `floor(capacity * fraction)`.
    Fraction(f64),
    /// A constant, independent of capacity.
    Fixed(usize),
    Custom(fn(usize) -> usize),
}

impl Threshold {
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn resolve(&self, capacity: usize) -> usize {
        match self {
            // Flooring keeps `resident <= floor(c * f)` equivalent to the real
            // comparison `resident <= c * f` for whole item counts.
            Self::Fraction(fraction) => (capacity as f64 * fraction).floor().max(0.0) as usize,
            Self::Fixed(count) => *count,
            Self::Custom(f) => f(capacity),
        }
    }
}

/// How many blocked consumers are woken when items become available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WakePolicy {
    /// One waiter per event.
    #[default]
    One,
    /// Every waiter when a refill yields several items, and on clear.
    All,
}
