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

use serde::{Serialize, de::DeserializeOwned};

use crate::{BincodeCodec, Codec, OverflowQueue, QueueConfig, Threshold, WakePolicy};

pub struct QueueBuilder {
    config: QueueConfig,
}

impl QueueBuilder {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            config: QueueConfig {
                base_path: base_path.into(),
                ..Default::default()
            },
        }
    }

    /// Resident item count above which the next push spills to disk.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = Some(capacity);
        self
    }

    /// Never spill. Existing overflow files are still drained.
    pub fn unbounded(mut self) -> Self {
        self.config.capacity = None;
        self
    }

    pub fn low_water(mut self, threshold: Threshold) -> Self {
        self.config.low_water = threshold;
        self
    }

    pub fn spill_batch(mut self, threshold: Threshold) -> Self {
        self.config.spill_batch = threshold;
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.file_extension = extension.into();
        self
    }

    pub fn wake_policy(mut self, policy: WakePolicy) -> Self {
        self.config.wake_policy = policy;
        self
    }

    /// Build a queue that stores overflow batches with [`BincodeCodec`].
    pub fn build<T>(self) -> OverflowQueue<T>
    where
        T: Serialize + DeserializeOwned,
    {
        OverflowQueue::new(self.config, BincodeCodec)
    }

    pub fn build_with_codec<T, C: Codec<T>>(self, codec: C) -> OverflowQueue<T, C> {
        OverflowQueue::new(self.config, codec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default_config() {
        let builder = QueueBuilder::new("/tmp/test_queue");
        assert_eq!(builder.config.base_path, PathBuf::from("/tmp/test_queue"));
        assert_eq!(builder.config.capacity, Some(1024));
        assert_eq!(builder.config.file_prefix, "failover");
        assert_eq!(builder.config.file_extension, ".log");
        assert_eq!(builder.config.wake_policy, WakePolicy::One);
        assert_eq!(builder.config.low_water.resolve(10), 2);
        assert_eq!(builder.config.spill_batch.resolve(10), 5);
    }

    #[test]
    fn test_builder_custom_config() {
        let builder = QueueBuilder::new("/tmp/test_queue")
            .capacity(64)
            .low_water(Threshold::Fixed(4))
            .spill_batch(Threshold::Fixed(32))
            .file_prefix("spill-")
            .file_extension(".bin")
            .wake_policy(WakePolicy::All);

        assert_eq!(builder.config.capacity, Some(64));
        assert_eq!(builder.config.low_water.resolve(64), 4);
        assert_eq!(builder.config.spill_batch.resolve(64), 32);
        assert_eq!(builder.config.file_prefix, "spill-");
        assert_eq!(builder.config.file_extension, ".bin");
        assert_eq!(builder.config.wake_policy, WakePolicy::All);
    }

    #[test]
    fn test_builder_unbounded() {
        let builder = QueueBuilder::new("/tmp/test_queue").capacity(8).unbounded();
        assert_eq!(builder.config.capacity, None);
    }
}
