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

//! A bounded, thread-safe queue that overflows to disk.
//!
//! Items live in memory until the resident count passes the configured
//! capacity; the oldest ones are then written to sequence-numbered overflow
//! files and read back, oldest file first, once the buffer runs low. Files
//! left behind by a previous process are picked up at construction.

pub mod builder;
pub mod codec;
pub mod config;
mod crc;
pub mod error;
pub mod file;
pub mod index;
pub mod path;
pub mod queue;
pub mod recovery;

pub use builder::QueueBuilder;
pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{QueueConfig, Threshold, WakePolicy};
pub use error::{QueueError, Result};
pub use queue::OverflowQueue;
