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

//! Batch codecs for overflow files.
//!
//! The queue never interprets item bytes itself. A [`Codec`] turns an ordered
//! batch of items into one opaque payload and back; the store frames that
//! payload with a length and checksum before it reaches disk.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::BoxError;

/// Encodes and decodes an ordered batch of items.
///
/// `decode` must return the items in the order they were given to `encode`.
pub trait Codec<T>: Send + Sync {
    fn encode(&self, batch: &[T]) -> Result<Vec<u8>, BoxError>;

    fn decode(&self, payload: &[u8]) -> Result<Vec<T>, BoxError>;
}

/// Compact binary batches via bincode's serde integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, batch: &[T]) -> Result<Vec<u8>, BoxError> {
        Ok(bincode::serde::encode_to_vec(batch, bincode::config::standard())?)
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<T>, BoxError> {
        let (batch, read): (Vec<T>, usize) =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
        if read != payload.len() {
            return Err(format!("{} trailing bytes after batch", payload.len() - read).into());
        }
        Ok(batch)
    }
}

/// Human-readable batches as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, batch: &[T]) -> Result<Vec<u8>, BoxError> { Ok(serde_json::to_vec(batch)?) }

    fn decode(&self, payload: &[u8]) -> Result<Vec<T>, BoxError> {
        Ok(serde_json::from_slice(payload)?)
    }
}
