//! Synthetic JSON payloads of an approximate size.

use bytes::Bytes;
use serde::Deserialize;
use std::collections::TryReserveError;

/// Size of one filler chunk, quotes and separator included.
pub const CHUNK_SIZE: usize = 1024;

const FILLER: &str = "x";

/// `{ size }`: bytes of JSON to generate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PayloadConfig {
    pub size: i64,
}

/// Builds a JSON array of fixed-size string chunks whose serialized length
/// is `size` rounded up to a whole chunk. Zero yields `[]`.
///
/// Fails instead of aborting when the buffer cannot be allocated.
pub fn generate(size: usize) -> Result<Bytes, TryReserveError> {
    let chunks = size.div_ceil(CHUNK_SIZE);
    // Each element is `"…",` so the string itself is three bytes shorter.
    let chunk = FILLER.repeat(CHUNK_SIZE - 3);

    // A saturated capacity exceeds `isize::MAX` and is refused by the reserve.
    let capacity = chunks.saturating_mul(CHUNK_SIZE).saturating_add(2);
    let mut json = String::new();
    json.try_reserve_exact(capacity)?;
    json.push('[');
    for index in 0..chunks {
        if index > 0 {
            json.push(',');
        }
        json.push('"');
        json.push_str(&chunk);
        json.push('"');
    }
    json.push(']');
    Ok(Bytes::from(json))
}
