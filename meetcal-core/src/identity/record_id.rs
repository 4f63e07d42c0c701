//! Durable record id generation.

use std::collections::HashSet;

use uuid::Uuid;

use crate::error::StoreError;

/// base32hex, the character set Google Calendar accepts in event ids.
const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

pub const RECORD_ID_LEN: usize = 20;

/// Consecutive collisions tolerated before giving up.
pub const MAX_ID_ATTEMPTS: usize = 32;

/// A random 20-character base32hex id.
pub fn random_record_id() -> String {
    let mut bits = Uuid::new_v4().as_u128();
    (0..RECORD_ID_LEN)
        .map(|_| {
            let c = ALPHABET[(bits & 0x1f) as usize] as char;
            bits >>= 5;
            c
        })
        .collect()
}

/// Draw ids from `next` until one is not in `taken`.
pub fn assign_record_id(
    taken: &HashSet<String>,
    mut next: impl FnMut() -> String,
) -> Result<String, StoreError> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = next();
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!(record_id = %candidate, "record id collision, retrying");
    }

    Err(StoreError::IdExhausted(MAX_ID_ATTEMPTS))
}
