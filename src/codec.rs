//! Base64 transport codec for ciphertext and key bytes.
//!
//! Standard alphabet (`A-Z a-z 0-9 + /`) with `=` padding. Decoding is
//! tolerant of truncation: it stops at the first `=` or at the end of the
//! input and returns the bytes assembled so far. Any other character
//! outside the alphabet is rejected.
//!
//! Binary payloads are bincode with fixed-width integers and a size limit,
//! so a hostile length prefix cannot trigger a huge allocation.

use crate::error::{EngineError, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Upper bound on a decoded ciphertext or key payload
pub const MAX_WIRE_BYTES: u64 = 64 << 20;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_WIRE_BYTES)
}

/// Serialize a wire value to bytes.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    wire_options()
        .serialize(value)
        .map_err(|e| EngineError::Internal(format!("serialization failed: {}", e)))
}

/// Deserialize a wire value; any failure is a [`EngineError::MalformedEncoding`].
pub fn from_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(wire_options().deserialize(bytes)?)
}

/// Serialize and base64-encode.
pub fn to_text<T: Serialize>(value: &T) -> Result<String> {
    Ok(encode(&to_bytes(value)?))
}

/// Base64-decode and deserialize.
pub fn from_text<T: DeserializeOwned>(text: &str) -> Result<T> {
    from_bytes(&decode(text)?)
}

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Encode bytes as padded base64 text.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);

    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;

        out.push(ALPHABET[(triple >> 18) as usize & 0x3f] as char);
        out.push(ALPHABET[(triple >> 12) as usize & 0x3f] as char);
        if chunk.len() > 1 {
            out.push(ALPHABET[(triple >> 6) as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
        if chunk.len() > 2 {
            out.push(ALPHABET[triple as usize & 0x3f] as char);
        } else {
            out.push('=');
        }
    }

    out
}

/// Decode base64 text.
///
/// Fails with [`EngineError::MalformedEncoding`] on a character outside the
/// alphabet that is not padding.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() / 4 * 3);
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for (pos, ch) in text.bytes().enumerate() {
        let value = match sextet(ch) {
            Some(v) => v,
            None if ch == b'=' => break,
            None => {
                return Err(EngineError::MalformedEncoding(format!(
                    "invalid base64 character {:?} at offset {}",
                    ch as char, pos
                )))
            }
        };

        acc = (acc << 6) | value as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
            acc &= (1 << bits) - 1;
        }
    }

    Ok(out)
}

fn sextet(ch: u8) -> Option<u8> {
    match ch {
        b'A'..=b'Z' => Some(ch - b'A'),
        b'a'..=b'z' => Some(ch - b'a' + 26),
        b'0'..=b'9' => Some(ch - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}
