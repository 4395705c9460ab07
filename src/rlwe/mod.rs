//! RLWE (Ring Learning With Errors) encryption over an RNS modulus chain
//!
//! Both schemes share this layer; they differ only in how a value becomes a
//! message polynomial (see [`crate::scheme`]).
//!
//! - Secret key s: ternary polynomial
//! - Public key (b, a) = (-a·s + e, a)
//! - Ciphertext (c0, c1) with phase c0 + c1·s = m + small error

mod enc;
mod types;

pub use types::{RlweCiphertext, RlwePublicKey, RlweSecretKey};
