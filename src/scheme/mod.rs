//! Scheme polymorphism
//!
//! The engine is generic over a [`Scheme`] marker type. A scheme decides how a
//! plaintext number becomes a message polynomial, how a decryption phase
//! becomes a number again, and which extra operations it supports. RLWE
//! encryption itself is shared (see [`crate::rlwe`]).

mod approximate;
mod exact;

pub use approximate::{Approximate, CkksEncoder};
pub use exact::{BatchEncoder, Exact};
pub use crate::params::SchemeKind;

use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::math::RnsPoly;
use crate::params::SchemeParams;
use crate::rlwe::RlweCiphertext;
use std::fmt::Debug;

/// An encryption scheme: encoding rules plus scheme-specific operations.
pub trait Scheme: Copy + Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    const KIND: SchemeKind;

    /// Precomputed encoding state, built once per engine
    type Encoder: Debug + Send + Sync;

    fn default_params() -> SchemeParams;

    fn encoder(ctx: &HeContext) -> Result<Self::Encoder>;

    /// Validate a plaintext value and encode it as a message polynomial over
    /// the full chain. Returns the polynomial and its scale.
    fn encode(encoder: &Self::Encoder, ctx: &HeContext, value: f64) -> Result<(RnsPoly, f64)>;

    /// Recover the plaintext value from a decryption phase.
    fn decode(encoder: &Self::Encoder, phase: &RnsPoly, scale: f64) -> f64;

    /// Multiply by a plaintext scalar. Returns the new ciphertext and scale.
    fn multiply_by_scalar(
        _encoder: &Self::Encoder,
        _ct: &RlweCiphertext,
        _scale: f64,
        _scalar: f64,
    ) -> Result<(RlweCiphertext, f64)> {
        Err(EngineError::UnsupportedForScheme(format!(
            "scalar multiplication is not available for the {} scheme",
            Self::KIND
        )))
    }
}
