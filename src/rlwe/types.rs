//! RLWE ciphertext and key types over an RNS modulus chain.

use crate::math::RnsPoly;
use serde::{Deserialize, Serialize};
use std::fmt;

/// RLWE secret key: ternary polynomial over the chain primes and the
/// special prime.
///
/// Not `Serialize`; only the owning key set can use it.
#[derive(Clone)]
pub struct RlweSecretKey {
    pub(crate) poly: RnsPoly,
}

impl RlweSecretKey {
    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    /// Secret restricted to the first `level` primes.
    pub(crate) fn at_level(&self, level: usize) -> RnsPoly {
        self.poly.prefix(level)
    }
}

impl fmt::Debug for RlweSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RlweSecretKey")
            .field("ring_dim", &self.ring_dim())
            .field("poly", &"<redacted>")
            .finish()
    }
}

/// RLWE public key: an encryption of zero, b = -a·s + e.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlwePublicKey {
    pub b: RnsPoly,
    pub a: RnsPoly,
}

impl RlwePublicKey {
    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.a.moduli()
    }
}

/// RLWE ciphertext (b, a) with phase b + a·s = Δ·m + e.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    pub b: RnsPoly,
    pub a: RnsPoly,
}

impl RlweCiphertext {
    pub fn from_parts(b: RnsPoly, a: RnsPoly) -> Self {
        debug_assert_eq!(
            b.moduli(),
            a.moduli(),
            "Ciphertext polynomials must share a modulus chain"
        );
        Self { b, a }
    }

    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    /// Number of chain primes carried
    pub fn level(&self) -> usize {
        self.a.level_count()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.a.moduli()
    }
}
