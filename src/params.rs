//! Parameter sets for the two encryption schemes
//!
//! Both presets use ring dimension 8192 and primes that are NTT-friendly for
//! every power-of-two dimension up to 8192, so tests can shrink the ring with
//! [`SchemeParams::with_ring_dim`] and keep the production moduli.

use crate::error::{EngineError, Result};
use crate::math::crt::chain_bits;
use crate::math::{ModQ, DEFAULT_Q, DEFAULT_SIGMA};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Production ring dimension
pub const RING_DIM: usize = 8192;

/// Plaintext modulus of the exact scheme (Fermat prime F4, ≡ 1 mod 2N)
pub const PLAIN_MODULUS: u64 = 65537;

/// Approximate scheme chain: one 58-bit base prime, three 40-bit rescale primes
pub const APPROX_MODULI: [u64; 4] = [
    288230376150876161,
    1099511480321,
    1099510890497,
    1099510824961,
];

/// Key-switching prime P, shared by both schemes
pub const SPECIAL_MODULUS: u64 = 1099510054913;

/// Approximate encoding scale, 2^40
pub const DEFAULT_SCALE: f64 = (1u64 << 40) as f64;

/// Which encryption scheme an engine, ciphertext or request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeKind {
    /// Exact integer arithmetic modulo t (BFV-style, batch encoded)
    #[serde(alias = "bfv", alias = "BFV")]
    Exact,
    /// Approximate real arithmetic at a fixed scale (CKKS-style)
    #[serde(alias = "ckks", alias = "CKKS")]
    Approximate,
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeKind::Exact => write!(f, "exact"),
            SchemeKind::Approximate => write!(f, "approximate"),
        }
    }
}

/// Cryptographic parameters for one scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParams {
    pub kind: SchemeKind,

    /// Ring dimension N (power of two)
    pub ring_dim: usize,

    /// Ciphertext modulus chain, base prime first.
    /// Each prime must be NTT-friendly: q ≡ 1 (mod 2N)
    pub moduli: Vec<u64>,

    /// Extra prime P for relinearization keys, never part of a ciphertext
    pub special_modulus: u64,

    /// Plaintext modulus t (exact scheme only)
    pub plain_modulus: Option<u64>,

    /// Encoding scale Δ (approximate scheme only)
    pub scale: Option<f64>,

    /// Standard deviation for Gaussian error sampling
    pub sigma: f64,
}

impl SchemeParams {
    /// Exact integer scheme: N = 8192, q = 2^60 - 2^14 + 1, t = 65537.
    pub fn exact() -> Self {
        Self {
            kind: SchemeKind::Exact,
            ring_dim: RING_DIM,
            moduli: vec![DEFAULT_Q],
            special_modulus: SPECIAL_MODULUS,
            plain_modulus: Some(PLAIN_MODULUS),
            scale: None,
            sigma: DEFAULT_SIGMA,
        }
    }

    /// Approximate real scheme: N = 8192, 58+40+40+40-bit chain, scale 2^40.
    pub fn approximate() -> Self {
        Self {
            kind: SchemeKind::Approximate,
            ring_dim: RING_DIM,
            moduli: APPROX_MODULI.to_vec(),
            special_modulus: SPECIAL_MODULUS,
            plain_modulus: None,
            scale: Some(DEFAULT_SCALE),
            sigma: DEFAULT_SIGMA,
        }
    }

    pub fn for_kind(kind: SchemeKind) -> Self {
        match kind {
            SchemeKind::Exact => Self::exact(),
            SchemeKind::Approximate => Self::approximate(),
        }
    }

    /// Same moduli with a different ring dimension (tests and benchmarks).
    pub fn with_ring_dim(mut self, ring_dim: usize) -> Self {
        self.ring_dim = ring_dim;
        self
    }

    /// Scaling factor Δ = ⌊q/t⌋ of the exact scheme
    pub fn delta(&self) -> u64 {
        match self.plain_modulus {
            Some(t) => self.moduli[0] / t,
            None => 0,
        }
    }

    /// Largest magnitude a single plaintext value may have.
    ///
    /// Exact: t - 1. Approximate: q_0 / (4Δ) rounded, 2^16 for the preset,
    /// which leaves one bit of headroom in the base prime for sums.
    pub fn max_magnitude(&self) -> f64 {
        match self.kind {
            SchemeKind::Exact => self.plain_modulus.map_or(0.0, |t| (t - 1) as f64),
            SchemeKind::Approximate => {
                let scale = self.scale.unwrap_or(DEFAULT_SCALE);
                (self.moduli[0] as f64 / (4.0 * scale)).round()
            }
        }
    }

    /// Total bits of the ciphertext modulus chain
    pub fn modulus_bits(&self) -> f64 {
        chain_bits(&self.moduli)
    }

    /// Chain primes followed by the special prime
    pub fn key_moduli(&self) -> Vec<u64> {
        let mut moduli = self.moduli.clone();
        moduli.push(self.special_modulus);
        moduli
    }

    /// Check if parameters are valid
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(EngineError::InvalidParameters(msg));

        if !self.ring_dim.is_power_of_two() || self.ring_dim < 2 {
            return invalid(format!("ring_dim {} must be a power of two", self.ring_dim));
        }
        if self.moduli.is_empty() {
            return invalid("modulus chain must not be empty".into());
        }
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return invalid(format!("sigma {} must be positive", self.sigma));
        }

        let two_n = 2 * self.ring_dim as u64;
        let all = self.key_moduli();
        for (i, &q) in all.iter().enumerate() {
            if q % two_n != 1 {
                return invalid(format!("modulus {} is not ≡ 1 (mod {})", q, two_n));
            }
            if q >= 1 << 62 {
                return invalid(format!("modulus {} exceeds 62 bits", q));
            }
            if !ModQ::is_prime(q) {
                return invalid(format!("modulus {} is not prime", q));
            }
            if all[..i].contains(&q) {
                return invalid(format!("modulus {} appears twice", q));
            }
        }

        match self.kind {
            SchemeKind::Exact => {
                let Some(t) = self.plain_modulus else {
                    return invalid("exact scheme requires a plaintext modulus".into());
                };
                if self.moduli.len() != 1 {
                    return invalid("exact scheme uses a single-prime modulus".into());
                }
                if !ModQ::is_prime(t) || t % two_n != 1 {
                    return invalid(format!(
                        "plaintext modulus {} must be a prime ≡ 1 (mod {}) for batching",
                        t, two_n
                    ));
                }
                if t >= self.moduli[0] {
                    return invalid("plaintext modulus must be smaller than q".into());
                }
            }
            SchemeKind::Approximate => {
                let Some(scale) = self.scale else {
                    return invalid("approximate scheme requires a scale".into());
                };
                if !(scale > 1.0 && scale.is_finite()) {
                    return invalid(format!("scale {} must be greater than 1", scale));
                }
                if scale >= self.moduli[0] as f64 {
                    return invalid("scale must be smaller than the base prime".into());
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        SchemeParams::exact().validate().unwrap();
        SchemeParams::approximate().validate().unwrap();
        SchemeParams::exact().with_ring_dim(1024).validate().unwrap();
        SchemeParams::approximate()
            .with_ring_dim(1024)
            .validate()
            .unwrap();
    }

    #[test]
    fn test_exact_limits() {
        let params = SchemeParams::exact();
        assert_eq!(params.max_magnitude(), 65536.0);
        assert_eq!(params.delta(), DEFAULT_Q / 65537);
        assert!((params.modulus_bits() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_approximate_limits() {
        let params = SchemeParams::approximate();
        let max = params.max_magnitude();
        assert!(max > 65535.0 && max < 65537.0, "max = {}", max);
        assert!(params.modulus_bits() > 177.0 && params.modulus_bits() < 179.0);
        assert_eq!(params.key_moduli().len(), 5);
    }

    #[test]
    fn test_rejects_bad_dimension() {
        let params = SchemeParams::exact().with_ring_dim(1000);
        assert!(matches!(
            params.validate(),
            Err(EngineError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_non_ntt_friendly_modulus() {
        let mut params = SchemeParams::approximate();
        params.moduli.push(1099511627689); // prime, but not ≡ 1 (mod 2N)
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_modulus() {
        let mut params = SchemeParams::approximate();
        params.special_modulus = params.moduli[1];
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_non_batching_plain_modulus() {
        let mut params = SchemeParams::exact();
        params.plain_modulus = Some(65521);
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_scheme_kind_serde_aliases() {
        let kind: SchemeKind = serde_json::from_str("\"ckks\"").unwrap();
        assert_eq!(kind, SchemeKind::Approximate);
        let kind: SchemeKind = serde_json::from_str("\"bfv\"").unwrap();
        assert_eq!(kind, SchemeKind::Exact);
        assert_eq!(
            serde_json::to_string(&SchemeKind::Approximate).unwrap(),
            "\"approximate\""
        );
    }

    #[test]
    fn test_params_json_roundtrip() {
        let params = SchemeParams::approximate();
        let json = serde_json::to_string(&params).unwrap();
        let back: SchemeParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
