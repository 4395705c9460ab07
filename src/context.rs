//! Immutable cryptographic context: validated parameters plus NTT tables.

use crate::error::{EngineError, Result};
use crate::math::{NttContext, RnsPoly};
use crate::params::{SchemeKind, SchemeParams};
use tracing::debug;

/// Validated parameters and one [`NttContext`] per prime.
///
/// `ntt` holds the chain primes in order followed by the special prime, so
/// `ntt[..k]` serves any ciphertext at level k and the full slice serves
/// key material.
#[derive(Debug, Clone)]
pub struct HeContext {
    params: SchemeParams,
    ntt: Vec<NttContext>,
}

impl HeContext {
    pub fn new(params: SchemeParams) -> Result<Self> {
        params.validate()?;

        let ntt = params
            .key_moduli()
            .into_iter()
            .map(|q| NttContext::new(params.ring_dim, q))
            .collect();

        debug!(
            scheme = %params.kind,
            ring_dim = params.ring_dim,
            primes = params.moduli.len(),
            "built scheme context"
        );

        Ok(Self { params, ntt })
    }

    pub fn params(&self) -> &SchemeParams {
        &self.params
    }

    pub fn kind(&self) -> SchemeKind {
        self.params.kind
    }

    pub fn ring_dim(&self) -> usize {
        self.params.ring_dim
    }

    /// Full ciphertext chain (fresh ciphertext moduli)
    pub fn chain(&self) -> &[u64] {
        &self.params.moduli
    }

    /// NTT tables for the first `level` chain primes
    pub fn chain_ntt(&self, level: usize) -> &[NttContext] {
        &self.ntt[..level]
    }

    /// NTT tables for chain + special prime
    pub fn key_ntt(&self) -> &[NttContext] {
        &self.ntt
    }

    /// Check that a polynomial belongs to this context: same ring dimension
    /// and residues that are a prefix of the modulus chain.
    pub fn check_poly(&self, poly: &RnsPoly) -> Result<()> {
        let level = poly.level_count();
        if level == 0 || level > self.chain().len() {
            return Err(EngineError::SchemeMismatch(format!(
                "{} residues, {} scheme chain has {}",
                level,
                self.kind(),
                self.chain().len()
            )));
        }
        for (residue, &q) in poly.residues().iter().zip(self.chain()) {
            if residue.modulus() != q {
                return Err(EngineError::SchemeMismatch(format!(
                    "modulus {} is not part of the {} scheme chain",
                    residue.modulus(),
                    self.kind()
                )));
            }
            if residue.dimension() != self.ring_dim() {
                return Err(EngineError::SchemeMismatch(format!(
                    "ring dimension {} differs from {}",
                    residue.dimension(),
                    self.ring_dim()
                )));
            }
            if residue.coeffs().iter().any(|&c| c >= q) {
                return Err(EngineError::MalformedEncoding(
                    "coefficient not reduced modulo its prime".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Zero polynomial helper used by tests across modules.
#[cfg(test)]
pub(crate) fn zero_at_level(ctx: &HeContext, level: usize) -> RnsPoly {
    RnsPoly::from_residues(
        ctx.chain()[..level]
            .iter()
            .map(|&q| crate::math::Poly::zero(ctx.ring_dim(), q))
            .collect(),
    )
}
