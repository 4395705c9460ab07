//! Approximate real scheme (CKKS-style)
//!
//! A value v is encoded as the constant polynomial round(v·Δ), which places
//! v in every slot. Decoding lifts the phase to the centered range of the
//! product of all primes at the ciphertext's level and evaluates it at the
//! slot's primitive 2N-th root of unity:
//!
//! ```text
//! slot_j = Re m(ζ^(5^j)) = Σ_i m_i · cos(π·i·5^j / N)
//! ```
//!
//! A result decodes correctly while |v|·Δ stays below half that product.
//! Fresh and summed ciphertexts carry the whole chain, so the ceiling is far
//! above any sum of encryptable values. Each scalar multiplication drops one
//! prime; after the last one only q_0 is left and results must stay within
//! q_0 / (2Δ), about 2^17.
//!
//! Scalar multiplication multiplies by round(s·Δ) and rescales once by the
//! last prime of the current level.

use super::Scheme;
use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::math::{CrtBasis, ModQ, RnsPoly};
use crate::params::{SchemeKind, SchemeParams, DEFAULT_SCALE};
use crate::rlwe::RlweCiphertext;
use std::f64::consts::PI;

/// Marker for the approximate real scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Approximate;

/// Fixed-scale encoder with a precomputed cosine table
#[derive(Debug, Clone)]
pub struct CkksEncoder {
    n: usize,
    scale: f64,
    max_magnitude: f64,
    /// cos(π·k / N) for k in [0, 2N)
    cos_table: Vec<f64>,
    /// bases[l - 1] reconstructs phases that carry the first l primes
    bases: Vec<CrtBasis>,
}

impl CkksEncoder {
    pub fn new(ctx: &HeContext) -> Result<Self> {
        let params = ctx.params();
        let n = params.ring_dim;
        let cos_table = (0..2 * n)
            .map(|k| (PI * k as f64 / n as f64).cos())
            .collect();
        let chain = ctx.chain();
        let bases = (1..=chain.len())
            .map(|level| {
                CrtBasis::new(&chain[..level]).ok_or_else(|| {
                    EngineError::InvalidParameters("modulus chain is not pairwise coprime".into())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            n,
            scale: params.scale.unwrap_or(DEFAULT_SCALE),
            max_magnitude: params.max_magnitude(),
            cos_table,
            bases,
        })
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    fn check_magnitude(&self, what: &str, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(EngineError::OutOfRange(format!(
                "{} {} is not a finite number",
                what, value
            )));
        }
        if value.abs() > self.max_magnitude {
            return Err(EngineError::OutOfRange(format!(
                "{} {} exceeds the approximate bound ±{}",
                what, value, self.max_magnitude
            )));
        }
        Ok(())
    }

    /// Decode slot `j` of a phase polynomial at the given scale.
    ///
    /// The phase must carry a prefix of the context's chain, which holds for
    /// every ciphertext that passed validation.
    pub fn decode_slot(&self, phase: &RnsPoly, scale: f64, j: usize) -> f64 {
        let two_n = 2 * self.n as u64;
        let g = ModQ::pow(5, j as u64, two_n) as usize;
        let residues = phase.residues();
        let basis = &self.bases[residues.len() - 1];

        let mut column = vec![0u64; residues.len()];
        let mut acc = 0.0f64;
        for i in 0..self.n {
            for (slot, residue) in column.iter_mut().zip(residues) {
                *slot = residue.coeff(i);
            }
            let m = basis.lift_centered(&column);
            if m != 0.0 {
                acc += m * self.cos_table[(i * g) % (2 * self.n)];
            }
        }
        acc / scale
    }
}

impl Scheme for Approximate {
    const KIND: SchemeKind = SchemeKind::Approximate;
    type Encoder = CkksEncoder;

    fn default_params() -> SchemeParams {
        SchemeParams::approximate()
    }

    fn encoder(ctx: &HeContext) -> Result<CkksEncoder> {
        CkksEncoder::new(ctx)
    }

    fn encode(encoder: &CkksEncoder, ctx: &HeContext, value: f64) -> Result<(RnsPoly, f64)> {
        encoder.check_magnitude("value", value)?;
        let coeff = (value * encoder.scale).round() as i64;
        Ok((
            RnsPoly::constant_signed(coeff, ctx.ring_dim(), ctx.chain()),
            encoder.scale,
        ))
    }

    fn decode(encoder: &CkksEncoder, phase: &RnsPoly, scale: f64) -> f64 {
        encoder.decode_slot(phase, scale, 0)
    }

    fn multiply_by_scalar(
        encoder: &CkksEncoder,
        ct: &RlweCiphertext,
        scale: f64,
        scalar: f64,
    ) -> Result<(RlweCiphertext, f64)> {
        encoder.check_magnitude("scalar", scalar)?;
        if ct.level() <= 1 {
            return Err(EngineError::ModulusChainExhausted);
        }

        let q_last = ct.moduli()[ct.level() - 1];
        let encoded = (scalar * encoder.scale).round() as i64;
        let product = ct.scalar_mul_signed(encoded);
        let rescaled = product
            .rescale_by_last()
            .ok_or(EngineError::ModulusChainExhausted)?;

        Ok((rescaled, scale * encoder.scale / q_last as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> HeContext {
        HeContext::new(SchemeParams::approximate().with_ring_dim(1024)).unwrap()
    }

    #[test]
    fn test_encode_decode_without_noise() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        for v in [0.0, 3.14, -2.71, 65536.0, -65536.0, 1e-6] {
            let (m, scale) = Approximate::encode(&encoder, &ctx, v).unwrap();
            let back = Approximate::decode(&encoder, &m, scale);
            assert!((back - v).abs() < 1e-9, "{} decoded as {}", v, back);
        }
    }

    #[test]
    fn test_constant_fills_every_slot() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, scale) = Approximate::encode(&encoder, &ctx, 1.5).unwrap();
        for j in [1, 7, 511] {
            assert!((encoder.decode_slot(&m, scale, j) - 1.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_encode_rejects_out_of_range() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        for v in [1e6, -70000.0, f64::NAN, f64::NEG_INFINITY] {
            assert!(matches!(
                Approximate::encode(&encoder, &ctx, v),
                Err(EngineError::OutOfRange(_))
            ));
        }
    }

    #[test]
    fn test_scalar_multiply_on_plain_message() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, scale) = Approximate::encode(&encoder, &ctx, 1.25).unwrap();
        let zero = RnsPoly::zero(ctx.ring_dim(), ctx.chain());
        // Trivial ciphertext (m, 0): its phase is m under any key
        let ct = RlweCiphertext::from_parts(m, zero);

        let (product, new_scale) = Approximate::multiply_by_scalar(&encoder, &ct, scale, 4.0).unwrap();
        assert_eq!(product.level(), 3);
        let back = encoder.decode_slot(&product.b, new_scale, 0);
        assert!((back - 5.0).abs() < 1e-6, "got {}", back);
    }

    #[test]
    fn test_sum_past_base_prime_decodes() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, scale) = Approximate::encode(&encoder, &ctx, 60000.0).unwrap();
        // 180000·Δ is past q_0 / 2
        let total = &(&m + &m) + &m;
        let back = encoder.decode_slot(&total, scale, 0);
        assert!((back - 180000.0).abs() < 1e-6, "got {}", back);
    }

    #[test]
    fn test_large_scalar_product_decodes() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, scale) = Approximate::encode(&encoder, &ctx, 1000.0).unwrap();
        let zero = RnsPoly::zero(ctx.ring_dim(), ctx.chain());
        let ct = RlweCiphertext::from_parts(m, zero);

        let (product, new_scale) =
            Approximate::multiply_by_scalar(&encoder, &ct, scale, 1000.0).unwrap();
        let back = encoder.decode_slot(&product.b, new_scale, 0);
        assert!((back - 1e6).abs() < 1e-3, "got {}", back);
    }

    #[test]
    fn test_scalar_multiply_exhausts_chain() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, mut scale) = Approximate::encode(&encoder, &ctx, 1.0).unwrap();
        let zero = RnsPoly::zero(ctx.ring_dim(), ctx.chain());
        let mut ct = RlweCiphertext::from_parts(m, zero);

        for _ in 0..3 {
            let (next, next_scale) = Approximate::multiply_by_scalar(&encoder, &ct, scale, 1.0).unwrap();
            ct = next;
            scale = next_scale;
        }
        assert_eq!(ct.level(), 1);
        assert!((encoder.decode_slot(&ct.b, scale, 0) - 1.0).abs() < 1e-6);
        assert_eq!(
            Approximate::multiply_by_scalar(&encoder, &ct, scale, 2.0).unwrap_err(),
            EngineError::ModulusChainExhausted
        );
    }

    #[test]
    fn test_scalar_bound() {
        let ctx = ctx();
        let encoder = Approximate::encoder(&ctx).unwrap();
        let (m, scale) = Approximate::encode(&encoder, &ctx, 1.0).unwrap();
        let ct = RlweCiphertext::from_parts(m.clone(), m);
        assert!(matches!(
            Approximate::multiply_by_scalar(&encoder, &ct, scale, 1e9),
            Err(EngineError::OutOfRange(_))
        ));
    }
}
