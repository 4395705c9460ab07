//! Exact integer scheme (BFV-style)
//!
//! Values are batch encoded: a slot vector over Z_t is mapped to coefficients
//! by the inverse NTT modulo t, then scaled by Δ = ⌊q/t⌋. Only slot 0 carries
//! a value; the others stay zero. Decryption rounds t·x/q per coefficient and
//! maps back to slots with the forward NTT.

use super::Scheme;
use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::math::{ModQ, NttContext, Poly, RnsPoly};
use crate::params::{SchemeKind, SchemeParams};

/// Marker for the exact integer scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exact;

/// Slot encoder over Z_t
#[derive(Debug, Clone)]
pub struct BatchEncoder {
    ntt: NttContext,
    t: u64,
    q: u64,
    delta: u64,
}

impl BatchEncoder {
    pub fn new(ctx: &HeContext) -> Result<Self> {
        let params = ctx.params();
        let t = params.plain_modulus.ok_or_else(|| {
            EngineError::InvalidParameters("exact scheme requires a plaintext modulus".into())
        })?;
        Ok(Self {
            ntt: NttContext::new(params.ring_dim, t),
            t,
            q: params.moduli[0],
            delta: params.delta(),
        })
    }

    pub fn plain_modulus(&self) -> u64 {
        self.t
    }

    /// Slot vector (values mod t) to message coefficients
    pub fn encode_slots(&self, slots: &[u64]) -> Vec<u64> {
        let mut coeffs: Vec<u64> = slots.iter().map(|&v| self.ntt.to_mont(v % self.t)).collect();
        self.ntt.inverse(&mut coeffs);
        coeffs
    }

    /// Message coefficients (mod t) to slot vector
    pub fn decode_slots(&self, coeffs: &[u64]) -> Vec<u64> {
        let mut slots = coeffs.to_vec();
        self.ntt.forward(&mut slots);
        slots.iter().map(|&s| self.ntt.from_mont(s)).collect()
    }
}

impl Scheme for Exact {
    const KIND: SchemeKind = SchemeKind::Exact;
    type Encoder = BatchEncoder;

    fn default_params() -> SchemeParams {
        SchemeParams::exact()
    }

    fn encoder(ctx: &HeContext) -> Result<BatchEncoder> {
        BatchEncoder::new(ctx)
    }

    fn encode(encoder: &BatchEncoder, ctx: &HeContext, value: f64) -> Result<(RnsPoly, f64)> {
        if !value.is_finite() {
            return Err(EngineError::OutOfRange(format!("{} is not a finite number", value)));
        }
        let rounded = value.round();
        let max = (encoder.t - 1) as f64;
        if rounded < 0.0 || rounded > max {
            return Err(EngineError::OutOfRange(format!(
                "{} is outside the exact range [0, {}]",
                value, max
            )));
        }

        let mut slots = vec![0u64; ctx.ring_dim()];
        slots[0] = rounded as u64;
        let coeffs = encoder.encode_slots(&slots);

        let residues = ctx
            .chain()
            .iter()
            .map(|&q| {
                let scaled = coeffs
                    .iter()
                    .map(|&m| ModQ::mul(m, encoder.delta, q))
                    .collect();
                Poly::from_coeffs(scaled, q)
            })
            .collect();

        Ok((RnsPoly::from_residues(residues), 1.0))
    }

    fn decode(encoder: &BatchEncoder, phase: &RnsPoly, _scale: f64) -> f64 {
        let t = encoder.t as u128;
        let q = encoder.q as u128;
        let base = phase.residue(0);

        // m = round(t·x / q) mod t
        let coeffs: Vec<u64> = base
            .coeffs()
            .iter()
            .map(|&x| (((t * x as u128 + q / 2) / q) % t) as u64)
            .collect();

        encoder.decode_slots(&coeffs)[0] as f64
    }
}
