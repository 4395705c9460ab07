//! Scheme-tagged ciphertexts and their wire form.
//!
//! Wire form: base64 of bincode `(c0, c1, scale)`. Every residue carries its
//! prime, so a ciphertext from another scheme or parameter set is caught on
//! parse as [`EngineError::SchemeMismatch`].

use crate::codec;
use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::rlwe::RlweCiphertext;
use crate::scheme::Scheme;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// A ciphertext produced under scheme `S`.
///
/// The type parameter makes combining ciphertexts of different schemes a
/// compile error; text ciphertexts are checked at runtime instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Ciphertext<S: Scheme> {
    pub(crate) inner: RlweCiphertext,
    pub(crate) scale: f64,
    #[serde(skip)]
    _scheme: PhantomData<S>,
}

impl<S: Scheme> Ciphertext<S> {
    pub(crate) fn new(inner: RlweCiphertext, scale: f64) -> Self {
        Self {
            inner,
            scale,
            _scheme: PhantomData,
        }
    }

    /// Number of chain primes still carried
    pub fn level(&self) -> usize {
        self.inner.level()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn ring_dim(&self) -> usize {
        self.inner.ring_dim()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::to_bytes(self)
    }

    pub fn to_text(&self) -> Result<String> {
        codec::to_text(self)
    }

    /// Parse and validate a text ciphertext against a context.
    pub fn from_text(text: &str, ctx: &HeContext) -> Result<Self> {
        let ct: Self = codec::from_text(text)?;
        ct.validate(ctx)?;
        Ok(ct)
    }

    /// Check moduli, ring dimension and scale against the context.
    pub fn validate(&self, ctx: &HeContext) -> Result<()> {
        if ctx.kind() != S::KIND {
            return Err(EngineError::SchemeMismatch(format!(
                "{} ciphertext used with a {} context",
                S::KIND,
                ctx.kind()
            )));
        }
        ctx.check_poly(&self.inner.b)?;
        ctx.check_poly(&self.inner.a)?;
        if self.inner.b.level_count() != self.inner.a.level_count() {
            return Err(EngineError::MalformedEncoding(
                "ciphertext components disagree on level".into(),
            ));
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(EngineError::MalformedEncoding(format!(
                "invalid ciphertext scale {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Operands combine only at the same level and scale.
    pub(crate) fn check_compatible(&self, other: &Self) -> Result<()> {
        if self.level() != other.level() {
            return Err(EngineError::ScaleMismatch(format!(
                "levels differ: {} vs {}",
                self.level(),
                other.level()
            )));
        }
        let tolerance = 1e-9 * self.scale.max(other.scale);
        if (self.scale - other.scale).abs() > tolerance {
            return Err(EngineError::ScaleMismatch(format!(
                "scales differ: {} vs {}",
                self.scale, other.scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::zero_at_level;
    use crate::params::SchemeParams;
    use crate::scheme::{Approximate, Exact};

    fn approx_ctx() -> HeContext {
        HeContext::new(SchemeParams::approximate().with_ring_dim(64)).unwrap()
    }

    fn trivial<S: Scheme>(ctx: &HeContext, level: usize, scale: f64) -> Ciphertext<S> {
        let zero = zero_at_level(ctx, level);
        Ciphertext::new(RlweCiphertext::from_parts(zero.clone(), zero), scale)
    }

    #[test]
    fn test_text_roundtrip() {
        let ctx = approx_ctx();
        let ct: Ciphertext<Approximate> = trivial(&ctx, 4, 2f64.powi(40));
        let text = ct.to_text().unwrap();
        let back = Ciphertext::<Approximate>::from_text(&text, &ctx).unwrap();
        assert_eq!(back, ct);
    }

    #[test]
    fn test_wrong_scheme_tag_is_rejected() {
        let ctx = approx_ctx();
        let ct: Ciphertext<Approximate> = trivial(&ctx, 4, 1.0);
        let text = ct.to_text().unwrap();
        assert!(matches!(
            Ciphertext::<Exact>::from_text(&text, &ctx),
            Err(EngineError::SchemeMismatch(_))
        ));
    }

    #[test]
    fn test_compatibility() {
        let ctx = approx_ctx();
        let a: Ciphertext<Approximate> = trivial(&ctx, 4, 1024.0);
        let b: Ciphertext<Approximate> = trivial(&ctx, 3, 1024.0);
        let c: Ciphertext<Approximate> = trivial(&ctx, 4, 2048.0);

        a.check_compatible(&a.clone()).unwrap();
        assert!(matches!(a.check_compatible(&b), Err(EngineError::ScaleMismatch(_))));
        assert!(matches!(a.check_compatible(&c), Err(EngineError::ScaleMismatch(_))));
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        let ctx = approx_ctx();
        let ct: Ciphertext<Approximate> = trivial(&ctx, 4, f64::NAN);
        let text = ct.to_text().unwrap();
        assert!(matches!(
            Ciphertext::<Approximate>::from_text(&text, &ctx),
            Err(EngineError::MalformedEncoding(_))
        ));
    }
}
