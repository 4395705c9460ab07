//! Scheme-aware cipher operations
//!
//! An [`Engine`] owns one context, one encoder and one key set. Every
//! operation takes `&self` and works on local values, so a keyed engine can
//! be shared across request handlers behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use he_aggregate::{Engine, Exact};
//!
//! let engine = Engine::<Exact>::with_keys()?;
//! let a = engine.encrypt(5.0)?;
//! let b = engine.encrypt(7.0)?;
//! assert_eq!(engine.decrypt(&engine.add(&a, &b)?)?, 12.0);
//! # Ok::<(), he_aggregate::EngineError>(())
//! ```

use crate::ciphertext::Ciphertext;
use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::keys::{KeyManager, KeygenMetrics};
use crate::math::GaussianSampler;
use crate::params::{SchemeKind, SchemeParams};
use crate::rlwe::RlweCiphertext;
use crate::scheme::Scheme;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::debug;

/// Encryption engine for one scheme
#[derive(Debug)]
pub struct Engine<S: Scheme> {
    ctx: HeContext,
    encoder: S::Encoder,
    keys: KeyManager,
    _scheme: PhantomData<S>,
}

impl<S: Scheme> Engine<S> {
    /// Engine with the scheme's production parameters and no keys yet.
    pub fn new() -> Result<Self> {
        Self::with_params(S::default_params())
    }

    /// Engine with explicit parameters and no keys yet.
    pub fn with_params(params: SchemeParams) -> Result<Self> {
        if params.kind != S::KIND {
            return Err(EngineError::InvalidParameters(format!(
                "{} parameters given to a {} engine",
                params.kind,
                S::KIND
            )));
        }
        let ctx = HeContext::new(params)?;
        let encoder = S::encoder(&ctx)?;
        Ok(Self {
            ctx,
            encoder,
            keys: KeyManager::new(),
            _scheme: PhantomData,
        })
    }

    /// Engine with production parameters and freshly generated keys.
    pub fn with_keys() -> Result<Self> {
        let mut engine = Self::new()?;
        engine.generate_keys()?;
        Ok(engine)
    }

    pub fn kind(&self) -> SchemeKind {
        S::KIND
    }

    pub fn context(&self) -> &HeContext {
        &self.ctx
    }

    pub fn params(&self) -> &SchemeParams {
        self.ctx.params()
    }

    pub fn keys(&self) -> &KeyManager {
        &self.keys
    }

    /// Largest magnitude accepted by [`encrypt`](Self::encrypt)
    pub fn max_value(&self) -> f64 {
        self.ctx.params().max_magnitude()
    }

    pub fn generate_keys(&mut self) -> Result<KeygenMetrics> {
        self.keys.generate(&self.ctx)
    }

    pub fn export_public_key(&self) -> Result<String> {
        self.keys.export_public_key()
    }

    pub fn import_public_key(&mut self, text: &str) -> Result<()> {
        self.keys.import_public_key(text, &self.ctx)
    }

    pub fn encrypt(&self, value: f64) -> Result<Ciphertext<S>> {
        let start = Instant::now();
        let (message, scale) = S::encode(&self.encoder, &self.ctx, value)?;
        let pk = self
            .keys
            .public_key()
            .ok_or(EngineError::EncryptorNotInitialized)?;

        let mut sampler = GaussianSampler::new(self.ctx.params().sigma);
        let level = self.ctx.chain().len();
        let inner = RlweCiphertext::encrypt_public(pk, &message, self.ctx.chain_ntt(level), &mut sampler);

        debug!(scheme = %S::KIND, elapsed_us = start.elapsed().as_micros() as u64, "encrypt");
        Ok(Ciphertext::new(inner, scale))
    }

    pub fn decrypt(&self, ct: &Ciphertext<S>) -> Result<f64> {
        let start = Instant::now();
        ct.validate(&self.ctx)?;
        let sk = self
            .keys
            .secret_key()
            .ok_or(EngineError::DecryptorNotInitialized)?;

        let phase = ct.inner.phase(sk, self.ctx.chain_ntt(ct.level()));
        let value = S::decode(&self.encoder, &phase, ct.scale);

        debug!(scheme = %S::KIND, elapsed_us = start.elapsed().as_micros() as u64, "decrypt");
        Ok(value)
    }

    /// Homomorphic addition
    pub fn add(&self, a: &Ciphertext<S>, b: &Ciphertext<S>) -> Result<Ciphertext<S>> {
        a.validate(&self.ctx)?;
        b.validate(&self.ctx)?;
        a.check_compatible(b)?;
        Ok(Ciphertext::new(a.inner.add(&b.inner), a.scale))
    }

    /// Left fold of [`add`](Self::add) over all operands.
    ///
    /// Each operand is validated once against the context and checked for
    /// compatibility with the first one.
    pub fn sum(&self, items: &[Ciphertext<S>]) -> Result<Ciphertext<S>> {
        let start = Instant::now();
        let (first, rest) = items.split_first().ok_or(EngineError::EmptyOperandSet)?;
        first.validate(&self.ctx)?;

        let mut acc = first.inner.clone();
        for item in rest {
            item.validate(&self.ctx)?;
            first.check_compatible(item)?;
            acc = acc.add(&item.inner);
        }
        let acc = Ciphertext::new(acc, first.scale);

        debug!(
            scheme = %S::KIND,
            operands = items.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "sum"
        );
        Ok(acc)
    }

    /// Multiply by a plaintext scalar (approximate scheme only)
    pub fn multiply_by_scalar(&self, ct: &Ciphertext<S>, scalar: f64) -> Result<Ciphertext<S>> {
        ct.validate(&self.ctx)?;
        let (inner, scale) = S::multiply_by_scalar(&self.encoder, &ct.inner, ct.scale, scalar)?;
        Ok(Ciphertext::new(inner, scale))
    }

    /// Parse a text ciphertext produced by an engine of the same scheme
    pub fn parse(&self, text: &str) -> Result<Ciphertext<S>> {
        Ciphertext::from_text(text, &self.ctx)
    }

    pub fn encrypt_text(&self, value: f64) -> Result<String> {
        self.encrypt(value)?.to_text()
    }

    pub fn decrypt_text(&self, text: &str) -> Result<f64> {
        self.decrypt(&self.parse(text)?)
    }

    pub fn add_text(&self, a: &str, b: &str) -> Result<String> {
        self.add(&self.parse(a)?, &self.parse(b)?)?.to_text()
    }

    pub fn sum_text<T: AsRef<str>>(&self, items: &[T]) -> Result<String> {
        let parsed = items
            .iter()
            .map(|t| self.parse(t.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.sum(&parsed)?.to_text()
    }

    pub fn multiply_by_scalar_text(&self, text: &str, scalar: f64) -> Result<String> {
        self.multiply_by_scalar(&self.parse(text)?, scalar)?.to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{Approximate, Exact};

    fn keyed<S: Scheme>() -> Engine<S> {
        let mut engine = Engine::<S>::with_params(S::default_params().with_ring_dim(1024)).unwrap();
        engine.generate_keys().unwrap();
        engine
    }

    #[test]
    fn test_exact_add() {
        let engine = keyed::<Exact>();
        let a = engine.encrypt(5.0).unwrap();
        let b = engine.encrypt(7.0).unwrap();
        assert_eq!(engine.decrypt(&engine.add(&a, &b).unwrap()).unwrap(), 12.0);
    }

    #[test]
    fn test_approximate_add() {
        let engine = keyed::<Approximate>();
        let a = engine.encrypt(3.14).unwrap();
        let b = engine.encrypt(2.71).unwrap();
        let sum = engine.decrypt(&engine.add(&a, &b).unwrap()).unwrap();
        assert!((sum - 5.85).abs() < 0.01);
    }

    #[test]
    fn test_wrong_kind_params() {
        let err = Engine::<Exact>::with_params(SchemeParams::approximate()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameters(_)));
    }

    #[test]
    fn test_encrypt_before_keygen() {
        let engine = Engine::<Exact>::with_params(SchemeParams::exact().with_ring_dim(256)).unwrap();
        assert_eq!(engine.encrypt(1.0).unwrap_err(), EngineError::EncryptorNotInitialized);
    }

    #[test]
    fn test_sum_empty() {
        let engine = keyed::<Exact>();
        assert_eq!(engine.sum(&[]).unwrap_err(), EngineError::EmptyOperandSet);
    }

    #[test]
    fn test_sum_folds_all_operands() {
        let engine = keyed::<Exact>();
        let items: Vec<_> = (1..=10).map(|v| engine.encrypt(v as f64).unwrap()).collect();
        assert_eq!(engine.decrypt(&engine.sum(&items).unwrap()).unwrap(), 55.0);
    }

    #[test]
    fn test_sum_rejects_mismatched_operand() {
        let engine = keyed::<Approximate>();
        let a = engine.encrypt(1.0).unwrap();
        let b = engine.encrypt(2.0).unwrap();
        let c = engine.multiply_by_scalar(&engine.encrypt(1.0).unwrap(), 2.0).unwrap();
        assert!(matches!(
            engine.sum(&[a, b, c]),
            Err(EngineError::ScaleMismatch(_))
        ));
    }

    #[test]
    fn test_add_rejects_level_mismatch() {
        let engine = keyed::<Approximate>();
        let a = engine.encrypt(1.0).unwrap();
        let b = engine.multiply_by_scalar(&engine.encrypt(1.0).unwrap(), 2.0).unwrap();
        assert!(matches!(engine.add(&a, &b), Err(EngineError::ScaleMismatch(_))));
    }

    #[test]
    fn test_text_variants() {
        let engine = keyed::<Approximate>();
        let a = engine.encrypt_text(10.5).unwrap();
        let b = engine.encrypt_text(-0.5).unwrap();
        let sum = engine.add_text(&a, &b).unwrap();
        assert!((engine.decrypt_text(&sum).unwrap() - 10.0).abs() < 1e-4);

        let doubled = engine.multiply_by_scalar_text(&sum, 2.0).unwrap();
        assert!((engine.decrypt_text(&doubled).unwrap() - 20.0).abs() < 1e-3);

        let total = engine.sum_text(&[a.as_str(), b.as_str(), a.as_str()]).unwrap();
        assert!((engine.decrypt_text(&total).unwrap() - 20.5).abs() < 1e-4);
    }
}
