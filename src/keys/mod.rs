//! Key lifecycle: generation, public-key export/import, keygen metrics
//!
//! A [`KeyManager`] holds at most one key set. The secret key never leaves
//! it: there is no serializer for it and no accessor outside the crate.

mod relin;

pub use relin::RelinKeys;

use crate::codec;
use crate::context::HeContext;
use crate::error::{EngineError, Result};
use crate::math::GaussianSampler;
use crate::rlwe::{RlwePublicKey, RlweSecretKey};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Advisory figures recorded at key generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeygenMetrics {
    pub duration_ms: f64,
    pub public_key_bytes: usize,
    pub relin_key_bytes: usize,
    pub ring_dim: usize,
    pub modulus_bits: f64,
    pub moduli: Vec<u64>,
}

/// Key state of one engine
#[derive(Debug, Default)]
pub struct KeyManager {
    public: Option<RlwePublicKey>,
    secret: Option<RlweSecretKey>,
    relin: Option<RelinKeys>,
    metrics: Option<KeygenMetrics>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the secret, public and relinearization keys.
    ///
    /// Refused with [`EngineError::KeysAlreadyGenerated`] once a secret key
    /// exists; regenerating would orphan every ciphertext already issued.
    pub fn generate(&mut self, ctx: &HeContext) -> Result<KeygenMetrics> {
        if self.secret.is_some() {
            return Err(EngineError::KeysAlreadyGenerated);
        }

        let start = Instant::now();
        let params = ctx.params();
        let mut sampler = GaussianSampler::new(params.sigma);

        let secret = RlweSecretKey::generate(params.ring_dim, &params.key_moduli(), &mut sampler);
        let public = RlwePublicKey::generate(&secret, ctx.chain_ntt(ctx.chain().len()), &mut sampler);
        let relin = RelinKeys::generate(&secret, ctx, &mut sampler);
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let metrics = KeygenMetrics {
            duration_ms,
            public_key_bytes: codec::to_bytes(&public)?.len(),
            relin_key_bytes: codec::to_bytes(&relin)?.len(),
            ring_dim: params.ring_dim,
            modulus_bits: params.modulus_bits(),
            moduli: params.moduli.clone(),
        };

        info!(
            scheme = %params.kind,
            duration_ms = metrics.duration_ms,
            public_key_bytes = metrics.public_key_bytes,
            relin_key_bytes = metrics.relin_key_bytes,
            ring_dim = metrics.ring_dim,
            modulus_bits = metrics.modulus_bits,
            "generated keys"
        );

        self.public = Some(public);
        self.secret = Some(secret);
        self.relin = Some(relin);
        self.metrics = Some(metrics.clone());
        Ok(metrics)
    }

    pub fn public_key(&self) -> Option<&RlwePublicKey> {
        self.public.as_ref()
    }

    pub(crate) fn secret_key(&self) -> Option<&RlweSecretKey> {
        self.secret.as_ref()
    }

    pub fn relin_keys(&self) -> Option<&RelinKeys> {
        self.relin.as_ref()
    }

    pub fn metrics(&self) -> Option<&KeygenMetrics> {
        self.metrics.as_ref()
    }

    pub fn can_encrypt(&self) -> bool {
        self.public.is_some()
    }

    pub fn can_decrypt(&self) -> bool {
        self.secret.is_some()
    }

    /// Public key as base64 text.
    pub fn export_public_key(&self) -> Result<String> {
        let pk = self
            .public
            .as_ref()
            .ok_or(EngineError::EncryptorNotInitialized)?;
        codec::to_text(pk)
    }

    /// Replace the encryption capability with an imported public key.
    ///
    /// The key must match the context's ring dimension and full modulus
    /// chain. The secret key, if any, is left untouched.
    pub fn import_public_key(&mut self, text: &str, ctx: &HeContext) -> Result<()> {
        let pk: RlwePublicKey = codec::from_text(text)?;

        for part in [&pk.b, &pk.a] {
            ctx.check_poly(part)?;
            if part.level_count() != ctx.chain().len() {
                return Err(EngineError::SchemeMismatch(format!(
                    "public key carries {} of {} chain primes",
                    part.level_count(),
                    ctx.chain().len()
                )));
            }
        }

        info!(scheme = %ctx.kind(), "imported public key");
        self.public = Some(pk);
        Ok(())
    }
}
