//! Discrete Gaussian and ternary sampling
//!
//! Error terms and secret/ephemeral polynomials for RLWE encryption.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

/// Default Gaussian standard deviation
pub const DEFAULT_SIGMA: f64 = 3.2;

/// Discrete Gaussian sampler over Z using rejection sampling.
///
/// Owns its ChaCha20 stream; the uniform and ternary draws used alongside
/// the Gaussian ones come from the same stream through [`rng`](Self::rng).
#[derive(Clone)]
pub struct GaussianSampler {
    sigma: f64,
    /// Reject samples beyond this many units (6σ).
    tailcut: usize,
    rng: ChaCha20Rng,
}

impl GaussianSampler {
    /// Sampler seeded from OS entropy.
    pub fn new(sigma: f64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::from_entropy())
    }

    /// Deterministic sampler for tests and benchmarks.
    pub fn with_seed(sigma: f64, seed: u64) -> Self {
        Self::from_rng(sigma, ChaCha20Rng::seed_from_u64(seed))
    }

    fn from_rng(sigma: f64, rng: ChaCha20Rng) -> Self {
        let tailcut = (sigma * 6.0).ceil() as usize;
        Self {
            sigma,
            tailcut,
            rng,
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// The underlying RNG, for uniform sampling.
    pub fn rng(&mut self) -> &mut ChaCha20Rng {
        &mut self.rng
    }

    /// Sample a single value from the discrete Gaussian D_σ
    pub fn sample(&mut self) -> i64 {
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        let bound = self.tailcut as i64;

        loop {
            let x = self.rng.gen_range(-bound..=bound);

            // Accept with probability exp(-x²/(2σ²))
            let prob = (-((x * x) as f64) / sigma_sq_2).exp();
            let u: f64 = self.rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    pub fn sample_vec(&mut self, len: usize) -> Vec<i64> {
        (0..len).map(|_| self.sample()).collect()
    }

    /// Uniform ternary vector over {-1, 0, 1}.
    pub fn sample_ternary(&mut self, len: usize) -> Vec<i64> {
        (0..len).map(|_| self.rng.gen_range(-1i64..=1)).collect()
    }
}

impl std::fmt::Debug for GaussianSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussianSampler")
            .field("sigma", &self.sigma)
            .field("tailcut", &self.tailcut)
            .finish()
    }
}
