//! RLWE key generation, public-key encryption and homomorphic primitives
//!
//! Public key:  (b, a) = (-a·s + e, a)
//! Encryption:  (b·u + e1 + m, a·u + e2) with ternary u
//! Phase:       c0 + c1·s = m + e·u + e1 + e2·s

use crate::math::{GaussianSampler, NttContext, RnsPoly};

use super::types::{RlweCiphertext, RlwePublicKey, RlweSecretKey};

impl RlweSecretKey {
    /// Generate a ternary secret key over `moduli` (chain primes + special prime).
    pub fn generate(ring_dim: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        Self {
            poly: RnsPoly::ternary(ring_dim, moduli, sampler),
        }
    }
}

impl RlwePublicKey {
    /// Generate a public key over the first `ntt.len()` primes of the secret.
    pub fn generate(sk: &RlweSecretKey, ntt: &[NttContext], sampler: &mut GaussianSampler) -> Self {
        let level = ntt.len();
        let s = sk.at_level(level);
        let moduli = s.moduli();
        let dim = sk.ring_dim();

        let a = RnsPoly::random(dim, &moduli, sampler);
        let e = RnsPoly::gaussian(dim, &moduli, sampler);

        // b = -a·s + e
        let b = &(-&a.mul(&s, ntt)) + &e;

        Self { b, a }
    }
}

impl RlweCiphertext {
    /// Encrypt an already-scaled message polynomial under a public key.
    ///
    /// `message` must live on the same moduli as `pk`.
    pub fn encrypt_public(
        pk: &RlwePublicKey,
        message: &RnsPoly,
        ntt: &[NttContext],
        sampler: &mut GaussianSampler,
    ) -> Self {
        let moduli = pk.moduli();
        let dim = pk.ring_dim();

        let u = RnsPoly::ternary(dim, &moduli, sampler);
        let e1 = RnsPoly::gaussian(dim, &moduli, sampler);
        let e2 = RnsPoly::gaussian(dim, &moduli, sampler);

        let b = &(&pk.b.mul(&u, ntt) + &e1) + message;
        let a = &pk.a.mul(&u, ntt) + &e2;

        Self { b, a }
    }

    /// Decryption phase b + a·s at the ciphertext's level.
    pub fn phase(&self, sk: &RlweSecretKey, ntt: &[NttContext]) -> RnsPoly {
        let s = sk.at_level(self.level());
        &self.b + &self.a.mul(&s, ntt)
    }

    /// Homomorphic addition: (b1 + b2, a1 + a2) decrypts to m1 + m2
    pub fn add(&self, other: &RlweCiphertext) -> RlweCiphertext {
        RlweCiphertext {
            b: &self.b + &other.b,
            a: &self.a + &other.a,
        }
    }

    /// Multiply both components by a signed integer
    pub fn scalar_mul_signed(&self, scalar: i64) -> RlweCiphertext {
        RlweCiphertext {
            b: self.b.scalar_mul_signed(scalar),
            a: self.a.scalar_mul_signed(scalar),
        }
    }

    /// Divide by the last prime and drop it. `None` at the base level.
    pub fn rescale_by_last(&self) -> Option<RlweCiphertext> {
        Some(RlweCiphertext {
            b: self.b.rescale_by_last()?,
            a: self.a.rescale_by_last()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_SIGMA;
    use crate::params::SchemeParams;

    const N: usize = 256;

    fn setup() -> (Vec<u64>, Vec<NttContext>, GaussianSampler) {
        let params = SchemeParams::approximate();
        let key_moduli = params.key_moduli();
        let ntt = key_moduli.iter().map(|&q| NttContext::new(N, q)).collect();
        (key_moduli, ntt, GaussianSampler::with_seed(DEFAULT_SIGMA, 99))
    }

    #[test]
    fn test_public_key_encrypts_zero() {
        let (moduli, ntt, mut sampler) = setup();
        let sk = RlweSecretKey::generate(N, &moduli, &mut sampler);
        let pk = RlwePublicKey::generate(&sk, &ntt[..4], &mut sampler);

        let ct = RlweCiphertext { b: pk.b.clone(), a: pk.a.clone() };
        let phase = ct.phase(&sk, &ntt[..4]);
        // Phase of the public key is the Gaussian error itself
        for r in phase.residues() {
            assert!(r.linf_norm() <= 20);
        }
    }

    #[test]
    fn test_encrypt_phase_recovers_message_with_small_noise() {
        let (moduli, ntt, mut sampler) = setup();
        let sk = RlweSecretKey::generate(N, &moduli, &mut sampler);
        let pk = RlwePublicKey::generate(&sk, &ntt[..4], &mut sampler);

        let m = RnsPoly::constant_signed(1 << 40, N, &moduli[..4]);
        let ct = RlweCiphertext::encrypt_public(&pk, &m, &ntt[..4], &mut sampler);
        let phase = ct.phase(&sk, &ntt[..4]);

        let noise = (phase.residue(0).centered(0) - (1i64 << 40)).abs();
        assert!(noise < 1 << 16, "noise {} too large", noise);
    }

    #[test]
    fn test_add_and_rescale() {
        let (moduli, ntt, mut sampler) = setup();
        let sk = RlweSecretKey::generate(N, &moduli, &mut sampler);
        let pk = RlwePublicKey::generate(&sk, &ntt[..4], &mut sampler);

        let m1 = RnsPoly::constant_signed(3 << 40, N, &moduli[..4]);
        let m2 = RnsPoly::constant_signed(4 << 40, N, &moduli[..4]);
        let c1 = RlweCiphertext::encrypt_public(&pk, &m1, &ntt[..4], &mut sampler);
        let c2 = RlweCiphertext::encrypt_public(&pk, &m2, &ntt[..4], &mut sampler);

        let sum = c1.add(&c2);
        let rescaled = sum.rescale_by_last().unwrap();
        assert_eq!(rescaled.level(), 3);

        let phase = rescaled.phase(&sk, &ntt[..3]);
        let expected = ((7i128 << 40) / moduli[3] as i128) as i64;
        let got = phase.residue(0).centered(0);
        assert!((got - expected).abs() < 64, "got {}, expected {}", got, expected);
    }
}
