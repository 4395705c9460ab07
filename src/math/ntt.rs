//! Number-Theoretic Transform (NTT) for fast polynomial multiplication.
//!
//! Implements Cooley-Tukey radix-2 NTT for negacyclic convolution over
//! R_q = Z_q[X]/(X^n + 1). One context serves one prime; a modulus chain
//! keeps one context per prime (see [`crate::context::HeContext`]).
//!
//! The same transform doubles as the slot encoder of the exact scheme: for a
//! plaintext prime t ≡ 1 (mod 2n), the forward NTT maps coefficients to the
//! n SIMD slots and the inverse NTT maps slots back to coefficients.
//!
//! # Example
//!
//! ```
//! use he_aggregate::math::ntt::NttContext;
//!
//! let ctx = NttContext::with_default_q(256);
//!
//! let mut coeffs = vec![1u64; 256];
//! ctx.forward(&mut coeffs);
//! ctx.inverse(&mut coeffs);
//! assert_eq!(coeffs[0], 1);
//! ```

use super::modular::{ModQ, DEFAULT_Q};

/// Precomputed NTT context with twiddle factors.
///
/// Stores precomputed roots of unity and Montgomery constants. Create once
/// per (dimension, prime) pair and reuse.
#[derive(Clone, Debug)]
pub struct NttContext {
    n: usize,
    q: u64,
    /// -q^(-1) mod 2^64
    q_inv_neg: u64,
    /// 2^128 mod q
    r_squared: u64,
    /// Forward twiddle factors in bit-reversed order (Montgomery form).
    psi_powers: Vec<u64>,
    /// Inverse twiddle factors in bit-reversed order (Montgomery form).
    psi_inv_powers: Vec<u64>,
    /// n^(-1) mod q in Montgomery form.
    n_inv: u64,
}

impl NttContext {
    /// Creates an NTT context for the given dimension and prime.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two or `q` does not satisfy
    /// q ≡ 1 (mod 2n). Callers validate parameters first
    /// (see [`crate::params::SchemeParams::validate`]).
    pub fn new(n: usize, q: u64) -> Self {
        assert!(n.is_power_of_two(), "n must be a power of two");
        assert!(q % (2 * n as u64) == 1, "q must be ≡ 1 (mod 2n)");

        let q_inv_neg = Self::compute_q_inv_neg(q);
        let r_squared = Self::compute_r_squared(q);

        let psi = Self::find_primitive_root(2 * n as u64, q);
        let psi_mont = Self::to_montgomery(psi, q, r_squared, q_inv_neg);
        let psi_powers = Self::compute_twiddle_factors(n, psi_mont, q, q_inv_neg, r_squared);

        let psi_inv = ModQ::pow(psi, q - 2, q);
        let psi_inv_mont = Self::to_montgomery(psi_inv, q, r_squared, q_inv_neg);
        let psi_inv_powers =
            Self::compute_twiddle_factors(n, psi_inv_mont, q, q_inv_neg, r_squared);

        let n_inv = Self::to_montgomery(ModQ::pow(n as u64, q - 2, q), q, r_squared, q_inv_neg);

        Self {
            n,
            q,
            q_inv_neg,
            r_squared,
            psi_powers,
            psi_inv_powers,
            n_inv,
        }
    }

    /// Creates an NTT context with [`DEFAULT_Q`].
    pub fn with_default_q(n: usize) -> Self {
        Self::new(n, DEFAULT_Q)
    }

    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Forward NTT in place (Cooley-Tukey, decimation in time).
    ///
    /// Input is in standard form; output is in Montgomery form, ready for
    /// [`pointwise_mul`](Self::pointwise_mul).
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        for c in coeffs.iter_mut() {
            *c = Self::to_montgomery(*c, self.q, self.r_squared, self.q_inv_neg);
        }

        let n = self.n;
        let q = self.q;
        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let w = self.psi_powers[m + i];

                for j in j1..(j1 + t) {
                    let u = coeffs[j];
                    let v = self.montgomery_mul(coeffs[j + t], w);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place (Gentleman-Sande, decimation in frequency).
    ///
    /// Input is in Montgomery form; output is in standard form.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        let n = self.n;
        let q = self.q;
        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = i * 2 * t;
                let w = self.psi_inv_powers[m + i];

                for j in j1..(j1 + t) {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul(diff, w);
                }
            }
            t <<= 1;
        }

        // Scale by n^(-1) and leave Montgomery form in one pass
        for c in coeffs.iter_mut() {
            let scaled = self.montgomery_mul(*c, self.n_inv);
            *c = self.montgomery_mul(scaled, 1);
        }
    }

    /// Pointwise product of two NTT-domain vectors (both Montgomery form).
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");
        assert_eq!(result.len(), self.n, "Input length must match dimension");

        for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
            *r = self.montgomery_mul(x, y);
        }
    }

    /// Converts a value to Montgomery form.
    pub fn to_mont(&self, a: u64) -> u64 {
        Self::to_montgomery(a, self.q, self.r_squared, self.q_inv_neg)
    }

    /// Converts a value out of Montgomery form.
    pub fn from_mont(&self, a: u64) -> u64 {
        self.montgomery_mul(a, 1)
    }

    #[inline]
    fn montgomery_mul(&self, a: u64, b: u64) -> u64 {
        let q = self.q;
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
        let ab = (a as u128) * (r_squared as u128);
        let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    /// Smallest-generator primitive `order`-th root of unity modulo q.
    fn find_primitive_root(order: u64, q: u64) -> u64 {
        let exp = (q - 1) / order;
        for g in 2..q {
            let candidate = ModQ::pow(g, exp, q);
            // order is a power of two, so psi^(order/2) != 1 pins the order exactly
            if ModQ::pow(candidate, order / 2, q) != 1 {
                return candidate;
            }
        }
        unreachable!("q ≡ 1 (mod order) guarantees a primitive root")
    }

    /// Twiddle factors in bit-reversed order.
    fn compute_twiddle_factors(
        n: usize,
        psi: u64,
        q: u64,
        q_inv_neg: u64,
        r_squared: u64,
    ) -> Vec<u64> {
        let mont_mul = |a: u64, b: u64| -> u64 {
            let ab = (a as u128) * (b as u128);
            let mm = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
            let t = ((ab + mm * (q as u128)) >> 64) as u64;
            if t >= q {
                t - q
            } else {
                t
            }
        };

        let one = Self::to_montgomery(1, q, r_squared, q_inv_neg);
        let mut factors = vec![0u64; n];

        for m in 1..n {
            if m.is_power_of_two() {
                // psi^(n / (2m)) starts each level
                let mut pow = one;
                for _ in 0..(n / (2 * m)) {
                    pow = mont_mul(pow, psi);
                }
                factors[m] = pow;
            } else {
                let prev_idx = m & (m - 1);
                let step_idx = m & m.wrapping_neg();
                factors[m] = mont_mul(factors[prev_idx], factors[step_idx]);
            }
        }

        factors
    }
}
