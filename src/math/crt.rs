//! CRT (Chinese Remainder Theorem) helpers for RNS modulus chains.
//!
//! `mod_inverse` is ported and adapted from Google InsPIRe reference code
//! (private-membership/research/InsPIRe, commit 89f04516c4b8b48b8e65e50d25b37256e04096ad)
//! under the Apache-2.0 license.

use super::modular::ModQ;

/// Compute a modular inverse using the extended Euclidean algorithm.
///
/// Returns `x` such that `(a * x) % modulus == 1`, or `None` when `a` is not
/// invertible.
pub fn mod_inverse(a: u64, modulus: u64) -> Option<u64> {
    let mut t: i128 = 0;
    let mut new_t: i128 = 1;
    let mut r: i128 = modulus as i128;
    let mut new_r: i128 = (a % modulus) as i128;

    while new_r != 0 {
        let quotient = r / new_r;
        let tmp_t = t - quotient * new_t;
        t = new_t;
        new_t = tmp_t;

        let tmp_r = r - quotient * new_r;
        r = new_r;
        new_r = tmp_r;
    }

    if r != 1 {
        return None;
    }

    if t < 0 {
        t += modulus as i128;
    }
    Some(t as u64)
}

/// Total bit length of a modulus chain, log2(q_0 * ... * q_k).
pub fn chain_bits(moduli: &[u64]) -> f64 {
    moduli.iter().map(|&q| (q as f64).log2()).sum()
}

/// Balanced mixed-radix (Garner) reconstruction over a prime chain.
///
/// Every integer x in (-Q/2, Q/2], Q = q_0···q_{k-1}, has a unique expansion
/// x = Σ d_i · q_0···q_{i-1} with centered digits |d_i| <= (q_i - 1)/2. The
/// digits are computed exactly in u64 arithmetic; only the final weighted sum
/// is accumulated in f64, so small values come back exact and large ones keep
/// full relative precision.
#[derive(Debug, Clone)]
pub struct CrtBasis {
    moduli: Vec<u64>,
    /// radix[i][k] = q_0···q_{k-1} mod q_i, for k < i
    radix: Vec<Vec<u64>>,
    /// (q_0···q_{i-1})^{-1} mod q_i
    radix_inv: Vec<u64>,
    /// q_0···q_{i-1} as f64
    weights: Vec<f64>,
}

impl CrtBasis {
    /// Precompute the basis. `None` when two moduli share a factor.
    pub fn new(moduli: &[u64]) -> Option<Self> {
        let mut radix = Vec::with_capacity(moduli.len());
        let mut radix_inv = Vec::with_capacity(moduli.len());
        let mut weights = Vec::with_capacity(moduli.len());
        let mut weight = 1.0f64;

        for (i, &q) in moduli.iter().enumerate() {
            let mut row = Vec::with_capacity(i);
            let mut prod = 1 % q;
            for &p in &moduli[..i] {
                row.push(prod);
                prod = ModQ::mul(prod, p % q, q);
            }
            radix_inv.push(mod_inverse(prod, q)?);
            radix.push(row);
            weights.push(weight);
            weight *= q as f64;
        }

        Some(Self {
            moduli: moduli.to_vec(),
            radix,
            radix_inv,
            weights,
        })
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Centered integer with the given residues, one per modulus.
    pub fn lift_centered(&self, residues: &[u64]) -> f64 {
        debug_assert_eq!(residues.len(), self.moduli.len());
        let mut digits: Vec<i64> = Vec::with_capacity(self.moduli.len());
        let mut value = 0.0f64;

        for (i, (&q, &x)) in self.moduli.iter().zip(residues).enumerate() {
            let partial = digits
                .iter()
                .zip(&self.radix[i])
                .fold(0u64, |acc, (&d, &r)| {
                    ModQ::add(acc, ModQ::mul(ModQ::from_signed(d, q), r, q), q)
                });
            let digit = ModQ::mul(ModQ::sub(x % q, partial, q), self.radix_inv[i], q);
            let d = ModQ::to_signed(digit, q);
            if d != 0 {
                value += d as f64 * self.weights[i];
            }
            digits.push(d);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::modular::DEFAULT_Q;

    const CHAIN: [u64; 4] = [
        288230376150876161,
        1099511480321,
        1099510890497,
        1099510824961,
    ];

    fn residues(x: i128, moduli: &[u64]) -> Vec<u64> {
        moduli
            .iter()
            .map(|&q| x.rem_euclid(q as i128) as u64)
            .collect()
    }

    #[test]
    fn test_mod_inverse() {
        let q = DEFAULT_Q;
        for a in [2u64, 3, 65537, 1099511480321] {
            let inv = mod_inverse(a, q).unwrap();
            assert_eq!(ModQ::mul(a, inv, q), 1);
        }
    }

    #[test]
    fn test_mod_inverse_not_invertible() {
        assert_eq!(mod_inverse(6, 9), None);
        assert_eq!(mod_inverse(0, 7), None);
    }

    #[test]
    fn test_chain_bits() {
        let bits = chain_bits(&[DEFAULT_Q]);
        assert!((bits - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_lift_small_values_exact() {
        let basis = CrtBasis::new(&CHAIN).unwrap();
        for x in [0i128, 1, -1, 65537, -123_456_789, (1 << 52) - 3] {
            assert_eq!(basis.lift_centered(&residues(x, &CHAIN)), x as f64);
        }
    }

    #[test]
    fn test_lift_beyond_base_prime() {
        let basis = CrtBasis::new(&CHAIN[..3]).unwrap();
        for x in [(1i128 << 90) + 12345, -(1i128 << 100) - 7, 180_000i128 << 40] {
            let lifted = basis.lift_centered(&residues(x, &CHAIN[..3]));
            let rel = (lifted - x as f64).abs() / (x as f64).abs();
            assert!(rel < 1e-12, "{} lifted as {}", x, lifted);
        }
    }

    #[test]
    fn test_lift_single_prime_is_centered() {
        let basis = CrtBasis::new(&[DEFAULT_Q]).unwrap();
        assert_eq!(basis.lift_centered(&[DEFAULT_Q - 5]), -5.0);
        assert_eq!(basis.lift_centered(&[42]), 42.0);
    }

    #[test]
    fn test_basis_rejects_shared_factor() {
        assert!(CrtBasis::new(&[15, 35]).is_none());
    }
}
