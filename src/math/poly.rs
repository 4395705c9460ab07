//! Polynomial operations over R_q = Z_q[X]/(X^d + 1).
//!
//! Polynomials are stored in the coefficient domain. Multiplication goes
//! through the NTT and returns to coefficients, so every `Poly` at rest can
//! be serialized, compared and centered-lifted directly.
//!
//! # Example
//!
//! ```
//! use he_aggregate::math::{NttContext, Poly, DEFAULT_Q};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha20Rng;
//!
//! let ctx = NttContext::with_default_q(256);
//! let mut rng = ChaCha20Rng::seed_from_u64(1);
//!
//! let a = Poly::random_with_rng(256, DEFAULT_Q, &mut rng);
//! let one = Poly::constant(1, 256, DEFAULT_Q);
//! assert_eq!(a.mul_ntt(&one, &ctx), a);
//! ```

use super::modular::ModQ;
use super::ntt::NttContext;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// Polynomial in R_q = Z_q[X]/(X^d + 1), coefficient domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    coeffs: Vec<u64>,
    q: u64,
}

impl Poly {
    /// Create zero polynomial with given dimension and modulus
    pub fn zero(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
        }
    }

    /// Create polynomial from coefficient vector, reducing modulo q
    pub fn from_coeffs(coeffs: Vec<u64>, q: u64) -> Self {
        let coeffs = coeffs.into_iter().map(|c| c % q).collect();
        Self { coeffs, q }
    }

    /// Create polynomial from signed (centered) coefficients
    pub fn from_signed(coeffs: &[i64], q: u64) -> Self {
        Self {
            coeffs: coeffs.iter().map(|&c| ModQ::from_signed(c, q)).collect(),
            q,
        }
    }

    /// Create polynomial with a single coefficient (constant polynomial)
    pub fn constant(value: u64, dim: usize, q: u64) -> Self {
        let mut coeffs = vec![0; dim];
        coeffs[0] = value % q;
        Self { coeffs, q }
    }

    /// Generate a uniformly random polynomial with given RNG
    pub fn random_with_rng<R: Rng>(dim: usize, q: u64, rng: &mut R) -> Self {
        let coeffs: Vec<u64> = (0..dim).map(|_| rng.gen_range(0..q)).collect();
        Self { coeffs, q }
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    pub fn coeffs_mut(&mut self) -> &mut [u64] {
        &mut self.coeffs
    }

    /// Coefficient `i` lifted to the centered range [-q/2, q/2]
    pub fn centered(&self, i: usize) -> i64 {
        ModQ::to_signed(self.coeffs[i], self.q)
    }

    /// Scalar multiplication
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let scalar = scalar % self.q;
        let coeffs = self
            .coeffs
            .iter()
            .map(|&c| ModQ::mul(c, scalar, self.q))
            .collect();
        Self { coeffs, q: self.q }
    }

    /// Polynomial multiplication using NTT (negacyclic for X^d + 1)
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert_eq!(self.q, other.q, "Moduli must match");
        assert_eq!(self.q, ctx.modulus(), "NTT context modulus must match");
        assert_eq!(
            self.coeffs.len(),
            other.coeffs.len(),
            "Dimensions must match"
        );

        let mut a = self.coeffs.clone();
        let mut b = other.coeffs.clone();
        ctx.forward(&mut a);
        ctx.forward(&mut b);

        let mut result = vec![0u64; a.len()];
        ctx.pointwise_mul(&a, &b, &mut result);
        ctx.inverse(&mut result);

        Self {
            coeffs: result,
            q: self.q,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// L-infinity norm in the centered representation
    pub fn linf_norm(&self) -> u64 {
        self.coeffs
            .iter()
            .map(|&c| if c <= self.q / 2 { c } else { self.q - c })
            .max()
            .unwrap_or(0)
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Poly {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        let q = self.q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&rhs.coeffs)
            .map(|(&a, &b)| {
                let sum = a + b;
                if sum >= q {
                    sum - q
                } else {
                    sum
                }
            })
            .collect();
        Poly { coeffs, q }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Poly {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        let q = self.q;
        let coeffs = self
            .coeffs
            .iter()
            .zip(&rhs.coeffs)
            .map(|(&a, &b)| ModQ::sub(a, b, q))
            .collect();
        Poly { coeffs, q }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        let q = self.q;
        Poly {
            coeffs: self.coeffs.iter().map(|&c| ModQ::negate(c, q)).collect(),
            q,
        }
    }
}
