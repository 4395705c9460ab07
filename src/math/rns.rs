//! Residue Number System (RNS) polynomials.
//!
//! An [`RnsPoly`] represents one element of Z_Q[X]/(X^d + 1) for a composite
//! Q = q_0 * q_1 * ... * q_k as one [`Poly`] per prime. Arithmetic is done
//! residue by residue; rescaling drops the last prime and divides by it.

use super::crt::mod_inverse;
use super::gaussian::GaussianSampler;
use super::modular::ModQ;
use super::ntt::NttContext;
use super::poly::Poly;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// Polynomial over a modulus chain, one residue per prime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnsPoly {
    residues: Vec<Poly>,
}

impl RnsPoly {
    pub fn zero(dim: usize, moduli: &[u64]) -> Self {
        Self {
            residues: moduli.iter().map(|&q| Poly::zero(dim, q)).collect(),
        }
    }

    /// Lift a small signed polynomial into every residue.
    pub fn from_signed(coeffs: &[i64], moduli: &[u64]) -> Self {
        Self {
            residues: moduli
                .iter()
                .map(|&q| Poly::from_signed(coeffs, q))
                .collect(),
        }
    }

    /// Constant polynomial with a signed value in every residue.
    pub fn constant_signed(value: i64, dim: usize, moduli: &[u64]) -> Self {
        Self {
            residues: moduli
                .iter()
                .map(|&q| Poly::constant(ModQ::from_signed(value, q), dim, q))
                .collect(),
        }
    }

    pub fn from_residues(residues: Vec<Poly>) -> Self {
        Self { residues }
    }

    /// Uniform element of R_Q, drawn independently per residue.
    pub fn random(dim: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        Self {
            residues: moduli
                .iter()
                .map(|&q| Poly::random_with_rng(dim, q, sampler.rng()))
                .collect(),
        }
    }

    /// Discrete Gaussian error polynomial; the same integer error is
    /// embedded in every residue.
    pub fn gaussian(dim: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        let e = sampler.sample_vec(dim);
        Self::from_signed(&e, moduli)
    }

    /// Ternary polynomial with coefficients in {-1, 0, 1}.
    pub fn ternary(dim: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        let s = sampler.sample_ternary(dim);
        Self::from_signed(&s, moduli)
    }

    pub fn dimension(&self) -> usize {
        self.residues.first().map_or(0, Poly::dimension)
    }

    /// Number of primes currently carried (the ciphertext level).
    pub fn level_count(&self) -> usize {
        self.residues.len()
    }

    pub fn moduli(&self) -> Vec<u64> {
        self.residues.iter().map(Poly::modulus).collect()
    }

    pub fn residues(&self) -> &[Poly] {
        &self.residues
    }

    pub fn residue(&self, i: usize) -> &Poly {
        &self.residues[i]
    }

    /// The first `len` residues (drops the tail of the chain).
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            residues: self.residues[..len].to_vec(),
        }
    }

    /// Residue-wise negacyclic product. `ctxs[i]` must belong to prime `i`.
    pub fn mul(&self, other: &Self, ctxs: &[NttContext]) -> Self {
        assert_eq!(self.level_count(), other.level_count(), "Levels must match");
        assert!(ctxs.len() >= self.level_count(), "Missing NTT contexts");
        Self {
            residues: self
                .residues
                .iter()
                .zip(&other.residues)
                .zip(ctxs)
                .map(|((a, b), ctx)| a.mul_ntt(b, ctx))
                .collect(),
        }
    }

    /// Multiply every residue by a signed integer scalar.
    pub fn scalar_mul_signed(&self, scalar: i64) -> Self {
        Self {
            residues: self
                .residues
                .iter()
                .map(|p| p.scalar_mul(ModQ::from_signed(scalar, p.modulus())))
                .collect(),
        }
    }

    /// Divide by the last prime q_L with rounding and drop it:
    /// c_i' = (c_i - [c]_{q_L}) * q_L^(-1) mod q_i.
    ///
    /// Returns `None` when only one residue remains.
    pub fn rescale_by_last(&self) -> Option<Self> {
        if self.residues.len() < 2 {
            return None;
        }
        let (last, rest) = self.residues.split_last()?;
        let q_last = last.modulus();
        let dim = last.dimension();

        let mut residues = Vec::with_capacity(rest.len());
        for p in rest {
            let q = p.modulus();
            let inv = mod_inverse(q_last % q, q)?;
            let coeffs = (0..dim)
                .map(|k| {
                    let correction = ModQ::from_signed(last.centered(k), q);
                    ModQ::mul(ModQ::sub(p.coeff(k), correction, q), inv, q)
                })
                .collect();
            residues.push(Poly::from_coeffs(coeffs, q));
        }
        Some(Self { residues })
    }
}

impl Add for &RnsPoly {
    type Output = RnsPoly;

    fn add(self, rhs: Self) -> RnsPoly {
        assert_eq!(self.level_count(), rhs.level_count(), "Levels must match");
        RnsPoly {
            residues: self
                .residues
                .iter()
                .zip(&rhs.residues)
                .map(|(a, b)| a + b)
                .collect(),
        }
    }
}

impl Sub for &RnsPoly {
    type Output = RnsPoly;

    fn sub(self, rhs: Self) -> RnsPoly {
        assert_eq!(self.level_count(), rhs.level_count(), "Levels must match");
        RnsPoly {
            residues: self
                .residues
                .iter()
                .zip(&rhs.residues)
                .map(|(a, b)| a - b)
                .collect(),
        }
    }
}

impl Neg for &RnsPoly {
    type Output = RnsPoly;

    fn neg(self) -> RnsPoly {
        RnsPoly {
            residues: self.residues.iter().map(|p| -p).collect(),
        }
    }
}
