//! Relinearization key generation
//!
//! Hybrid key switching from s² to s with one extra prime P. For every chain
//! prime q_j the key holds one RLWE encryption modulo Q·P:
//!
//! ```text
//! K[j] = (-a_j·s + e_j + P·s²·[j-th CRT slot], a_j)
//! ```
//!
//! where "j-th CRT slot" means residue j carries (P mod q_j)·s² and every
//! other residue, including the special one, carries zero.

use crate::context::HeContext;
use crate::math::{GaussianSampler, Poly, RnsPoly};
use crate::rlwe::{RlweCiphertext, RlweSecretKey};
use serde::{Deserialize, Serialize};

/// One key-switching row per chain prime, each over chain + special prime
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelinKeys {
    pub rows: Vec<RlweCiphertext>,
}

impl RelinKeys {
    /// Generate relinearization keys for `sk` under the context's moduli.
    pub fn generate(sk: &RlweSecretKey, ctx: &HeContext, sampler: &mut GaussianSampler) -> Self {
        let ntt = ctx.key_ntt();
        let moduli = ctx.params().key_moduli();
        let special = ctx.params().special_modulus;
        let dim = ctx.ring_dim();

        let s = sk.at_level(moduli.len());
        let s_squared = s.mul(&s, ntt);

        let rows = (0..ctx.chain().len())
            .map(|j| {
                let message = RnsPoly::from_residues(
                    s_squared
                        .residues()
                        .iter()
                        .enumerate()
                        .map(|(i, residue)| {
                            if i == j {
                                residue.scalar_mul(special % residue.modulus())
                            } else {
                                Poly::zero(dim, residue.modulus())
                            }
                        })
                        .collect(),
                );

                let a = RnsPoly::random(dim, &moduli, sampler);
                let e = RnsPoly::gaussian(dim, &moduli, sampler);
                let b = &(&(-&a.mul(&s, ntt)) + &e) + &message;

                RlweCiphertext::from_parts(b, a)
            })
            .collect();

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
