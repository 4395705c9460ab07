//! Mathematical primitives for the encrypted aggregation engine.
//!
//! - **Modular arithmetic** over Z_q
//! - **Number-Theoretic Transform (NTT)** with Montgomery reduction
//! - **Polynomial operations** over R_q = Z_q[X]/(X^d + 1)
//! - **RNS polynomials** over a chain of NTT-friendly primes
//! - **Discrete Gaussian and ternary sampling** for RLWE noise and secrets
//!
//! The schemes in [`crate::scheme`] only touch this layer through `Poly`,
//! `RnsPoly`, `NttContext` and `GaussianSampler`.

pub mod crt;
pub mod gaussian;
pub mod modular;
pub mod ntt;
pub mod poly;
pub mod rns;

pub use crt::{mod_inverse, CrtBasis};
pub use gaussian::{GaussianSampler, DEFAULT_SIGMA};
pub use modular::{ModQ, DEFAULT_Q};
pub use ntt::NttContext;
pub use poly::Poly;
pub use rns::RnsPoly;
