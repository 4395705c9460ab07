//! he-aggregate: encrypted aggregation over numeric columns
//!
//! Values are encrypted under one of two RLWE schemes, combined
//! homomorphically and decrypted only by the key holder:
//!
//! - [`Exact`]: integer slots modulo 65537, exact sums
//! - [`Approximate`]: fixed-point reals at scale 2^40, sums within a small
//!   error plus plaintext scalar multiplication with rescaling
//!
//! Key components:
//! - [`Engine`]: keygen, encrypt, decrypt, add, sum and scalar multiply for one scheme
//! - [`ColumnAggregator`]: CSV column loading and plain/encrypted aggregates
//! - [`Engines`]: both engines plus the JSON operation contract
//! - `http` (feature `server`): axum routes over a shared [`Engines`]

pub mod aggregate;
pub mod ciphertext;
pub mod codec;
pub mod context;
pub mod engine;
pub mod error;
pub mod keys;
pub mod math;
pub mod params;
pub mod rlwe;
pub mod scheme;
pub mod service;
#[cfg(feature = "server")]
pub mod http;

pub use aggregate::{
    encrypted_average, encrypted_sum, plain_average, plain_sum, summarize, Aggregate,
    ColumnAggregator, ColumnSummary, CsvOptions,
};
pub use ciphertext::Ciphertext;
pub use context::HeContext;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use keys::{KeyManager, KeygenMetrics};
pub use params::{SchemeKind, SchemeParams};
pub use scheme::{Approximate, Exact, Scheme};
pub use service::{Engines, Operand, OperationKind, OperationOutput, OperationRequest, OperationResponse};
