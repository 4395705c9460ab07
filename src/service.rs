//! The two engines side by side, plus the scheme-agnostic operation contract
//!
//! ```json
//! { "operation": "sum", "scheme": "exact", "operands": ["<b64>", "<b64>"] }
//! ```
//!
//! is answered with `{ "result": "<b64>" }` or `{ "error": "<message>" }`.

use crate::aggregate::{encrypted_average, ColumnAggregator, ColumnSummary, Aggregate};
use crate::ciphertext::Ciphertext;
use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::keys::KeygenMetrics;
use crate::params::{SchemeKind, SchemeParams};
use crate::scheme::{Approximate, Exact, Scheme};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Encrypt,
    Decrypt,
    Add,
    Sum,
    Average,
    #[serde(alias = "multiply_by_scalar")]
    Multiply,
}

/// A plaintext number or a base64 ciphertext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Number(f64),
    Ciphertext(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation: OperationKind,
    pub scheme: SchemeKind,
    #[serde(default)]
    pub operands: Vec<Operand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Value(f64),
    Ciphertext(String),
    Ciphertexts(Vec<String>),
}

/// Wire response: exactly one of `result` or `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OperationOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<OperationOutput>> for OperationResponse {
    fn from(outcome: Result<OperationOutput>) -> Self {
        match outcome {
            Ok(result) => Self {
                result: Some(result),
                error: None,
            },
            Err(err) => Self {
                result: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// One engine per scheme, never mixed
#[derive(Debug)]
pub struct Engines {
    pub exact: Engine<Exact>,
    pub approximate: Engine<Approximate>,
}

impl Engines {
    /// Production parameters, keys not yet generated.
    pub fn new() -> Result<Self> {
        Self::with_params(SchemeParams::exact(), SchemeParams::approximate())
    }

    pub fn with_params(exact: SchemeParams, approximate: SchemeParams) -> Result<Self> {
        Ok(Self {
            exact: Engine::with_params(exact)?,
            approximate: Engine::with_params(approximate)?,
        })
    }

    /// Same moduli at a smaller ring dimension (tests and demos).
    pub fn with_ring_dim(ring_dim: usize) -> Result<Self> {
        Self::with_params(
            SchemeParams::exact().with_ring_dim(ring_dim),
            SchemeParams::approximate().with_ring_dim(ring_dim),
        )
    }

    /// Generate keys for both engines.
    pub fn generate_keys(&mut self) -> Result<[KeygenMetrics; 2]> {
        Ok([
            self.exact.generate_keys()?,
            self.approximate.generate_keys()?,
        ])
    }

    pub fn params(&self, scheme: SchemeKind) -> &SchemeParams {
        match scheme {
            SchemeKind::Exact => self.exact.params(),
            SchemeKind::Approximate => self.approximate.params(),
        }
    }

    pub fn export_public_key(&self, scheme: SchemeKind) -> Result<String> {
        match scheme {
            SchemeKind::Exact => self.exact.export_public_key(),
            SchemeKind::Approximate => self.approximate.export_public_key(),
        }
    }

    pub fn encrypt_text(&self, scheme: SchemeKind, value: f64) -> Result<String> {
        match scheme {
            SchemeKind::Exact => self.exact.encrypt_text(value),
            SchemeKind::Approximate => self.approximate.encrypt_text(value),
        }
    }

    pub fn decrypt_text(&self, scheme: SchemeKind, text: &str) -> Result<f64> {
        match scheme {
            SchemeKind::Exact => self.exact.decrypt_text(text),
            SchemeKind::Approximate => self.approximate.decrypt_text(text),
        }
    }

    pub fn add_text(&self, scheme: SchemeKind, a: &str, b: &str) -> Result<String> {
        match scheme {
            SchemeKind::Exact => self.exact.add_text(a, b),
            SchemeKind::Approximate => self.approximate.add_text(a, b),
        }
    }

    /// Aggregate a CSV column, encrypted under `scheme` or in plaintext.
    pub fn summarize_file(
        &self,
        aggregator: &ColumnAggregator,
        path: &Path,
        index: usize,
        aggregate: Aggregate,
        scheme: Option<SchemeKind>,
    ) -> Result<ColumnSummary> {
        let column = aggregator.load_column(path, index);
        match scheme {
            Some(SchemeKind::Exact) => crate::aggregate::summarize(&column, aggregate, Some(&self.exact)),
            Some(SchemeKind::Approximate) => {
                crate::aggregate::summarize(&column, aggregate, Some(&self.approximate))
            }
            None => crate::aggregate::summarize::<Exact>(&column, aggregate, None),
        }
    }

    /// Run one operation request.
    pub fn execute(&self, request: &OperationRequest) -> Result<OperationOutput> {
        debug!(
            operation = ?request.operation,
            scheme = %request.scheme,
            operands = request.operands.len(),
            "executing operation"
        );
        match request.scheme {
            SchemeKind::Exact => run(&self.exact, request),
            SchemeKind::Approximate => run(&self.approximate, request),
        }
    }

    /// Run one operation request and fold failures into the response.
    pub fn handle(&self, request: &OperationRequest) -> OperationResponse {
        self.execute(request).into()
    }
}

fn run<S: Scheme>(engine: &Engine<S>, request: &OperationRequest) -> Result<OperationOutput> {
    let operands = &request.operands;

    match request.operation {
        OperationKind::Encrypt => {
            let values = numbers(operands)?;
            let mut texts = values
                .iter()
                .map(|&v| engine.encrypt_text(v))
                .collect::<Result<Vec<_>>>()?;
            match texts.len() {
                0 => Err(EngineError::EmptyOperandSet),
                1 => Ok(OperationOutput::Ciphertext(texts.remove(0))),
                _ => Ok(OperationOutput::Ciphertexts(texts)),
            }
        }
        OperationKind::Decrypt => {
            let [operand] = operands.as_slice() else {
                return Err(arity("decrypt", 1, operands.len()));
            };
            let ct = ciphertext(engine, operand)?;
            Ok(OperationOutput::Value(engine.decrypt(&ct)?))
        }
        OperationKind::Add => {
            let [a, b] = operands.as_slice() else {
                return Err(arity("add", 2, operands.len()));
            };
            let sum = engine.add(&ciphertext(engine, a)?, &ciphertext(engine, b)?)?;
            Ok(OperationOutput::Ciphertext(sum.to_text()?))
        }
        OperationKind::Sum => {
            let cts = ciphertexts(engine, operands)?;
            Ok(OperationOutput::Ciphertext(engine.sum(&cts)?.to_text()?))
        }
        OperationKind::Average => {
            if operands.is_empty() {
                return Ok(OperationOutput::Value(0.0));
            }
            if let Ok(values) = numbers(operands) {
                return Ok(OperationOutput::Value(encrypted_average(&values, engine)?));
            }
            let cts = ciphertexts(engine, operands)?;
            let total = engine.decrypt(&engine.sum(&cts)?)?;
            Ok(OperationOutput::Value(total / cts.len() as f64))
        }
        OperationKind::Multiply => {
            let scalar = request
                .scalar
                .ok_or_else(|| EngineError::InvalidRequest("multiply requires a scalar".into()))?;
            let [operand] = operands.as_slice() else {
                return Err(arity("multiply", 1, operands.len()));
            };
            let product = engine.multiply_by_scalar(&ciphertext(engine, operand)?, scalar)?;
            Ok(OperationOutput::Ciphertext(product.to_text()?))
        }
    }
}

fn arity(operation: &str, expected: usize, got: usize) -> EngineError {
    EngineError::InvalidRequest(format!(
        "{} takes {} operand(s), got {}",
        operation, expected, got
    ))
}

fn numbers(operands: &[Operand]) -> Result<Vec<f64>> {
    operands
        .iter()
        .map(|op| match op {
            Operand::Number(v) => Ok(*v),
            Operand::Ciphertext(_) => Err(EngineError::InvalidRequest(
                "expected plaintext numbers, got a ciphertext".into(),
            )),
        })
        .collect()
}

/// Parse a ciphertext operand; a plaintext number is encrypted first.
fn ciphertext<S: Scheme>(engine: &Engine<S>, operand: &Operand) -> Result<Ciphertext<S>> {
    match operand {
        Operand::Ciphertext(text) => engine.parse(text),
        Operand::Number(v) => engine.encrypt(*v),
    }
}

fn ciphertexts<S: Scheme>(engine: &Engine<S>, operands: &[Operand]) -> Result<Vec<Ciphertext<S>>> {
    operands.iter().map(|op| ciphertext(engine, op)).collect()
}
