//! Error handling for the aggregation engine
//!
//! One error enum is shared by every layer (codec, keys, cipher operations,
//! column aggregation, request dispatch). The HTTP layer maps it to a status
//! code through [`EngineError::is_client_error`].

use std::fmt;

/// Engine operation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Text is not valid base64, or the decoded bytes are not a ciphertext/key.
    MalformedEncoding(String),
    /// Operand was produced under a different scheme or parameter set.
    SchemeMismatch(String),
    /// Approximate operands differ in level or scale.
    ScaleMismatch(String),
    /// Plaintext or scalar outside the representable range.
    OutOfRange(String),
    /// `sum` called with no operands.
    EmptyOperandSet,
    /// Encryption requested before a public key exists.
    EncryptorNotInitialized,
    /// Decryption requested on an engine without a secret key.
    DecryptorNotInitialized,
    /// Operation not defined for this scheme.
    UnsupportedForScheme(String),
    /// No prime left to rescale by.
    ModulusChainExhausted,
    /// Keys were already generated for this engine.
    KeysAlreadyGenerated,
    InvalidParameters(String),
    /// Malformed operation request (unknown operation, wrong operand kind).
    InvalidRequest(String),
    /// A CSV source could not be read.
    FileUnavailable(String),
    Internal(String),
}

impl EngineError {
    /// Validation failures caused by the caller's input (HTTP 400).
    /// Key-state and configuration failures are internal (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EngineError::EncryptorNotInitialized
                | EngineError::DecryptorNotInitialized
                | EngineError::KeysAlreadyGenerated
                | EngineError::InvalidParameters(_)
                | EngineError::Internal(_)
        )
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MalformedEncoding(msg) => write!(f, "malformed encoding: {}", msg),
            EngineError::SchemeMismatch(msg) => write!(f, "scheme mismatch: {}", msg),
            EngineError::ScaleMismatch(msg) => write!(f, "scale mismatch: {}", msg),
            EngineError::OutOfRange(msg) => write!(f, "value out of range: {}", msg),
            EngineError::EmptyOperandSet => write!(f, "operand set is empty"),
            EngineError::EncryptorNotInitialized => {
                write!(f, "encryptor not initialized: no public key")
            }
            EngineError::DecryptorNotInitialized => {
                write!(f, "decryptor not initialized: no secret key")
            }
            EngineError::UnsupportedForScheme(msg) => {
                write!(f, "operation unsupported for scheme: {}", msg)
            }
            EngineError::ModulusChainExhausted => {
                write!(f, "modulus chain exhausted: no prime left to rescale by")
            }
            EngineError::KeysAlreadyGenerated => write!(f, "keys already generated"),
            EngineError::InvalidParameters(msg) => write!(f, "invalid parameters: {}", msg),
            EngineError::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            EngineError::FileUnavailable(msg) => write!(f, "file unavailable: {}", msg),
            EngineError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::FileUnavailable(err.to_string())
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        EngineError::MalformedEncoding(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
