// src/blockchain/models.rs

use ethers_core::abi::Token;
use ethers_core::types::H256;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

// --- Error taxonomy for contract invocations ---

/// Reason code attached to `InvokeError::InvalidArgument`, so callers can
/// react to the specific violation without string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgumentErrorReason {
    Arity,
    AddressFormat,
    Overflow,
    NotPayable,
    Type,
    ValueFormat,
}

impl std::fmt::Display for ArgumentErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArgumentErrorReason::Arity => "arity",
            ArgumentErrorReason::AddressFormat => "address-format",
            ArgumentErrorReason::Overflow => "overflow",
            ArgumentErrorReason::NotPayable => "not-payable",
            ArgumentErrorReason::Type => "type",
            ArgumentErrorReason::ValueFormat => "value-format",
        })
    }
}

/// Classified failure of a single invocation. None of these crash the
/// process and none are retried automatically.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Caller-supplied arity/type/format violation. Always local; no network
    /// call has been made when this is returned.
    #[error("invalid argument ({reason}): {message}")]
    InvalidArgument {
        reason: ArgumentErrorReason,
        message: String,
    },

    /// Function name absent from the interface registry.
    #[error("function '{0}' is not part of the contract interface")]
    UnknownFunction(String),

    /// The network or node rejected the transaction before inclusion.
    /// Resubmission is left to the caller with a fresh request.
    #[error("transaction submission failed: {0}")]
    Submission(String),

    /// Included on-chain but execution reverted. Terminal.
    #[error("execution reverted: {}", reason.as_deref().unwrap_or("no reason provided"))]
    Reverted { reason: Option<String> },

    /// Return bytes did not match the declared outputs; treated as an
    /// interface-description mismatch, not a local bug.
    #[error("failed to decode return data: {0}")]
    Decode(String),

    /// The confirmation wait exceeded the caller's budget. The transaction's
    /// on-chain fate is unresolved; re-query by hash later.
    #[error("confirmation wait timed out; fate of transaction {tx_hash:?} is unknown")]
    Timeout { tx_hash: H256 },

    /// The read-only call itself failed (node unreachable, RPC error).
    #[error("read-only call failed: {0}")]
    Read(String),
}

/// Machine-readable classification carried in `InvocationOutcome::Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    UnknownFunction,
    SubmissionError,
    RevertError,
    DecodeError,
    TimeoutError,
    ReadError,
}

impl InvokeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvokeError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            InvokeError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            InvokeError::Submission(_) => ErrorKind::SubmissionError,
            InvokeError::Reverted { .. } => ErrorKind::RevertError,
            InvokeError::Decode(_) => ErrorKind::DecodeError,
            InvokeError::Timeout { .. } => ErrorKind::TimeoutError,
            InvokeError::Read(_) => ErrorKind::ReadError,
        }
    }
}

// --- Invocation outcome ---

/// Terminal state of the dispatcher before reporting.
#[derive(Debug)]
pub enum DispatchSuccess {
    /// State-changing path, after inclusion was observed.
    Submitted { tx_hash: H256 },
    /// Read-only path, with decoded return values.
    Returned { values: Vec<Token> },
}

/// The single artifact returned across the invocation layer's boundary.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    TransactionSubmitted { tx_hash: String },
    ValueReturned { values: Vec<Value> },
    Failed { kind: ErrorKind, message: String },
}

impl InvocationOutcome {
    /// Normalize a dispatcher result into the uniform response consumed by
    /// the calling agent. Failure messages name the originating function and
    /// never include signing material.
    pub fn from_result(
        function_name: &str,
        result: Result<DispatchSuccess, InvokeError>,
    ) -> Self {
        match result {
            Ok(DispatchSuccess::Submitted { tx_hash }) => InvocationOutcome::TransactionSubmitted {
                tx_hash: format!("{tx_hash:?}"),
            },
            Ok(DispatchSuccess::Returned { values }) => InvocationOutcome::ValueReturned {
                values: values.iter().map(token_to_json).collect(),
            },
            Err(err) => InvocationOutcome::Failed {
                kind: err.kind(),
                message: format!("{function_name}: {err}"),
            },
        }
    }
}

/// Render a decoded ABI token as JSON: addresses and byte sequences as
/// 0x-hex, integers as decimal strings (they can exceed u64).
pub fn token_to_json(token: &Token) -> Value {
    match token {
        Token::Address(addr) => json!(format!("{addr:?}")),
        Token::Uint(n) | Token::Int(n) => json!(n.to_string()),
        Token::Bool(b) => json!(b),
        Token::String(s) => json!(s),
        Token::Bytes(b) | Token::FixedBytes(b) => json!(format!("0x{}", hex::encode(b))),
        other => json!(other.to_string()),
    }
}
