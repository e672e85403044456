// src/lib.rs

//! Generic contract invocation layer for a single deployed contract on an
//! EVM-compatible chain: encode typed function calls against a known
//! interface description, submit them as signed transactions, wait for
//! confirmation, and decode read-only results. The conversational agent
//! layer sits outside this crate and calls [`ContractInvoker::invoke`] with
//! a function name and raw string arguments.

// Re-export commonly used types
pub use ethers_core::abi::{ParamType, StateMutability, Token};
pub use ethers_core::types::{Address, Bytes, H256, U256};

// Re-export modules
pub mod blockchain;
pub mod config;

pub use blockchain::{
    ArgumentErrorReason, ChainRpc, ConfirmationPolicy, ContractInvoker, EncodedCall, ErrorKind,
    FunctionSignature, HttpRpc, InterfaceRegistry, InvocationOutcome, InvokeError, ReceiptStatus,
    RegistryError,
};
pub use config::Config;
