// src/blockchain/mod.rs

pub mod codec;
pub mod coerce;
pub mod invoker;
pub mod models;
pub mod nonce_manager;
pub mod registry;
pub mod rpc;

pub use invoker::{ConfirmationPolicy, ContractInvoker};
pub use models::{ArgumentErrorReason, ErrorKind, InvocationOutcome, InvokeError};
pub use registry::{FunctionSignature, InterfaceRegistry, RegistryError};
pub use rpc::{ChainRpc, EncodedCall, HttpRpc, ReceiptStatus};
