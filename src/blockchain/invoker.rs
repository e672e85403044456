// src/blockchain/invoker.rs

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ethers_core::types::{Address, Bytes, H256};
use ethers_signers::LocalWallet;
use secrecy::ExposeSecret;
use tracing::{debug, warn};

use super::codec;
use super::coerce;
use super::models::{ArgumentErrorReason, DispatchSuccess, InvocationOutcome, InvokeError};
use super::registry::{FunctionSignature, InterfaceRegistry};
use super::rpc::{ChainRpc, EncodedCall, HttpRpc};
use crate::config::Config;

/// How long, and how often, to wait for a submitted transaction's inclusion.
#[derive(Debug, Clone)]
pub struct ConfirmationPolicy {
    /// Maximum total wait; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Pause between receipt polls.
    pub poll_interval: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

/// Generic invocation layer for one deployed contract: resolves a function
/// by name, coerces raw arguments, encodes the call and routes it through
/// the read-only or transaction path of the injected chain collaborator.
///
/// Each invocation runs to completion as a single logical flow; the only
/// suspension point is the confirmation wait. Read-only calls may run fully
/// in parallel; nonce allocation for concurrent state-changing calls is
/// serialized inside the submission collaborator.
pub struct ContractInvoker {
    registry: InterfaceRegistry,
    contract: Address,
    rpc: Arc<dyn ChainRpc>,
    confirmation: ConfirmationPolicy,
}

impl ContractInvoker {
    pub fn new(registry: InterfaceRegistry, contract: Address, rpc: Arc<dyn ChainRpc>) -> Self {
        Self {
            registry,
            contract,
            rpc,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    /// Wire up an invoker from process configuration: HTTP JSON-RPC against
    /// the configured endpoint, signing with the configured identity.
    pub fn from_config(config: &Config, registry: InterfaceRegistry) -> anyhow::Result<Self> {
        let wallet = LocalWallet::from_str(config.private_key.expose_secret())
            .map_err(|e| anyhow::anyhow!("invalid PRIVATE_KEY: {e}"))?;
        let contract: Address = config
            .contract_address
            .parse()
            .context("CONTRACT_ADDRESS is not a valid address")?;
        let rpc = HttpRpc::new(&config.rpc_url, wallet)
            .with_gas(config.gas_limit, config.gas_price);
        Ok(Self::new(registry, contract, Arc::new(rpc)).with_confirmation(ConfirmationPolicy {
            timeout: config.confirmation_timeout,
            poll_interval: config.confirmation_poll_interval,
        }))
    }

    pub fn with_confirmation(mut self, confirmation: ConfirmationPolicy) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Invoke `function_name` with raw string arguments and no attached
    /// value. View functions take the read-only path; everything else is
    /// submitted as a signed transaction and awaited to inclusion.
    pub async fn invoke(&self, function_name: &str, raw_args: &[String]) -> InvocationOutcome {
        let result = self.dispatch(function_name, raw_args, None).await;
        InvocationOutcome::from_result(function_name, result)
    }

    /// Invoke a payable function, attaching `amount`: a human-entered
    /// decimal amount of the native currency (e.g. "0.01"), converted to
    /// wei before submission.
    pub async fn invoke_with_value(
        &self,
        function_name: &str,
        raw_args: &[String],
        amount: &str,
    ) -> InvocationOutcome {
        let result = self.dispatch(function_name, raw_args, Some(amount)).await;
        InvocationOutcome::from_result(function_name, result)
    }

    /// Read variant: execute the call without state change regardless of the
    /// function's declared mutability and decode the returned bytes.
    pub async fn read(&self, function_name: &str, raw_args: &[String]) -> InvocationOutcome {
        let result = async {
            let signature = self.lookup(function_name)?;
            let args = coerce::coerce(signature, raw_args)?;
            let data = codec::encode(signature, &args);
            self.evaluate(signature, data).await
        }
        .await;
        InvocationOutcome::from_result(function_name, result)
    }

    async fn dispatch(
        &self,
        function_name: &str,
        raw_args: &[String],
        amount: Option<&str>,
    ) -> Result<DispatchSuccess, InvokeError> {
        let signature = self.lookup(function_name)?;
        let args = coerce::coerce(signature, raw_args)?;

        // A non-zero attached value is only valid on a payable function, and
        // is rejected before any network interaction.
        let value = match amount {
            Some(raw) => {
                let wei = coerce::parse_native_amount(raw)?;
                if !wei.is_zero() && !signature.is_payable() {
                    return Err(InvokeError::InvalidArgument {
                        reason: ArgumentErrorReason::NotPayable,
                        message: format!(
                            "{function_name} is not payable; cannot attach a value"
                        ),
                    });
                }
                if wei.is_zero() {
                    None
                } else {
                    Some(wei)
                }
            }
            None => None,
        };

        let data = codec::encode(signature, &args);

        if signature.is_read_only() {
            self.evaluate(signature, data).await
        } else {
            let call = EncodedCall {
                to: self.contract,
                data,
                value,
            };
            self.submit_and_confirm(function_name, call).await
        }
    }

    fn lookup(&self, name: &str) -> Result<&FunctionSignature, InvokeError> {
        self.registry
            .lookup(name)
            .ok_or_else(|| InvokeError::UnknownFunction(name.to_string()))
    }

    async fn evaluate(
        &self,
        signature: &FunctionSignature,
        data: Bytes,
    ) -> Result<DispatchSuccess, InvokeError> {
        let raw = self
            .rpc
            .call_readonly(self.contract, data)
            .await
            .map_err(|e| InvokeError::Read(e.to_string()))?;
        let values = codec::decode(&signature.outputs, &raw)?;
        Ok(DispatchSuccess::Returned { values })
    }

    async fn submit_and_confirm(
        &self,
        function_name: &str,
        call: EncodedCall,
    ) -> Result<DispatchSuccess, InvokeError> {
        // Submission is not retried: blind resubmission risks duplicate
        // on-chain effects. The caller decides whether to issue a fresh
        // request.
        let tx_hash = self
            .rpc
            .submit_transaction(&call)
            .await
            .map_err(|e| InvokeError::Submission(e.to_string()))?;
        debug!(function = function_name, tx = ?tx_hash, "transaction submitted, awaiting inclusion");

        match self.confirmation.timeout {
            Some(budget) => {
                match tokio::time::timeout(budget, self.wait_for_receipt(tx_hash)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(tx = ?tx_hash, "confirmation wait exceeded; on-chain fate unresolved");
                        Err(InvokeError::Timeout { tx_hash })
                    }
                }
            }
            None => self.wait_for_receipt(tx_hash).await,
        }
    }

    /// Polls until the chain reports inclusion. Dropping this future stops
    /// the local wait only; the submitted transaction is unaffected.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<DispatchSuccess, InvokeError> {
        loop {
            match self.rpc.transaction_receipt(tx_hash).await {
                Ok(Some(status)) if status.success => {
                    return Ok(DispatchSuccess::Submitted { tx_hash });
                }
                Ok(Some(status)) => {
                    return Err(InvokeError::Reverted {
                        reason: status.revert_reason,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    // A failed poll leaves inclusion status unknown; retry on
                    // the next tick within the caller's budget.
                    debug!(tx = ?tx_hash, error = %e, "receipt poll failed");
                }
            }
            tokio::time::sleep(self.confirmation.poll_interval).await;
        }
    }
}
