//! Dispatcher scenarios against an in-process mock chain.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;

use evm_invoker::blockchain::codec;
use evm_invoker::{
    Address, Bytes, ChainRpc, ConfirmationPolicy, ContractInvoker, EncodedCall, ErrorKind,
    InterfaceRegistry, InvocationOutcome, ReceiptStatus, H256, U256,
};

const HOLDER: &str = "0x1111111111111111111111111111111111111111";

/// Every chain interaction the dispatcher performs, in order.
#[derive(Debug, Clone, PartialEq)]
enum Interaction {
    Submit { data: Vec<u8>, value: Option<U256> },
    Call { data: Vec<u8> },
    ReceiptPoll,
}

struct MockChain {
    interactions: Mutex<Vec<Interaction>>,
    read_return: Vec<u8>,
    /// `None` means the transaction never gets included.
    receipt: Option<ReceiptStatus>,
    submit_error: Option<String>,
}

impl MockChain {
    fn accepting() -> Self {
        Self {
            interactions: Mutex::new(Vec::new()),
            read_return: Vec::new(),
            receipt: Some(ReceiptStatus {
                success: true,
                revert_reason: None,
            }),
            submit_error: None,
        }
    }

    fn returning(read_return: Vec<u8>) -> Self {
        Self {
            read_return,
            ..Self::accepting()
        }
    }

    fn reverting(reason: &str) -> Self {
        Self {
            receipt: Some(ReceiptStatus {
                success: false,
                revert_reason: Some(reason.to_string()),
            }),
            ..Self::accepting()
        }
    }

    fn never_including() -> Self {
        Self {
            receipt: None,
            ..Self::accepting()
        }
    }

    fn rejecting(error: &str) -> Self {
        Self {
            submit_error: Some(error.to_string()),
            ..Self::accepting()
        }
    }

    fn recorded(&self) -> Vec<Interaction> {
        self.interactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn submit_transaction(&self, call: &EncodedCall) -> Result<H256> {
        self.interactions.lock().unwrap().push(Interaction::Submit {
            data: call.data.to_vec(),
            value: call.value,
        });
        if let Some(error) = &self.submit_error {
            bail!("{error}");
        }
        Ok(H256::repeat_byte(0xfe))
    }

    async fn call_readonly(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        self.interactions
            .lock()
            .unwrap()
            .push(Interaction::Call { data: data.to_vec() });
        Ok(Bytes::from(self.read_return.clone()))
    }

    async fn transaction_receipt(&self, _tx_hash: H256) -> Result<Option<ReceiptStatus>> {
        self.interactions.lock().unwrap().push(Interaction::ReceiptPoll);
        Ok(self.receipt.clone())
    }
}

fn invoker(chain: Arc<MockChain>) -> ContractInvoker {
    ContractInvoker::new(
        InterfaceRegistry::crosschain_token(),
        Address::repeat_byte(0xc0),
        chain,
    )
    .with_confirmation(ConfirmationPolicy {
        timeout: Some(Duration::from_millis(250)),
        poll_interval: Duration::from_millis(5),
    })
}

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn expect_failure(outcome: InvocationOutcome) -> (ErrorKind, String) {
    match outcome {
        InvocationOutcome::Failed { kind, message } => (kind, message),
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn balance_of_decodes_returned_value() {
    // 32-byte big-endian encoding of 42.
    let mut word = vec![0u8; 32];
    word[31] = 42;
    let chain = Arc::new(MockChain::returning(word));
    let invoker = invoker(chain.clone());

    let outcome = invoker.invoke("balanceOf", &args(&[HOLDER])).await;
    match outcome {
        InvocationOutcome::ValueReturned { values } => assert_eq!(values, vec![json!("42")]),
        other => panic!("expected ValueReturned, got {other:?}"),
    }

    // Exactly one read-only call, no submission, no receipt polling.
    let recorded = chain.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(matches!(recorded[0], Interaction::Call { .. }));
}

#[tokio::test]
async fn read_variant_matches_view_path() {
    let mut word = vec![0u8; 32];
    word[31] = 42;
    let chain = Arc::new(MockChain::returning(word));
    let invoker = invoker(chain);

    let outcome = invoker.read("balanceOf", &args(&[HOLDER])).await;
    match outcome {
        InvocationOutcome::ValueReturned { values } => assert_eq!(values, vec![json!("42")]),
        other => panic!("expected ValueReturned, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_return_bytes_classify_as_decode_error() {
    let chain = Arc::new(MockChain::returning(vec![0u8; 5]));
    let invoker = invoker(chain);

    let (kind, message) = expect_failure(invoker.invoke("balanceOf", &args(&[HOLDER])).await);
    assert_eq!(kind, ErrorKind::DecodeError);
    assert!(message.starts_with("balanceOf:"));
}

#[tokio::test]
async fn crosschain_mint_confirms_as_submitted() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain.clone());

    let outcome = invoker
        .invoke("crosschainMint", &args(&[HOLDER, "1000"]))
        .await;
    match outcome {
        InvocationOutcome::TransactionSubmitted { tx_hash } => {
            assert!(tx_hash.starts_with("0x"));
        }
        other => panic!("expected TransactionSubmitted, got {other:?}"),
    }

    let recorded = chain.recorded();
    match &recorded[0] {
        Interaction::Submit { data, value } => {
            assert_eq!(
                &data[0..4],
                codec::selector("crosschainMint(address,uint256)").as_slice()
            );
            assert_eq!(*value, None);
        }
        other => panic!("expected Submit first, got {other:?}"),
    }
    assert!(recorded[1..].iter().all(|i| *i == Interaction::ReceiptPoll));
}

#[tokio::test]
async fn included_revert_surfaces_as_revert_error() {
    let chain = Arc::new(MockChain::reverting("caller is not the aiAgent"));
    let invoker = invoker(chain);

    let (kind, message) =
        expect_failure(invoker.invoke("crosschainMint", &args(&[HOLDER, "1000"])).await);
    assert_eq!(kind, ErrorKind::RevertError);
    assert!(message.contains("caller is not the aiAgent"));
}

#[tokio::test]
async fn payable_deposit_attaches_converted_value() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain.clone());

    let outcome = invoker.invoke_with_value("deposit", &[], "0.01").await;
    assert!(matches!(
        outcome,
        InvocationOutcome::TransactionSubmitted { .. }
    ));

    match &chain.recorded()[0] {
        Interaction::Submit { value, .. } => assert_eq!(*value, Some(U256::exp10(16))),
        other => panic!("expected Submit first, got {other:?}"),
    }
}

#[tokio::test]
async fn value_on_nonpayable_function_never_reaches_the_chain() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain.clone());

    let (kind, _) = expect_failure(
        invoker
            .invoke_with_value("crosschainMint", &args(&[HOLDER, "1000"]), "1.0")
            .await,
    );
    assert_eq!(kind, ErrorKind::InvalidArgument);
    assert!(chain.recorded().is_empty());
}

#[tokio::test]
async fn zero_value_on_nonpayable_function_is_allowed() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain);

    let outcome = invoker
        .invoke_with_value("crosschainMint", &args(&[HOLDER, "1000"]), "0")
        .await;
    assert!(matches!(
        outcome,
        InvocationOutcome::TransactionSubmitted { .. }
    ));
}

#[tokio::test]
async fn unknown_function_performs_no_network_call() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain.clone());

    let (kind, message) = expect_failure(invoker.invoke("selfdestruct", &[]).await);
    assert_eq!(kind, ErrorKind::UnknownFunction);
    assert!(message.contains("selfdestruct"));
    assert!(chain.recorded().is_empty());
}

#[tokio::test]
async fn arity_mismatch_performs_no_network_call() {
    let chain = Arc::new(MockChain::accepting());
    let invoker = invoker(chain.clone());

    let (kind, _) = expect_failure(invoker.invoke("balanceOf", &[]).await);
    assert_eq!(kind, ErrorKind::InvalidArgument);
    assert!(chain.recorded().is_empty());
}

#[tokio::test]
async fn rejected_submission_is_not_retried() {
    let chain = Arc::new(MockChain::rejecting("insufficient funds for gas"));
    let invoker = invoker(chain.clone());

    let (kind, message) =
        expect_failure(invoker.invoke("withdraw", &args(&["100"])).await);
    assert_eq!(kind, ErrorKind::SubmissionError);
    assert!(message.contains("insufficient funds"));

    // One submission attempt, no receipt polling afterwards.
    let recorded = chain.recorded();
    assert_eq!(recorded.len(), 1);
    assert!(matches!(recorded[0], Interaction::Submit { .. }));
}

#[tokio::test]
async fn confirmation_timeout_leaves_fate_unresolved() {
    let chain = Arc::new(MockChain::never_including());
    let invoker = invoker(chain.clone());

    let (kind, message) =
        expect_failure(invoker.invoke("crosschainMint", &args(&[HOLDER, "1"])).await);
    assert_eq!(kind, ErrorKind::TimeoutError);
    // The hash is surfaced so the caller can re-query later.
    assert!(message.contains(&format!("{:?}", H256::repeat_byte(0xfe))));

    let recorded = chain.recorded();
    assert!(matches!(recorded[0], Interaction::Submit { .. }));
    assert!(recorded.len() > 1, "expected at least one receipt poll");
}
