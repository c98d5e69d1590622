//! Transfer pipeline against the mock ledger.

use std::{str::FromStr, sync::Arc};

use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
};
use solana_send_tui::domain::{
    signer::{ApprovalSigner, TransactionSigner},
    transfer::{
        TransferContext, TransferOrchestrator, TransferPhase, TransferRequest, TransferStage,
    },
};
use tokio::sync::mpsc;

use super::{CountingSigner, MockLedger, PhaseLog, transfer_lamports};

fn orchestrator() -> TransferOrchestrator {
    TransferOrchestrator::new(CommitmentConfig::confirmed())
}

fn ready(signer: Arc<dyn TransactionSigner>) -> TransferContext {
    TransferContext {
        sender: Some(signer.pubkey()),
        signer: Some(signer),
    }
}

fn request(amount: &str) -> TransferRequest {
    TransferRequest::new(Pubkey::new_unique().to_string(), amount)
}

#[tokio::test]
async fn test_successful_transfer() {
    let ledger = MockLedger::new();
    let signer = Arc::new(CountingSigner::new());
    let sender = signer.pubkey();
    let log = PhaseLog::default();

    let result = orchestrator()
        .transfer(&ledger, ready(signer.clone()), request("1.5"), log.recorder())
        .await;

    assert_eq!(result.error, None);
    let signature = result.signature.expect("signature");
    assert!(Signature::from_str(&signature).is_ok());

    let sent = ledger.last_sent().expect("sent transaction");
    assert_eq!(sent.signatures[0].to_string(), signature);
    assert_eq!(sent.message.static_account_keys()[0], sender);
    assert_eq!(transfer_lamports(&sent), 1_500_000_000);
    assert!(sent.verify_with_results().iter().all(|ok| *ok));
    assert_eq!(signer.calls(), 1);

    assert_eq!(
        log.phases(),
        vec![
            TransferPhase::InProgress(TransferStage::Preparing),
            TransferPhase::InProgress(TransferStage::FetchingBlockhash),
            TransferPhase::InProgress(TransferStage::AwaitingSignature),
            TransferPhase::InProgress(TransferStage::Submitting),
            TransferPhase::Confirmed { signature },
        ]
    );
}

#[tokio::test]
async fn test_recipient_is_trimmed() {
    let ledger = MockLedger::new();
    let recipient = Pubkey::new_unique();
    let signer = Arc::new(CountingSigner::new());

    let result = orchestrator()
        .transfer(
            &ledger,
            ready(signer),
            TransferRequest::new(format!("  {}  ", recipient), "0.000000001"),
            |_| {},
        )
        .await;

    assert!(result.signature.is_some());
    let sent = ledger.last_sent().unwrap();
    assert!(sent.message.static_account_keys().contains(&recipient));
    assert_eq!(transfer_lamports(&sent), 1);
}

#[tokio::test]
async fn test_not_ready_makes_no_calls() {
    let ledger = MockLedger::new();
    let signer = Arc::new(CountingSigner::new());
    let log = PhaseLog::default();

    // Account without a signer.
    let ctx = TransferContext {
        sender: Some(signer.pubkey()),
        signer: None,
    };
    let result = orchestrator()
        .transfer(&ledger, ctx, request("1"), log.recorder())
        .await;

    assert_eq!(
        result.error.as_deref(),
        Some("Wallet not connected or signer unavailable")
    );
    assert_eq!(result.signature, None);
    assert_eq!(ledger.calls(), 0);
    assert_eq!(signer.calls(), 0);
    assert!(matches!(
        log.phases().last(),
        Some(TransferPhase::Failed {
            stage: TransferStage::Preparing,
            ..
        })
    ));

    let result = orchestrator()
        .transfer(&ledger, TransferContext::default(), request("1"), |_| {})
        .await;
    assert!(result.error.is_some());
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_invalid_amount_fails_before_ledger() {
    let ledger = MockLedger::new();
    let signer = Arc::new(CountingSigner::new());

    for amount in ["abc", "", "-1", "1e3", "1.2.3"] {
        let result = orchestrator()
            .transfer(&ledger, ready(signer.clone()), request(amount), |_| {})
            .await;
        let error = result.error.expect("error");
        assert!(error.starts_with("Invalid amount"), "{amount}: {error}");
        assert_eq!(result.signature, None);
    }

    assert_eq!(ledger.calls(), 0);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn test_invalid_recipient_fails_before_ledger() {
    let ledger = MockLedger::new();
    let signer = Arc::new(CountingSigner::new());

    let result = orchestrator()
        .transfer(
            &ledger,
            ready(signer),
            TransferRequest::new("not-an-address", "1"),
            |_| {},
        )
        .await;

    assert!(
        result
            .error
            .unwrap()
            .starts_with("Invalid recipient address")
    );
    assert_eq!(ledger.calls(), 0);
}

#[tokio::test]
async fn test_blockhash_failure() {
    let ledger = MockLedger {
        blockhash_error: Some("connection refused".to_string()),
        ..MockLedger::default()
    };
    let signer = Arc::new(CountingSigner::new());
    let log = PhaseLog::default();

    let result = orchestrator()
        .transfer(&ledger, ready(signer.clone()), request("1"), log.recorder())
        .await;

    assert_eq!(
        result.error.as_deref(),
        Some("Failed to fetch latest blockhash: connection refused")
    );
    assert_eq!(signer.calls(), 0);
    assert_eq!(ledger.send_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(matches!(
        log.phases().last(),
        Some(TransferPhase::Failed {
            stage: TransferStage::FetchingBlockhash,
            ..
        })
    ));
}

#[tokio::test]
async fn test_confirmation_failure() {
    let ledger = MockLedger {
        confirmation_error: Some("InsufficientFundsForRent".to_string()),
        ..MockLedger::default()
    };
    let signer = Arc::new(CountingSigner::new());

    let result = orchestrator()
        .transfer(&ledger, ready(signer), request("1"), |_| {})
        .await;

    assert_eq!(
        result.error.as_deref(),
        Some("Transaction failed: InsufficientFundsForRent")
    );
    assert_eq!(result.signature, None);
    assert!(ledger.last_sent().is_some());
}

#[tokio::test]
async fn test_rejection_then_retry() {
    let ledger = MockLedger::new();
    let inner = Arc::new(CountingSigner::new());
    let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel();
    let signer: Arc<dyn TransactionSigner> =
        Arc::new(ApprovalSigner::new("alice", inner.clone(), prompt_tx));
    let orchestrator = orchestrator();

    let prompt = tokio::spawn(async move {
        prompt_rx.recv().await.unwrap().reject();
        prompt_rx.recv().await.unwrap().approve();
    });

    let rejected = orchestrator
        .transfer(&ledger, ready(signer.clone()), request("1"), |_| {})
        .await;
    assert_eq!(rejected.signature, None);
    assert!(rejected.error.unwrap().contains("rejected"));
    assert_eq!(ledger.send_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(inner.calls(), 0);
    assert!(!orchestrator.is_busy());

    let retried = orchestrator
        .transfer(&ledger, ready(signer), request("1"), |_| {})
        .await;
    prompt.await.unwrap();
    assert_eq!(retried.error, None);
    assert!(retried.signature.is_some());
    assert_eq!(inner.calls(), 1);
}

#[tokio::test]
async fn test_single_flight() {
    let ledger = Arc::new(MockLedger::gated());
    let signer = Arc::new(CountingSigner::new());
    let orchestrator = orchestrator();

    let first = {
        let ledger = Arc::clone(&ledger);
        let orchestrator = orchestrator.clone();
        let ctx = ready(signer.clone());
        tokio::spawn(async move {
            orchestrator
                .transfer(&*ledger, ctx, request("1"), |_| {})
                .await
        })
    };

    let gate = ledger.gate.as_ref().unwrap();
    gate.entered.notified().await;
    assert!(orchestrator.is_busy());

    let second = orchestrator
        .transfer(&*ledger, ready(signer.clone()), request("2"), |_| {})
        .await;
    assert_eq!(
        second.error.as_deref(),
        Some("A transfer is already in progress")
    );

    gate.release.notify_one();
    let first = first.await.unwrap();
    assert!(first.signature.is_some());
    assert_eq!(ledger.send_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(!orchestrator.is_busy());
}
