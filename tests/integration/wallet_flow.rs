//! Keypair wallets from disk through a session into a transfer.

use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, write_keypair_file},
    signer::Signer,
};
use solana_send_tui::{
    domain::{
        transfer::{TransferOrchestrator, TransferRequest},
        wallet::WalletSession,
    },
    infra::keystore::discover_wallets,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

use super::{MockLedger, transfer_lamports};

fn wallets_dir_with(names: &[&str]) -> (TempDir, Vec<Pubkey>) {
    let dir = TempDir::new().unwrap();
    let pubkeys = names
        .iter()
        .map(|name| {
            let keypair = Keypair::new();
            write_keypair_file(&keypair, dir.path().join(format!("{}.json", name))).unwrap();
            keypair.pubkey()
        })
        .collect();
    (dir, pubkeys)
}

#[tokio::test]
async fn test_connect_transfer_disconnect() {
    let (dir, pubkeys) = wallets_dir_with(&["alice", "bob"]);
    let wallets = discover_wallets(None, dir.path(), &[]);
    assert_eq!(wallets.len(), 2);

    let mut session = WalletSession::new(wallets, None);
    let orchestrator = TransferOrchestrator::new(CommitmentConfig::confirmed());
    let ledger = MockLedger::new();
    let recipient = Pubkey::new_unique().to_string();

    session.connect(1).unwrap();
    assert_eq!(session.wallet_info().unwrap().name, "bob");
    assert_eq!(session.account(), Some(pubkeys[1]));

    let result = orchestrator
        .transfer(
            &ledger,
            session.transfer_context(),
            TransferRequest::new(recipient.clone(), "0.25"),
            |_| {},
        )
        .await;
    assert!(result.signature.is_some());
    let sent = ledger.last_sent().unwrap();
    assert_eq!(sent.message.static_account_keys()[0], pubkeys[1]);
    assert_eq!(transfer_lamports(&sent), 250_000_000);
    assert!(sent.verify_with_results().iter().all(|ok| *ok));

    session.disconnect();
    let calls_before = ledger.calls();
    let result = orchestrator
        .transfer(
            &ledger,
            session.transfer_context(),
            TransferRequest::new(recipient, "0.25"),
            |_| {},
        )
        .await;
    assert_eq!(
        result.error.as_deref(),
        Some("Wallet not connected or signer unavailable")
    );
    assert_eq!(ledger.calls(), calls_before);
}

#[tokio::test]
async fn test_switching_wallets_changes_sender() {
    let (dir, pubkeys) = wallets_dir_with(&["alice", "bob"]);
    let mut session = WalletSession::new(discover_wallets(None, dir.path(), &[]), None);

    session.connect(0).unwrap();
    assert_eq!(session.account(), Some(pubkeys[0]));
    session.connect(1).unwrap();
    assert_eq!(session.account(), Some(pubkeys[1]));
    assert_eq!(session.connected_index(), Some(1));
    assert_eq!(session.transfer_context().sender, Some(pubkeys[1]));
}

#[tokio::test]
async fn test_approval_prompt_routes_through_session() {
    let (dir, pubkeys) = wallets_dir_with(&["alice"]);
    let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel();
    let mut session = WalletSession::new(discover_wallets(None, dir.path(), &[]), Some(prompt_tx));
    session.connect(0).unwrap();

    let prompt = tokio::spawn(async move {
        let request = prompt_rx.recv().await.unwrap();
        assert_eq!(request.wallet, "alice");
        assert_eq!(request.signer, pubkeys[0]);
        request.approve();
    });

    let ledger = MockLedger::new();
    let result = TransferOrchestrator::new(CommitmentConfig::confirmed())
        .transfer(
            &ledger,
            session.transfer_context(),
            TransferRequest::new(Pubkey::new_unique().to_string(), "1"),
            |_| {},
        )
        .await;
    prompt.await.unwrap();

    assert_eq!(result.error, None);
    assert!(result.signature.is_some());
}
