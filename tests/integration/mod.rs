//! Integration tests for solana-send-tui.
//!
//! Most tests drive the transfer pipeline against in-memory doubles:
//! - `MockLedger` counts calls and can fail or hold a stage
//! - `CountingSigner` wraps a real keypair signer and counts requests
//!
//! `localnet_flow` needs a running `solana-test-validator` and is ignored by
//! default.

pub mod localnet_flow;
pub mod transfer_flow;
pub mod wallet_flow;

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::VersionedTransaction,
};
use solana_send_tui::domain::{
    signer::{KeypairSigner, SigningError, TransactionSigner},
    transfer::{LedgerClient, TransferError, TransferPhase, transaction_signature},
};
use tokio::sync::Notify;

/// Ledger double. Succeeds unless told otherwise.
#[derive(Default)]
pub struct MockLedger {
    pub blockhash_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub sent: Mutex<Vec<VersionedTransaction>>,
    pub blockhash_error: Option<String>,
    pub confirmation_error: Option<String>,
    /// When set, `latest_blockhash` signals `entered` and waits for `release`.
    pub gate: Option<Gate>,
}

#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst) + self.send_calls.load(Ordering::SeqCst)
    }

    pub fn last_sent(&self) -> Option<VersionedTransaction> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn latest_blockhash(&self) -> Result<Hash, TransferError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        match &self.blockhash_error {
            Some(e) => Err(TransferError::Blockhash(e.clone())),
            None => Ok(Hash::new_unique()),
        }
    }

    async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        _commitment: CommitmentConfig,
    ) -> Result<Signature, TransferError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(transaction.clone());
        if let Some(e) = &self.confirmation_error {
            return Err(TransferError::Confirmation(e.clone()));
        }
        transaction_signature(transaction)
            .ok_or_else(|| TransferError::Submission("transaction is not signed".to_string()))
    }
}

/// Keypair signer that counts how often it is asked to sign.
pub struct CountingSigner {
    inner: KeypairSigner,
    pubkey: Pubkey,
    pub calls: AtomicUsize,
}

impl CountingSigner {
    pub fn new() -> Self {
        let keypair = Keypair::new();
        let pubkey = solana_sdk::signer::Signer::pubkey(&keypair);
        Self {
            inner: KeypairSigner::new(keypair),
            pubkey,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSigner for CountingSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, SigningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.sign_transactions(transactions).await
    }
}

/// Collects every phase reported by a transfer.
#[derive(Clone, Default)]
pub struct PhaseLog(Arc<Mutex<Vec<TransferPhase>>>);

impl PhaseLog {
    pub fn recorder(&self) -> impl Fn(TransferPhase) + Send + Sync + use<> {
        let log = Arc::clone(&self.0);
        move |phase| log.lock().unwrap().push(phase)
    }

    pub fn phases(&self) -> Vec<TransferPhase> {
        self.0.lock().unwrap().clone()
    }
}

/// Lamports carried by a system transfer instruction.
pub fn transfer_lamports(tx: &VersionedTransaction) -> u64 {
    let data = &tx.message.instructions()[0].data;
    // bincode: u32 discriminant, then the u64 amount.
    let mut amount = [0u8; 8];
    amount.copy_from_slice(&data[4..12]);
    u64::from_le_bytes(amount)
}
