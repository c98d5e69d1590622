//! Transaction signers.
//!
//! A signer authorizes compiled transactions on behalf of one account. The
//! wallet session hands out `Arc<dyn TransactionSigner>` so the transfer task
//! can keep signing even if the user disconnects mid-flight.

use std::sync::Arc;

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::VersionedTransaction,
};
use thiserror::Error;
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("signature request rejected: {0}")]
    Rejected(String),
    #[error("{0} is not a required signer of this transaction")]
    NotASigner(Pubkey),
    #[error("signing failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign every transaction in order. May wait on the user indefinitely.
    async fn sign_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, SigningError>;
}

/// Signs with a keypair held in memory.
pub struct KeypairSigner {
    keypair: Arc<Keypair>,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Place this keypair's signature in its slot among the required signers.
    pub fn sign_one(
        &self,
        mut tx: VersionedTransaction,
    ) -> Result<VersionedTransaction, SigningError> {
        let pubkey = self.keypair.pubkey();
        let required = tx.message.header().num_required_signatures as usize;
        let slot = tx
            .message
            .static_account_keys()
            .iter()
            .take(required)
            .position(|key| *key == pubkey)
            .ok_or(SigningError::NotASigner(pubkey))?;

        let signature = self
            .keypair
            .try_sign_message(&tx.message.serialize())
            .map_err(|e| SigningError::Failed(e.to_string()))?;

        if tx.signatures.len() < required {
            tx.signatures.resize(required, Signature::default());
        }
        tx.signatures[slot] = signature;
        Ok(tx)
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, SigningError> {
        transactions
            .into_iter()
            .map(|tx| self.sign_one(tx))
            .collect()
    }
}

/// A pending request for the user to approve a signature.
#[derive(Debug)]
pub struct ApprovalRequest {
    pub wallet: String,
    pub signer: Pubkey,
    pub fee_payer: Option<Pubkey>,
    pub transaction_count: usize,
    respond: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    /// Create a request and the receiver its answer arrives on.
    pub fn new(
        wallet: impl Into<String>,
        signer: Pubkey,
        fee_payer: Option<Pubkey>,
        transaction_count: usize,
    ) -> (Self, oneshot::Receiver<bool>) {
        let (respond, answer) = oneshot::channel();
        let request = Self {
            wallet: wallet.into(),
            signer,
            fee_payer,
            transaction_count,
            respond,
        };
        (request, answer)
    }

    pub fn approve(self) {
        // The signer may have given up already; nothing to do then.
        let _ = self.respond.send(true);
    }

    pub fn reject(self) {
        let _ = self.respond.send(false);
    }
}

/// Wraps a signer behind an interactive approval prompt.
pub struct ApprovalSigner {
    wallet: String,
    pubkey: Pubkey,
    inner: Arc<dyn TransactionSigner>,
    prompt_tx: UnboundedSender<ApprovalRequest>,
}

impl ApprovalSigner {
    pub fn new(
        wallet: impl Into<String>,
        inner: Arc<dyn TransactionSigner>,
        prompt_tx: UnboundedSender<ApprovalRequest>,
    ) -> Self {
        Self {
            wallet: wallet.into(),
            pubkey: TransactionSigner::pubkey(inner.as_ref()),
            inner,
            prompt_tx,
        }
    }
}

#[async_trait]
impl TransactionSigner for ApprovalSigner {
    fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    async fn sign_transactions(
        &self,
        transactions: Vec<VersionedTransaction>,
    ) -> Result<Vec<VersionedTransaction>, SigningError> {
        let (request, answer) = ApprovalRequest::new(
            self.wallet.clone(),
            self.pubkey,
            transactions
                .first()
                .and_then(|tx| tx.message.static_account_keys().first().copied()),
            transactions.len(),
        );

        self.prompt_tx
            .send(request)
            .map_err(|_| SigningError::Rejected("approval prompt unavailable".to_string()))?;
        debug!(wallet = %self.wallet, "Waiting for signature approval");

        match answer.await {
            Ok(true) => self.inner.sign_transactions(transactions).await,
            Ok(false) => Err(SigningError::Rejected("user rejected the request".to_string())),
            Err(_) => {
                warn!(wallet = %self.wallet, "Approval prompt dropped without an answer");
                Err(SigningError::Rejected("approval prompt closed".to_string()))
            }
        }
    }
}
