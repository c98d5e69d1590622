//! SOL transfer pipeline.
//!
//! A transfer runs as a sequence of stages, each reported through a callback
//! so the UI can show where it is:
//!
//! ```text
//! Idle -> Preparing -> FetchingBlockhash -> AwaitingSignature -> Submitting -> Confirmed
//!                 \______________________________________________________/
//!                                           |
//!                                        Failed { stage }
//! ```
//!
//! Only one transfer may be in flight per orchestrator. Callers take a
//! [`TransferTicket`] first; a second `begin()` fails until the ticket drops.

use std::{
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    message::{VersionedMessage, v0},
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use solana_system_interface::instruction as system_instruction;
use strum::Display;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::{
    amount::{AmountError, format_sol, parse_sol_amount},
    signer::{SigningError, TransactionSigner},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Wallet not connected or signer unavailable")]
    NotReady,
    #[error("A transfer is already in progress")]
    AlreadyInFlight,
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("Failed to fetch latest blockhash: {0}")]
    Blockhash(String),
    #[error("Failed to compile transaction: {0}")]
    Compile(String),
    #[error("{0}")]
    Signing(#[from] SigningError),
    #[error("Failed to open subscription: {0}")]
    Subscription(String),
    #[error("Failed to send transaction: {0}")]
    Submission(String),
    #[error("Transaction failed: {0}")]
    Confirmation(String),
    #[error("Transaction was not confirmed within {0}s")]
    ConfirmationTimeout(u64),
}

/// The ledger operations a transfer needs.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, TransferError>;

    /// Send a signed transaction and wait until it reaches `commitment`.
    async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, TransferError>;
}

/// User input for one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    /// Decimal SOL, e.g. "1.5".
    pub amount: String,
}

impl TransferRequest {
    pub fn new(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }
}

/// Sender account and signer, taken from the wallet session at submit time.
#[derive(Clone, Default)]
pub struct TransferContext {
    pub sender: Option<Pubkey>,
    pub signer: Option<Arc<dyn TransactionSigner>>,
}

impl TransferContext {
    pub fn is_ready(&self) -> bool {
        self.sender.is_some() && self.signer.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TransferStage {
    #[strum(to_string = "Preparing transaction")]
    Preparing,
    #[strum(to_string = "Fetching blockhash")]
    FetchingBlockhash,
    #[strum(to_string = "Awaiting wallet approval")]
    AwaitingSignature,
    #[strum(to_string = "Submitting")]
    Submitting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferPhase {
    #[default]
    Idle,
    InProgress(TransferStage),
    Confirmed {
        signature: String,
    },
    Failed {
        stage: TransferStage,
        error: String,
    },
}

impl TransferPhase {
    pub fn is_processing(&self) -> bool {
        matches!(self, TransferPhase::InProgress(_))
    }

    pub fn result(&self) -> TransferResult {
        match self {
            TransferPhase::Confirmed { signature } => TransferResult {
                error: None,
                signature: Some(signature.clone()),
            },
            TransferPhase::Failed { error, .. } => TransferResult {
                error: Some(error.clone()),
                signature: None,
            },
            _ => TransferResult::default(),
        }
    }
}

/// Outcome of a transfer as shown in the form.
///
/// Both fields are `None` until an attempt completes, then exactly one is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferResult {
    pub error: Option<String>,
    pub signature: Option<String>,
}

/// Build the system transfer message, paid for by the sender.
pub fn build_transfer_message(
    sender: &Pubkey,
    recipient: &Pubkey,
    lamports: u64,
    blockhash: Hash,
) -> Result<VersionedMessage, TransferError> {
    let instruction = system_instruction::transfer(sender, recipient, lamports);
    let message = v0::Message::try_compile(sender, &[instruction], &[], blockhash)
        .map_err(|e| TransferError::Compile(e.to_string()))?;
    Ok(VersionedMessage::V0(message))
}

/// Wrap a message in a transaction with an empty slot per required signer.
pub fn compile_transaction(message: VersionedMessage) -> VersionedTransaction {
    let required = message.header().num_required_signatures as usize;
    VersionedTransaction {
        signatures: vec![Signature::default(); required],
        message,
    }
}

/// Signature identifying the transaction: the fee payer's.
pub fn transaction_signature(tx: &VersionedTransaction) -> Option<Signature> {
    tx.signatures
        .first()
        .copied()
        .filter(|sig| *sig != Signature::default())
}

#[derive(Clone)]
pub struct TransferOrchestrator {
    commitment: CommitmentConfig,
    in_flight: Arc<AtomicBool>,
}

impl TransferOrchestrator {
    pub fn new(commitment: CommitmentConfig) -> Self {
        Self {
            commitment,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the single transfer slot.
    pub fn begin(&self) -> Result<TransferTicket, TransferError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TransferError::AlreadyInFlight)?;
        Ok(TransferTicket {
            commitment: self.commitment,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    /// Begin and run a transfer, collapsing the outcome into a result.
    pub async fn transfer(
        &self,
        ledger: &dyn LedgerClient,
        ctx: TransferContext,
        request: TransferRequest,
        on_phase: impl Fn(TransferPhase) + Send + Sync,
    ) -> TransferResult {
        match self.begin() {
            Ok(ticket) => ticket.run(ledger, ctx, request, on_phase).await.result(),
            Err(e) => TransferResult {
                error: Some(e.to_string()),
                signature: None,
            },
        }
    }
}

/// Exclusive right to run one transfer. Dropping it frees the slot.
pub struct TransferTicket {
    commitment: CommitmentConfig,
    in_flight: Arc<AtomicBool>,
}

impl Drop for TransferTicket {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

impl TransferTicket {
    /// Run the pipeline to completion and return the final phase.
    ///
    /// Every intermediate and the final phase are also passed to `on_phase`.
    pub async fn run(
        self,
        ledger: &dyn LedgerClient,
        ctx: TransferContext,
        request: TransferRequest,
        on_phase: impl Fn(TransferPhase) + Send + Sync,
    ) -> TransferPhase {
        let mut stage = TransferStage::Preparing;
        let report = |next: TransferStage| {
            debug!("Transfer stage: {}", next);
            on_phase(TransferPhase::InProgress(next));
        };

        let outcome = self
            .execute(ledger, ctx, &request, &mut stage, &report)
            .await;

        let phase = match outcome {
            Ok(signature) => {
                info!(%signature, recipient = %request.recipient, "Transfer confirmed");
                TransferPhase::Confirmed {
                    signature: signature.to_string(),
                }
            }
            Err(e) => {
                error!(%stage, recipient = %request.recipient, "Transfer failed: {}", e);
                TransferPhase::Failed {
                    stage,
                    error: e.to_string(),
                }
            }
        };
        on_phase(phase.clone());
        phase
    }

    async fn execute(
        &self,
        ledger: &dyn LedgerClient,
        ctx: TransferContext,
        request: &TransferRequest,
        stage: &mut TransferStage,
        report: &(impl Fn(TransferStage) + Send + Sync),
    ) -> Result<Signature, TransferError> {
        report(TransferStage::Preparing);
        let (sender, signer) = match (ctx.sender, ctx.signer) {
            (Some(sender), Some(signer)) => (sender, signer),
            _ => return Err(TransferError::NotReady),
        };

        let lamports = parse_sol_amount(&request.amount)?;
        let recipient = Pubkey::from_str(request.recipient.trim())
            .map_err(|e| TransferError::InvalidRecipient(e.to_string()))?;
        info!(%sender, %recipient, lamports, "Starting transfer of {}", format_sol(lamports));

        *stage = TransferStage::FetchingBlockhash;
        report(*stage);
        let blockhash = ledger.latest_blockhash().await?;

        let message = build_transfer_message(&sender, &recipient, lamports, blockhash)?;
        let transaction = compile_transaction(message);

        *stage = TransferStage::AwaitingSignature;
        report(*stage);
        let signed = signer
            .sign_transactions(vec![transaction])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                SigningError::Failed("wallet returned no transaction".to_string())
            })?;
        let signature = transaction_signature(&signed).ok_or_else(|| {
            SigningError::Failed("wallet returned an unsigned transaction".to_string())
        })?;

        *stage = TransferStage::Submitting;
        report(*stage);
        ledger.send_and_confirm(&signed, self.commitment).await?;

        Ok(signature)
    }
}
