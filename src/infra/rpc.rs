use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use solana_client::{
    nonblocking::{pubsub_client::PubsubClient, rpc_client::RpcClient},
    rpc_config::{RpcSendTransactionConfig, RpcSignatureSubscribeConfig},
    rpc_response::{ProcessedSignatureResult, Response as RpcResponse, RpcSignatureResult},
};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    signature::Signature,
    transaction::{TransactionError, VersionedTransaction},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    domain::transfer::{LedgerClient, TransferError, transaction_signature},
};

/// HTTP and websocket endpoints of a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub rpc_url: String,
    pub ws_url: String,
}

impl Endpoints {
    pub fn from_config(config: &Config) -> Self {
        Self {
            rpc_url: config.network.rpc_url.clone(),
            ws_url: config.network.ws_url.clone(),
        }
    }
}

/// Websocket client that connects on first use.
pub struct SubscriptionClient {
    url: String,
    client: Mutex<Option<Arc<PubsubClient>>>,
    generation: AtomicU64,
}

impl SubscriptionClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of times the cached connection has been dropped.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Get the connected client, opening the websocket if needed.
    pub async fn client(&self, connect_timeout: Duration) -> Result<Arc<PubsubClient>, TransferError> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(Arc::clone(client));
        }
        debug!(generation = self.generation(), "Opening websocket to {}", self.url);
        let client = match tokio::time::timeout(connect_timeout, PubsubClient::new(&self.url)).await
        {
            Ok(Ok(client)) => Arc::new(client),
            Ok(Err(e)) => {
                return Err(TransferError::Subscription(format!(
                    "websocket {}: {}",
                    self.url, e
                )));
            }
            Err(_) => {
                warn!("Websocket {} did not connect within {:?}", self.url, connect_timeout);
                return Err(TransferError::Subscription(format!(
                    "websocket {}: timed out after {}s",
                    self.url,
                    connect_timeout.as_secs()
                )));
            }
        };
        *guard = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Drop the cached connection so the next call reconnects.
    pub async fn reset(&self) {
        self.client.lock().await.take();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// How a signature subscription ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Confirmation {
    Processed(Option<TransactionError>),
    Closed,
    TimedOut,
}

/// Wait for the first processed notification on `notifications`.
async fn await_confirmation<S>(notifications: S, timeout: Duration) -> Confirmation
where
    S: Stream<Item = RpcResponse<RpcSignatureResult>>,
{
    let wait = async move {
        let mut notifications = std::pin::pin!(notifications);
        while let Some(response) = notifications.next().await {
            if let RpcSignatureResult::ProcessedSignature(ProcessedSignatureResult { err }) =
                response.value
            {
                return Confirmation::Processed(err);
            }
        }
        Confirmation::Closed
    };
    tokio::time::timeout(timeout, wait)
        .await
        .unwrap_or(Confirmation::TimedOut)
}

/// Sends a transaction and waits for its confirmation notification.
#[derive(Clone)]
pub struct SendAndConfirm {
    rpc: Arc<RpcClient>,
    subscriptions: Arc<SubscriptionClient>,
    timeout: Duration,
}

impl SendAndConfirm {
    pub fn new(
        rpc: Arc<RpcClient>,
        subscriptions: Arc<SubscriptionClient>,
        timeout: Duration,
    ) -> Self {
        Self {
            rpc,
            subscriptions,
            timeout,
        }
    }

    pub async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, TransferError> {
        let signature = transaction_signature(transaction)
            .ok_or_else(|| TransferError::Submission("transaction is not signed".to_string()))?;

        // Subscribe before sending so the notification cannot be missed.
        let pubsub = self.subscriptions.client(self.timeout).await?;
        let subscribe_config = RpcSignatureSubscribeConfig {
            commitment: Some(commitment),
            enable_received_notification: Some(false),
        };
        let (notifications, unsubscribe) = match pubsub
            .signature_subscribe(&signature, Some(subscribe_config))
            .await
        {
            Ok(subscription) => subscription,
            Err(e) => {
                self.subscriptions.reset().await;
                return Err(TransferError::Subscription(format!(
                    "signature subscription failed: {}",
                    e
                )));
            }
        };

        let send_config = RpcSendTransactionConfig {
            preflight_commitment: Some(commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        if let Err(e) = self
            .rpc
            .send_transaction_with_config(transaction, send_config)
            .await
        {
            unsubscribe().await;
            return Err(TransferError::Submission(e.to_string()));
        }
        info!(%signature, ?commitment, "Transaction sent, awaiting confirmation");

        let confirmation = await_confirmation(notifications, self.timeout).await;
        unsubscribe().await;
        self.settle(signature, confirmation).await
    }

    async fn settle(
        &self,
        signature: Signature,
        confirmation: Confirmation,
    ) -> Result<Signature, TransferError> {
        match confirmation {
            Confirmation::Processed(None) => Ok(signature),
            Confirmation::Processed(Some(err)) => {
                Err(TransferError::Confirmation(format!("{:?}", err)))
            }
            Confirmation::Closed => {
                self.subscriptions.reset().await;
                Err(TransferError::Confirmation(
                    "subscription closed before confirmation".to_string(),
                ))
            }
            Confirmation::TimedOut => {
                warn!(%signature, "Confirmation timed out after {:?}", self.timeout);
                Err(TransferError::ConfirmationTimeout(self.timeout.as_secs()))
            }
        }
    }
}

/// The long-lived clients shared by every consumer.
pub struct ConnectionHandles {
    pub rpc: Arc<RpcClient>,
    pub subscriptions: Arc<SubscriptionClient>,
    pub send_and_confirm: SendAndConfirm,
}

impl ConnectionHandles {
    /// Build the clients. No network I/O happens here.
    pub fn new(endpoints: &Endpoints, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let rpc = Arc::new(RpcClient::new_with_commitment(
            endpoints.rpc_url.clone(),
            commitment,
        ));
        let subscriptions = Arc::new(SubscriptionClient::new(endpoints.ws_url.clone()));
        let send_and_confirm =
            SendAndConfirm::new(Arc::clone(&rpc), Arc::clone(&subscriptions), timeout);
        Self {
            rpc,
            subscriptions,
            send_and_confirm,
        }
    }

    /// Get the RPC URL.
    pub fn rpc_url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl LedgerClient for ConnectionHandles {
    async fn latest_blockhash(&self) -> Result<Hash, TransferError> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| TransferError::Blockhash(e.to_string()))
    }

    async fn send_and_confirm(
        &self,
        transaction: &VersionedTransaction,
        commitment: CommitmentConfig,
    ) -> Result<Signature, TransferError> {
        self.send_and_confirm
            .send_and_confirm(transaction, commitment)
            .await
    }
}
