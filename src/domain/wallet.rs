//! Wallet session: which wallets exist, which one is connected, and the
//! signer the transfer pipeline should use.

use std::{path::PathBuf, sync::Arc};

use color_eyre::eyre::{Result, eyre};
use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::{
    domain::{
        signer::{ApprovalRequest, ApprovalSigner, KeypairSigner, TransactionSigner},
        transfer::TransferContext,
    },
    infra::keystore,
};

/// Display metadata for a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub name: String,
    pub icon: Option<char>,
}

impl WalletInfo {
    /// Glyph shown next to the wallet name: the icon, else the first letter.
    pub fn avatar(&self) -> char {
        self.icon
            .or_else(|| self.name.chars().next())
            .unwrap_or('W')
    }
}

/// A wallet found on disk that can be connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub info: WalletInfo,
    pub path: PathBuf,
}

struct ConnectedWallet {
    index: usize,
    info: WalletInfo,
    signer: Arc<dyn TransactionSigner>,
}

pub struct WalletSession {
    wallets: Vec<WalletDescriptor>,
    connected: Option<ConnectedWallet>,
    approvals: Option<UnboundedSender<ApprovalRequest>>,
}

impl WalletSession {
    /// Create a session over the given wallets.
    ///
    /// With `approvals` set, every signature request is routed through the
    /// approval prompt before the keypair signs.
    pub fn new(
        wallets: Vec<WalletDescriptor>,
        approvals: Option<UnboundedSender<ApprovalRequest>>,
    ) -> Self {
        Self {
            wallets,
            connected: None,
            approvals,
        }
    }

    pub fn wallets(&self) -> &[WalletDescriptor] {
        &self.wallets
    }

    /// Connect the wallet at `index`, replacing any current connection.
    pub fn connect(&mut self, index: usize) -> Result<WalletInfo> {
        let descriptor = self
            .wallets
            .get(index)
            .ok_or_else(|| eyre!("Wallet index {} out of bounds", index))?;
        let keypair = keystore::load_keypair(&descriptor.path)?;
        let info = descriptor.info.clone();

        let keypair_signer: Arc<dyn TransactionSigner> = Arc::new(KeypairSigner::new(keypair));
        let signer: Arc<dyn TransactionSigner> = match &self.approvals {
            Some(prompt_tx) => Arc::new(ApprovalSigner::new(
                info.name.clone(),
                keypair_signer,
                prompt_tx.clone(),
            )),
            None => keypair_signer,
        };

        info!("Connected wallet {} ({})", info.name, signer.pubkey());
        self.connected = Some(ConnectedWallet {
            index,
            info: info.clone(),
            signer,
        });
        Ok(info)
    }

    pub fn disconnect(&mut self) {
        if let Some(wallet) = self.connected.take() {
            info!("Disconnected wallet {}", wallet.info.name);
        }
    }

    pub fn account(&self) -> Option<Pubkey> {
        self.connected.as_ref().map(|w| w.signer.pubkey())
    }

    /// Position of the connected wallet in [`Self::wallets`].
    pub fn connected_index(&self) -> Option<usize> {
        self.connected.as_ref().map(|w| w.index)
    }

    pub fn wallet_info(&self) -> Option<&WalletInfo> {
        self.connected.as_ref().map(|w| &w.info)
    }

    pub fn signer(&self) -> Option<Arc<dyn TransactionSigner>> {
        self.connected.as_ref().map(|w| Arc::clone(&w.signer))
    }

    /// Both an account and a signer are available.
    pub fn is_ready(&self) -> bool {
        self.account().is_some() && self.signer().is_some()
    }

    pub fn transfer_context(&self) -> TransferContext {
        TransferContext {
            sender: self.account(),
            signer: self.signer(),
        }
    }
}
