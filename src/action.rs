use serde::{Deserialize, Serialize};
use strum::Display;

use crate::domain::transfer::{TransferPhase, TransferRequest};

/// Actions that can be triggered by user input or internal events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Tick,
    Resize(u16, u16),
    Suspend,
    Quit,
    Error(String),

    // Wallet dialog
    OpenWalletModal,
    CloseWalletModal,
    ConnectWallet(usize),
    DisconnectWallet,

    // Transfer
    SubmitTransfer(TransferRequest),
    TransferProgress(TransferPhase),
}
