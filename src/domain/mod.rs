pub mod amount;
pub mod modal;
pub mod signer;
pub mod transfer;
pub mod wallet;
