//! Live transfer against `solana-test-validator` on the default ports.
//!
//! Run with `cargo test --test integration -- --ignored` while a validator is up.

use std::{sync::Arc, time::Duration};

use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solana_send_tui::{
    config::Config,
    domain::{
        signer::{KeypairSigner, TransactionSigner},
        transfer::{TransferContext, TransferOrchestrator, TransferRequest},
    },
    infra::provider::{ConnectionProvider, use_connection},
};

const AIRDROP_LAMPORTS: u64 = 2_000_000_000;

async fn wait_for(rpc: &RpcClient, sig: &Signature) {
    for _ in 0..60 {
        if rpc.confirm_transaction(sig).await.unwrap_or(false) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    panic!("airdrop {} was not confirmed", sig);
}

#[tokio::test]
#[ignore = "needs a running solana-test-validator"]
async fn test_localnet_transfer() {
    let config = Config::localnet().with_confirm_timeout(30);
    let provider = ConnectionProvider::from_config(&config);
    let orchestrator = TransferOrchestrator::new(config.commitment.to_config());

    let sender = Keypair::new();
    let recipient = Pubkey::new_unique();

    let result = provider
        .scope(async {
            let handles = use_connection().unwrap();

            let airdrop = handles
                .rpc
                .request_airdrop(&sender.pubkey(), AIRDROP_LAMPORTS)
                .await
                .expect("airdrop request");
            wait_for(&handles.rpc, &airdrop).await;

            let signer: Arc<dyn TransactionSigner> =
                Arc::new(KeypairSigner::new(sender.insecure_clone()));
            let ctx = TransferContext {
                sender: Some(sender.pubkey()),
                signer: Some(signer),
            };
            orchestrator
                .transfer(
                    &*handles,
                    ctx,
                    TransferRequest::new(recipient.to_string(), "1.5"),
                    |phase| println!("{:?}", phase),
                )
                .await
        })
        .await;

    assert_eq!(result.error, None);
    assert!(result.signature.is_some());

    let balance = provider
        .handles()
        .rpc
        .get_balance(&recipient)
        .await
        .expect("recipient balance");
    assert_eq!(balance, 1_500_000_000);
}
