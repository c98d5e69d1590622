use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIRM_TIMEOUT_SECS;

#[derive(Parser, Debug)]
#[command(name = "solana-send-tui")]
#[command(version)]
#[command(about = "A terminal UI for sending SOL from a local keypair wallet")]
pub struct Args {
    /// Tick rate in ticks per second
    #[arg(short, long, default_value_t = 4.0)]
    pub tick_rate: f64,

    /// Frame rate in frames per second
    #[arg(short, long, default_value_t = 60.0)]
    pub frame_rate: f64,

    /// Cluster to connect to (devnet, testnet, mainnet, localnet)
    #[arg(short, long, default_value = "devnet")]
    pub network: String,

    /// Custom RPC URL (overrides network default)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Custom websocket URL (derived from the RPC URL when omitted)
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Commitment level to wait for (processed, confirmed, finalized)
    #[arg(long)]
    pub commitment: Option<String>,

    /// Seconds to wait for a transaction confirmation
    #[arg(long, default_value_t = DEFAULT_CONFIRM_TIMEOUT_SECS)]
    pub confirm_timeout: u64,

    /// Additional keypair file to offer as a wallet (repeatable)
    #[arg(short, long = "keypair")]
    pub keypairs: Vec<PathBuf>,

    /// Sign without asking for approval
    #[arg(long)]
    pub auto_approve: bool,

    /// Data directory path
    #[arg(long)]
    pub data_dir: Option<String>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
