use std::{path::PathBuf, time::Duration};

use color_eyre::eyre::{Result, eyre};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use strum::{Display, EnumString};

/// Default time to wait for a confirmation notification.
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 60;

/// Get the data directory for the application.
pub fn get_data_dir() -> PathBuf {
    if let Ok(s) = std::env::var("SOLANA_SEND_DATA") {
        PathBuf::from(s)
    } else if let Some(proj_dirs) = ProjectDirs::from("com", "solana-send", "solana-send") {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

/// Finality level a transfer must reach before it is reported as confirmed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_config(self) -> CommitmentConfig {
        let commitment = match self {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        };
        CommitmentConfig { commitment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc_url: String,
    pub ws_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub commitment: Commitment,
    pub confirm_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::devnet()
    }
}

impl Config {
    /// Create config from CLI args.
    pub fn new(
        network: &str,
        rpc_url: Option<&str>,
        ws_url: Option<&str>,
        commitment: Option<&str>,
    ) -> Result<Self> {
        let mut config = Self::from_network(network);
        if let Some(url) = rpc_url {
            config.network.rpc_url = url.to_string();
            config.network.ws_url = websocket_url_for(url)?;
        }
        if let Some(url) = ws_url {
            config.network.ws_url = url.to_string();
        }
        if let Some(level) = commitment {
            config.commitment = level
                .parse()
                .map_err(|_| eyre!("Unknown commitment level: {}", level))?;
        }
        Ok(config)
    }

    pub fn mainnet() -> Self {
        Self::preset(
            "mainnet",
            "https://api.mainnet-beta.solana.com",
            "wss://api.mainnet-beta.solana.com",
        )
    }

    pub fn testnet() -> Self {
        Self::preset(
            "testnet",
            "https://api.testnet.solana.com",
            "wss://api.testnet.solana.com",
        )
    }

    pub fn devnet() -> Self {
        Self::preset(
            "devnet",
            "https://api.devnet.solana.com",
            "wss://api.devnet.solana.com",
        )
    }

    pub fn localnet() -> Self {
        Self::preset("localnet", "http://127.0.0.1:8899", "ws://127.0.0.1:8900")
    }

    pub fn from_network(network: &str) -> Self {
        match network {
            "mainnet" | "mainnet-beta" => Self::mainnet(),
            "testnet" => Self::testnet(),
            "localnet" | "localhost" => Self::localnet(),
            _ => Self::devnet(),
        }
    }

    pub fn with_confirm_timeout(mut self, secs: u64) -> Self {
        self.confirm_timeout_secs = secs;
        self
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    fn preset(name: &str, rpc_url: &str, ws_url: &str) -> Self {
        Self {
            network: NetworkConfig {
                name: name.to_string(),
                rpc_url: rpc_url.to_string(),
                ws_url: ws_url.to_string(),
            },
            commitment: Commitment::default(),
            confirm_timeout_secs: DEFAULT_CONFIRM_TIMEOUT_SECS,
        }
    }
}

/// Derive the pubsub URL for an RPC URL.
///
/// `http` becomes `ws` and `https` becomes `wss`. An explicit port is bumped
/// by one, matching the validator's default RPC/pubsub port pair.
pub fn websocket_url_for(rpc_url: &str) -> Result<String> {
    let (scheme, rest) = rpc_url
        .split_once("://")
        .ok_or_else(|| eyre!("Invalid RPC URL: {}", rpc_url))?;
    let ws_scheme = match scheme {
        "http" => "ws",
        "https" => "wss",
        other => return Err(eyre!("Unsupported RPC URL scheme: {}", other)),
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let authority = match authority
        .rsplit_once(':')
        .and_then(|(host, port)| Some((host, port.parse::<u16>().ok()?)))
    {
        Some((host, port)) => format!("{}:{}", host, port.saturating_add(1)),
        None => authority.to_string(),
    };

    Ok(format!("{}://{}{}", ws_scheme, authority, path))
}
