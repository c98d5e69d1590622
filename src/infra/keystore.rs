use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, eyre};
use directories::BaseDirs;
use solana_sdk::signature::{Keypair, read_keypair_file};
use tracing::debug;

use crate::{
    config::get_data_dir,
    domain::wallet::{WalletDescriptor, WalletInfo},
};

/// Icon shown for the Solana CLI default keypair.
pub const SOLANA_CLI_ICON: char = '◎';

/// Path of the Solana CLI default keypair (`~/.config/solana/id.json`).
pub fn solana_cli_keypair_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(".config")
            .join("solana")
            .join("id.json")
    })
}

/// Directory scanned for additional keypair wallets.
pub fn wallets_dir() -> PathBuf {
    get_data_dir().join("wallets")
}

/// Discover the wallets available on this machine.
///
/// Order: Solana CLI default keypair, `*.json` files in the wallets directory
/// (sorted by name), then explicit paths. Missing files are skipped and each
/// path is listed once.
pub fn discover_wallets(
    cli_keypair: Option<&Path>,
    wallets_dir: &Path,
    extra: &[PathBuf],
) -> Vec<WalletDescriptor> {
    fn push(wallets: &mut Vec<WalletDescriptor>, path: PathBuf, info: WalletInfo) {
        if !path.is_file() || wallets.iter().any(|w| w.path == path) {
            return;
        }
        debug!("Found wallet {} at {}", info.name, path.display());
        wallets.push(WalletDescriptor { info, path });
    }

    let mut wallets = Vec::new();

    if let Some(path) = cli_keypair {
        push(
            &mut wallets,
            path.to_path_buf(),
            WalletInfo {
                name: "Solana CLI".to_string(),
                icon: Some(SOLANA_CLI_ICON),
            },
        );
    }

    let mut dir_entries: Vec<PathBuf> = std::fs::read_dir(wallets_dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default();
    dir_entries.sort();

    for path in dir_entries.into_iter().chain(extra.iter().cloned()) {
        let info = WalletInfo {
            name: wallet_name(&path),
            icon: None,
        };
        push(&mut wallets, path, info);
    }

    wallets
}

fn wallet_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load a keypair stored in the Solana CLI JSON format.
pub fn load_keypair(path: &Path) -> Result<Keypair> {
    read_keypair_file(path)
        .map_err(|e| eyre!("Failed to read keypair {}: {}", path.display(), e))
}
