//! Connection provider: builds the shared RPC handles once and makes them
//! available to everything running inside its scope.

use std::{
    future::Future,
    sync::{Arc, OnceLock},
    time::Duration,
};

use solana_sdk::commitment_config::CommitmentConfig;
use thiserror::Error;
use tracing::debug;

use crate::{
    config::Config,
    infra::rpc::{ConnectionHandles, Endpoints},
};

tokio::task_local! {
    static CONNECTION: Arc<ConnectionHandles>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("use_connection must be used within a ConnectionProvider")]
    NotWithinProvider,
}

pub struct ConnectionProvider {
    endpoints: Endpoints,
    commitment: CommitmentConfig,
    confirm_timeout: Duration,
    handles: OnceLock<Arc<ConnectionHandles>>,
}

impl ConnectionProvider {
    pub fn new(endpoints: Endpoints, commitment: CommitmentConfig, confirm_timeout: Duration) -> Self {
        Self {
            endpoints,
            commitment,
            confirm_timeout,
            handles: OnceLock::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Endpoints::from_config(config),
            config.commitment.to_config(),
            config.confirm_timeout(),
        )
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The shared handles, built on first call.
    pub fn handles(&self) -> Arc<ConnectionHandles> {
        Arc::clone(self.handles.get_or_init(|| {
            debug!(
                "Creating connection handles for {} / {}",
                self.endpoints.rpc_url, self.endpoints.ws_url
            );
            Arc::new(ConnectionHandles::new(
                &self.endpoints,
                self.commitment,
                self.confirm_timeout,
            ))
        }))
    }

    /// Point the provider at new endpoints. Handles are rebuilt lazily, and
    /// only if the endpoints differ.
    pub fn set_endpoints(&mut self, endpoints: Endpoints) {
        if self.endpoints != endpoints {
            self.endpoints = endpoints;
            self.handles = OnceLock::new();
        }
    }

    /// Run `future` with this provider's handles available to `use_connection`.
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        CONNECTION.scope(self.handles(), future).await
    }
}

/// Run `future` with the given handles installed, e.g. inside a spawned task.
pub async fn with_connection<F: Future>(handles: Arc<ConnectionHandles>, future: F) -> F::Output {
    CONNECTION.scope(handles, future).await
}

/// The handles of the enclosing provider scope.
pub fn use_connection() -> Result<Arc<ConnectionHandles>, ProviderError> {
    CONNECTION
        .try_with(Arc::clone)
        .map_err(|_| ProviderError::NotWithinProvider)
}
