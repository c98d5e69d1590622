pub mod keystore;
pub mod provider;
pub mod rpc;
