//! solana-send-tui: a terminal front-end for sending SOL.
//!
//! The library half exposes the non-UI layers:
//! - Wallet discovery and sessions backed by Solana CLI keypair files
//! - A single-flight transfer pipeline with stage reporting
//! - Shared RPC and websocket clients scoped by a connection provider

pub mod config;
pub mod domain;
pub mod infra;
