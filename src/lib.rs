//! StakeChain - An in-memory proof-of-stake ledger
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Blockchain
//! - [`blockchain`] - Blocks, the chain and its integrity checks
//! - [`transaction`] - Transfer types and validation rules
//! - [`mempool`] - Bounded pool of pending transactions
//!
//! ## Consensus
//! - [`validators`] - Staked validator roster and leader election
//! - [`consensus`] - Vote sampling and the two-thirds ratification rule
//!
//! ## Identity
//! - [`wallet`] - Key pairs, addresses and signatures (secp256k1)
//!
//! ## Application
//! - [`ledger`] - One owned instance tying chain, roster and wallets together
//! - [`node`] - Runtime orchestration and block production
//! - [`api`] - REST API
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus
// ============================================================================
pub mod consensus;
pub mod validators;

// ============================================================================
// Identity
// ============================================================================
pub mod wallet;

// ============================================================================
// Application
// ============================================================================
pub mod ledger;
pub mod node;

#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
