// Re-export module: block modelling and chain management live in
// `blockchain/core/`, split into chain, balance state and integrity checks.

pub mod core;
pub use core::*;
