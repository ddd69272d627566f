// Blocks and the chain, committed-balance replay, and link/hash integrity.
pub mod chain;
pub mod state;
pub mod validation;

pub use chain::*;
pub use state::*;
pub use validation::*;
