//! Simplified BFT-style vote simulation over the staked validator network.
//!
//! Votes are not cryptographic: each active validator votes for a block with
//! probability `reputation / 100`, and a block is accepted once the tally
//! reaches a two-thirds supermajority.

use crate::blockchain::Block;
use crate::validators::{NetworkStats, ValidatorNetwork};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

pub const CONSENSUS_ALGORITHM: &str = "Tower BFT (simplified)";
pub const CONSENSUS_THRESHOLD: &str = "66%";

/// `floor(active * 2/3) + 1`
pub fn required_votes(active_validators: usize) -> usize {
    active_validators * 2 / 3 + 1
}

/// Tally of one simulated voting round. Ephemeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteResult {
    pub valid: bool,
    pub votes: usize,
    pub required: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusInfo {
    pub algorithm: &'static str,
    pub required_consensus: &'static str,
    pub required_votes: usize,
    #[serde(flatten)]
    pub network: NetworkStats,
}

/// Stateless: every round reads the roster it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusEngine;

impl ConsensusEngine {
    pub fn new() -> Self {
        ConsensusEngine
    }

    /// Run one voting round for `block` without touching the roster.
    pub fn validate_block<R: Rng + ?Sized>(
        &self,
        network: &ValidatorNetwork,
        block: &Block,
        rng: &mut R,
    ) -> VoteResult {
        let mut active = 0;
        let mut votes = 0;
        for validator in network.active_validators() {
            active += 1;
            let vote_chance = validator.reputation as f64 / 100.0;
            if rng.gen::<f64>() < vote_chance {
                votes += 1;
            }
        }

        let required = required_votes(active);
        let result = VoteResult {
            valid: votes >= required,
            votes,
            required,
        };

        if result.valid {
            info!(index = block.index, votes, required, "block ratified");
        } else {
            warn!(index = block.index, votes, required, "block failed to reach consensus");
        }
        result
    }

    /// Vote on `block`; on success credit the network's current leader.
    ///
    /// The credit goes to whoever the last `select_leader` call picked, not to
    /// the block's author label, so callers must elect and ratify under the
    /// same exclusive borrow (see `Ledger::process_block`).
    pub fn reach_consensus<R: Rng + ?Sized>(
        &self,
        network: &mut ValidatorNetwork,
        block: &Block,
        rng: &mut R,
    ) -> bool {
        let result = self.validate_block(network, block, rng);

        if result.valid {
            if let Some(leader_id) = network.current_leader().map(|v| v.id.clone()) {
                network.record_block_validation(&leader_id);
            }
        }

        result.valid
    }

    pub fn info(&self, network: &ValidatorNetwork) -> ConsensusInfo {
        let stats = network.network_stats();
        ConsensusInfo {
            algorithm: CONSENSUS_ALGORITHM,
            required_consensus: CONSENSUS_THRESHOLD,
            required_votes: required_votes(stats.active_validators),
            network: stats,
        }
    }
}
