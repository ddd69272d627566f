//! Staked validator roster: admission, stake-weighted leader election and
//! reputation tracking.

use crate::error::ChainError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum stake required to join the network.
pub const MIN_STAKE: u64 = 1000;
/// Reputation ceiling; new validators start here.
pub const MAX_REPUTATION: u32 = 100;
/// A validator whose reputation falls below this is deactivated.
pub const DEACTIVATION_THRESHOLD: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorNode {
    pub id: String,
    pub name: String,
    pub stake: u64,
    pub blocks_validated: u64,
    pub reputation: u32,
    pub is_active: bool,
    pub joined_at: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStats {
    pub total_validators: usize,
    pub active_validators: usize,
    pub total_stake: u64,
    pub total_blocks_validated: u64,
    pub current_leader: Option<ValidatorNode>,
    pub average_reputation: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ValidatorNetwork {
    // Insertion order matters: leader election walks validators in this order.
    validators: Vec<ValidatorNode>,
    current_leader: Option<String>,
}

impl ValidatorNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(&mut self, name: &str, stake: u64) -> Result<ValidatorNode, ChainError> {
        if stake < MIN_STAKE {
            return Err(ChainError::StakeTooLow {
                stake,
                min: MIN_STAKE,
            });
        }
        let total = self.total_stake();
        if total.checked_add(stake).is_none() {
            return Err(ChainError::StakeOverflow { stake, total });
        }

        let joined_at = chrono::Utc::now().timestamp_millis() as u64;
        let id = self.unique_id(name, joined_at);
        let validator = ValidatorNode {
            id,
            name: name.to_string(),
            stake,
            blocks_validated: 0,
            reputation: MAX_REPUTATION,
            is_active: true,
            joined_at,
        };

        info!(id = %validator.id, stake, "validator joined");
        self.validators.push(validator.clone());
        Ok(validator)
    }

    /// `validator_{name}_{base36 millis}`, suffixed when two joins land in the same millisecond.
    fn unique_id(&self, name: &str, joined_at: u64) -> String {
        let base = format!("validator_{}_{}", name, to_base36(joined_at));
        if self.get_validator(&base).is_none() {
            return base;
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.get_validator(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Sum of every stake on the roster. Admission keeps it within `u64`.
    pub fn total_stake(&self) -> u64 {
        self.validators.iter().map(|v| v.stake).sum()
    }

    pub fn remove_validator(&mut self, id: &str) -> bool {
        let before = self.validators.len();
        self.validators.retain(|v| v.id != id);
        let removed = self.validators.len() != before;
        if removed {
            info!(id, "validator removed");
        }
        removed
    }

    pub fn get_validator(&self, id: &str) -> Option<&ValidatorNode> {
        self.validators.iter().find(|v| v.id == id)
    }

    fn get_validator_mut(&mut self, id: &str) -> Option<&mut ValidatorNode> {
        self.validators.iter_mut().find(|v| v.id == id)
    }

    pub fn get_all_validators(&self) -> &[ValidatorNode] {
        &self.validators
    }

    pub fn active_validators(&self) -> impl Iterator<Item = &ValidatorNode> {
        self.validators.iter().filter(|v| v.is_active)
    }

    pub fn active_count(&self) -> usize {
        self.active_validators().count()
    }

    /// Stake-weighted draw over active validators. Draws `r` in
    /// `[0, total_active_stake)` and walks the roster subtracting stakes until
    /// `r <= 0`. Records the winner as the current leader.
    pub fn select_leader<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<ValidatorNode> {
        let active: Vec<&ValidatorNode> = self.active_validators().collect();
        let first = active.first()?;

        let total_stake: u64 = active.iter().map(|v| v.stake).sum();
        let mut r = rng.gen::<f64>() * total_stake as f64;

        let mut leader = *first;
        for validator in &active {
            r -= validator.stake as f64;
            if r <= 0.0 {
                leader = *validator;
                break;
            }
        }

        let leader = leader.clone();
        info!(id = %leader.id, stake = leader.stake, total_stake, "leader elected");
        self.current_leader = Some(leader.id.clone());
        Some(leader)
    }

    /// The most recently elected leader, if it is still on the roster.
    pub fn current_leader(&self) -> Option<&ValidatorNode> {
        self.current_leader
            .as_deref()
            .and_then(|id| self.get_validator(id))
    }

    /// Credit a successful validation. Unknown ids are ignored.
    pub fn record_block_validation(&mut self, id: &str) -> bool {
        match self.get_validator_mut(id) {
            Some(v) => {
                v.blocks_validated += 1;
                v.reputation = (v.reputation + 1).min(MAX_REPUTATION);
                true
            }
            None => false,
        }
    }

    /// Lower reputation (floored at 0); deactivates below the threshold.
    /// There is no automatic path back to active.
    pub fn penalize(&mut self, id: &str, amount: u32) -> Result<ValidatorNode, ChainError> {
        let validator = self
            .get_validator_mut(id)
            .ok_or_else(|| ChainError::ValidatorNotFound(id.to_string()))?;

        validator.reputation = validator.reputation.saturating_sub(amount);
        if validator.reputation < DEACTIVATION_THRESHOLD && validator.is_active {
            validator.is_active = false;
            warn!(id, reputation = validator.reputation, "validator deactivated");
        } else {
            info!(id, reputation = validator.reputation, "validator penalized");
        }
        Ok(validator.clone())
    }

    pub fn network_stats(&self) -> NetworkStats {
        let total_validators = self.validators.len();
        let average_reputation = if total_validators > 0 {
            let sum: f64 = self.validators.iter().map(|v| v.reputation as f64).sum();
            sum / total_validators as f64
        } else {
            0.0
        };

        NetworkStats {
            total_validators,
            active_validators: self.active_count(),
            total_stake: self.total_stake(),
            total_blocks_validated: self.validators.iter().map(|v| v.blocks_validated).sum(),
            current_leader: self.current_leader().cloned(),
            average_reputation,
        }
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
