//! Application state: one chain, one validator network, one consensus engine
//! and the randomness they share, behind a single owner.
//!
//! Every mutating operation takes `&mut self`, so wrapping a `Ledger` in one
//! lock (as `node::Node` does) serializes submissions against block
//! production and keeps leader election and ratification in the same
//! critical section.

use crate::blockchain::{BalanceSheet, Block, Blockchain, ChainInfo};
use crate::config::Config;
use crate::consensus::{ConsensusEngine, ConsensusInfo};
use crate::error::ChainError;
use crate::transaction::{Amount, BatchValidation, Transaction, TransferRequest};
use crate::validators::{NetworkStats, ValidatorNetwork, ValidatorNode};
use crate::wallet::{Wallet, WalletInfo, WalletRegistry};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

/// Reserved sender for funding transfers. Its balance goes negative by
/// exactly the amount it has issued.
pub const FAUCET_ADDRESS: &str = "faucet";

/// Result of one produce-and-ratify round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedBlock {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: usize,
    pub hash: String,
    pub validator: Option<String>,
    pub leader: Option<String>,
    pub consensus_reached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TransactionStatus {
    Pending,
    Committed {
        #[serde(rename = "blockIndex")]
        block_index: u64,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionLookup {
    pub transaction: Transaction,
    #[serde(flatten)]
    pub status: TransactionStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub block_index: u64,
    pub transaction: Transaction,
}

pub struct Ledger {
    chain: Blockchain,
    network: ValidatorNetwork,
    consensus: ConsensusEngine,
    wallets: WalletRegistry,
    rng: StdRng,
}

impl Ledger {
    /// Empty rosters, randomness from `rng`.
    pub fn new(rng: StdRng) -> Self {
        Ledger {
            chain: Blockchain::new(),
            network: ValidatorNetwork::new(),
            consensus: ConsensusEngine::new(),
            wallets: WalletRegistry::new(),
            rng,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Fresh process state: seed validators and author labels from the
    /// genesis section, randomness from the configured seed or OS entropy.
    pub fn from_config(config: &Config) -> Result<Self, ChainError> {
        let rng = match config.consensus.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ledger = Self::new(rng);

        for seed in &config.genesis.validators {
            ledger.add_validator_to_network(&seed.name, seed.stake)?;
        }
        for author in &config.genesis.authors {
            ledger.add_author(author);
        }

        info!(
            validators = config.genesis.validators.len(),
            authors = config.genesis.authors.len(),
            "ledger initialised"
        );
        Ok(ledger)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Validate against committed balances, then stage on the chain.
    pub fn create_transaction(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
    ) -> Result<Transaction, ChainError> {
        let request = TransferRequest::new(from, to, amount);
        if let Err(e) = request.validate(&self.chain) {
            warn!(from, to, amount, kind = e.kind(), "transaction rejected");
            return Err(e);
        }

        let tx = self.chain.create_transaction(request)?;
        info!(id = %tx.id, from, to, amount, "transaction accepted");
        Ok(tx)
    }

    /// Issue new value from the faucet. Skips the balance rule but not the
    /// structural checks.
    pub fn fund(&mut self, address: &str, amount: Amount) -> Result<Transaction, ChainError> {
        let tx = self
            .chain
            .create_transaction(TransferRequest::new(FAUCET_ADDRESS, address, amount))?;
        info!(id = %tx.id, to = address, amount, "faucet transfer staged");
        Ok(tx)
    }

    pub fn pending(&self, limit: Option<usize>) -> Vec<Transaction> {
        self.chain.pending.list(limit)
    }

    pub fn pending_count(&self) -> usize {
        self.chain.pending.len()
    }

    /// Replay the pending set in order on top of committed balances and flag
    /// every transfer that would overdraw its sender at that point. Faucet
    /// issuance is applied but never flagged.
    pub fn audit_pending(&self) -> BatchValidation {
        let mut sheet = BalanceSheet::replay(&self.chain.blocks);
        let mut rejected = Vec::new();

        for tx in self.chain.pending.iter() {
            if tx.from != FAUCET_ADDRESS {
                if let Err(e) = tx.validate(&sheet) {
                    rejected.push((tx.id.clone(), e));
                    continue;
                }
            }
            sheet.apply(tx);
        }

        BatchValidation::from_rejections(rejected)
    }

    pub fn evict_pending(&mut self, ids: &[String]) -> usize {
        let removed = self.chain.pending.remove(ids);
        if removed > 0 {
            info!(removed, "pending transactions evicted");
        }
        removed
    }

    /// Pending first, then committed.
    pub fn find_transaction(&self, id: &str) -> Option<TransactionLookup> {
        if let Some(tx) = self.chain.pending.get(id) {
            return Some(TransactionLookup {
                transaction: tx.clone(),
                status: TransactionStatus::Pending,
            });
        }
        self.chain
            .find_transaction(id)
            .map(|(block_index, tx)| TransactionLookup {
                transaction: tx.clone(),
                status: TransactionStatus::Committed { block_index },
            })
    }

    pub fn transaction_history(&self, address: &str) -> Vec<HistoryEntry> {
        self.chain
            .history(address)
            .into_iter()
            .map(|(block_index, transaction)| HistoryEntry {
                block_index,
                transaction,
            })
            .collect()
    }

    // ========================================================================
    // Blocks
    // ========================================================================

    pub fn mine_block(&mut self) -> Result<Block, ChainError> {
        self.chain.mine_block()
    }

    pub fn reach_consensus(&mut self, block: &Block) -> bool {
        self.consensus
            .reach_consensus(&mut self.network, block, &mut self.rng)
    }

    /// Elect a leader, mine every pending transaction, then vote on the block.
    /// Fails with `EmptyPool` before any leader is elected.
    pub fn process_block(&mut self) -> Result<ProcessedBlock, ChainError> {
        if self.chain.pending.is_empty() {
            return Err(ChainError::EmptyPool);
        }

        let leader = self.network.select_leader(&mut self.rng);
        let block = self.chain.mine_block()?;
        let consensus_reached = self.reach_consensus(&block);

        Ok(ProcessedBlock {
            index: block.index,
            timestamp: block.timestamp,
            transactions: block.transactions.len(),
            hash: block.hash,
            validator: block.validator,
            leader: leader.map(|l| l.name),
            consensus_reached,
        })
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain.blocks
    }

    pub fn get_block(&self, index: u64) -> Result<&Block, ChainError> {
        self.chain.get_block(index).ok_or(ChainError::BlockNotFound(index))
    }

    pub fn chain_info(&self) -> ChainInfo {
        self.chain.chain_info()
    }

    pub fn is_valid(&self) -> bool {
        self.chain.is_valid()
    }

    pub fn add_author(&mut self, label: &str) -> bool {
        self.chain.add_author(label)
    }

    // ========================================================================
    // Balances
    // ========================================================================

    pub fn get_balance(&self, address: &str) -> Amount {
        self.chain.get_balance(address)
    }

    pub fn balances(&self) -> BalanceSheet {
        BalanceSheet::replay(&self.chain.blocks)
    }

    // ========================================================================
    // Validator network & consensus
    // ========================================================================

    pub fn add_validator_to_network(
        &mut self,
        name: &str,
        stake: u64,
    ) -> Result<ValidatorNode, ChainError> {
        self.network.add_validator(name, stake)
    }

    pub fn penalize_validator(
        &mut self,
        id: &str,
        amount: u32,
    ) -> Result<ValidatorNode, ChainError> {
        self.network.penalize(id, amount)
    }

    pub fn remove_validator(&mut self, id: &str) -> Result<(), ChainError> {
        if self.network.remove_validator(id) {
            Ok(())
        } else {
            Err(ChainError::ValidatorNotFound(id.to_string()))
        }
    }

    pub fn get_all_validators(&self) -> &[ValidatorNode] {
        self.network.get_all_validators()
    }

    pub fn get_validator(&self, id: &str) -> Option<&ValidatorNode> {
        self.network.get_validator(id)
    }

    pub fn current_leader(&self) -> Option<&ValidatorNode> {
        self.network.current_leader()
    }

    pub fn network_stats(&self) -> NetworkStats {
        self.network.network_stats()
    }

    pub fn consensus_info(&self) -> ConsensusInfo {
        self.consensus.info(&self.network)
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    pub fn create_wallet(&mut self, name: Option<String>) -> WalletInfo {
        self.wallets.create(name)
    }

    pub fn wallet(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }
}
