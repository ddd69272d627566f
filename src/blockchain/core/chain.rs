use crate::error::ChainError;
use crate::mempool::TransactionPool;
use crate::transaction::{check_structure, Amount, BalanceSource, Transaction, TransferRequest};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::state::{net_flow, replay_balance};
use super::validation::first_invalid_block;

/// Previous-hash value carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Author label stamped on the genesis block.
pub const GENESIS_VALIDATOR: &str = "genesis";
/// Author used when the round-robin roster is empty.
pub const DEFAULT_AUTHOR: &str = "default-validator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub validator: Option<String>,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        validator: Option<String>,
    ) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        let mut block = Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            validator,
            hash: String::new(),
            nonce: 0,
        };
        block.seal();
        block
    }

    /// SHA-256 over index, previous hash, timestamp, transactions, nonce and author.
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            tx.hash_into(&mut hasher);
        }
        hasher.update(self.nonce.to_le_bytes());
        hasher.update(self.validator.as_deref().unwrap_or("").as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Recompute and store the hash from the current fields.
    pub fn seal(&mut self) {
        self.hash = self.calculate_hash();
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }
}

/// Summary returned by [`Blockchain::chain_info`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub length: usize,
    pub validator_count: usize,
    pub pending_count: usize,
    pub is_valid: bool,
    pub latest_block: Block,
}

#[derive(Debug, Clone)]
pub struct Blockchain {
    pub blocks: Vec<Block>,
    pub pending: TransactionPool,
    /// Round-robin block-author labels. Independent of the staked validator network.
    pub authors: Vec<String>,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain {
    pub fn new() -> Self {
        Self::with_pool(TransactionPool::new())
    }

    pub fn with_pool(pending: TransactionPool) -> Self {
        Blockchain {
            blocks: vec![Self::create_genesis_block()],
            pending,
            authors: Vec::new(),
        }
    }

    fn create_genesis_block() -> Block {
        Block::new(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            Some(GENESIS_VALIDATOR.to_string()),
        )
    }

    pub fn latest_block(&self) -> &Block {
        // The genesis block is pushed at construction, so the chain is never empty.
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get_block(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    /// Idempotent insert into the author roster. Returns false if already present.
    pub fn add_author(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.authors.contains(&label) {
            return false;
        }
        self.authors.push(label);
        true
    }

    /// Round-robin author for the next block, indexed by the current chain length.
    pub fn select_author(&self) -> String {
        if self.authors.is_empty() {
            return DEFAULT_AUTHOR.to_string();
        }
        let index = self.blocks.len() % self.authors.len();
        self.authors[index].clone()
    }

    /// Committed balance plus every pending transfer, without overflow.
    fn projected_balance(&self, address: &str) -> i128 {
        let committed = self.blocks.iter().flat_map(|b| b.transactions.iter());
        net_flow(committed.chain(self.pending.iter()), address)
    }

    /// Reject a transfer that would push either party's balance outside
    /// `Amount` once everything pending is mined.
    fn check_headroom(&self, request: &TransferRequest) -> Result<(), ChainError> {
        let amount = i128::from(request.amount);
        let sender = self.projected_balance(&request.from) - amount;
        let recipient = self.projected_balance(&request.to) + amount;
        if Amount::try_from(sender).is_err() || Amount::try_from(recipient).is_err() {
            return Err(ChainError::InvalidTransaction(format!(
                "Transfer of {} would overflow a balance",
                request.amount
            )));
        }
        Ok(())
    }

    /// Admit a transfer into the pending set after structural and range checks.
    /// The balance rule is the caller's concern (see `Ledger::create_transaction`).
    pub fn create_transaction(
        &mut self,
        request: TransferRequest,
    ) -> Result<Transaction, ChainError> {
        check_structure(&request)?;
        self.check_headroom(&request)?;
        let tx = Transaction::admit(request);
        self.pending.add(tx.clone())?;
        debug!(id = %tx.id, from = %tx.from, to = %tx.to, amount = tx.amount, "transaction staged");
        Ok(tx)
    }

    /// Seal every pending transaction into a new block and append it.
    pub fn mine_block(&mut self) -> Result<Block, ChainError> {
        if self.pending.is_empty() {
            return Err(ChainError::EmptyPool);
        }

        let author = self.select_author();
        let index = self.blocks.len() as u64;
        let previous_hash = self.latest_block().hash.clone();
        let transactions = self.pending.drain();

        let block = Block::new(index, previous_hash, transactions, Some(author));
        info!(
            index = block.index,
            transactions = block.transactions.len(),
            author = block.validator.as_deref().unwrap_or(""),
            hash = %block.hash,
            "block mined"
        );
        self.blocks.push(block.clone());
        Ok(block)
    }

    /// Replays every committed block; never cached.
    pub fn get_balance(&self, address: &str) -> Amount {
        replay_balance(&self.blocks, address)
    }

    pub fn is_valid(&self) -> bool {
        first_invalid_block(&self.blocks).is_none()
    }

    pub fn chain_info(&self) -> ChainInfo {
        ChainInfo {
            length: self.blocks.len(),
            validator_count: self.authors.len(),
            pending_count: self.pending.len(),
            is_valid: self.is_valid(),
            latest_block: self.latest_block().clone(),
        }
    }

    /// Locate a committed transaction and the index of its block.
    pub fn find_transaction(&self, id: &str) -> Option<(u64, &Transaction)> {
        self.blocks.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .find(|tx| tx.id == id)
                .map(|tx| (block.index, tx))
        })
    }

    /// Committed transactions that touch `address`, oldest first.
    pub fn history(&self, address: &str) -> Vec<(u64, Transaction)> {
        self.blocks
            .iter()
            .flat_map(|block| {
                block
                    .transactions
                    .iter()
                    .filter(|tx| tx.involves(address))
                    .map(move |tx| (block.index, tx.clone()))
            })
            .collect()
    }
}

impl BalanceSource for Blockchain {
    fn balance_of(&self, address: &str) -> Amount {
        self.get_balance(address)
    }
}
