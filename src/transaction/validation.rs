/// Validation logic for transactions separated from type definitions
use crate::error::ChainError;
use crate::transaction::types::{Amount, Transaction, TransferRequest};
use serde::Serialize;
use std::collections::HashMap;

/// Read access to committed balances. Validation never looks at pending
/// transactions, only at what is already in mined blocks.
pub trait BalanceSource {
    fn balance_of(&self, address: &str) -> Amount;
}

impl BalanceSource for HashMap<String, Amount> {
    fn balance_of(&self, address: &str) -> Amount {
        self.get(address).copied().unwrap_or(0)
    }
}

/// Check a transfer against committed state. Rules run in order and the first
/// failure wins: addresses, amount, balance, self-transfer.
pub fn validate_transfer(
    from: &str,
    to: &str,
    amount: Amount,
    state: &impl BalanceSource,
) -> Result<(), ChainError> {
    if from.is_empty() || to.is_empty() {
        return Err(ChainError::InvalidAddress);
    }

    if amount <= 0 {
        return Err(ChainError::NonPositiveAmount(amount));
    }

    let balance = state.balance_of(from);
    if balance < amount {
        return Err(ChainError::InsufficientBalance { balance, amount });
    }

    if from == to {
        return Err(ChainError::SelfTransfer);
    }

    Ok(())
}

/// Structural checks only (no balance). The chain repeats these on admission
/// and reports a violation as `InvalidTransaction`.
pub fn check_structure(request: &TransferRequest) -> Result<(), ChainError> {
    if request.from.is_empty() || request.to.is_empty() {
        return Err(ChainError::InvalidTransaction(
            "Transaction requires both sender and recipient addresses".to_string(),
        ));
    }
    if request.amount <= 0 {
        return Err(ChainError::InvalidTransaction(format!(
            "Transaction amount must be positive, got {}",
            request.amount
        )));
    }
    Ok(())
}

impl TransferRequest {
    pub fn validate(&self, state: &impl BalanceSource) -> Result<(), ChainError> {
        validate_transfer(&self.from, &self.to, self.amount, state)
    }
}

impl Transaction {
    pub fn validate(&self, state: &impl BalanceSource) -> Result<(), ChainError> {
        validate_transfer(&self.from, &self.to, self.amount, state)
    }
}

/// Outcome of validating a set of transactions. `invalid_transactions` and
/// `errors` are parallel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidation {
    pub valid: bool,
    pub invalid_transactions: Vec<String>,
    pub errors: Vec<String>,
    #[serde(skip)]
    pub error_kinds: Vec<ChainError>,
}

/// Validate every transaction independently; does not stop at the first failure.
pub fn validate_batch(
    transactions: &[Transaction],
    state: &impl BalanceSource,
) -> BatchValidation {
    let rejections = transactions
        .iter()
        .filter_map(|tx| tx.validate(state).err().map(|e| (tx.id.clone(), e)))
        .collect();
    BatchValidation::from_rejections(rejections)
}

impl BatchValidation {
    /// Build a report from `(transaction id, error)` pairs in the order found.
    pub fn from_rejections(rejections: Vec<(String, ChainError)>) -> Self {
        let (invalid_transactions, error_kinds): (Vec<_>, Vec<_>) =
            rejections.into_iter().unzip();
        BatchValidation {
            valid: invalid_transactions.is_empty(),
            errors: error_kinds.iter().map(|e| e.to_string()).collect(),
            invalid_transactions,
            error_kinds,
        }
    }
}
