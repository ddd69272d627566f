use crate::transaction::{Amount, BalanceSource, Transaction};
use serde::Serialize;
use std::collections::HashMap;

use super::chain::Block;

/// Net effect of `tx` on `address`, widened so sums of full-range amounts
/// cannot overflow.
fn delta(tx: &Transaction, address: &str) -> i128 {
    let mut net = 0;
    if tx.from == address {
        net -= i128::from(tx.amount);
    }
    if tx.to == address {
        net += i128::from(tx.amount);
    }
    net
}

/// Clamp a widened balance back into `Amount`. Admission keeps balances in
/// range, so this only saturates after pending entries were evicted out of
/// their admission order.
pub fn narrow(balance: i128) -> Amount {
    Amount::try_from(balance).unwrap_or(if balance > 0 { Amount::MAX } else { Amount::MIN })
}

/// Exact credits minus debits for `address` across `transactions`.
pub fn net_flow<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
    address: &str,
) -> i128 {
    transactions.into_iter().map(|tx| delta(tx, address)).sum()
}

/// Sum of credits minus debits for `address` across every committed block.
pub fn replay_balance(blocks: &[Block], address: &str) -> Amount {
    narrow(net_flow(blocks.iter().flat_map(|b| b.transactions.iter()), address))
}

/// Every address's committed balance, rebuilt from scratch in one pass.
///
/// Used where many balances are needed at once (batch audits, dashboards);
/// single lookups go through [`replay_balance`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalanceSheet {
    balances: HashMap<String, i128>,
}

impl BalanceSheet {
    pub fn replay(blocks: &[Block]) -> Self {
        let mut sheet = BalanceSheet::default();
        for tx in blocks.iter().flat_map(|b| b.transactions.iter()) {
            sheet.apply(tx);
        }
        sheet
    }

    /// Debit the sender and credit the recipient of `tx`.
    pub fn apply(&mut self, tx: &Transaction) {
        let amount = i128::from(tx.amount);
        *self.balances.entry(tx.from.clone()).or_insert(0) -= amount;
        *self.balances.entry(tx.to.clone()).or_insert(0) += amount;
    }

    pub fn get_balance(&self, address: &str) -> Amount {
        self.balances.get(address).copied().map_or(0, narrow)
    }

    /// Addresses sorted by balance, largest first.
    pub fn ranked(&self) -> Vec<(String, Amount)> {
        let mut entries: Vec<_> = self
            .balances
            .iter()
            .map(|(a, b)| (a.clone(), narrow(*b)))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

impl BalanceSource for BalanceSheet {
    fn balance_of(&self, address: &str) -> Amount {
        self.get_balance(address)
    }
}
