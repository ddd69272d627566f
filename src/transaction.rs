//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{
    check_structure, validate_batch, validate_transfer, BalanceSource, BatchValidation,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use std::collections::HashMap;

    fn balances(entries: &[(&str, Amount)]) -> HashMap<String, Amount> {
        entries.iter().map(|(a, b)| (a.to_string(), *b)).collect()
    }

    fn tx(from: &str, to: &str, amount: Amount) -> Transaction {
        Transaction::admit(TransferRequest::new(from, to, amount))
    }

    #[test]
    fn test_valid_transfer_with_sufficient_balance() {
        let state = balances(&[("alice", 50)]);
        assert!(TransferRequest::new("alice", "bob", 50).validate(&state).is_ok());
    }

    #[test]
    fn test_empty_addresses_rejected_first() {
        let state = balances(&[]);
        // Also has a non-positive amount, but the address rule runs first.
        let result = TransferRequest::new("", "bob", 0).validate(&state);
        assert_eq!(result, Err(ChainError::InvalidAddress));

        let result = TransferRequest::new("alice", "", 5).validate(&state);
        assert_eq!(result, Err(ChainError::InvalidAddress));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let state = balances(&[("alice", 100)]);
        assert_eq!(
            TransferRequest::new("alice", "bob", 0).validate(&state),
            Err(ChainError::NonPositiveAmount(0))
        );
        assert_eq!(
            TransferRequest::new("alice", "bob", -3).validate(&state),
            Err(ChainError::NonPositiveAmount(-3))
        );
    }

    #[test]
    fn test_insufficient_balance_rejected() {
        let state = balances(&[("alice", 9)]);
        assert_eq!(
            TransferRequest::new("alice", "bob", 10).validate(&state),
            Err(ChainError::InsufficientBalance {
                balance: 9,
                amount: 10
            })
        );
    }

    #[test]
    fn test_self_transfer_checked_after_balance() {
        // With no balance the balance rule wins.
        let empty = balances(&[]);
        assert!(matches!(
            TransferRequest::new("alice", "alice", 5).validate(&empty),
            Err(ChainError::InsufficientBalance { .. })
        ));

        let funded = balances(&[("alice", 5)]);
        assert_eq!(
            TransferRequest::new("alice", "alice", 5).validate(&funded),
            Err(ChainError::SelfTransfer)
        );
    }

    #[test]
    fn test_pending_spends_are_not_deducted() {
        // Two transactions that together exceed the balance each pass on their own.
        let state = balances(&[("alice", 10)]);
        let first = tx("alice", "bob", 8);
        let second = tx("alice", "carol", 8);
        assert!(first.validate(&state).is_ok());
        assert!(second.validate(&state).is_ok());
    }

    #[test]
    fn test_batch_validation_collects_every_failure() {
        let state = balances(&[("alice", 10)]);
        let ok = tx("alice", "bob", 5);
        let broke = tx("bob", "alice", 5);
        let zero = tx("alice", "bob", 0);

        let report = validate_batch(&[ok, broke.clone(), zero.clone()], &state);
        assert!(!report.valid);
        assert_eq!(report.invalid_transactions, vec![broke.id, zero.id]);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.error_kinds[0].kind(), "InsufficientBalance");
        assert_eq!(report.error_kinds[1].kind(), "NonPositiveAmount");
    }

    #[test]
    fn test_batch_validation_of_clean_set() {
        let state = balances(&[("alice", 10)]);
        let report = validate_batch(&[tx("alice", "bob", 10)], &state);
        assert!(report.valid);
        assert!(report.invalid_transactions.is_empty());
    }

    #[test]
    fn test_admission_assigns_unique_hex_ids() {
        let a = tx("alice", "bob", 1);
        let b = tx("alice", "bob", 1);
        assert_eq!(a.id.len(), 64);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.id, b.id);
        assert!(a.timestamp > 0);
    }

    #[test]
    fn test_structure_check_reports_invalid_transaction() {
        let err = check_structure(&TransferRequest::new("alice", "", 1)).unwrap_err();
        assert_eq!(err.kind(), "InvalidTransaction");
        assert!(check_structure(&TransferRequest::new("alice", "bob", 1)).is_ok());
    }
}
