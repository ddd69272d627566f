use super::chain::Block;

/// Index of the first block whose stored hash is stale or whose previous-hash
/// link does not match its predecessor. `None` when the chain is intact.
///
/// Read-only: nothing is repaired.
pub fn first_invalid_block(blocks: &[Block]) -> Option<u64> {
    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        if !current.has_valid_hash() {
            return Some(current.index);
        }

        if current.previous_hash != previous.hash {
            return Some(current.index);
        }
    }
    None
}
