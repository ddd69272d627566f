/// Transaction types for StakeChain
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Value moved by a transfer, in integral base units.
pub type Amount = i64;

/// Addresses are opaque strings handed out by the identity provider.
pub type Address = String;

/// A transfer proposed by a caller, before the chain has admitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

impl TransferRequest {
    pub fn new(from: impl Into<Address>, to: impl Into<Address>, amount: Amount) -> Self {
        TransferRequest {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

/// A transfer admitted to the chain. The id and timestamp are assigned by the
/// chain at admission time, never by the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Transaction {
    /// Admit a request: stamps it with a fresh random id and the current time.
    pub fn admit(request: TransferRequest) -> Self {
        Transaction {
            id: generate_transaction_id(),
            from: request.from,
            to: request.to,
            amount: request.amount,
            timestamp: chrono::Utc::now().timestamp_millis() as u64,
            signature: None,
        }
    }

    pub fn involves(&self, address: &str) -> bool {
        self.from == address || self.to == address
    }

    /// Feed every field that identifies this transaction into a block digest.
    pub fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.id.as_bytes());
        hasher.update(self.from.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.to.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        if let Some(signature) = &self.signature {
            hasher.update(signature.as_bytes());
        }
    }
}

/// 32 random bytes, hex encoded.
pub fn generate_transaction_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
