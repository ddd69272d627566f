//! Identity provider: secp256k1 key pairs, addresses and message signing.
//!
//! Transaction admission never requires a signature; signing is offered to
//! callers that want to attach one.

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Hex SHA-256 of the compressed public key.
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.public_key.serialize()))
    }

    /// Signs a message (hashed with SHA-256 first) and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; 64], ChainError> {
        let digest = Sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::Crypto(format!("Failed to create message: {}", e)))?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

/// Verifies a hex-encoded compact signature against a hex-encoded compressed public key.
pub fn verify_signature(
    public_key_hex: &str,
    message: &[u8],
    signature_hex: &str,
) -> Result<(), ChainError> {
    let public_key_bytes = hex::decode(public_key_hex)
        .map_err(|e| ChainError::Crypto(format!("Invalid public key hex: {}", e)))?;
    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| ChainError::Crypto(format!("Invalid signature hex: {}", e)))?;

    let public_key = PublicKey::from_slice(&public_key_bytes)
        .map_err(|e| ChainError::Crypto(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_compact(&signature_bytes)
        .map_err(|e| ChainError::Crypto(format!("Invalid signature: {}", e)))?;

    let digest = Sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::Crypto(format!("Failed to create message: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .map_err(|e| ChainError::Crypto(format!("Signature verification failed: {}", e)))
}

#[derive(Debug, Clone)]
pub struct Wallet {
    pub name: Option<String>,
    pub address: String,
    keypair: KeyPair,
}

/// Public view of a wallet handed back to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletInfo {
    pub address: String,
    pub public_key: String,
}

impl Wallet {
    /// Named wallets get `{name}_{16 hex}`; anonymous ones 32 hex characters.
    pub fn new(name: Option<String>) -> Self {
        let keypair = KeyPair::generate();
        let fingerprint = keypair.fingerprint();
        let address = match &name {
            Some(n) if !n.is_empty() => format!("{}_{}", n, &fingerprint[..16]),
            _ => fingerprint[..32].to_string(),
        };
        Wallet {
            name,
            address,
            keypair,
        }
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.keypair.public_key.serialize())
    }

    /// Hex-encoded compact signature over `message`.
    pub fn sign(&self, message: &[u8]) -> Result<String, ChainError> {
        self.keypair.sign(message).map(hex::encode)
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address.clone(),
            public_key: self.public_key_hex(),
        }
    }
}

/// Wallets created during this process, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    wallets: HashMap<String, Wallet>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: Option<String>) -> WalletInfo {
        let wallet = Wallet::new(name);
        let info = wallet.info();
        self.wallets.insert(wallet.address.clone(), wallet);
        info
    }

    pub fn get(&self, address: &str) -> Option<&Wallet> {
        self.wallets.get(address)
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }
}
