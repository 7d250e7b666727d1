//! Ed25519 keypairs in the Solana layout

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use crate::encoding::{base58_decode, base58_encode, EncodingError};

#[derive(Error, Debug)]
pub enum Ed25519Error {
    #[error("Invalid seed length {0} (expected 32)")]
    InvalidSeedLength(usize),
    #[error("Invalid keypair length {0} (expected 64)")]
    InvalidKeypairLength(usize),
    #[error("Entropy source failed: {0}")]
    Entropy(String),
    #[error("Public half does not match the secret seed")]
    MismatchedKeypair,
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// An Ed25519 keypair for Solana
#[derive(Clone)]
pub struct Ed25519Keypair {
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a new random keypair from the OS entropy source, reporting
    /// entropy failures instead of panicking
    pub fn try_generate() -> Result<Self, Ed25519Error> {
        let mut seed = [0u8; SECRET_KEY_LENGTH];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| Ed25519Error::Entropy(e.to_string()))?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Create from a raw 32-byte seed
    pub fn from_seed(seed: &[u8]) -> Result<Self, Ed25519Error> {
        let seed: &[u8; SECRET_KEY_LENGTH] = seed
            .try_into()
            .map_err(|_| Ed25519Error::InvalidSeedLength(seed.len()))?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(seed),
        })
    }

    /// Restore from the base58 secret key a wallet exports (64 bytes:
    /// seed || public key)
    pub fn from_base58_secret(encoded: &str) -> Result<Self, Ed25519Error> {
        let bytes = base58_decode(encoded)?;
        let bytes: &[u8; KEYPAIR_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Ed25519Error::InvalidKeypairLength(bytes.len()))?;
        let signing_key =
            SigningKey::from_keypair_bytes(bytes).map_err(|_| Ed25519Error::MismatchedKeypair)?;
        Ok(Self { signing_key })
    }

    /// The 32-byte seed
    pub fn seed_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Full keypair bytes (seed || pubkey), the layout Solana wallets use
    pub fn keypair_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    /// The public key as bytes (32 bytes)
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 public address
    pub fn address(&self) -> String {
        base58_encode(&self.public_key_bytes())
    }

    /// Base58 of the 64-byte keypair
    pub fn secret_base58(&self) -> String {
        base58_encode(&self.keypair_bytes())
    }
}
