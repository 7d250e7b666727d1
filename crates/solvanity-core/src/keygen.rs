//! Keypair source for the search loop

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use solvanity_crypto::{Ed25519Error, Ed25519Keypair};

#[derive(Error, Debug)]
pub enum KeygenError {
    #[error("Keypair generation failed: {0}")]
    Ed25519(#[from] Ed25519Error),
    #[error("Keypair generation failed: {0}")]
    Other(String),
}

/// One generated keypair, rendered the way a wallet exports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Base58 public key
    pub public_address: String,
    /// Base58 of the 64-byte keypair (seed || public key)
    pub private_key_material: String,
}

/// Produces independent random keypairs
pub trait KeypairGenerator: Send + Sync {
    fn generate(&self) -> Result<Candidate, KeygenError>;
}

/// Solana keypairs from the OS entropy source
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Generator;

impl KeypairGenerator for Ed25519Generator {
    fn generate(&self) -> Result<Candidate, KeygenError> {
        let keypair = Ed25519Keypair::try_generate()?;
        Ok(Candidate {
            public_address: keypair.address(),
            private_key_material: keypair.secret_base58(),
        })
    }
}

impl<G: KeypairGenerator + ?Sized> KeypairGenerator for Box<G> {
    fn generate(&self) -> Result<Candidate, KeygenError> {
        (**self).generate()
    }
}

impl<G: KeypairGenerator + ?Sized> KeypairGenerator for Arc<G> {
    fn generate(&self) -> Result<Candidate, KeygenError> {
        (**self).generate()
    }
}
