//! SolVanity Crypto Primitives
//!
//! Ed25519 keypair generation and the base58 encodings Solana uses for
//! public addresses and secret keys.

pub mod ed25519;
pub mod encoding;

pub use self::ed25519::{Ed25519Error, Ed25519Keypair};

// Re-export dependencies for use by other crates
pub use bs58;
