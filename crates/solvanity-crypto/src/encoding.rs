//! Base58 encoding (Bitcoin alphabet, no checksum) as used by Solana

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Invalid base58 input: {0}")]
    InvalidBase58(String),
}

/// Base58 encode
pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

/// Base58 decode
pub fn base58_decode(input: &str) -> Result<Vec<u8>, EncodingError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| EncodingError::InvalidBase58(e.to_string()))
}
