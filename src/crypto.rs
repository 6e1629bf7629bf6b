//! Signing and verification of canonical transaction text (ECDSA over secp256k1)

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Compact signature bytes as produced by [`sign`].
pub type SignatureBytes = [u8; COMPACT_SIGNATURE_SIZE];

fn message_digest(text: &[u8]) -> Message {
    let digest: [u8; 32] = Sha256::digest(text).into();
    Message::from_digest(digest)
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// Returns the public key as a compressed byte array.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    pub fn sign(&self, text: &str) -> SignatureBytes {
        sign(text, &self.secret_key)
    }
}

/// Signs the SHA-256 digest of `text` and returns the compact signature bytes.
pub fn sign(text: &str, secret_key: &SecretKey) -> SignatureBytes {
    let message = message_digest(text.as_bytes());
    SECP256K1_CONTEXT
        .sign_ecdsa(&message, secret_key)
        .serialize_compact()
}

/// Fail-closed check of `signature` over `text`. Malformed signatures yield `false`.
pub fn verify(text: &str, signature: &[u8], public_key: &PublicKey) -> bool {
    let Ok(signature) = Signature::from_compact(signature) else {
        return false;
    };
    let message = message_digest(text.as_bytes());
    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, public_key)
        .is_ok()
}

/// Verifies a signature given raw compressed public key bytes, reporting why it failed.
pub fn verify_signature(
    public_key_bytes: &[u8],
    text: &str,
    signature_bytes: &[u8],
) -> Result<(), ChainError> {
    if public_key_bytes.len() != PUBLIC_KEY_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Public key must be exactly {} bytes (compressed), got {}",
            PUBLIC_KEY_SIZE,
            public_key_bytes.len()
        )));
    }
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let public_key = PublicKey::from_slice(public_key_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))?;

    if verify(text, signature_bytes, &public_key) {
        Ok(())
    } else {
        Err(ChainError::VerificationFailed)
    }
}
