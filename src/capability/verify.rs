//! Detached-signature verification seam (§1 "external cryptographic
//! primitives", expanded in SPEC_FULL §B.2)

use k256::ecdsa::signature::Verifier;
use k256::ecdsa::{Signature, VerifyingKey};

use crate::error::AppError;

pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` (hex) over `message` given the signer's
    /// hex-encoded compressed secp256k1 public key.
    fn verify(&self, public_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), AppError>;
}

pub struct K256Verifier;

impl SignatureVerifier for K256Verifier {
    fn verify(&self, public_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<(), AppError> {
        let key_bytes = hex::decode(public_key_hex)
            .map_err(|_| AppError::Unauthorized("malformed public key".to_string()))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&key_bytes)
            .map_err(|_| AppError::Unauthorized("invalid public key".to_string()))?;

        let sig_bytes = hex::decode(signature_hex)
            .map_err(|_| AppError::Unauthorized("malformed signature".to_string()))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| AppError::Unauthorized("invalid signature encoding".to_string()))?;

        verifying_key
            .verify(message, &signature)
            .map_err(|_| AppError::Unauthorized("signature verification failed".to_string()))
    }
}
