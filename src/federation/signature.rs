//! Payload signatures
//!
//! Message bodies are signed with RSASSA-PKCS1-v1_5 over SHA-256 and
//! carried as standard base64. PKCS#1 v1.5 is deterministic, so the
//! same key and payload always produce the same signature.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha256;

use super::keys::{parse_private_key, parse_public_key};
use crate::data::KeyRepository;
use crate::error::AppError;
use crate::metrics::SIGNATURE_VERIFICATIONS_TOTAL;

/// Sign `payload` with a PEM private key
///
/// # Returns
/// Base64-encoded signature
pub fn sign_payload(private_key_pem: &str, payload: &[u8]) -> Result<String, AppError> {
    let private_key = parse_private_key(private_key_pem)?;
    let signing_key = SigningKey::<Sha256>::new(private_key);
    let signature = signing_key.sign(payload);
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Check a base64 signature over `payload` against a PEM public key
///
/// Malformed base64, malformed keys and cryptographic mismatches all
/// yield `false`.
pub fn verify_payload(public_key_pem: &str, signature_b64: &str, payload: &[u8]) -> bool {
    let Ok(signature_bytes) = BASE64.decode(signature_b64.trim()) else {
        tracing::debug!("Signature is not valid base64");
        return false;
    };

    let public_key = match parse_public_key(public_key_pem) {
        Ok(key) => key,
        Err(error) => {
            tracing::warn!(%error, "Stored public key cannot be parsed");
            return false;
        }
    };

    let Ok(signature) = Signature::try_from(signature_bytes.as_slice()) else {
        tracing::debug!("Signature bytes are malformed");
        return false;
    };

    VerifyingKey::<Sha256>::new(public_key)
        .verify(payload, &signature)
        .is_ok()
}

/// Signs and verifies payloads on behalf of actors, by username
///
/// Key material comes from a [`KeyRepository`]; the signer itself
/// holds no keys.
#[derive(Clone)]
pub struct PayloadSigner {
    keys: Arc<dyn KeyRepository>,
}

impl PayloadSigner {
    pub fn new(keys: Arc<dyn KeyRepository>) -> Self {
        Self { keys }
    }

    /// Sign `payload` with the private key in `username`'s vault
    ///
    /// # Errors
    /// - `Forbidden` when the actor has no vault
    /// - `Key` when the stored key cannot be parsed
    pub async fn sign(&self, username: &str, payload: &[u8]) -> Result<String, AppError> {
        let private_key_pem = self.keys.private_key_pem(username).await?.ok_or_else(|| {
            tracing::warn!(%username, "Access denied: private key not found");
            AppError::Forbidden
        })?;

        sign_payload(&private_key_pem, payload)
    }

    /// Verify a signature claimed to come from `username`
    ///
    /// Fails closed: unknown actors and lookup errors return `false`.
    pub async fn verify(&self, username: &str, signature_b64: &str, payload: &[u8]) -> bool {
        let public_key_pem = match self.keys.public_key_pem(username).await {
            Ok(Some(pem)) => pem,
            Ok(None) => {
                tracing::debug!(%username, "Signature from unknown actor");
                SIGNATURE_VERIFICATIONS_TOTAL
                    .with_label_values(&["unknown_actor"])
                    .inc();
                return false;
            }
            Err(error) => {
                tracing::warn!(%username, %error, "Public key lookup failed");
                SIGNATURE_VERIFICATIONS_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                return false;
            }
        };

        let valid = verify_payload(&public_key_pem, signature_b64, payload);
        if valid {
            SIGNATURE_VERIFICATIONS_TOTAL
                .with_label_values(&["valid"])
                .inc();
        } else {
            tracing::info!(%username, "Signature verification failed");
            SIGNATURE_VERIFICATIONS_TOTAL
                .with_label_values(&["invalid"])
                .inc();
        }
        valid
    }
}
