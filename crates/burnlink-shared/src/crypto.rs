use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::constants::NONCE_SIZE;
use crate::envelope::EncryptedEnvelope;
use crate::error::CryptoError;
use crate::key_codec::SymmetricKey;
use crate::provider::{random_array, CryptoProvider};

// Fresh random IV on every call; an IV must never repeat under one key.
pub fn encrypt(
    plaintext: &str,
    key: &SymmetricKey,
    provider: &impl CryptoProvider,
) -> Result<EncryptedEnvelope, CryptoError> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let iv: [u8; NONCE_SIZE] = random_array(provider)?;

    let data = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
        .map_err(|_| CryptoError::EncryptionFailed)?;

    Ok(EncryptedEnvelope::new(iv, data))
}

/// Encrypt and serialize to the transport JSON in one step.
pub fn encrypt_to_json(
    plaintext: &str,
    key: &SymmetricKey,
    provider: &impl CryptoProvider,
) -> Result<String, CryptoError> {
    encrypt(plaintext, key, provider)?.to_json()
}

/// Decrypt transport JSON. Structural problems are `CorruptedData`; any
/// authentication failure is `InvalidKeyOrCorruptedData`.
pub fn decrypt(envelope_json: &str, key: &SymmetricKey) -> Result<String, CryptoError> {
    let envelope = EncryptedEnvelope::from_json(envelope_json)?;
    decrypt_envelope(&envelope, key)
}

pub fn decrypt_envelope(
    envelope: &EncryptedEnvelope,
    key: &SymmetricKey,
) -> Result<String, CryptoError> {
    envelope.check_iv()?;

    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&envelope.iv), envelope.data.as_slice())
        .map_err(|_| {
            tracing::debug!("AES-GCM authentication failed");
            CryptoError::InvalidKeyOrCorruptedData
        })?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::corrupted("Plaintext is not UTF-8"))
}
