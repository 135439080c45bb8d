//! Transport framing persisted as a record's `encrypted_content`.
//!
//! ```text
//! {"iv":[12 numbers],"data":[ciphertext || tag],
//!  "salt":"1,2,...",            // passphrase mode only
//!  "passphraseProtected":true,  // passphrase mode only
//!  "burnAfterRead":true}        // Instant expiry only
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::NONCE_SIZE;
use crate::error::CryptoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    pub iv: Vec<u8>,
    pub data: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub passphrase_protected: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub burn_after_read: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl EncryptedEnvelope {
    pub fn new(iv: [u8; NONCE_SIZE], data: Vec<u8>) -> Self {
        Self {
            iv: iv.to_vec(),
            data,
            salt: None,
            passphrase_protected: false,
            burn_after_read: false,
        }
    }

    /// Mark the envelope as passphrase-protected and attach the KDF salt.
    pub fn with_passphrase_salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self.passphrase_protected = true;
        self
    }

    pub fn with_burn_after_read(mut self, burn: bool) -> Self {
        self.burn_after_read = burn;
        self
    }

    /// Parse the stored JSON text.
    pub fn from_json(text: &str) -> Result<Self, CryptoError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|_| CryptoError::corrupted("Invalid JSON"))?;

        let present = |field: &str| value.get(field).is_some_and(|v| !v.is_null());
        if !present("iv") || !present("data") {
            return Err(CryptoError::corrupted("Missing IV or Content"));
        }

        let envelope: Self = serde_json::from_value(value)
            .map_err(|e| CryptoError::corrupted(format!("Malformed envelope: {e}")))?;
        envelope.check_iv()?;
        Ok(envelope)
    }

    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|_| CryptoError::EncryptionFailed)
    }

    pub(crate) fn check_iv(&self) -> Result<(), CryptoError> {
        if self.iv.len() != NONCE_SIZE {
            return Err(CryptoError::corrupted(format!(
                "IV must be {NONCE_SIZE} bytes, got {}",
                self.iv.len()
            )));
        }
        Ok(())
    }

    /// Either the explicit flag or a stored salt marks passphrase mode.
    pub fn is_passphrase_protected(&self) -> bool {
        self.passphrase_protected || self.salt.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The salt needed to re-derive a passphrase key.
    pub fn passphrase_salt(&self) -> Result<&str, CryptoError> {
        match self.salt.as_deref() {
            Some(salt) if !salt.is_empty() => Ok(salt),
            _ => Err(CryptoError::corrupted("Missing passphrase salt")),
        }
    }
}
