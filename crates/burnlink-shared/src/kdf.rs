//! Key derivation: passphrase + salt → AES-256-GCM key (PBKDF2-HMAC-SHA256)

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::constants::{PBKDF2_ITERATIONS, SALT_SIZE, SYMMETRIC_KEY_SIZE};
use crate::error::CryptoError;
use crate::key_codec::SymmetricKey;
use crate::provider::{random_array, CryptoProvider};

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Iteration count (default: 100,000)
    pub iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

/// Derive a key from a passphrase using the default parameters.
///
/// The salt is used as text: its UTF-8 bytes feed PBKDF2, not the numbers it
/// lists. Links created elsewhere depend on exactly this.
pub fn derive_key(passphrase: &str, salt: &str) -> SymmetricKey {
    derive_key_with(passphrase, salt, &KdfParams::default())
}

pub fn derive_key_with(passphrase: &str, salt: &str, params: &KdfParams) -> SymmetricKey {
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut key,
    );
    SymmetricKey::from_bytes(key)
}

/// Generate a fresh salt: 16 random bytes as a comma-joined decimal string.
pub fn generate_salt(provider: &impl CryptoProvider) -> Result<String, CryptoError> {
    let bytes: [u8; SALT_SIZE] = random_array(provider)?;
    Ok(bytes
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::CountingProvider;
    use crate::provider::OsCryptoProvider;

    const FAST: KdfParams = KdfParams { iterations: 1_000 };

    #[test]
    fn test_kdf_deterministic() {
        let key1 = derive_key("correct horse", "1,2,3");
        let key2 = derive_key("correct horse", "1,2,3");
        assert_eq!(key1.as_bytes(), key2.as_bytes(), "KDF must be deterministic");
    }

    #[test]
    fn test_kdf_different_salts() {
        let key1 = derive_key_with("same-passphrase", "1,2,3", &FAST);
        let key2 = derive_key_with("same-passphrase", "1,2,4", &FAST);
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_kdf_different_passphrases() {
        let key1 = derive_key_with("passphrase-a", "salt", &FAST);
        let key2 = derive_key_with("passphrase-b", "salt", &FAST);
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_iteration_count_matters() {
        let key1 = derive_key_with("pass", "salt", &KdfParams { iterations: 1 });
        let key2 = derive_key_with("pass", "salt", &KdfParams { iterations: 2 });
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_pbkdf2_sha256_known_vector() {
        // RFC 7914 section 11, first PBKDF2-HMAC-SHA256 vector (c = 1)
        let key = derive_key_with("passwd", "salt", &KdfParams { iterations: 1 });
        assert_eq!(
            &key.as_bytes()[..8],
            &[0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );
    }

    #[test]
    fn test_salt_format() {
        let salt = generate_salt(&CountingProvider::default()).unwrap();
        assert_eq!(salt, "0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15");
    }

    #[test]
    fn test_random_salts_differ() {
        let a = generate_salt(&OsCryptoProvider).unwrap();
        let b = generate_salt(&OsCryptoProvider).unwrap();
        assert_eq!(a.split(',').count(), SALT_SIZE);
        assert!(a.split(',').all(|n| n.parse::<u8>().is_ok()));
        assert_ne!(a, b);
    }
}
