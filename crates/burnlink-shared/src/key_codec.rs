//! Textual encodings of the 256-bit AES-GCM key carried in share links.
//!
//! New keys are always written as URL-safe base64 (no padding) of the raw
//! 32 bytes. Older links carry standard base64 of a JSON Web Key export, so
//! decoding walks an ordered list of [`KeyDecoder`] strategies and takes the
//! first one that produces a key.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{JWK_ALGORITHM, JWK_KEY_TYPE, SYMMETRIC_KEY_SIZE};
use crate::error::CryptoError;
use crate::provider::{random_array, CryptoProvider};

// `atob` accepts input with or without trailing `=`.
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A 256-bit AES-GCM key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; SYMMETRIC_KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.bytes
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SYMMETRIC_KEY_SIZE] = bytes.try_into().ok()?;
        Some(Self { bytes })
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a fresh random key.
pub fn generate_key(provider: &impl CryptoProvider) -> Result<SymmetricKey, CryptoError> {
    Ok(SymmetricKey::from_bytes(random_array(provider)?))
}

/// Encode a key in the current link format: URL-safe base64, no padding.
pub fn encode_key(key: &SymmetricKey) -> String {
    URL_SAFE_NO_PAD.encode(key.as_bytes())
}

/// Generate a random key and return only its link encoding.
pub fn encode_random_key(provider: &impl CryptoProvider) -> Result<String, CryptoError> {
    let key = generate_key(provider)?;
    Ok(encode_key(&key))
}

/// Decode a key from either the legacy JWK form or the raw form.
pub fn decode_key(text: &str) -> Result<SymmetricKey, CryptoError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CryptoError::InvalidKeyFormat);
    }

    for decoder in DECODERS {
        if let Some(key) = decoder.decode(text) {
            tracing::debug!(format = decoder.name(), "decoded link key");
            return Ok(key);
        }
    }

    Err(CryptoError::InvalidKeyFormat)
}

/// One way of turning link text into a key. Strategies are independent:
/// a failed attempt leaves nothing behind for the next one.
trait KeyDecoder: Sync {
    fn name(&self) -> &'static str;
    fn decode(&self, text: &str) -> Option<SymmetricKey>;
}

const DECODERS: [&dyn KeyDecoder; 2] = [&LegacyJwkDecoder, &RawKeyDecoder];

/// Standard base64 wrapping a JSON Web Key export.
struct LegacyJwkDecoder;

#[derive(Deserialize)]
struct Jwk {
    kty: String,
    k: String,
    #[serde(default)]
    alg: Option<String>,
}

impl KeyDecoder for LegacyJwkDecoder {
    fn name(&self) -> &'static str {
        "legacy-jwk"
    }

    fn decode(&self, text: &str) -> Option<SymmetricKey> {
        let mut decoded = LENIENT_STANDARD.decode(text).ok()?;
        let key = parse_jwk(&decoded);
        decoded.zeroize();
        key
    }
}

fn parse_jwk(decoded: &[u8]) -> Option<SymmetricKey> {
    let json = std::str::from_utf8(decoded).ok()?;
    if !json.starts_with('{') {
        return None;
    }

    let jwk: Jwk = serde_json::from_str(json).ok()?;
    if jwk.kty != JWK_KEY_TYPE {
        return None;
    }
    if jwk.alg.as_deref().is_some_and(|alg| alg != JWK_ALGORITHM) {
        return None;
    }

    let mut raw = LENIENT_URL_SAFE.decode(jwk.k.as_bytes()).ok()?;
    let key = SymmetricKey::from_slice(&raw);
    raw.zeroize();
    key
}

/// URL-safe base64 of the raw 32 key bytes.
struct RawKeyDecoder;

impl KeyDecoder for RawKeyDecoder {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn decode(&self, text: &str) -> Option<SymmetricKey> {
        let mut standard: String = text
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                other => other,
            })
            .collect();
        while standard.len() % 4 != 0 {
            standard.push('=');
        }

        let mut raw = STANDARD.decode(standard.as_bytes()).ok()?;
        let key = SymmetricKey::from_slice(&raw);
        raw.zeroize();
        key
    }
}
