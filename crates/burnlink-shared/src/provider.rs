//! Source of cryptographic randomness.
//!
//! Every operation that needs fresh random bytes (keys, IVs, salts) takes a
//! [`CryptoProvider`] explicitly instead of reaching for a global RNG, so the
//! core can run against a mock in tests and on any runtime that supplies
//! its own entropy.

use rand::RngCore;

use crate::error::CryptoError;

pub trait CryptoProvider: Send + Sync {
    /// Fill `buf` with cryptographically secure random bytes.
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCryptoProvider;

impl CryptoProvider for OsCryptoProvider {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        rand::rngs::OsRng.try_fill_bytes(buf).map_err(|e| {
            tracing::error!(error = %e, "OS random source failed");
            CryptoError::CryptoUnavailable
        })
    }
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for &P {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_random(buf)
    }
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for std::sync::Arc<P> {
    fn fill_random(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        (**self).fill_random(buf)
    }
}

pub(crate) fn random_array<const N: usize>(
    provider: &impl CryptoProvider,
) -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    provider.fill_random(&mut bytes)?;
    Ok(bytes)
}
