/// AES-256-GCM key size in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// AES-GCM nonce (IV) size in bytes
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Random salt size in bytes, before decimal rendering
pub const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count for passphrase-derived keys
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Maximum text secret length in bytes (100 KiB)
pub const MAX_TEXT_SIZE: usize = 100 * 1024;

/// Maximum file secret size in bytes (10 MiB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Hard ceiling on how long any secret may live (24 hours)
pub const MAX_TTL_SECS: i64 = 86_400;

/// Fallback-link duration when the fragment carries none
pub const FALLBACK_DEFAULT_TTL_SECS: i64 = 300;

/// Length of the random id used by fallback links
pub const FALLBACK_ID_LEN: usize = 6;

/// Path segment that precedes the secret id in every share link
pub const VIEW_PATH: &str = "view";

/// JWK fields expected from the legacy key export
pub const JWK_KEY_TYPE: &str = "oct";
pub const JWK_ALGORITHM: &str = "A256GCM";
