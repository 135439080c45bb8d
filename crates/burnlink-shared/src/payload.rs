//! The plaintext that gets encrypted: a typed text or file secret.
//!
//! Secrets created before the typed wrapper existed were stored as bare
//! text, so [`deserialize`] only insists on structure when the JSON carries
//! a recognized `type` discriminator. Anything else is the secret itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{MAX_FILE_SIZE, MAX_TEXT_SIZE};
use crate::error::CryptoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Payload {
    Text {
        content: String,
    },
    File {
        /// Standard base64 of the file bytes.
        content: String,
        #[serde(rename = "fileName")]
        file_name: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl Payload {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn file(bytes: &[u8], file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::File {
            content: STANDARD.encode(bytes),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    /// Size counted against the creation limits, in bytes.
    pub fn size(&self) -> usize {
        match self {
            Self::Text { content } => content.len(),
            // decoded length of the base64 content
            Self::File { content, .. } => {
                let padding = content.bytes().rev().take_while(|b| *b == b'=').count();
                ((content.len() / 4) * 3).saturating_sub(padding.min(2))
            }
        }
    }

    pub fn max_size(&self) -> usize {
        match self {
            Self::Text { .. } => MAX_TEXT_SIZE,
            Self::File { .. } => MAX_FILE_SIZE,
        }
    }

    pub fn exceeds_limit(&self) -> bool {
        self.size() > self.max_size()
    }
}

/// A file secret with all metadata present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSecret {
    pub content: String,
    pub file_name: String,
    pub mime_type: String,
}

impl FileSecret {
    /// Decode the base64 file content.
    pub fn bytes(&self) -> Result<Vec<u8>, CryptoError> {
        STANDARD
            .decode(self.content.as_bytes())
            .map_err(|_| CryptoError::corrupted("Invalid file content encoding"))
    }
}

/// The result of decoding decrypted plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Text(String),
    File(FileSecret),
    /// Pre-wrapper secret, or JSON without a known `type`: the whole
    /// decrypted text.
    Bare(String),
}

impl Decoded {
    /// Text to show for text secrets, typed or bare.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Bare(text) => Some(text),
            Self::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileSecret> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }
}

pub fn serialize(payload: &Payload) -> Result<String, CryptoError> {
    serde_json::to_string(payload).map_err(|_| CryptoError::EncryptionFailed)
}

pub fn deserialize(text: &str) -> Result<Decoded, CryptoError> {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return Ok(Decoded::Bare(text.to_string()));
    };

    match value.get("type").and_then(Value::as_str) {
        Some("text") => match value.get("content").and_then(Value::as_str) {
            Some(content) => Ok(Decoded::Text(content.to_string())),
            None => Err(CryptoError::corrupted("Missing text content")),
        },
        Some("file") => {
            let field = |name: &str| {
                value
                    .get(name)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            match (field("content"), field("fileName"), field("mimeType")) {
                (Some(content), Some(file_name), Some(mime_type)) => Ok(Decoded::File(FileSecret {
                    content,
                    file_name,
                    mime_type,
                })),
                _ => Err(CryptoError::corrupted("Missing file metadata")),
            }
        }
        _ => Ok(Decoded::Bare(text.to_string())),
    }
}
