//! Per-message values passed between the components and the backend.
//!
//! Everything here is created for one display or send event and dropped
//! afterwards.

use serde::{Deserialize, Serialize};

use super::flags::{SendFlags, StatusFlags, UiFlags};

/// What the backend returned for one decrypt call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptionResult {
    /// 0 means success.
    pub exit_code: i32,
    pub status: StatusFlags,
    /// Recovered bytes, still in the block's charset.
    pub plaintext: Vec<u8>,
    pub error_message: String,
}

/// What the backend returned for one encrypt/sign call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionResult {
    pub cipher_text: Vec<u8>,
    /// 0 means success.
    pub exit_code: i32,
    pub status: StatusFlags,
    pub error_message: String,
}

/// A sending identity and its PGP defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub sign_by_default: bool,
    pub encrypt_by_default: bool,
    pub pgp_mime_by_default: bool,
    /// Greater than zero when `key_id` should be used instead of `email`.
    pub key_mode: u32,
    pub key_id: Option<String>,
}

/// Input to the send-policy resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendContext {
    pub identity: Identity,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    /// The plaintext body; rewritten in place for inline PGP.
    pub body_text: String,
    /// The message is being saved (draft/template), not transmitted.
    pub save_message: bool,
}

/// Hash algorithm requested for PGP/MIME signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Let the backend choose.
    #[default]
    Default,
    Sha1,
    Ripemd160,
    Sha256,
    Sha384,
    Sha512,
    Sha224,
}

impl HashAlgorithm {
    /// The `micalg` name without the `pgp-` prefix, or `None` for the backend default.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Sha1 => Some("sha1"),
            Self::Ripemd160 => Some("ripemd160"),
            Self::Sha256 => Some("sha256"),
            Self::Sha384 => Some("sha384"),
            Self::Sha512 => Some("sha512"),
            Self::Sha224 => Some("sha224"),
        }
    }
}

/// User preferences consulted at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub always_trust_send: bool,
    pub encrypt_to_self: bool,
    pub confirm_before_send: bool,
    pub mime_hash_algorithm: HashAlgorithm,
    pub wrap_width: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            always_trust_send: false,
            encrypt_to_self: false,
            confirm_before_send: false,
            mime_hash_algorithm: HashAlgorithm::Default,
            wrap_width: 72,
        }
    }
}

/// Instructions for the transport when the message goes out as PGP/MIME.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDescriptor {
    pub send_flags: SendFlags,
    pub ui_flags: UiFlags,
    pub sender: String,
    /// To and Cc recipients, comma separated.
    pub recipients: String,
    pub bcc_recipients: String,
    pub hash_algorithm: HashAlgorithm,
}

impl SecurityDescriptor {
    /// The `micalg` parameter for a `multipart/signed` wrapper, if one is fixed.
    pub fn micalg(&self) -> Option<String> {
        self.hash_algorithm.name().map(|name| format!("pgp-{name}"))
    }
}
