//! The crypto backend contract.
//!
//! Decrypt and encrypt are required. Sender key lookup and interactive key
//! selection are optional capabilities: callers ask for them through
//! [`CryptoBackend::sender_key_lookup`] and [`CryptoBackend::key_selector`]
//! and fall back to documented defaults when they are absent.

pub mod gpg;

use std::rc::Rc;

use tracing::debug;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::model::address;
use crate::model::flags::{SendFlags, UiFlags};
use crate::model::message::{DecryptionResult, EncryptionResult, Identity};

/// Shared handle to the backend. `None` wherever a handle is optional means
/// the backend is unavailable and PGP handling is a no-op.
pub type BackendHandle = Rc<dyn CryptoBackend>;

/// Operations every backend provides.
pub trait CryptoBackend {
    /// Decrypt and/or verify one armored block.
    fn decrypt(&self, ui_flags: UiFlags, armored: &[u8]) -> Result<DecryptionResult>;

    /// Sign and/or encrypt `plaintext` according to `send_flags`.
    ///
    /// `to` and `bcc` are comma-separated bare addresses.
    fn encrypt(
        &self,
        ui_flags: UiFlags,
        plaintext: &[u8],
        from: &str,
        to: &str,
        bcc: &str,
        send_flags: SendFlags,
    ) -> Result<EncryptionResult>;

    /// Whether the PGP/MIME decoding layer is ready.
    fn mime_initialized(&self) -> bool {
        true
    }

    /// Bring up the PGP/MIME decoding layer.
    fn initialize_mime(&self) {}

    fn strip_email_display_name(&self, address: &str) -> String {
        address::strip_display_name(address)
    }

    /// Why the backend failed to start, if it did.
    fn initialization_error(&self) -> Option<String> {
        None
    }

    fn sender_key_lookup(&self) -> Option<&dyn SenderKeyLookup> {
        None
    }

    fn key_selector(&self) -> Option<&dyn KeySelector> {
        None
    }
}

/// Optional capability: map an identity to the key user id it signs with.
pub trait SenderKeyLookup {
    fn sender_user_id(&self, identity: &Identity) -> Option<String>;
}

/// Optional capability: let the user confirm or change recipients' keys.
pub trait KeySelector {
    /// `None` means the user declined and the send must be canceled.
    fn select_keys(
        &self,
        send_flags: SendFlags,
        opt_flags: SendFlags,
        got_flags: SendFlags,
        from: &str,
        to: &[String],
        bcc: &[String],
    ) -> Option<KeySelection>;
}

/// The outcome of an accepted key selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelection {
    pub send_flags: SendFlags,
    pub to_addr: String,
    pub bcc_addr: String,
}

/// Build the configured backend, or `None` when it is disabled or missing.
///
/// This is the only place availability is decided; the result is passed to
/// every component that needs it.
pub fn connect(config: &BackendConfig) -> Option<BackendHandle> {
    if !config.enabled {
        debug!("PGP backend disabled in configuration");
        return None;
    }
    match gpg::GpgBackend::probe(config) {
        Ok(backend) => {
            debug!(program = %config.program.display(), version = %backend.version(), "PGP backend loaded");
            Some(Rc::new(backend))
        }
        Err(e) => {
            debug!(program = %config.program.display(), error = %e, "PGP backend doesn't seem to be installed");
            None
        }
    }
}
