//! Inline PGP on receipt: find the armored block, decrypt it, splice it back.

pub mod armor;
pub mod charset;
pub mod reassemble;

use tracing::{debug, error};

use crate::backend::{BackendHandle, CryptoBackend};
use crate::error::{PgpError, Result};
use crate::model::armor::SplitText;
use crate::model::flags::{StatusFlags, UiFlags};

pub use armor::extract;
pub use reassemble::{reassemble, resolve_charset, OVER_LONG_HEAD_THRESHOLD};

/// A successfully processed inline block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOutcome {
    /// The body to display: head, decrypted text and tail, or the original
    /// body when the backend recovered nothing.
    pub text: String,
    pub status: StatusFlags,
    pub split: SplitText,
}

/// Runs the extract → decrypt → reassemble pipeline for one body at a time.
pub struct InlineDecryptor {
    backend: Option<BackendHandle>,
    over_long_head_threshold: usize,
}

impl InlineDecryptor {
    pub fn new(backend: Option<BackendHandle>) -> Self {
        Self {
            backend,
            over_long_head_threshold: OVER_LONG_HEAD_THRESHOLD,
        }
    }

    pub fn with_head_threshold(mut self, threshold: usize) -> Self {
        self.over_long_head_threshold = threshold;
        self
    }

    /// Decrypt the inline block in `raw`.
    ///
    /// `None` means the body should be shown untouched: there is no backend,
    /// no block, or processing failed (failures are logged here and never
    /// reach the caller).
    pub fn try_decrypt(&self, raw: &str, ambient_charset: Option<&str>) -> Option<InlineOutcome> {
        let backend = self.backend.as_deref()?;
        let split = extract(raw)?;
        let (start, end) = (split.armor.start_offset, split.armor.end_offset);

        match self.decrypt_split(backend, raw, split, ambient_charset) {
            Ok(outcome) => {
                debug!(start, end, status = ?outcome.status, "Inline PGP block processed");
                Some(outcome)
            }
            Err(e) => {
                error!(start, end, charset = ?ambient_charset, error = %e, "Inline PGP processing failed");
                None
            }
        }
    }

    fn decrypt_split(
        &self,
        backend: &dyn CryptoBackend,
        raw: &str,
        split: SplitText,
        ambient_charset: Option<&str>,
    ) -> Result<InlineOutcome> {
        let armored = charset::encode(
            ambient_charset.unwrap_or(charset::DEFAULT_CHARSET),
            &split.armor.body,
        );
        let result = backend.decrypt(UiFlags::empty(), &armored)?;

        if result.exit_code != 0 {
            return Err(PgpError::Decryption {
                exit_code: result.exit_code,
                message: result.error_message,
            });
        }

        let decoding = resolve_charset(&split.armor, ambient_charset);
        let decrypted = charset::decode(decoding, &result.plaintext);
        let mut text = reassemble(
            &split.head,
            &decrypted,
            &split.tail,
            self.over_long_head_threshold,
        );
        if text.is_empty() {
            debug!(status = ?result.status, "Backend recovered no text, keeping body");
            text = raw.to_string();
        }

        Ok(InlineOutcome {
            text,
            status: result.status,
            split,
        })
    }
}
