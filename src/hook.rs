//! Message lifecycle events for a mail client.
//!
//! A client calls these in order as a message is displayed, replied to or
//! sent. With no backend every event is a no-op that leaves content as it was.

use bitflags::bitflags;
use serde::Serialize;
use tracing::debug;

use crate::backend::BackendHandle;
use crate::config::Config;
use crate::i18n;
use crate::inline::InlineDecryptor;
use crate::model::flags::StatusFlags;
use crate::model::message::{Preferences, SendContext};
use crate::send::confirm::Prompter;
use crate::send::policy::{SendOutcome, SendPolicyResolver};

bitflags! {
    /// Presentation marks attached to a displayed message.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
    pub struct Badges: u8 {
        const DECRYPTED = 1 << 0;
        const SIGNED    = 1 << 1;
    }
}

impl Badges {
    pub fn from_status(status: StatusFlags) -> Self {
        let mut badges = Self::empty();
        badges.set(Self::DECRYPTED, status.contains(StatusFlags::DECRYPTION_OKAY));
        badges.set(
            Self::SIGNED,
            status.intersects(StatusFlags::GOOD_SIGNATURE | StatusFlags::UNVERIFIED_SIGNATURE),
        );
        badges
    }
}

/// A body after inline processing, ready to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayedMessage {
    pub text: String,
    pub badges: Badges,
    pub status: StatusFlags,
    /// Tooltip for the signed badge when the signer's key is unverified.
    pub signature_note: Option<&'static str>,
}

pub struct PgpHook {
    backend: Option<BackendHandle>,
    decryptor: InlineDecryptor,
    resolver: SendPolicyResolver,
}

impl PgpHook {
    pub fn new(backend: Option<BackendHandle>) -> Self {
        Self {
            decryptor: InlineDecryptor::new(backend.clone()),
            resolver: SendPolicyResolver::new(backend.clone()),
            backend,
        }
    }

    pub fn from_config(backend: Option<BackendHandle>, config: &Config) -> Self {
        let mut hook = Self::new(backend);
        hook.decryptor = hook
            .decryptor
            .with_head_threshold(config.display.over_long_head_threshold);
        hook
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Called with the top-level content type before the body is rendered.
    pub fn before_streaming(&self, content_type: &str) -> Badges {
        let Some(backend) = self.backend.as_deref() else {
            return Badges::empty();
        };
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "multipart/encrypted" => {
                if !backend.mime_initialized() {
                    debug!("Initializing PGP/MIME layer");
                    backend.initialize_mime();
                }
                Badges::empty()
            }
            "multipart/signed" => Badges::SIGNED,
            _ => Badges::empty(),
        }
    }

    /// Called with the rendered plaintext body.
    ///
    /// `None` means the body is shown as it is.
    pub fn streamed(&self, body: &str, charset: Option<&str>) -> Option<DisplayedMessage> {
        if body.is_empty() {
            return None;
        }
        let outcome = self.decryptor.try_decrypt(body, charset)?;
        let signature_note = outcome
            .status
            .contains(StatusFlags::UNVERIFIED_SIGNATURE)
            .then(i18n::unknown_good);

        Some(DisplayedMessage {
            text: outcome.text,
            badges: Badges::from_status(outcome.status),
            status: outcome.status,
            signature_note,
        })
    }

    pub fn before_send(
        &self,
        ctx: &mut SendContext,
        prefs: &Preferences,
        prompter: &mut dyn Prompter,
    ) -> SendOutcome {
        self.resolver.resolve(ctx, prefs, prompter)
    }

    /// The initial body of a reply: the decrypted text, cited, if there is one.
    pub fn reply_composed(&self, decrypted: Option<&str>, body: &str) -> String {
        match decrypted {
            Some(text) if self.is_enabled() && !text.is_empty() => cite(&format!("\n{text}")),
            _ => body.to_string(),
        }
    }
}

/// Prefix every line after the first with `> `, or `>` when the line is
/// empty or already quoted.
pub fn cite(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            out.push_str(if line.is_empty() || line.starts_with('>') {
                ">"
            } else {
                "> "
            });
        }
        out.push_str(line);
    }
    out
}
