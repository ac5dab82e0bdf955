//! Send-time policy: which protection a message gets, and applying it.
//!
//! The resolver runs once per send and never loops:
//! derive flags → pick the sender key → strip recipients → key selection →
//! PGP/MIME descriptor or inline transform → confirmation.
//! Every exit that does not send a protected message restores the original
//! body, so the caller never sees a half-processed one.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, error, info};

use crate::backend::{BackendHandle, CryptoBackend};
use crate::error::{PgpError, Result};
use crate::i18n;
use crate::inline::charset::{self, DEFAULT_CHARSET};
use crate::model::address;
use crate::model::flags::{SendFlags, UiFlags};
use crate::model::message::{Identity, Preferences, SecurityDescriptor, SendContext};

use super::confirm::Prompter;
use super::wrap::simple_wrap;

/// The result of a send that may proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub flags: SendFlags,
    /// Sender address or key id handed to the backend.
    pub sender: String,
    /// To and Cc, bare addresses, comma separated.
    pub recipients: String,
    pub bcc_recipients: String,
    /// Present when the transport must apply PGP/MIME.
    pub security: Option<SecurityDescriptor>,
    /// The body was replaced by inline signed or encrypted text.
    pub body_modified: bool,
    /// Protection failed and the user chose to send the plaintext.
    pub unencrypted_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Send(Resolution),
    Canceled,
}

/// The three flag sets produced by [`derive_flags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFlags {
    /// Everything that applies to this send.
    pub send: SendFlags,
    /// The bits contributed by preferences alone.
    pub opt: SendFlags,
    /// The bits the composition asked for, before preferences.
    pub got: SendFlags,
}

/// Everything fixed before protection is applied.
struct Plan {
    flags: SendFlags,
    from: String,
    to_list: Vec<String>,
    to_addr: String,
    bcc_addr: String,
}

/// Combine identity defaults, the save flag and preferences.
pub fn derive_flags(identity: &Identity, save_message: bool, prefs: &Preferences) -> DerivedFlags {
    let mut got = SendFlags::empty();
    got.set(SendFlags::SIGN, identity.sign_by_default);
    got.set(SendFlags::ENCRYPT, identity.encrypt_by_default);
    got.set(SendFlags::PGP_MIME, identity.pgp_mime_by_default);
    got.set(SendFlags::SAVE_MESSAGE, save_message);

    let mut opt = SendFlags::empty();
    opt.set(SendFlags::ALWAYS_TRUST, prefs.always_trust_send);
    opt.set(
        SendFlags::ENCRYPT_TO_SELF,
        prefs.encrypt_to_self || got.contains(SendFlags::SAVE_MESSAGE),
    );

    DerivedFlags {
        send: got | opt,
        opt,
        got,
    }
}

/// The address or key id to sign with.
///
/// A backend offering sender lookup is authoritative; otherwise the identity's
/// own key id is used when its key mode asks for it. Falls back to the email.
pub fn sender_user_id(backend: &dyn CryptoBackend, identity: &Identity) -> String {
    let user_id = match backend.sender_key_lookup() {
        Some(lookup) => lookup.sender_user_id(identity),
        None if identity.key_mode > 0 => identity.key_id.clone(),
        None => None,
    };
    user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| identity.email.clone())
}

/// Insert a `Charset:` armor header after the `BEGIN PGP MESSAGE` line.
pub fn add_charset_header(armored: &str, charset: &str) -> String {
    static BEGIN_RE: OnceLock<Regex> = OnceLock::new();
    let re = BEGIN_RE.get_or_init(|| {
        Regex::new(r"(-----BEGIN PGP MESSAGE----- *)(\r?\n)").expect("valid armor regex")
    });
    re.replacen(armored, 1, |caps: &Captures| {
        format!("{}{}Charset: {}{}", &caps[1], &caps[2], charset, &caps[2])
    })
    .into_owned()
}

/// Decides and applies send-time protection.
pub struct SendPolicyResolver {
    backend: Option<BackendHandle>,
}

impl SendPolicyResolver {
    pub fn new(backend: Option<BackendHandle>) -> Self {
        Self { backend }
    }

    /// Resolve the protection for `ctx`, rewriting `ctx.body_text` for inline PGP.
    ///
    /// On [`SendOutcome::Canceled`] the body is exactly what it was on entry.
    pub fn resolve(
        &self,
        ctx: &mut SendContext,
        prefs: &Preferences,
        prompter: &mut dyn Prompter,
    ) -> SendOutcome {
        let Some(backend) = self.backend.as_deref() else {
            return SendOutcome::Send(passthrough(ctx));
        };

        let derived = derive_flags(&ctx.identity, ctx.save_message, prefs);
        let from = sender_user_id(backend, &ctx.identity);

        let to_list = strip_all(backend, ctx.to.iter().chain(&ctx.cc));
        let bcc_list = strip_all(backend, ctx.bcc.iter());

        let mut plan = Plan {
            flags: derived.send,
            from,
            to_addr: to_list.join(", "),
            bcc_addr: bcc_list.join(", "),
            to_list,
        };
        debug!(flags = %plan.flags.describe(), from = %plan.from, "Derived send flags");

        if let Some(selector) = backend.key_selector() {
            match selector.select_keys(
                plan.flags,
                derived.opt,
                derived.got,
                &plan.from,
                &plan.to_list,
                &bcc_list,
            ) {
                Some(selection) => {
                    plan.flags = selection.send_flags;
                    plan.to_addr = selection.to_addr;
                    plan.bcc_addr = selection.bcc_addr;
                }
                None => {
                    info!("Key selection declined, send canceled");
                    return SendOutcome::Canceled;
                }
            }
        }

        let original = ctx.body_text.clone();
        match self.protect(backend, ctx, prefs, prompter, &plan) {
            Ok(Some(resolution)) => SendOutcome::Send(resolution),
            Ok(None) => {
                ctx.body_text = original;
                info!("Send not confirmed, canceled");
                SendOutcome::Canceled
            }
            Err(e) => {
                ctx.body_text = original;
                offer_unencrypted(backend, prompter, &plan, e)
            }
        }
    }

    /// Apply PGP/MIME or inline protection, then ask for confirmation.
    ///
    /// `Ok(None)` means the user declined.
    fn protect(
        &self,
        backend: &dyn CryptoBackend,
        ctx: &mut SendContext,
        prefs: &Preferences,
        prompter: &mut dyn Prompter,
        plan: &Plan,
    ) -> Result<Option<Resolution>> {
        let mut ui_flags = UiFlags::INTERACTIVE;
        let mut security = None;
        let mut body_modified = false;

        if plan.flags.using_pgp_mime() {
            ui_flags |= UiFlags::PGP_MIME;
            security = Some(SecurityDescriptor {
                send_flags: plan.flags,
                ui_flags,
                sender: plan.from.clone(),
                recipients: plan.to_addr.clone(),
                bcc_recipients: plan.bcc_addr.clone(),
                hash_algorithm: prefs.mime_hash_algorithm,
            });
        } else if plan.flags.is_protected() {
            ctx.body_text = protect_inline(backend, &ctx.body_text, ui_flags, plan, prefs.wrap_width)?;
            body_modified = true;
        }

        if !plan.flags.contains(SendFlags::SAVE_MESSAGE) && prefs.confirm_before_send {
            let all = [plan.to_addr.as_str(), plan.bcc_addr.as_str()]
                .iter()
                .filter(|s| !s.is_empty())
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            if !prompter.confirm_send(&plan.to_list.join(", "), &all, plan.flags) {
                return Ok(None);
            }
        }

        Ok(Some(Resolution {
            flags: plan.flags,
            sender: plan.from.clone(),
            recipients: plan.to_addr.clone(),
            bcc_recipients: plan.bcc_addr.clone(),
            security,
            body_modified,
            unencrypted_fallback: false,
        }))
    }
}

/// Sign and/or encrypt the body text, returning the armored replacement.
///
/// A non-zero exit code or empty output is an error rather than a silent
/// fallback to the unchanged body, so the caller asks before sending plaintext.
fn protect_inline(
    backend: &dyn CryptoBackend,
    body: &str,
    ui_flags: UiFlags,
    plan: &Plan,
    wrap_width: usize,
) -> Result<String> {
    let encrypting = plan.flags.contains(SendFlags::ENCRYPT);
    let plain: Cow<'_, str> = if encrypting {
        Cow::Borrowed(body)
    } else {
        Cow::Owned(simple_wrap(body, wrap_width))
    };

    let bytes = charset::encode(DEFAULT_CHARSET, &plain);
    let result = backend.encrypt(
        ui_flags,
        &bytes,
        &plan.from,
        &plan.to_addr,
        &plan.bcc_addr,
        plan.flags,
    )?;

    if result.exit_code != 0 || result.cipher_text.is_empty() {
        return Err(PgpError::Encryption {
            exit_code: result.exit_code,
            message: result.error_message,
        });
    }

    let armored = charset::decode(DEFAULT_CHARSET, &result.cipher_text);
    if encrypting && !charset::is_us_ascii(DEFAULT_CHARSET) {
        Ok(add_charset_header(&armored, DEFAULT_CHARSET))
    } else {
        Ok(armored)
    }
}

/// Protection failed: ask whether to send the (restored) plaintext.
fn offer_unencrypted(
    backend: &dyn CryptoBackend,
    prompter: &mut dyn Prompter,
    plan: &Plan,
    err: PgpError,
) -> SendOutcome {
    error!(error = %err, flags = %plan.flags.describe(), "PGP encrypt error");

    let mut message = i18n::sign_failed().to_string();
    if let Some(init_error) = backend.initialization_error() {
        message.push('\n');
        message.push_str(&init_error);
    }

    if !prompter.confirm_send_unencrypted(&message) {
        info!("Unencrypted send declined, canceled");
        return SendOutcome::Canceled;
    }

    SendOutcome::Send(Resolution {
        flags: plan.flags - (SendFlags::SIGN | SendFlags::ENCRYPT | SendFlags::PGP_MIME),
        sender: plan.from.clone(),
        recipients: plan.to_addr.clone(),
        bcc_recipients: plan.bcc_addr.clone(),
        security: None,
        body_modified: false,
        unencrypted_fallback: true,
    })
}

/// What a send looks like without any backend: nothing changes.
fn passthrough(ctx: &SendContext) -> Resolution {
    let join = |list: &[String]| {
        list.iter()
            .map(|a| address::strip_display_name(a))
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let to_cc: Vec<String> = ctx.to.iter().chain(&ctx.cc).cloned().collect();

    Resolution {
        flags: SendFlags::empty(),
        sender: ctx.identity.email.clone(),
        recipients: join(&to_cc),
        bcc_recipients: join(&ctx.bcc),
        security: None,
        body_modified: false,
        unencrypted_fallback: false,
    }
}

fn strip_all<'a>(
    backend: &dyn CryptoBackend,
    addresses: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    addresses
        .map(|a| backend.strip_email_display_name(a))
        .filter(|a| !a.is_empty())
        .collect()
}
