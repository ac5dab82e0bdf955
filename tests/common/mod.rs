//! Shared helpers: a scripted backend and a recording prompter.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use inlinepgp::backend::{BackendHandle, CryptoBackend, KeySelection, KeySelector, SenderKeyLookup};
use inlinepgp::error::{PgpError, Result};
use inlinepgp::model::flags::{SendFlags, StatusFlags, UiFlags};
use inlinepgp::model::message::{DecryptionResult, EncryptionResult, Identity};
use inlinepgp::send::Prompter;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

/// One recorded `encrypt` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptCall {
    pub ui_flags: UiFlags,
    pub plaintext: Vec<u8>,
    pub from: String,
    pub to: String,
    pub bcc: String,
    pub send_flags: SendFlags,
}

/// A backend that answers from a script and records what it was asked.
#[derive(Default)]
pub struct ScriptedBackend {
    pub decrypt_reply: DecryptionResult,
    pub decrypt_error: Option<String>,
    pub encrypt_reply: EncryptionResult,
    pub encrypt_error: Option<String>,
    pub init_error: Option<String>,
    /// `Some` enables the sender lookup capability.
    pub sender_id: Option<Option<String>>,
    /// `Some` enables the key selector capability; the inner value is its answer.
    pub selection: Option<Option<KeySelection>>,
    pub mime_ready: Cell<bool>,
    pub mime_inits: Cell<u32>,
    pub decrypt_calls: RefCell<Vec<Vec<u8>>>,
    pub encrypt_calls: RefCell<Vec<EncryptCall>>,
    pub selector_calls: Cell<u32>,
}

impl ScriptedBackend {
    pub fn decrypting_to(plaintext: &[u8], status: StatusFlags) -> Self {
        Self {
            decrypt_reply: DecryptionResult {
                exit_code: 0,
                status,
                plaintext: plaintext.to_vec(),
                error_message: String::new(),
            },
            ..Self::default()
        }
    }

    pub fn encrypting_to(armored: &str) -> Self {
        Self {
            encrypt_reply: EncryptionResult {
                cipher_text: armored.as_bytes().to_vec(),
                exit_code: 0,
                status: StatusFlags::empty(),
                error_message: String::new(),
            },
            ..Self::default()
        }
    }

    /// Returns the typed handle for inspection and the trait object for injection.
    pub fn into_handle(self) -> (Rc<ScriptedBackend>, BackendHandle) {
        let backend = Rc::new(self);
        let handle: BackendHandle = backend.clone();
        (backend, handle)
    }
}

impl CryptoBackend for ScriptedBackend {
    fn decrypt(&self, _ui_flags: UiFlags, armored: &[u8]) -> Result<DecryptionResult> {
        self.decrypt_calls.borrow_mut().push(armored.to_vec());
        match &self.decrypt_error {
            Some(message) => Err(PgpError::Backend(message.clone())),
            None => Ok(self.decrypt_reply.clone()),
        }
    }

    fn encrypt(
        &self,
        ui_flags: UiFlags,
        plaintext: &[u8],
        from: &str,
        to: &str,
        bcc: &str,
        send_flags: SendFlags,
    ) -> Result<EncryptionResult> {
        self.encrypt_calls.borrow_mut().push(EncryptCall {
            ui_flags,
            plaintext: plaintext.to_vec(),
            from: from.to_string(),
            to: to.to_string(),
            bcc: bcc.to_string(),
            send_flags,
        });
        match &self.encrypt_error {
            Some(message) => Err(PgpError::Backend(message.clone())),
            None => Ok(self.encrypt_reply.clone()),
        }
    }

    fn mime_initialized(&self) -> bool {
        self.mime_ready.get()
    }

    fn initialize_mime(&self) {
        self.mime_inits.set(self.mime_inits.get() + 1);
        self.mime_ready.set(true);
    }

    fn initialization_error(&self) -> Option<String> {
        self.init_error.clone()
    }

    fn sender_key_lookup(&self) -> Option<&dyn SenderKeyLookup> {
        self.sender_id.as_ref().map(|_| self as &dyn SenderKeyLookup)
    }

    fn key_selector(&self) -> Option<&dyn KeySelector> {
        self.selection.as_ref().map(|_| self as &dyn KeySelector)
    }
}

impl SenderKeyLookup for ScriptedBackend {
    fn sender_user_id(&self, _identity: &Identity) -> Option<String> {
        self.sender_id.clone().flatten()
    }
}

impl KeySelector for ScriptedBackend {
    fn select_keys(
        &self,
        _send_flags: SendFlags,
        _opt_flags: SendFlags,
        _got_flags: SendFlags,
        _from: &str,
        _to: &[String],
        _bcc: &[String],
    ) -> Option<KeySelection> {
        self.selector_calls.set(self.selector_calls.get() + 1);
        self.selection.clone().flatten()
    }
}

/// Answers from fixed values and records every question.
pub struct RecordingPrompter {
    pub confirm: bool,
    pub send_unencrypted: bool,
    pub confirm_asked: Vec<(String, String, SendFlags)>,
    pub unencrypted_asked: Vec<String>,
}

impl RecordingPrompter {
    pub fn new(confirm: bool, send_unencrypted: bool) -> Self {
        Self {
            confirm,
            send_unencrypted,
            confirm_asked: Vec::new(),
            unencrypted_asked: Vec::new(),
        }
    }
}

impl Prompter for RecordingPrompter {
    fn confirm_send(&mut self, recipients: &str, all_recipients: &str, flags: SendFlags) -> bool {
        self.confirm_asked
            .push((recipients.to_string(), all_recipients.to_string(), flags));
        self.confirm
    }

    fn confirm_send_unencrypted(&mut self, message: &str) -> bool {
        self.unencrypted_asked.push(message.to_string());
        self.send_unencrypted
    }
}
