//! Internationalization (i18n) module.
//!
//! Provides the localized strings spliced into decrypted messages, shown in
//! send-time prompts, and used for CLI output.
//! English is the default language; Spanish is available as an alternative.

use std::sync::OnceLock;

static CURRENT_LANG: OnceLock<Lang> = OnceLock::new();

/// Supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English (default)
    En,
    /// Spanish
    Es,
}

impl Lang {
    /// Parse a language code string (e.g. "en", "es", "en_US", "es_ES").
    /// Returns `None` for unrecognized codes.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.to_lowercase();
        let prefix = normalized.split(['_', '-', '.']).next().unwrap_or("");
        match prefix {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Initialize the global language. Call once at startup.
/// If already initialized, this is a no-op.
pub fn set_lang(lang: Lang) {
    let _ = CURRENT_LANG.set(lang);
}

/// Get the currently configured language (defaults to English).
pub fn lang() -> Lang {
    CURRENT_LANG.get().copied().unwrap_or(Lang::En)
}

/// Detect language from `INLINEPGP_LANG`, then `LC_MESSAGES`, then `LANG`.
pub fn detect_system_lang() -> Lang {
    ["INLINEPGP_LANG", "LC_MESSAGES", "LANG"]
        .iter()
        .find_map(|var| std::env::var(var).ok().and_then(|v| Lang::from_code(&v)))
        .unwrap_or(Lang::En)
}

macro_rules! msg {
    ($name:ident, $en:expr, $es:expr) => {
        /// Returns a localized string for the current language.
        pub fn $name() -> &'static str {
            match lang() {
                Lang::En => $en,
                Lang::Es => $es,
            }
        }
    };
}

// ── Decrypted message markers ────────────────────────────────────

msg!(
    begin_pgp_part,
    "********* *BEGIN ENCRYPTED or SIGNED PART* *********",
    "********* *INICIO DE LA PARTE CIFRADA o FIRMADA* *********"
);
msg!(
    end_pgp_part,
    "********** *END ENCRYPTED or SIGNED PART* **********",
    "********** *FIN DE LA PARTE CIFRADA o FIRMADA* **********"
);
msg!(
    note_part_encrypted,
    "*Note: Parts of this message have NOT been signed or encrypted, only part of the message is shown as protected*",
    "*Nota: partes de este mensaje NO han sido firmadas ni cifradas, solo una parte del mensaje se muestra como protegida*"
);
msg!(
    unknown_good,
    "Good signature from an unverified key",
    "Firma correcta de una clave no verificada"
);

// ── Send-time prompts ────────────────────────────────────────────

msg!(
    sign_failed,
    "An error occurred while signing or encrypting the message.",
    "Se produjo un error al firmar o cifrar el mensaje."
);
msg!(
    send_unencrypted,
    "Send Unencrypted",
    "Enviar sin cifrar"
);
msg!(
    confirm_send,
    "Send this message?",
    "\u{bf}Enviar este mensaje?"
);
msg!(label_recipients, "Recipients", "Destinatarios");
msg!(label_flags, "Protection", "Protecci\u{f3}n");
msg!(answer_yes_no, "[y/N]", "[s/N]");

// ── CLI help strings ─────────────────────────────────────────────

msg!(
    app_about,
    "inlinepgp: decrypt inline PGP blocks in mail bodies and apply sign/encrypt policy when sending.",
    "inlinepgp: descifra bloques PGP en l\u{ed}nea dentro de correos y aplica la pol\u{ed}tica de firma/cifrado al enviar."
);
msg!(
    help_cmd_decrypt,
    "Decrypt or verify the inline PGP block in a message",
    "Descifrar o verificar el bloque PGP en l\u{ed}nea de un mensaje"
);
msg!(
    help_cmd_encrypt,
    "Sign and/or encrypt a message body before sending",
    "Firmar y/o cifrar el cuerpo de un mensaje antes de enviarlo"
);
msg!(
    help_cmd_completions,
    "Generate shell completions",
    "Generar completions para tu shell"
);
msg!(
    help_cmd_manpage,
    "Generate a man page",
    "Generar p\u{e1}gina de manual"
);

// ── CLI output ───────────────────────────────────────────────────

msg!(
    cli_no_pgp_block,
    "No inline PGP block found, or it could not be processed.",
    "No se encontr\u{f3} un bloque PGP en l\u{ed}nea, o no se pudo procesar."
);
msg!(
    cli_backend_unavailable,
    "The PGP backend is disabled or not installed.",
    "El motor PGP est\u{e1} desactivado o no est\u{e1} instalado."
);
msg!(cli_send_canceled, "Send canceled.", "Env\u{ed}o cancelado.");
msg!(
    err_file_not_found,
    "File not found",
    "Fichero no encontrado"
);

/// Whether `answer` means yes in the current language.
pub fn is_affirmative(answer: &str) -> bool {
    let a = answer.trim().to_lowercase();
    match lang() {
        Lang::En => a == "y" || a == "yes",
        Lang::Es => a == "s" || a == "si" || a == "s\u{ed}" || a == "y" || a == "yes",
    }
}
