//! Backend that drives an installed `gpg` (or compatible) program.
//!
//! Every call runs the program once in batch mode with `--status-fd 2` and
//! reads the `[GNUPG:]` status lines from stderr.

use std::ffi::OsStr;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::config::BackendConfig;
use crate::error::{PgpError, Result};
use crate::model::flags::{SendFlags, StatusFlags, UiFlags};
use crate::model::message::{DecryptionResult, EncryptionResult, Identity};

use super::{CryptoBackend, SenderKeyLookup};

const STATUS_PREFIX: &str = "[GNUPG:] ";
const BATCH_ARGS: [&str; 4] = ["--batch", "--no-tty", "--status-fd", "2"];

/// Runs the configured gpg program.
#[derive(Debug, Clone)]
pub struct GpgBackend {
    program: PathBuf,
    homedir: Option<PathBuf>,
    version: String,
}

/// Captured result of one gpg invocation.
#[derive(Debug, Default)]
struct GpgOutput {
    exit_code: i32,
    stdout: Vec<u8>,
    status: StatusFlags,
    /// Human-readable stderr lines, status lines removed.
    messages: String,
}

impl GpgBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            program: config.program.clone(),
            homedir: config.homedir.clone(),
            version: String::new(),
        }
    }

    /// Create the backend and check that the program runs.
    pub fn probe(config: &BackendConfig) -> Result<Self> {
        let mut backend = Self::new(config);
        let output = backend.run(&["--version"], b"")?;
        if output.exit_code != 0 {
            return Err(PgpError::Backend(format!(
                "'{}' --version exited with {}",
                backend.program.display(),
                output.exit_code
            )));
        }
        backend.version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(backend)
    }

    /// First line of `--version`, empty if never probed.
    pub fn version(&self) -> &str {
        &self.version
    }

    fn run<S: AsRef<OsStr>>(&self, args: &[S], input: &[u8]) -> Result<GpgOutput> {
        let mut cmd = Command::new(&self.program);
        if let Some(ref homedir) = self.homedir {
            cmd.arg("--homedir").arg(homedir);
        }
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        trace!(command = ?cmd, "Running backend");

        let mut child = cmd.spawn().map_err(|e| PgpError::io(&self.program, e))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PgpError::Backend("stdin of backend not captured".into()))?;

        let output = std::thread::scope(|s| {
            s.spawn(move || {
                // gpg may exit before reading everything; its exit code says why.
                let _ = stdin.write_all(input);
            });
            child.wait_with_output()
        })
        .map_err(|e| PgpError::io(&self.program, e))?;

        let (status, messages) = parse_status(&output.stderr);
        Ok(GpgOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            status,
            messages,
        })
    }
}

impl CryptoBackend for GpgBackend {
    fn decrypt(&self, _ui_flags: UiFlags, armored: &[u8]) -> Result<DecryptionResult> {
        let mut args = BATCH_ARGS.to_vec();
        args.push("--decrypt");
        let output = self.run(&args[..], armored)?;
        let exit_code = fix_exit_code(output.exit_code, output.status, !output.stdout.is_empty());
        debug!(
            exit_code,
            gpg_exit_code = output.exit_code,
            status = ?output.status,
            "gpg decrypt finished"
        );

        Ok(DecryptionResult {
            exit_code,
            status: output.status,
            plaintext: output.stdout,
            error_message: output.messages,
        })
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
        let args = encrypt_args(ui_flags, from, to, bcc, send_flags)?;
        let output = self.run(&args[..], plaintext)?;
        debug!(exit_code = output.exit_code, flags = ?send_flags, "gpg encrypt finished");

        Ok(EncryptionResult {
            cipher_text: output.stdout,
            exit_code: output.exit_code,
            status: output.status,
            error_message: output.messages,
        })
    }

    fn sender_key_lookup(&self) -> Option<&dyn SenderKeyLookup> {
        Some(self)
    }
}

impl SenderKeyLookup for GpgBackend {
    fn sender_user_id(&self, identity: &Identity) -> Option<String> {
        if identity.key_mode > 0 {
            if let Some(ref key_id) = identity.key_id {
                return Some(key_id.clone());
            }
        }
        if identity.email.is_empty() {
            return None;
        }

        let mut args: Vec<&str> = BATCH_ARGS.to_vec();
        args.extend(["--with-colons", "--list-secret-keys", identity.email.as_str()]);
        match self.run(&args[..], b"") {
            Ok(output) if output.exit_code == 0 => {
                first_secret_key_id(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!(email = %identity.email, exit_code = output.exit_code, "No secret key for sender");
                None
            }
            Err(e) => {
                debug!(email = %identity.email, error = %e, "Secret key lookup failed");
                None
            }
        }
    }
}

/// Build the gpg argument list for an encrypt/sign request.
fn encrypt_args(
    ui_flags: UiFlags,
    from: &str,
    to: &str,
    bcc: &str,
    send_flags: SendFlags,
) -> Result<Vec<String>> {
    let mut args: Vec<String> = BATCH_ARGS.iter().map(|a| a.to_string()).collect();
    args.push("--armor".into());

    if send_flags.contains(SendFlags::ALWAYS_TRUST) {
        args.extend(["--trust-model".to_string(), "always".to_string()]);
    }
    if !from.is_empty() {
        args.extend(["--local-user".to_string(), from.to_string()]);
    }

    if send_flags.contains(SendFlags::ENCRYPT) {
        args.push("--encrypt".into());
        for rcpt in split_addresses(to) {
            args.extend(["--recipient".to_string(), rcpt.to_string()]);
        }
        for rcpt in split_addresses(bcc) {
            args.extend(["--hidden-recipient".to_string(), rcpt.to_string()]);
        }
        if send_flags.contains(SendFlags::ENCRYPT_TO_SELF) && !from.is_empty() {
            args.extend(["--encrypt-to".to_string(), from.to_string()]);
        }
        if send_flags.contains(SendFlags::SIGN) {
            args.push("--sign".into());
        }
    } else if send_flags.contains(SendFlags::SIGN) {
        if ui_flags.contains(UiFlags::PGP_MIME) {
            args.push("--detach-sign".into());
        } else {
            args.push("--clearsign".into());
        }
    } else {
        return Err(PgpError::Backend(
            "encrypt called without SIGN or ENCRYPT".into(),
        ));
    }

    Ok(args)
}

fn split_addresses(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|a| !a.is_empty())
}

/// Collect status keywords and the remaining diagnostic lines from stderr.
fn parse_status(stderr: &[u8]) -> (StatusFlags, String) {
    let text = String::from_utf8_lossy(stderr);
    let mut status = StatusFlags::empty();
    let mut messages = Vec::new();

    for line in text.lines() {
        let Some(rest) = line.strip_prefix(STATUS_PREFIX) else {
            if !line.trim().is_empty() {
                messages.push(line);
            }
            continue;
        };
        status |= match rest.split_whitespace().next().unwrap_or_default() {
            "DECRYPTION_OKAY" => StatusFlags::DECRYPTION_OKAY,
            "DECRYPTION_FAILED" => StatusFlags::DECRYPTION_FAILED,
            "GOODSIG" => StatusFlags::GOOD_SIGNATURE,
            "BADSIG" => StatusFlags::BAD_SIGNATURE,
            "ERRSIG" | "NO_PUBKEY" | "EXPKEYSIG" | "REVKEYSIG" => StatusFlags::UNVERIFIED_SIGNATURE,
            "TRUST_UNDEFINED" | "TRUST_NEVER" => StatusFlags::UNTRUSTED_IDENTITY,
            "NODATA" => StatusFlags::NO_DATA,
            _ => StatusFlags::empty(),
        };
    }

    (status, messages.join("\n"))
}

/// Exit code to report for a decrypt or verify run.
///
/// gpg exits 2 whenever a signature cannot be checked, even when the data was
/// recovered. Successful decryption, or a clearsigned text whose only problem
/// is an unknown signer key, count as success; the status flags keep the detail.
fn fix_exit_code(exit_code: i32, status: StatusFlags, has_plaintext: bool) -> i32 {
    if exit_code == 0 {
        return 0;
    }
    if status.contains(StatusFlags::DECRYPTION_OKAY) && !status.contains(StatusFlags::DECRYPTION_FAILED) {
        return 0;
    }
    let unverified_only = status.contains(StatusFlags::UNVERIFIED_SIGNATURE)
        && !status.intersects(StatusFlags::BAD_SIGNATURE | StatusFlags::DECRYPTION_FAILED);
    if unverified_only && has_plaintext {
        return 0;
    }
    exit_code
}

/// Key id (as `0x…`) of the first `sec` record in `--with-colons` output.
fn first_secret_key_id(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| line.starts_with("sec:"))
        .find_map(|line| line.split(':').nth(4))
        .filter(|id| !id.is_empty())
        .map(|id| format!("0x{id}"))
}
