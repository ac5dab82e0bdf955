//! The user-facing questions asked while sending.

use std::io::{BufRead, Write};

use tracing::warn;

use crate::i18n;
use crate::model::flags::SendFlags;

/// Asks the user to approve a send.
pub trait Prompter {
    /// Final confirmation before a protected message leaves.
    ///
    /// `recipients` lists To and Cc; `all_recipients` also includes Bcc.
    fn confirm_send(&mut self, recipients: &str, all_recipients: &str, flags: SendFlags) -> bool;

    /// Signing or encryption failed: send the plaintext instead?
    fn confirm_send_unencrypted(&mut self, message: &str) -> bool;
}

/// Answers every question with a fixed value.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm_send(&mut self, _recipients: &str, _all_recipients: &str, _flags: SendFlags) -> bool {
        self.0
    }

    fn confirm_send_unencrypted(&mut self, _message: &str) -> bool {
        self.0
    }
}

/// Asks on a line-oriented terminal: questions go to `output`, answers come from `input`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> bool {
        if let Err(e) = write!(self.output, "{question} {} ", i18n::answer_yes_no())
            .and_then(|()| self.output.flush())
        {
            warn!(error = %e, "Could not write prompt");
            return false;
        }
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => i18n::is_affirmative(&answer),
            Err(e) => {
                warn!(error = %e, "Could not read answer");
                false
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn confirm_send(&mut self, recipients: &str, all_recipients: &str, flags: SendFlags) -> bool {
        let question = format!(
            "{}\n  {}: {}\n  {}: {}\n",
            i18n::confirm_send(),
            i18n::label_recipients(),
            if all_recipients.is_empty() { recipients } else { all_recipients },
            i18n::label_flags(),
            flags.describe(),
        );
        self.ask(&question)
    }

    fn confirm_send_unencrypted(&mut self, message: &str) -> bool {
        let question = format!("{message}\n{}?", i18n::send_unencrypted());
        self.ask(&question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_prompter_accepts_yes() {
        let mut out = Vec::new();
        let mut prompter = LinePrompter::new(&b"y\n"[..], &mut out);
        assert!(prompter.confirm_send("a@example.com", "", SendFlags::SIGN));
        let shown = String::from_utf8(out).expect("utf8");
        assert!(shown.contains("a@example.com"));
        assert!(shown.contains("SIGN"));
    }

    #[test]
    fn test_line_prompter_eof_declines() {
        let mut out = Vec::new();
        let mut prompter = LinePrompter::new(&b""[..], &mut out);
        assert!(!prompter.confirm_send_unencrypted("failed"));
    }

    #[test]
    fn test_fixed_answer() {
        assert!(FixedAnswer(true).confirm_send_unencrypted("x"));
        assert!(!FixedAnswer(false).confirm_send("a", "a", SendFlags::ENCRYPT));
    }
}
