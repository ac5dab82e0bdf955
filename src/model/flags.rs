//! Bit sets exchanged with the crypto backend.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// What the backend reported about a decrypted or verified block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct StatusFlags: u32 {
        const DECRYPTION_OKAY      = 1 << 0;
        const DECRYPTION_FAILED    = 1 << 1;
        const GOOD_SIGNATURE       = 1 << 2;
        const BAD_SIGNATURE        = 1 << 3;
        /// Signed, but the signer's key is unknown or unusable.
        const UNVERIFIED_SIGNATURE = 1 << 4;
        const UNTRUSTED_IDENTITY   = 1 << 5;
        const NO_DATA              = 1 << 6;
    }
}

bitflags! {
    /// Send-time policy bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SendFlags: u32 {
        const SIGN            = 1 << 0;
        const ENCRYPT         = 1 << 1;
        const PGP_MIME        = 1 << 2;
        const ENCRYPT_TO_SELF = 1 << 3;
        const ALWAYS_TRUST    = 1 << 4;
        const SAVE_MESSAGE    = 1 << 5;
    }
}

bitflags! {
    /// How the backend may interact with the user.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct UiFlags: u32 {
        const INTERACTIVE = 1 << 0;
        const PGP_MIME    = 1 << 1;
    }
}

impl SendFlags {
    /// SIGN or ENCRYPT requested.
    pub fn is_protected(self) -> bool {
        self.intersects(Self::SIGN | Self::ENCRYPT)
    }

    /// PGP/MIME applies only when something is actually signed or encrypted.
    pub fn using_pgp_mime(self) -> bool {
        self.contains(Self::PGP_MIME) && self.is_protected()
    }

    /// `"SIGN | ENCRYPT"` style text for prompts and logs.
    pub fn describe(self) -> String {
        let mut out = String::new();
        let _ = bitflags::parser::to_writer(&self, &mut out);
        out
    }
}
