//! `inlinepgp` — inline PGP handling for mail clients.
//!
//! On receipt, [`inline`] locates an armored PGP block inside a plaintext
//! body, hands it to a [`backend`] for decryption and splices the result back
//! between the surrounding text. On send, [`send`] derives the sign/encrypt
//! flags and either attaches a PGP/MIME descriptor or rewrites the body.

pub mod backend;
pub mod config;
pub mod error;
pub mod hook;
pub mod i18n;
pub mod inline;
pub mod model;
pub mod send;
pub mod source;
