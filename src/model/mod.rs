//! Core data model: armored blocks, flag sets, addresses and per-message values.

pub mod address;
pub mod armor;
pub mod flags;
pub mod message;
