//! Finding and rule description model.
//!
//! # Responsibility
//! - Define the records exchanged between rules, engine, reporter and store.
//!
//! # Invariants
//! - Finding locations are relative to the checked root and use `/`.
//! - Fingerprints never include line or column numbers.

pub mod finding;
pub mod rule;
