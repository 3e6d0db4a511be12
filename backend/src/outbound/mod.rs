//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-process identity, household, and poll stores
//! - **password**: salted SHA-256 credential hasher
//!
//! Adapters are thin translators between domain types and their storage
//! representation. They contain no business logic.

pub mod memory;
pub mod password;
