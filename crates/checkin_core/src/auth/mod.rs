//! Shared-passcode authorization gate and coach password digests.
//!
//! # Responsibility
//! - Guard sensitive roster, coach and log mutations behind one shared secret.
//! - Derive and check salted digests for coach sign-in passwords.
//!
//! # Invariants
//! - Every holder of the secret has full privilege; operators are not told
//!   apart.
//! - No lockout, no backoff, no attempt counting.
//!
//! # Security
//! This is a PIN-style gate, not authentication. The comparison is plain
//! string equality and the secret is a configuration constant. Do not build
//! identity or audit features on top of it.

pub mod gate;
pub mod password;
