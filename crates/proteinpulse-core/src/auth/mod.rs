//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `Session`: Token-based session persisted to disk, with expiry
//! - `SessionSource`: what the repository asks "who is signed in right now?"
//! - `CredentialStore`: Secure OS-level credential storage via keyring
//!
//! The repository never owns the session lifecycle; it only reads the
//! current session at the moment of each remote attempt.

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData, SessionSource};
