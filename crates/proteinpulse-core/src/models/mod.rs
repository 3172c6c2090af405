//! Data models for Protein Pulse entities.
//!
//! This module contains the domain types shared by the local store, the
//! remote client and the repository:
//!
//! - `UserProfile`, `ProfilePatch`: per-user settings and the default daily target
//! - `SavedShortcut`: a saved food with a default protein amount
//! - `IntakeEntry`, `DailyLog`: logged intake and the per-date bucket it lands in
//! - `DailyGoal`: a target bound to one calendar date

pub mod food;
pub mod goal;
pub mod log;
pub mod profile;

use thiserror::Error;

pub use food::{IntakeEntry, SavedShortcut};
pub use goal::DailyGoal;
pub use log::DailyLog;
pub use profile::{ProfilePatch, ThemePreference, UnitPreference, UserProfile, DEFAULT_DAILY_TARGET};

/// Rejected input when constructing a domain value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Amount must be a finite number, got {0}")]
    NotFinite(f64),

    #[error("Amount must not be negative, got {0}")]
    Negative(f64),

    #[error("Default amount must be greater than zero, got {0}")]
    NotPositive(f64),
}

/// Check an amount that may be zero (intake, targets)
pub(crate) fn check_non_negative(amount: f64) -> Result<f64, ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NotFinite(amount));
    }
    if amount < 0.0 {
        return Err(ValidationError::Negative(amount));
    }
    Ok(amount)
}

pub(crate) fn check_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Calendar date key used for per-date buckets ("YYYY-MM-DD")
pub fn date_key(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
