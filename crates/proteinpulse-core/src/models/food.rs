use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{check_name, check_non_negative, ValidationError};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A saved food the user can log again with one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedShortcut {
    pub id: String,
    pub name: String,
    pub default_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl SavedShortcut {
    pub fn new(name: &str, default_amount: f64) -> Result<Self, ValidationError> {
        let name = check_name(name)?;
        let default_amount = check_non_negative(default_amount)?;
        if default_amount == 0.0 {
            return Err(ValidationError::NotPositive(default_amount));
        }
        Ok(Self {
            id: new_id(),
            name,
            default_amount,
            created_at: Utc::now(),
        })
    }
}

/// One logged intake event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeEntry {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub eaten_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl IntakeEntry {
    pub fn new(name: &str, amount: f64, eaten_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id: new_id(),
            name: check_name(name)?,
            amount: check_non_negative(amount)?,
            eaten_at,
            created_at: Utc::now(),
        })
    }

    /// Log a saved shortcut at its default amount
    pub fn from_shortcut(shortcut: &SavedShortcut, eaten_at: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            name: shortcut.name.clone(),
            amount: shortcut.default_amount,
            eaten_at,
            created_at: Utc::now(),
        }
    }

    /// The daily log bucket this entry belongs to: the local calendar date it was eaten on.
    pub fn log_date(&self) -> NaiveDate {
        self.eaten_at.with_timezone(&Local).date_naive()
    }
}
