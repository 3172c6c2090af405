use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{check_non_negative, ValidationError};

/// A protein target for one specific date, overriding the profile default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGoal {
    pub date: NaiveDate,
    pub target: f64,
}

impl DailyGoal {
    pub fn new(date: NaiveDate, target: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            date,
            target: check_non_negative(target)?,
        })
    }
}
