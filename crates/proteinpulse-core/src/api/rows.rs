//! Wire representations of the backend tables and their translation to
//! domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{DailyGoal, IntakeEntry, SavedShortcut, ThemePreference, UnitPreference, UserProfile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub user_id: String,
    pub daily_protein_goal: f64,
    pub email: Option<String>,
    #[serde(default)]
    pub is_synced: bool,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

impl ProfileRow {
    pub fn from_profile(user_id: &str, profile: &UserProfile) -> Self {
        Self {
            user_id: user_id.to_string(),
            daily_protein_goal: profile.daily_target,
            email: profile.email.clone(),
            is_synced: profile.synced,
            units: Some(profile.units.to_string()),
            theme: Some(profile.theme.to_string()),
        }
    }

    /// Unknown enum values fall back to the profile defaults
    pub fn into_profile(self) -> UserProfile {
        let defaults = UserProfile::default();
        let units = match self.units.as_deref().map(str::parse::<UnitPreference>) {
            Some(Ok(units)) => units,
            Some(Err(e)) => {
                warn!(error = %e, "Unknown unit preference from server");
                defaults.units
            }
            None => defaults.units,
        };
        let theme = match self.theme.as_deref().map(str::parse::<ThemePreference>) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                warn!(error = %e, "Unknown theme preference from server");
                defaults.theme
            }
            None => defaults.theme,
        };
        let daily_target = if self.daily_protein_goal.is_finite() && self.daily_protein_goal >= 0.0 {
            self.daily_protein_goal
        } else {
            warn!(target = self.daily_protein_goal, "Invalid daily goal from server");
            defaults.daily_target
        };

        UserProfile {
            daily_target,
            email: self.email,
            synced: self.is_synced,
            units,
            theme,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFoodRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub default_protein_amount: f64,
    pub created_at: DateTime<Utc>,
}

impl SavedFoodRow {
    pub fn from_shortcut(user_id: &str, shortcut: &SavedShortcut) -> Self {
        Self {
            id: shortcut.id.clone(),
            user_id: user_id.to_string(),
            name: shortcut.name.clone(),
            default_protein_amount: shortcut.default_amount,
            created_at: shortcut.created_at,
        }
    }

    /// `None` for rows that could never have been created locally
    pub fn into_shortcut(self) -> Option<SavedShortcut> {
        if !(self.default_protein_amount.is_finite() && self.default_protein_amount > 0.0) {
            warn!(id = %self.id, amount = self.default_protein_amount, "Skipping saved food with invalid amount");
            return None;
        }
        Some(SavedShortcut {
            id: self.id,
            name: self.name,
            default_amount: self.default_protein_amount,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntryRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub protein_amount: f64,
    pub time_eaten: DateTime<Utc>,
    /// Local calendar date of `time_eaten`, stored so the server can filter by day
    pub log_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl FoodEntryRow {
    pub fn from_entry(user_id: &str, entry: &IntakeEntry) -> Self {
        Self {
            id: entry.id.clone(),
            user_id: user_id.to_string(),
            name: entry.name.clone(),
            protein_amount: entry.amount,
            time_eaten: entry.eaten_at,
            log_date: entry.log_date(),
            created_at: entry.created_at,
        }
    }

    pub fn into_entry(self) -> Option<IntakeEntry> {
        if !(self.protein_amount.is_finite() && self.protein_amount >= 0.0) {
            warn!(id = %self.id, amount = self.protein_amount, "Skipping food entry with invalid amount");
            return None;
        }
        Some(IntakeEntry {
            id: self.id,
            name: self.name,
            amount: self.protein_amount,
            eaten_at: self.time_eaten,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGoalRow {
    pub user_id: String,
    pub date: NaiveDate,
    pub target_protein: f64,
}

impl DailyGoalRow {
    pub fn from_goal(user_id: &str, goal: &DailyGoal) -> Self {
        Self {
            user_id: user_id.to_string(),
            date: goal.date,
            target_protein: goal.target,
        }
    }

    pub fn into_goal(self) -> Option<DailyGoal> {
        match DailyGoal::new(self.date, self.target_protein) {
            Ok(goal) => Some(goal),
            Err(e) => {
                warn!(date = %self.date, error = %e, "Skipping invalid daily goal");
                None
            }
        }
    }
}
