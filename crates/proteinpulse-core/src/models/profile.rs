use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{check_non_negative, ValidationError};

/// Daily protein target for a brand-new profile, in grams.
pub const DEFAULT_DAILY_TARGET: f64 = 160.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitPreference {
    #[default]
    Grams,
    Ounces,
}

impl std::fmt::Display for UnitPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitPreference::Grams => write!(f, "grams"),
            UnitPreference::Ounces => write!(f, "ounces"),
        }
    }
}

impl FromStr for UnitPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(UnitPreference::Grams),
            "oz" | "ounce" | "ounces" => Ok(UnitPreference::Ounces),
            other => Err(format!("unknown unit '{}' (expected grams or ounces)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemePreference::Light => write!(f, "light"),
            ThemePreference::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            other => Err(format!("unknown theme '{}' (expected light or dark)", other)),
        }
    }
}

/// Per-user settings. One per user, created with defaults on first access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub daily_target: f64,
    pub email: Option<String>,
    pub synced: bool,
    pub units: UnitPreference,
    pub theme: ThemePreference,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            daily_target: DEFAULT_DAILY_TARGET,
            email: None,
            synced: false,
            units: UnitPreference::Grams,
            theme: ThemePreference::Light,
        }
    }
}

/// Partial update to a `UserProfile`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    daily_target: Option<f64>,
    email: Option<String>,
    synced: Option<bool>,
    units: Option<UnitPreference>,
    theme: Option<ThemePreference>,
}

impl ProfilePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn daily_target(mut self, target: f64) -> Result<Self, ValidationError> {
        self.daily_target = Some(check_non_negative(target)?);
        Ok(self)
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn synced(mut self, synced: bool) -> Self {
        self.synced = Some(synced);
        self
    }

    pub fn units(mut self, units: UnitPreference) -> Self {
        self.units = Some(units);
        self
    }

    pub fn theme(mut self, theme: ThemePreference) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields over `profile`
    pub fn apply(&self, profile: &UserProfile) -> UserProfile {
        let mut updated = profile.clone();
        if let Some(target) = self.daily_target {
            updated.daily_target = target;
        }
        if let Some(ref email) = self.email {
            updated.email = Some(email.clone());
        }
        if let Some(synced) = self.synced {
            updated.synced = synced;
        }
        if let Some(units) = self.units {
            updated.units = units;
        }
        if let Some(theme) = self.theme {
            updated.theme = theme;
        }
        updated
    }
}
