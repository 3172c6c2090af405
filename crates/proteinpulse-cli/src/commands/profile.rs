use anyhow::{bail, Result};

use proteinpulse_core::models::{ProfilePatch, ThemePreference, UnitPreference};

use super::helpers::{format_amount, invalid, report_write};
use crate::app::App;

pub(crate) async fn cmd_profile_show(app: &App) -> Result<()> {
    let profile = app.repo.get_user_profile().await;
    println!("Daily target: {}", format_amount(profile.daily_target, profile.units));
    println!("Units:        {}", profile.units);
    println!("Theme:        {}", profile.theme);
    if let Some(ref email) = profile.email {
        println!("Account:      {email}");
    }
    println!("Synced:       {}", if profile.synced { "yes" } else { "no" });
    Ok(())
}

pub(crate) async fn cmd_profile_set(
    app: &App,
    target: Option<f64>,
    units: Option<UnitPreference>,
    theme: Option<ThemePreference>,
) -> Result<()> {
    let mut patch = ProfilePatch::new();
    if let Some(target) = target {
        patch = patch.daily_target(target).map_err(invalid)?;
    }
    if let Some(units) = units {
        patch = patch.units(units);
    }
    if let Some(theme) = theme {
        patch = patch.theme(theme);
    }
    if patch.is_empty() {
        bail!("Nothing to change. Use --target, --units or --theme");
    }

    let outcome = app.repo.update_user_profile(&patch).await;
    report_write("Profile updated", outcome);
    Ok(())
}

pub(crate) async fn cmd_profile_reset(app: &App) -> Result<()> {
    let outcome = app.repo.reset_user_profile().await;
    report_write("Profile reset to defaults", outcome);
    Ok(())
}
