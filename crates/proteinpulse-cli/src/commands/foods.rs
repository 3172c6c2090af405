use anyhow::{bail, Result};

use proteinpulse_core::models::SavedShortcut;
use proteinpulse_core::Propagation;

use super::helpers::{format_amount, invalid, report_write};
use crate::app::App;

pub(crate) async fn cmd_foods_list(app: &App) -> Result<()> {
    let shortcuts = app.repo.get_saved_shortcuts().await;
    if shortcuts.is_empty() {
        println!("No saved foods. Add one with `proteinpulse foods add <name> <grams>`");
        return Ok(());
    }

    let units = app.repo.get_user_profile().await.units;
    for shortcut in &shortcuts {
        println!(
            "{:<36}  {:<24}  {}",
            shortcut.id,
            shortcut.name,
            format_amount(shortcut.default_amount, units)
        );
    }
    Ok(())
}

pub(crate) async fn cmd_foods_add(app: &App, name: &str, amount: f64) -> Result<()> {
    let shortcut = SavedShortcut::new(name, amount).map_err(invalid)?;
    let outcome = app.repo.add_saved_shortcut(&shortcut).await;
    report_write(&format!("Saved '{}' [{}]", shortcut.name, shortcut.id), outcome);
    Ok(())
}

pub(crate) async fn cmd_foods_rm(app: &App, id: &str) -> Result<()> {
    let outcome = app.repo.delete_saved_shortcut(id).await;
    if outcome == Propagation::Unchanged {
        bail!("No saved food with ID {id}");
    }
    report_write(&format!("Removed saved food {id}"), outcome);
    Ok(())
}
