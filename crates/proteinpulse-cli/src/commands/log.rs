use anyhow::{bail, Result};
use chrono::Local;

use proteinpulse_core::models::{IntakeEntry, SavedShortcut};
use proteinpulse_core::Propagation;

use super::helpers::{eaten_at, format_amount, invalid, parse_date, progress_bar, report_write};
use crate::app::App;

/// Find a saved food by exact ID or case-insensitive name
fn find_shortcut<'a>(shortcuts: &'a [SavedShortcut], key: &str) -> Option<&'a SavedShortcut> {
    shortcuts
        .iter()
        .find(|s| s.id == key)
        .or_else(|| shortcuts.iter().find(|s| s.name.eq_ignore_ascii_case(key.trim())))
}

pub(crate) async fn cmd_log_add(
    app: &App,
    food: &str,
    amount: Option<f64>,
    date: Option<String>,
) -> Result<()> {
    let date = parse_date(date)?;
    let at = eaten_at(date);

    let entry = match amount {
        Some(amount) => IntakeEntry::new(food, amount, at).map_err(invalid)?,
        None => {
            let shortcuts = app.repo.get_saved_shortcuts().await;
            let Some(shortcut) = find_shortcut(&shortcuts, food) else {
                bail!("No saved food named '{food}'. Give an amount or add it with `foods add`");
            };
            IntakeEntry::from_shortcut(shortcut, at)
        }
    };

    let outcome = app.repo.add_intake_entry(&entry).await;
    let units = app.repo.get_user_profile().await.units;
    report_write(
        &format!(
            "Logged {} of {} on {} [{}]",
            format_amount(entry.amount, units),
            entry.name,
            entry.log_date(),
            entry.id
        ),
        outcome,
    );
    Ok(())
}

pub(crate) async fn cmd_log_show(app: &App, date: Option<String>) -> Result<()> {
    let date = parse_date(date)?;
    let log = app.repo.get_daily_log(date).await;
    let target = app.repo.target_for(date).await;
    let units = app.repo.get_user_profile().await.units;

    println!("{}", date.format("%A, %B %-d %Y"));
    if log.is_empty() {
        println!("  Nothing logged");
    }
    for entry in log.entries() {
        let time = entry.eaten_at.with_timezone(&Local).format("%H:%M");
        println!(
            "  {time}  {:<24}  {:>10}  {}",
            entry.name,
            format_amount(entry.amount, units),
            entry.id
        );
    }
    println!(
        "Total {} of {}  {}",
        format_amount(log.total(), units),
        format_amount(target, units),
        progress_bar(log.progress(target))
    );
    Ok(())
}

pub(crate) async fn cmd_log_rm(app: &App, id: &str, date: Option<String>) -> Result<()> {
    let date = parse_date(date)?;
    let outcome = app.repo.delete_intake_entry(date, id).await;
    if outcome == Propagation::Unchanged {
        bail!("No entry {id} logged on {date}");
    }
    report_write(&format!("Removed entry {id} from {date}"), outcome);
    Ok(())
}
