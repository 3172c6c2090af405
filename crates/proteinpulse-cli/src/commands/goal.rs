use anyhow::Result;

use proteinpulse_core::models::DailyGoal;

use super::helpers::{format_amount, invalid, parse_date, report_write};
use crate::app::App;

pub(crate) async fn cmd_goal_show(app: &App, date: Option<String>) -> Result<()> {
    let date = parse_date(date)?;
    let profile = app.repo.get_user_profile().await;
    match app.repo.get_daily_goal(date).await {
        Some(goal) => println!("{date}: {}", format_amount(goal.target, profile.units)),
        None => println!(
            "{date}: {} (profile default)",
            format_amount(profile.daily_target, profile.units)
        ),
    }
    Ok(())
}

pub(crate) async fn cmd_goal_set(app: &App, target: f64, date: Option<String>) -> Result<()> {
    let date = parse_date(date)?;
    let goal = DailyGoal::new(date, target).map_err(invalid)?;
    let outcome = app.repo.set_daily_goal(&goal).await;
    report_write(&format!("Goal for {date} set to {target} g"), outcome);
    Ok(())
}
