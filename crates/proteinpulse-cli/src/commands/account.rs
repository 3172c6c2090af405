use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use proteinpulse_core::auth::{CredentialStore, SessionData};
use proteinpulse_core::models::ProfilePatch;

use crate::app::App;

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let email = input.trim().to_string();
    if email.is_empty() {
        bail!("An email address is required to sign in");
    }
    Ok(email)
}

pub(crate) async fn cmd_status(app: &App) -> Result<()> {
    let mode = if app.repo.is_remote_backed() {
        "remote-backed"
    } else {
        "local only"
    };
    println!("Storage:   {mode}");

    match app.session_data() {
        Some(data) if !data.is_expired() => {
            let who = data.email.as_deref().unwrap_or(&data.user_id);
            println!(
                "Signed in: {who} (session expires in {} min)",
                data.minutes_until_expiry()
            );
        }
        Some(_) => println!("Signed in: session expired, run `proteinpulse signin`"),
        None => println!("Signed in: no (guest)"),
    }

    let ages = app.repo.cache_ages();
    println!("Namespace: {}", app.repo.namespace());
    println!("Profile:   cached {}", ages.profile_age());
    println!("Foods:     cached {}", ages.shortcuts_age());
    println!("Pending:   {} write(s) waiting to sync", app.repo.pending_writes());
    Ok(())
}

fn resolve_email(app: &App, email: Option<String>) -> Result<String> {
    match email.or_else(|| app.config.last_email.clone()) {
        Some(email) => Ok(email),
        None => prompt_email(),
    }
}

fn no_remote() -> anyhow::Error {
    anyhow::anyhow!("No remote backend configured. Set PROTEIN_PULSE_URL and PROTEIN_PULSE_ANON_KEY")
}

pub(crate) async fn cmd_signin(app: &mut App, email: Option<String>, remember: bool) -> Result<()> {
    let client = app.client.clone().ok_or_else(no_remote)?;
    let email = resolve_email(app, email)?;
    let password = rpassword::prompt_password(format!("Password for {email}: "))
        .context("Failed to read password")?;

    println!("Signing in...");
    let session_data = client.authenticate(&email, &password).await?;
    start_session(app, session_data, &email, &password, remember).await
}

pub(crate) async fn cmd_signup(app: &mut App, email: Option<String>, remember: bool) -> Result<()> {
    let client = app.client.clone().ok_or_else(no_remote)?;
    let email = match email {
        Some(email) => email,
        None => prompt_email()?,
    };
    let password = rpassword::prompt_password(format!("Choose a password for {email}: "))
        .context("Failed to read password")?;
    let confirm = rpassword::prompt_password("Repeat password: ").context("Failed to read password")?;
    if password != confirm {
        bail!("Passwords do not match");
    }

    println!("Creating account...");
    match client.sign_up(&email, &password).await? {
        Some(session_data) => start_session(app, session_data, &email, &password, remember).await,
        None => {
            app.config.last_email = Some(email.clone());
            app.config.save()?;
            println!("Account created. Confirm the email sent to {email}, then run `proteinpulse signin`");
            Ok(())
        }
    }
}

/// Store a new session, link the profile to the account and push pending writes
async fn start_session(
    app: &mut App,
    session_data: SessionData,
    email: &str,
    password: &str,
    remember: bool,
) -> Result<()> {
    app.set_session(session_data)?;

    if remember {
        if let Err(e) = CredentialStore::store(email, password) {
            warn!(error = %e, "Failed to remember password");
        }
    }

    app.config.last_email = Some(email.to_string());
    app.config.save()?;

    // Creates the remote profile on first sign-in
    app.repo.get_user_profile().await;
    let outcome = app
        .repo
        .update_user_profile(&ProfilePatch::new().email(email).synced(true))
        .await;
    info!(%outcome, "Profile linked to account");

    println!("Signed in as {email}");
    let report = app.repo.sync_pending().await;
    if report.attempted > 0 {
        println!("Synced {} pending write(s)", report.synced);
    }
    Ok(())
}

pub(crate) async fn cmd_signout(app: &App, forget: bool) -> Result<()> {
    let Some(data) = app.session_data() else {
        println!("Not signed in");
        return Ok(());
    };

    if let Some(client) = app.client.as_ref() {
        if let Err(e) = client.sign_out(&data).await {
            warn!(error = %e, "Server sign-out failed, clearing local session anyway");
        }
    }
    app.clear_session()?;

    if forget {
        if let Some(email) = data.email.as_deref().or(app.config.last_email.as_deref()) {
            if let Err(e) = CredentialStore::delete(email) {
                warn!(error = %e, "Failed to remove remembered password");
            }
        }
    }

    println!("Signed out");
    Ok(())
}

pub(crate) async fn cmd_sync(app: &App) -> Result<()> {
    if !app.repo.is_remote_backed() {
        println!("No remote backend configured; everything is stored locally");
        return Ok(());
    }

    let report = app.repo.sync_pending().await;
    if report.attempted == 0 && report.remaining == 0 {
        println!("Nothing to sync");
        return Ok(());
    }
    println!(
        "Synced {}, dropped {}, still pending {}",
        report.synced, report.dropped, report.remaining
    );
    if report.remaining > 0 && app.session_data().map_or(true, |d| d.is_expired()) {
        println!("Sign in to push the remaining writes");
    }
    Ok(())
}
