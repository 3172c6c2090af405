//! Process-wide state shared by the commands.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use proteinpulse_core::api::RestClient;
use proteinpulse_core::auth::{CredentialStore, Session, SessionData};
use proteinpulse_core::config::Config;
use proteinpulse_core::Repository;

pub struct App {
    pub config: Config,
    pub session: Arc<RwLock<Session>>,
    /// Auth client; `None` when no remote backend is configured
    pub client: Option<RestClient>,
    pub repo: Repository,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;

        // Load session from disk if it exists
        let mut session = Session::new(data_dir);
        let load_result = session.load();
        debug!(?load_result, has_data = session.data.is_some(), "Session loaded");
        let session = Arc::new(RwLock::new(session));

        let client = match config.remote() {
            Some(remote) => Some(RestClient::new(&remote.url, &remote.anon_key)?),
            None => None,
        };
        let repo = Repository::from_config(&config, session.clone())?;

        Ok(Self {
            config,
            session,
            client,
            repo,
        })
    }

    /// The stored session, expired or not
    pub fn session_data(&self) -> Option<SessionData> {
        self.session.read().ok().and_then(|s| s.data.clone())
    }

    pub fn set_session(&self, data: SessionData) -> Result<()> {
        let mut session = self
            .session
            .write()
            .map_err(|_| anyhow!("Session lock poisoned"))?;
        session.update(data);
        session.save()
    }

    pub fn clear_session(&self) -> Result<()> {
        self.session
            .write()
            .map_err(|_| anyhow!("Session lock poisoned"))?
            .clear()
    }

    /// Renew a session that is about to expire, first with its refresh token
    /// and then with a remembered password. Failure leaves the app in guest
    /// mode for this run.
    pub async fn restore_session(&self) {
        let Some(client) = self.client.as_ref() else {
            return;
        };
        let Some(data) = self.session_data() else {
            return;
        };
        if !data.needs_refresh() {
            debug!(minutes_left = data.minutes_until_expiry(), "Session still fresh");
            return;
        }

        if let Some(ref token) = data.refresh_token {
            match client.refresh(token).await {
                Ok(renewed) => {
                    self.store_renewed(renewed);
                    return;
                }
                Err(e) => warn!(error = %e, "Token refresh failed"),
            }
        }

        let Some(email) = data.email.clone().or_else(|| self.config.last_email.clone()) else {
            return;
        };
        let password = match CredentialStore::get_password(&email) {
            Ok(password) => password,
            Err(e) => {
                debug!(error = %e, "No remembered password");
                return;
            }
        };
        match client.authenticate(&email, &password).await {
            Ok(renewed) => self.store_renewed(renewed),
            Err(e) => warn!(error = %e, "Re-authentication with stored credentials failed"),
        }
    }

    fn store_renewed(&self, data: SessionData) {
        info!(user_id = %data.user_id, "Session renewed");
        if let Err(e) = self.set_session(data) {
            warn!(error = %e, "Failed to save renewed session");
        }
    }
}
