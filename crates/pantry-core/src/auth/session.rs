use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use super::{RetailerBackend, SessionError};
use crate::config::{AuthMode, Settings};

/// Owns the app-credentials and user clients for the life of the process.
///
/// Clients are built on first demand and reused until invalidated. Callers
/// share one manager by reference; accessors take `&mut self`, so there is
/// no locking and at most one initialization runs at a time.
pub struct SessionManager<B: RetailerBackend> {
    backend: B,
    settings: Settings,
    app_client: Option<Arc<B::Client>>,
    user_client: Option<Arc<B::Client>>,
}

impl<B: RetailerBackend> SessionManager<B> {
    pub fn new(backend: B, settings: Settings) -> Self {
        Self {
            backend,
            settings,
            app_client: None,
            user_client: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Client for public catalog and location data.
    pub fn get_app_client(&mut self) -> Result<Arc<B::Client>, SessionError> {
        if let Some(client) = &self.app_client {
            debug!("Using cached app client");
            return Ok(Arc::clone(client));
        }

        self.settings.require(AuthMode::App)?;

        let client = Arc::new(
            self.build_app_client()
                .map_err(SessionError::Initialization)?,
        );
        self.app_client = Some(Arc::clone(&client));
        info!("App client authorized");
        Ok(client)
    }

    /// Client bound to the end user's OAuth token.
    ///
    /// A cached client is returned only if its token still validates.
    /// Otherwise the persisted token is loaded and, if stale, refreshed
    /// once. When nothing usable remains this fails with
    /// [`SessionError::AuthenticationRequired`].
    pub fn get_user_client(&mut self) -> Result<Arc<B::Client>, SessionError> {
        if let Some(client) = &self.user_client {
            if self.backend.test_token(client) {
                debug!("Using cached user client");
                return Ok(Arc::clone(client));
            }
            debug!("Cached user token failed validation");
        }
        self.user_client = None;

        self.settings.require(AuthMode::User)?;

        match self.recover_user_client() {
            Ok(Some(client)) => {
                let client = Arc::new(client);
                self.user_client = Some(Arc::clone(&client));
                Ok(client)
            }
            Ok(None) => Err(SessionError::AuthenticationRequired),
            Err(e) => Err(SessionError::AuthenticationFailed(e)),
        }
    }

    /// Drop the cached app client; the next call rebuilds it.
    pub fn invalidate_app_client(&mut self) {
        if self.app_client.take().is_some() {
            debug!("App client invalidated");
        }
    }

    /// Drop the cached user client; the next call recovers from scratch.
    pub fn invalidate_user_client(&mut self) {
        if self.user_client.take().is_some() {
            debug!("User client invalidated");
        }
    }

    pub fn has_app_client(&self) -> bool {
        self.app_client.is_some()
    }

    pub fn has_user_client(&self) -> bool {
        self.user_client.is_some()
    }

    fn build_app_client(&self) -> anyhow::Result<B::Client> {
        let mut client = self
            .backend
            .new_client(&self.settings)
            .context("Failed to construct client")?;
        self.backend
            .authorize_app(&mut client)
            .context("Client credentials grant failed")?;
        Ok(client)
    }

    /// `Ok(None)` means no usable token: the OAuth flow has to run.
    /// `Err` is reserved for backend failures outside the refresh step.
    fn recover_user_client(&self) -> anyhow::Result<Option<B::Client>> {
        let token_path = self.settings.token_path();

        let token = self
            .backend
            .load_token(&token_path)
            .with_context(|| format!("Failed to load token from {}", token_path.display()))?;
        let Some(token) = token else {
            debug!(path = %token_path.display(), "No persisted user token");
            return Ok(None);
        };

        let refresh_token = token.refresh_credential().map(str::to_owned);
        let expired = token.is_expired();
        let mut client = self
            .backend
            .client_with_token(&self.settings, token, &token_path)
            .context("Failed to construct user client")?;

        if expired {
            debug!("Persisted token is past its expiry, skipping validation");
        } else if self.backend.test_token(&client) {
            info!("Restored user session from persisted token");
            return Ok(Some(client));
        }

        let Some(refresh_token) = refresh_token else {
            debug!("Persisted token is unusable and has no refresh token");
            return Ok(None);
        };

        match self.backend.refresh_token(&mut client, &refresh_token) {
            Ok(()) if self.backend.test_token(&client) => {
                info!("User token refreshed");
                Ok(Some(client))
            }
            Ok(()) => {
                warn!("Refreshed user token failed validation");
                Ok(None)
            }
            Err(e) => {
                warn!(error = %e, "User token refresh failed");
                Ok(None)
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
