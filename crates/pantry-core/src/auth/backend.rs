use std::path::Path;

use anyhow::Result;

use super::TokenRecord;
use crate::config::Settings;

/// The API library the session layer drives.
///
/// Implementations own HTTP, token exchange and the token file format.
/// [`SessionManager`](super::SessionManager) calls each method at most once
/// per accessor call, except `test_token`, which runs once per validation
/// step (cached client, restored token, refreshed token).
pub trait RetailerBackend {
    /// Authenticated client handle.
    type Client;

    /// Construct an unauthorized client from the configured app identity.
    fn new_client(&self, settings: &Settings) -> Result<Self::Client>;

    /// Run the client-credentials grant on `client`.
    fn authorize_app(&self, client: &mut Self::Client) -> Result<()>;

    /// Construct a client bound to a previously persisted user token.
    fn client_with_token(
        &self,
        settings: &Settings,
        token: TokenRecord,
        token_path: &Path,
    ) -> Result<Self::Client>;

    /// Check the client's current token against the remote service.
    fn test_token(&self, client: &Self::Client) -> bool;

    /// Exchange `refresh_token` for a new access token on `client`.
    fn refresh_token(&self, client: &mut Self::Client, refresh_token: &str) -> Result<()>;

    /// Load the persisted user token; `Ok(None)` when no token file exists.
    fn load_token(&self, path: &Path) -> Result<Option<TokenRecord>>;
}
