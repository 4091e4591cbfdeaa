use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Missing required environment variables: {}", .missing.join(", "))]
    Configuration { missing: Vec<String> },

    #[error("Failed to initialize client credentials client: {0:#}")]
    Initialization(#[source] anyhow::Error),

    /// Expected when no usable user token exists. The caller must run the
    /// OAuth flow (start, then complete) before retrying.
    #[error(
        "Authentication required. Start the OAuth flow and complete it before retrying."
    )]
    AuthenticationRequired,

    #[error("Authentication failed: {0:#}")]
    AuthenticationFailed(#[source] anyhow::Error),
}

impl SessionError {
    /// True for the expected "run the OAuth flow" signal.
    pub fn is_authentication_required(&self) -> bool {
        matches!(self, SessionError::AuthenticationRequired)
    }
}
