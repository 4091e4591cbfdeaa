//! Configuration for the retailer API session and local files.
//!
//! Settings are read from the environment (the binary loads a `.env` file
//! first). The app-credentials mode needs the client id and secret; the
//! user-OAuth mode additionally needs the redirect URI.
//!
//! Preferences are stored at `~/.pantry/preferences.json`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::auth::SessionError;

/// Application name used for the preferences directory
const APP_DIR: &str = ".pantry";

/// Preferences file name
const PREFERENCES_FILE: &str = "preferences.json";

/// Token file written by the API library after the OAuth flow completes.
/// Relative to the working directory.
pub const TOKEN_FILE: &str = ".kroger_token_user.json";

pub const CLIENT_ID_VAR: &str = "KROGER_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "KROGER_CLIENT_SECRET";
pub const REDIRECT_URI_VAR: &str = "KROGER_REDIRECT_URI";
pub const ZIP_CODE_VAR: &str = "KROGER_USER_ZIP_CODE";

/// Zip code used for location searches when none is configured.
pub const DEFAULT_ZIP_CODE: &str = "10001";

const KNOWN_VARS: [&str; 4] = [CLIENT_ID_VAR, CLIENT_SECRET_VAR, REDIRECT_URI_VAR, ZIP_CODE_VAR];

/// Which kind of session a caller is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Client-credentials access to public catalog and location data.
    App,
    /// OAuth access bound to an end user.
    User,
}

impl AuthMode {
    /// Environment variables that must be set for this mode, in reporting order.
    pub fn required_vars(&self) -> &'static [&'static str] {
        match self {
            AuthMode::App => &[CLIENT_ID_VAR, CLIENT_SECRET_VAR],
            AuthMode::User => &[CLIENT_ID_VAR, CLIENT_SECRET_VAR, REDIRECT_URI_VAR],
        }
    }
}

/// Snapshot of the configuration values the session layer consumes.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
    token_path: Option<PathBuf>,
}

impl Settings {
    /// Read the known variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(
            KNOWN_VARS
                .iter()
                .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value))),
        )
    }

    /// Build settings from explicit name/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            token_path: None,
        }
    }

    /// Override where the persisted user token is read from.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Look up a value; empty strings count as unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Names of every required variable missing for `mode`.
    pub fn missing_vars(&self, mode: AuthMode) -> Vec<String> {
        mode.required_vars()
            .iter()
            .filter(|name| self.get(name).is_none())
            .map(|name| name.to_string())
            .collect()
    }

    /// Fail with every missing variable for `mode`, not just the first.
    pub fn require(&self, mode: AuthMode) -> Result<(), SessionError> {
        let missing = self.missing_vars(mode);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SessionError::Configuration { missing })
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.get(CLIENT_ID_VAR)
    }

    pub fn client_secret(&self) -> Option<&str> {
        self.get(CLIENT_SECRET_VAR)
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.get(REDIRECT_URI_VAR)
    }

    /// Zip code for location searches, falling back to [`DEFAULT_ZIP_CODE`].
    pub fn zip_code(&self) -> &str {
        self.get(ZIP_CODE_VAR).unwrap_or(DEFAULT_ZIP_CODE)
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(TOKEN_FILE))
    }
}

/// Default location of the preferences file under the user's home directory.
pub fn preferences_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR).join(PREFERENCES_FILE))
}
