//! Session and preference plumbing for a grocery-retailer API client.
//!
//! - `auth`: cached app-credentials and user OAuth clients
//! - `prefs`: the local preferences file (preferred store location)
//! - `config`: environment-driven settings and default paths
//! - `utils`: display helpers

pub mod auth;
pub mod config;
pub mod prefs;
pub mod utils;

pub use auth::{RetailerBackend, SessionError, SessionManager, TokenRecord};
pub use config::{AuthMode, Settings};
pub use prefs::{PreferenceStore, Preferences, PrefsError};
