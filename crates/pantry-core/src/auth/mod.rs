//! Authentication module for retailer API sessions.
//!
//! This module provides:
//! - `SessionManager`: lazily built app-credentials and user OAuth clients
//!   with explicit invalidation
//! - `RetailerBackend`: the seam to the API library that performs the
//!   actual token exchange, validation and refresh
//! - `TokenRecord`: the persisted user token as loaded by the backend
//!
//! A missing or unrecoverable user token surfaces as
//! `SessionError::AuthenticationRequired`, which callers answer by running
//! the interactive OAuth flow and retrying.

pub mod backend;
pub mod error;
pub mod session;
pub mod token;

pub use backend::RetailerBackend;
pub use error::SessionError;
pub use session::SessionManager;
pub use token::TokenRecord;
