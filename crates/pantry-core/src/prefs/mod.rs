//! Local preference persistence.
//!
//! This module provides the `PreferenceStore` for a single JSON preferences
//! file. The file currently models one key, the preferred store location;
//! any other keys found in the file are carried through unchanged.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so readers never observe a partial write. A missing or corrupted
//! file reads as the default record.

pub mod error;
pub mod store;

pub use error::PrefsError;
pub use store::{PreferenceStore, Preferences};
