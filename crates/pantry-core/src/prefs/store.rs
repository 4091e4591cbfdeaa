use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::PrefsError;
use crate::config;

const LOCATION_KEY: &str = "preferred_location_id";

/// Contents of the preferences file.
///
/// `preferred_location_id` is always written, as `null` when unset.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Preferences {
    pub preferred_location_id: Option<String>,
    /// Keys this crate does not model, preserved across rewrites.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Preferences {
    /// Build from a parsed JSON object. A location id that is not a string
    /// reads as unset; every other key is kept as is.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let preferred_location_id = match map.remove(LOCATION_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id),
            Some(other) => {
                warn!(value = %other, "Ignoring preferred location ID that is not a string");
                None
            }
        };
        Self {
            preferred_location_id,
            extra: map,
        }
    }
}

pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store at the default location under the home directory.
    pub fn new() -> Result<Self, PrefsError> {
        let path = config::preferences_path().ok_or(PrefsError::NoHomeDir)?;
        Ok(Self { path })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences, falling back to defaults.
    ///
    /// A missing file is created with the default record. An empty or
    /// unparseable file, or JSON that is not an object, is reported and
    /// replaced with the default (best-effort). Any other read failure
    /// yields the default without touching the file.
    pub fn load(&self) -> Preferences {
        if let Some(parent) = self.parent_dir() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Unexpected error preparing preferences directory");
                return Preferences::default();
            }
        }

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No preferences file, creating default");
                let defaults = Preferences::default();
                self.save_best_effort(&defaults);
                return defaults;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unexpected error loading preferences");
                return Preferences::default();
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            warn!(path = %self.path.display(), "Preferences file is empty, resetting to defaults");
            let defaults = Preferences::default();
            self.save_best_effort(&defaults);
            return defaults;
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => Preferences::from_map(map),
            Ok(_) => {
                warn!(path = %self.path.display(), "Preferences file is not a JSON object, resetting to defaults");
                let defaults = Preferences::default();
                self.save_best_effort(&defaults);
                defaults
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Could not load preferences, resetting to defaults");
                let defaults = Preferences::default();
                self.save_best_effort(&defaults);
                defaults
            }
        }
    }

    /// Atomically replace the preferences file with `prefs`.
    ///
    /// On failure the temporary file is removed and the error returned; the
    /// target keeps whatever the last successful save wrote.
    pub fn save(&self, prefs: &Preferences) -> Result<(), PrefsError> {
        let contents = serde_json::to_string_pretty(prefs)?;
        let temp_path = self.temp_path();

        match self.write_and_replace(&temp_path, contents.as_bytes()) {
            Ok(()) => {
                info!(path = %self.path.display(), "Preferences saved");
                Ok(())
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Could not save preferences");
                remove_temp_file_best_effort(&temp_path);
                Err(e)
            }
        }
    }

    pub fn get_preferred_location_id(&self) -> Option<String> {
        let location_id = self.load().preferred_location_id;
        debug!(location_id = ?location_id, "Retrieved preferred location ID");
        location_id
    }

    /// Set the preferred location and confirm it reads back.
    pub fn set_preferred_location_id(&self, location_id: &str) -> Result<(), PrefsError> {
        info!(location_id, "Setting preferred location ID");
        self.update_location(Some(location_id))
    }

    pub fn clear_preferred_location_id(&self) -> Result<(), PrefsError> {
        info!("Clearing preferred location ID");
        self.update_location(None)
    }

    fn update_location(&self, location_id: Option<&str>) -> Result<(), PrefsError> {
        self.update_location_with(location_id, Self::load)
    }

    /// Load-modify-save, then check the value read back through `reload`.
    fn update_location_with(
        &self,
        location_id: Option<&str>,
        reload: impl FnOnce(&Self) -> Preferences,
    ) -> Result<(), PrefsError> {
        let mut prefs = self.load();
        prefs.preferred_location_id = location_id.map(str::to_owned);
        self.save(&prefs)?;

        // Renames have been seen to report success without the new contents
        // landing; re-read before claiming the write.
        verify_location(location_id, reload(self).preferred_location_id)?;
        debug!(location_id = ?location_id, "Preferred location ID verified");
        Ok(())
    }

    fn write_and_replace(&self, temp_path: &Path, contents: &[u8]) -> Result<(), PrefsError> {
        if let Some(parent) = self.parent_dir() {
            fs::create_dir_all(parent).map_err(|e| PrefsError::io(parent, e))?;
        }

        let mut file = File::create(temp_path).map_err(|e| PrefsError::io(temp_path, e))?;
        file.write_all(contents)
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_all())
            .map_err(|e| PrefsError::io(temp_path, e))?;
        drop(file);

        replace_file(temp_path, &self.path).map_err(|e| PrefsError::io(&self.path, e))
    }

    /// Best-effort: failures are logged and discarded.
    fn save_best_effort(&self, prefs: &Preferences) {
        if let Err(e) = self.save(prefs) {
            warn!(path = %self.path.display(), error = %e, "Could not write default preferences");
        }
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn verify_location(expected: Option<&str>, actual: Option<String>) -> Result<(), PrefsError> {
    if actual.as_deref() == expected {
        Ok(())
    } else {
        Err(PrefsError::Verification {
            expected: expected.map(str::to_owned),
            actual,
        })
    }
}

/// Rename `from` over `to`. Where the platform refuses to replace an
/// existing file, the target is removed first.
fn replace_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        #[cfg(not(unix))]
        Err(e) if to.is_file() => {
            debug!(error = %e, "Rename over existing file refused, removing target first");
            fs::remove_file(to)?;
            fs::rename(from, to)
        }
        Err(e) => Err(e),
    }
}

/// Best-effort: failures are logged and discarded.
fn remove_temp_file_best_effort(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove temporary preferences file");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> PreferenceStore {
        PreferenceStore::with_path(dir.join("preferences.json"))
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    #[test]
    fn test_load_missing_file_creates_default() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let prefs = store.load();
        assert_eq!(prefs, Preferences::default());

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{\n  \"preferred_location_id\": null\n}");
    }

    #[test]
    fn test_load_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = PreferenceStore::with_path(dir.path().join("nested").join("prefs.json"));

        assert_eq!(store.get_preferred_location_id(), None);
        assert!(store.path().exists());
    }

    #[test]
    fn test_load_malformed_json_returns_default_and_repairs() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), "{\"preferred_location_id\": \"014").unwrap();

        assert_eq!(store.load(), Preferences::default());

        let repaired: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(repaired, json!({"preferred_location_id": null}));
    }

    #[test]
    fn test_load_empty_file_returns_default() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), "  \n").unwrap();

        assert_eq!(store.load(), Preferences::default());
        assert!(!fs::read_to_string(store.path()).unwrap().trim().is_empty());
    }

    #[test]
    fn test_load_non_object_returns_default() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(store.path(), "[1, 2, 3]").unwrap();

        assert_eq!(store.load(), Preferences::default());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_unreadable_path_does_not_persist() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        // A directory where the file should be makes the read fail
        fs::create_dir(store.path()).unwrap();

        assert_eq!(store.load(), Preferences::default());
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_save_load_round_trips_unknown_keys() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut prefs = Preferences {
            preferred_location_id: Some("01400943".to_string()),
            ..Default::default()
        };
        prefs.extra.insert("theme".to_string(), json!("dark"));
        prefs.extra.insert("recent".to_string(), json!(["01400376", "01400943"]));

        store.save(&prefs).unwrap();
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn test_save_format_and_no_temp_left_behind() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let prefs = Preferences {
            preferred_location_id: Some("Café-7".to_string()),
            ..Default::default()
        };
        store.save(&prefs).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{\n  \"preferred_location_id\": \"Café-7\"\n}");
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let store = PreferenceStore::with_path("/home/user/.pantry/preferences.json");
        assert_eq!(
            store.temp_path(),
            PathBuf::from("/home/user/.pantry/preferences.json.tmp")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_save_failure_is_surfaced_and_temp_removed() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        // Renaming a file over a directory fails
        fs::create_dir(store.path()).unwrap();

        let err = store.save(&Preferences::default()).unwrap_err();
        assert!(matches!(err, PrefsError::Io { .. }));
        assert!(!store.temp_path().exists());
        assert!(store.path().is_dir());
    }

    #[test]
    fn test_set_then_get_preferred_location() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.set_preferred_location_id("123").unwrap();
        assert_eq!(store.get_preferred_location_id().as_deref(), Some("123"));
    }

    #[test]
    fn test_set_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(
            store.path(),
            r#"{"preferred_location_id": "old", "modality": "PICKUP"}"#,
        )
        .unwrap();

        store.set_preferred_location_id("new").unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, json!({"preferred_location_id": "new", "modality": "PICKUP"}));
    }

    #[test]
    fn test_clear_preferred_location() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.set_preferred_location_id("123").unwrap();
        store.clear_preferred_location_id().unwrap();
        assert_eq!(store.get_preferred_location_id(), None);
    }

    #[test]
    fn test_non_string_location_keeps_other_keys() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let original = r#"{"preferred_location_id": 1400943, "modality": "PICKUP"}"#;
        fs::write(store.path(), original).unwrap();

        let prefs = store.load();
        assert_eq!(prefs.preferred_location_id, None);
        assert_eq!(prefs.extra.get("modality"), Some(&json!("PICKUP")));
        // Loading alone leaves the file as it was
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);

        store.set_preferred_location_id("123").unwrap();
        let raw: Value = serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, json!({"preferred_location_id": "123", "modality": "PICKUP"}));
    }

    #[test]
    fn test_from_map_location_values() {
        let prefs = Preferences::from_map(object(json!({"preferred_location_id": "014"})));
        assert_eq!(prefs.preferred_location_id.as_deref(), Some("014"));
        assert!(prefs.extra.is_empty());

        let prefs = Preferences::from_map(object(json!({"preferred_location_id": null, "a": 1})));
        assert_eq!(prefs.preferred_location_id, None);
        assert_eq!(prefs.extra.get("a"), Some(&json!(1)));

        let prefs = Preferences::from_map(Map::new());
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_set_fails_when_read_back_disagrees() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.set_preferred_location_id("old").unwrap();

        // Read back a stale record, as if the rename never landed
        let err = store
            .update_location_with(Some("123"), |_| Preferences {
                preferred_location_id: Some("old".to_string()),
                ..Default::default()
            })
            .unwrap_err();

        match err {
            PrefsError::Verification { expected, actual } => {
                assert_eq!(expected.as_deref(), Some("123"));
                assert_eq!(actual.as_deref(), Some("old"));
            }
            other => panic!("expected verification error, got {other:?}"),
        }
        // The save itself completed atomically
        assert_eq!(store.get_preferred_location_id().as_deref(), Some("123"));
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_verify_location_mismatch() {
        assert!(verify_location(Some("123"), Some("123".to_string())).is_ok());
        assert!(verify_location(None, None).is_ok());

        let err = verify_location(Some("123"), None).unwrap_err();
        assert!(matches!(err, PrefsError::Verification { .. }));
        assert_eq!(
            err.to_string(),
            "Failed to save preferred location. Expected: Some(\"123\"), Got: None"
        );
    }
}
