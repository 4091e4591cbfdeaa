use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted user token, as written by the API library after the OAuth flow.
///
/// The session layer only looks at `refresh_token` and `expires_at`; the
/// remaining fields are carried for the backend that owns the file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenRecord {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// The refresh credential, if the token file carries one. Presence is
    /// all that is checked; the backend judges the value.
    pub fn refresh_credential(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Local expiry check, used to skip a remote validation that cannot pass.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() >= at).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_parse_token_file_keeps_unknown_fields() {
        let json = r#"{"access_token":"abc","refresh_token":"def","token_type":"bearer","expires_in":1800}"#;
        let token: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.refresh_credential(), Some("def"));
        assert_eq!(token.extra.get("token_type"), Some(&Value::from("bearer")));
        assert_eq!(token.extra.get("expires_in"), Some(&Value::from(1800)));
    }

    #[test]
    fn test_refresh_credential_presence() {
        assert_eq!(TokenRecord::new("abc").refresh_credential(), None);
        assert_eq!(
            TokenRecord::new("abc").with_refresh_token("").refresh_credential(),
            Some("")
        );
        let token: TokenRecord =
            serde_json::from_str(r#"{"access_token":"abc","refresh_token":null}"#).unwrap();
        assert_eq!(token.refresh_credential(), None);
    }

    #[test]
    fn test_is_expired() {
        let mut token = TokenRecord::new("abc");
        assert!(!token.is_expired());
        token.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(token.is_expired());
        token.expires_at = Some(Utc::now() + Duration::minutes(30));
        assert!(!token.is_expired());
    }
}
