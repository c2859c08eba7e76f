use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{Login, UserId};

/// Request headers the GraphQL endpoint requires on every call.
///
/// All six are scraped from a curl command the user copies out of their
/// browser's network inspector; a request missing any of them is rejected
/// server-side, so construction fails early instead.
pub const REQUIRED_HEADERS: [&str; 6] = [
    "authorization",
    "client-id",
    "client-integrity",
    "client-session-id",
    "client-version",
    "x-device-id",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeadersError {
    #[error("header '{0}' not found")]
    MissingHeader(&'static str),
}

/// The scraped authentication headers, persisted in settings.
///
/// Invariant: all six [`REQUIRED_HEADERS`] are present and non-empty is not
/// enforced beyond presence; the server is the authority on token shape.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHeaders {
    authorization: String,
    #[serde(rename = "client-id")]
    client_id: String,
    #[serde(rename = "client-integrity")]
    client_integrity: String,
    #[serde(rename = "client-session-id")]
    client_session_id: String,
    #[serde(rename = "client-version")]
    client_version: String,
    #[serde(rename = "x-device-id")]
    device_id: String,
}

impl AuthHeaders {
    /// Build from a lowercase-keyed header map, failing on the first
    /// required header that is absent.
    pub fn from_scraped(mut headers: HashMap<String, String>) -> Result<Self, AuthHeadersError> {
        let mut take = |name: &'static str| {
            headers
                .remove(name)
                .ok_or(AuthHeadersError::MissingHeader(name))
        };
        Ok(Self {
            authorization: take("authorization")?,
            client_id: take("client-id")?,
            client_integrity: take("client-integrity")?,
            client_session_id: take("client-session-id")?,
            client_version: take("client-version")?,
            device_id: take("x-device-id")?,
        })
    }

    /// Header name/value pairs in the form a request builder consumes.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("authorization", self.authorization.as_str()),
            ("client-id", self.client_id.as_str()),
            ("client-integrity", self.client_integrity.as_str()),
            ("client-session-id", self.client_session_id.as_str()),
            ("client-version", self.client_version.as_str()),
            ("x-device-id", self.device_id.as_str()),
        ]
        .into_iter()
    }
}

// Manual Debug impl to prevent leaking credentials in logs.
impl fmt::Debug for AuthHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHeaders")
            .field("authorization", &"[REDACTED]")
            .field("client-id", &"[REDACTED]")
            .field("client-integrity", &"[REDACTED]")
            .field("client-session-id", &"[REDACTED]")
            .field("client-version", &"[REDACTED]")
            .field("x-device-id", &"[REDACTED]")
            .finish()
    }
}

/// The authenticated user whose sent messages are being fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub login: Login,
    pub id: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> HashMap<String, String> {
        REQUIRED_HEADERS
            .iter()
            .map(|name| ((*name).to_string(), format!("value-{name}")))
            .collect()
    }

    #[test]
    fn from_scraped_accepts_complete_map() {
        let headers = AuthHeaders::from_scraped(full_map()).unwrap();
        let pairs: HashMap<&str, &str> = headers.iter().collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(pairs["authorization"], "value-authorization");
        assert_eq!(pairs["x-device-id"], "value-x-device-id");
    }

    #[test]
    fn from_scraped_reports_first_missing_header() {
        let mut map = full_map();
        map.remove("client-integrity");
        let err = AuthHeaders::from_scraped(map).unwrap_err();
        assert_eq!(err, AuthHeadersError::MissingHeader("client-integrity"));
    }

    #[test]
    fn from_scraped_ignores_extra_headers() {
        let mut map = full_map();
        map.insert("accept".to_string(), "*/*".to_string());
        assert!(AuthHeaders::from_scraped(map).is_ok());
    }

    #[test]
    fn debug_redacts_every_value() {
        let headers = AuthHeaders::from_scraped(full_map()).unwrap();
        let debug = format!("{headers:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("value-authorization"));
        assert!(!debug.contains("value-x-device-id"));
    }

    #[test]
    fn serde_round_trip_preserves_wire_names() {
        let headers = AuthHeaders::from_scraped(full_map()).unwrap();
        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json["x-device-id"], "value-x-device-id");
        assert_eq!(json["client-session-id"], "value-client-session-id");
        let back: AuthHeaders = serde_json::from_value(json).unwrap();
        assert_eq!(back, headers);
    }
}
