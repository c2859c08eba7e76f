//! Auth-data scraping from browser-copied curl text.
//!
//! The user copies the site's `gql` request out of their browser's network
//! inspector ("Copy as cURL (bash)") and pastes the whole command in. Only
//! the `-H '<name>: <value>'` header flags matter; the six required headers
//! are extracted and everything else is ignored.

use std::collections::HashMap;
use std::sync::OnceLock;

use chatlog_types::{AuthHeaders, AuthHeadersError, REQUIRED_HEADERS};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurlParseError {
    #[error("curl text is empty")]
    Empty,
    #[error("header '{0}' not found in curl text")]
    MissingHeader(&'static str),
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"-H '([^:]+): ([^']+)'").expect("header pattern is valid")
    })
}

/// Scrape [`AuthHeaders`] out of a pasted curl command.
pub fn parse_curl_headers(text: &str) -> Result<AuthHeaders, CurlParseError> {
    if text.trim().is_empty() {
        return Err(CurlParseError::Empty);
    }

    let mut headers: HashMap<String, String> = HashMap::new();
    for capture in header_pattern().captures_iter(text) {
        let key = capture[1].to_ascii_lowercase();
        if REQUIRED_HEADERS.contains(&key.as_str()) {
            headers.insert(key, capture[2].to_string());
        }
    }

    AuthHeaders::from_scraped(headers).map_err(|e| match e {
        AuthHeadersError::MissingHeader(name) => CurlParseError::MissingHeader(name),
    })
}
