use crate::error::TimelineError;
use crate::tokens::Credentials;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
const TIMEOUT_SEC: u64 = 10;

pub const GUEST_TOKEN: &str = "x-guest-token";

#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Scheme and host the API paths are appended to
    pub api_base: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SEC),
        }
    }
}

/// Headers sent with every API call of a session
pub fn session_headers(credentials: &Credentials) -> Result<HeaderMap, TimelineError> {
    let mut headers = HeaderMap::new();
    let mut guest = HeaderValue::from_str(&credentials.guest_token)?;
    guest.set_sensitive(true);
    headers.insert(GUEST_TOKEN, guest);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.bearer_token))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Builds the transport for a session, with its headers set as defaults
pub(crate) fn session_client(
    credentials: &Credentials,
    options: &ClientOptions,
) -> Result<Client, TimelineError> {
    Client::builder()
        .default_headers(session_headers(credentials)?)
        .timeout(options.timeout)
        .build()
        .map_err(TimelineError::ClientInit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn credentials() -> Credentials {
        Credentials {
            guest_token: "1453245896142090240".to_string(),
            bearer_token: "AAAA%3Dtoken".to_string(),
            query_id: "Bauemgi9WnN4yz7XbcRTQg".to_string(),
        }
    }

    #[test]
    fn headers_come_from_credentials() {
        let headers = session_headers(&credentials()).unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(headers["x-guest-token"], "1453245896142090240");
        assert_eq!(headers[AUTHORIZATION], "Bearer AAAA%3Dtoken");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[test]
    fn headers_are_deterministic() {
        assert_eq!(
            session_headers(&credentials()).unwrap(),
            session_headers(&credentials()).unwrap()
        );
    }

    #[test]
    fn unusable_token_is_rejected() {
        let mut bad = credentials();
        bad.guest_token = "line\nbreak".to_string();
        let err = session_headers(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueUnavailable);
    }

    #[test]
    fn default_options() {
        let options = ClientOptions::default();
        assert_eq!(options.api_base, "https://api.twitter.com");
        assert_eq!(options.timeout, Duration::from_secs(10));
    }
}
