//! The three session values an anonymous web client needs before it can call the API.
//!
//! [`ScrapingTokenProvider`] reads them from the public web client the same way a browser
//! would come across them: the guest token is set by an inline script on the home page, and
//! the bearer token and `UserByScreenName` query id are embedded in the main JS bundle.

use crate::error::{TokenError, TokenKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::fmt;
use tokio::sync::OnceCell;

pub const DEFAULT_WEB_BASE: &str = "https://twitter.com";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn guest_token(&self) -> Result<String, TokenError>;

    async fn bearer_token(&self) -> Result<String, TokenError>;

    async fn query_id(&self) -> Result<String, TokenError>;
}

/// Session values for one client, never persisted.
///
/// Also usable as a provider in its own right, e.g. when loaded from a credentials file.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub guest_token: String,
    pub bearer_token: String,
    pub query_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("guest_token", &"<redacted>")
            .field("bearer_token", &"<redacted>")
            .field("query_id", &self.query_id)
            .finish()
    }
}

impl Credentials {
    /// Asks `provider` for each value in turn, stopping at the first failure
    pub async fn acquire(provider: &dyn TokenProvider) -> Result<Self, TokenError> {
        let guest_token = provider.guest_token().await?;
        let bearer_token = provider.bearer_token().await?;
        let query_id = provider.query_id().await?;
        Ok(Self {
            guest_token,
            bearer_token,
            query_id,
        })
    }
}

#[async_trait]
impl TokenProvider for Credentials {
    async fn guest_token(&self) -> Result<String, TokenError> {
        Ok(self.guest_token.clone())
    }

    async fn bearer_token(&self) -> Result<String, TokenError> {
        Ok(self.bearer_token.clone())
    }

    async fn query_id(&self) -> Result<String, TokenError> {
        Ok(self.query_id.clone())
    }
}

static GUEST_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"gt=(\d+)").unwrap());
static MAIN_SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"src="([^"]*/main\.[0-9a-zA-Z]+\.js)""#).unwrap());
static BEARER_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(AAAAAAAAAAAAAAAAAAAAA[^"]+)""#).unwrap());
static QUERY_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"queryId:"([^"]+)",operationName:"UserByScreenName""#).unwrap()
});

pub struct ScrapingTokenProvider {
    client: Client,
    home: Url,
    home_page: OnceCell<String>,
    main_script: OnceCell<String>,
}

impl ScrapingTokenProvider {
    pub fn new(client: Client, web_base: Url) -> Self {
        Self {
            client,
            home: web_base,
            home_page: OnceCell::new(),
            main_script: OnceCell::new(),
        }
    }

    async fn get_text(&self, url: Url, value: TokenKind) -> Result<String, TokenError> {
        log::debug!("Fetching {} for the {}", url, value);
        let fetch = |source| TokenError::Fetch { value, source };
        let response = self.client.get(url).send().await.map_err(fetch)?;
        let response = response.error_for_status().map_err(fetch)?;
        response.text().await.map_err(fetch)
    }

    async fn home_page(&self, value: TokenKind) -> Result<&str, TokenError> {
        let page = self
            .home_page
            .get_or_try_init(|| self.get_text(self.home.clone(), value))
            .await?;
        Ok(page)
    }

    async fn main_script(&self, value: TokenKind) -> Result<&str, TokenError> {
        let script = self
            .main_script
            .get_or_try_init(|| async move {
                let page = self.home_page(value).await?;
                let src = MAIN_SCRIPT_RE
                    .captures(page)
                    .and_then(|caps| caps.get(1))
                    .ok_or(TokenError::MissingScript)?;
                let url = self
                    .home
                    .join(src.as_str())
                    .map_err(|_| TokenError::MissingScript)?;
                self.get_text(url, value).await
            })
            .await?;
        Ok(script)
    }
}

fn capture(re: &Regex, haystack: &str, value: TokenKind) -> Result<String, TokenError> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(TokenError::NotFound(value))
}

#[async_trait]
impl TokenProvider for ScrapingTokenProvider {
    async fn guest_token(&self) -> Result<String, TokenError> {
        let page = self.home_page(TokenKind::GuestToken).await?;
        capture(&GUEST_TOKEN_RE, page, TokenKind::GuestToken)
    }

    async fn bearer_token(&self) -> Result<String, TokenError> {
        let script = self.main_script(TokenKind::BearerToken).await?;
        capture(&BEARER_TOKEN_RE, script, TokenKind::BearerToken)
    }

    async fn query_id(&self) -> Result<String, TokenError> {
        let script = self.main_script(TokenKind::QueryId).await?;
        capture(&QUERY_ID_RE, script, TokenKind::QueryId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOME: &str = r#"<html><head>
        <script>document.cookie="gt=1453245896142090240; Max-Age=10800; Domain=.twitter.com; Path=/; Secure";</script>
        <script src="/responsive-web/client-web/main.a1b2c3d4.js" nonce="x"></script>
        </head></html>"#;
    const SCRIPT: &str = r#"e.exports={queryId:"Bauemgi9WnN4yz7XbcRTQg",operationName:"UserByScreenName",operationType:"query"};
        const a="ACTION_FLUSH",s="AAAAAAAAAAAAAAAAAAAAANRILgAAAAAAnNwIzUejRCOuH5E6I8xnZz4puTs%3D1Zv7ttfk8LF81IUq16cHjhLTvJu4FA33AGWWjCpTnA";"#;

    async fn provider_for(server: &MockServer) -> ScrapingTokenProvider {
        let base = Url::parse(&server.uri()).unwrap();
        ScrapingTokenProvider::new(Client::new(), base)
    }

    #[tokio::test]
    async fn scrapes_all_three_values() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/responsive-web/client-web/main.a1b2c3d4.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SCRIPT))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let credentials = Credentials::acquire(&provider).await.unwrap();
        assert_eq!(credentials.guest_token, "1453245896142090240");
        assert!(credentials.bearer_token.starts_with("AAAAAAAAAAAAAAAAAAAAANRIL"));
        assert!(credentials.bearer_token.ends_with("WjCpTnA"));
        assert_eq!(credentials.query_id, "Bauemgi9WnN4yz7XbcRTQg");
    }

    #[tokio::test]
    async fn missing_guest_token_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.guest_token().await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound(TokenKind::GuestToken)));
        let err = provider.bearer_token().await.unwrap_err();
        assert!(matches!(err, TokenError::MissingScript));
    }

    #[tokio::test]
    async fn script_without_query_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(HOME))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/responsive-web/client-web/main.a1b2c3d4.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("var x = 1;"))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.query_id().await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound(TokenKind::QueryId)));
        assert_eq!(err.value(), Some(TokenKind::QueryId));
    }

    #[tokio::test]
    async fn failed_page_fetch_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        let err = provider.guest_token().await.unwrap_err();
        assert!(matches!(
            err,
            TokenError::Fetch {
                value: TokenKind::GuestToken,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn credentials_serve_themselves() {
        let credentials: Credentials = serde_json::from_str(
            r#"{"guest_token":"1","bearer_token":"b","query_id":"q"}"#,
        )
        .unwrap();
        let again = Credentials::acquire(&credentials).await.unwrap();
        assert_eq!(again, credentials);
    }

    #[test]
    fn debug_hides_tokens() {
        let credentials = Credentials {
            guest_token: "1453245896142090240".to_string(),
            bearer_token: "AAAA%3Dsecret".to_string(),
            query_id: "Bauemgi9WnN4yz7XbcRTQg".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("1453245896142090240"));
        assert!(!debug.contains("secret"));
        assert!(debug.contains("Bauemgi9WnN4yz7XbcRTQg"));
    }
}
