use reqwest::header::InvalidHeaderValue;
use std::fmt;
use thiserror::Error;

/// One of the three session values scraped from the web client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    GuestToken,
    BearerToken,
    QueryId,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuestToken => write!(f, "guest token"),
            Self::BearerToken => write!(f, "bearer token"),
            Self::QueryId => write!(f, "query id"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Unable to fetch the page holding the {value}: {source}")]
    Fetch {
        value: TokenKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unable to find the {0} in the fetched content")]
    NotFound(TokenKind),
    #[error("Unable to find the main script reference in the web page")]
    MissingScript,
}

impl TokenError {
    pub fn value(&self) -> Option<TokenKind> {
        match self {
            Self::Fetch { value, .. } => Some(*value),
            Self::NotFound(value) => Some(*value),
            Self::MissingScript => None,
        }
    }
}

/// The API call a [`TimelineError`] originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    UserLookup,
    Timeline,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserLookup => write!(f, "the user id"),
            Self::Timeline => write!(f, "tweets"),
        }
    }
}

/// Coarse classification of a [`TimelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A session value could not be obtained
    ValueUnavailable,
    /// A network call failed, or its body was not JSON
    RequestFailed,
    /// The JSON body lacked an expected field
    DataShapeMismatch,
}

#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("Unable to obtain session values: {0}")]
    ValueUnavailable(#[from] TokenError),
    #[error("Failed to get {operation}, request failed with: {source}")]
    RequestFailed {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to get {operation}, {detail}")]
    DataShapeMismatch {
        operation: Operation,
        detail: &'static str,
    },
    #[error("Session value is not a valid header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),
    #[error("Unable to build the HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
}

impl TimelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValueUnavailable(_) | Self::InvalidHeader(_) => ErrorKind::ValueUnavailable,
            Self::RequestFailed { .. } | Self::ClientInit(_) => ErrorKind::RequestFailed,
            Self::DataShapeMismatch { .. } => ErrorKind::DataShapeMismatch,
        }
    }

    pub(crate) fn request(operation: Operation) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::RequestFailed { operation, source }
    }
}
