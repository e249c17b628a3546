//! Reads a user's recent tweets without an account, by replaying the requests the
//! logged-out web client makes.

pub mod error;
pub mod model;
pub mod session;
pub mod timeline;
pub mod tokens;

pub use error::{ErrorKind, Operation, TimelineError, TokenError, TokenKind};
pub use model::Post;
pub use session::ClientOptions;
pub use timeline::{TimelineClient, DEFAULT_COUNT};
pub use tokens::{Credentials, ScrapingTokenProvider, TokenProvider};
