//! Request signing: the credentials bundle and the signature provider seam.

pub mod oauth1;

pub use oauth1::OAuth1Signer;

use crate::error::TweetlineResult;
use reqwest::{Method, Url};
use std::fmt;

/// OAuth 1.0a consumer and access-token pair. Passed by reference into signing,
/// never mutated by the executors.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Produces a ready-to-use `Authorization` header value for a request.
///
/// `method` is `None` for the streaming variant, where the endpoint is signed
/// against plain `GET` implicitly.
#[cfg_attr(test, mockall::automock)]
pub trait Signer: Send + Sync {
    fn authorization_header(
        &self,
        uri: &Url,
        credentials: &Credentials,
        method: Option<Method>,
    ) -> TweetlineResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("ck", "cs-secret", "at", "ats-secret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("ck"));
        assert!(rendered.contains("at"));
        assert!(!rendered.contains("cs-secret"));
        assert!(!rendered.contains("ats-secret"));
    }
}
