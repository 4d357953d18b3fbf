//! OAuth 1.0a HMAC-SHA1 request signing.

use crate::auth::{Credentials, Signer};
use crate::error::{TweetlineError, TweetlineResult};
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Method, Url};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay as-is, everything else is encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

/// Percent-encode a string the way OAuth 1.0a requires.
pub fn percent_encode(src: &str) -> String {
    utf8_percent_encode(src, OAUTH_ENCODE_SET).to_string()
}

/// Default signature provider producing `OAuth ...` header values.
#[derive(Debug, Clone, Default)]
pub struct OAuth1Signer;

impl OAuth1Signer {
    pub fn new() -> Self {
        Self
    }

    /// Sign with an explicit nonce and timestamp.
    pub fn sign_with(
        &self,
        uri: &Url,
        credentials: &Credentials,
        method: &Method,
        nonce: &str,
        timestamp: u64,
    ) -> TweetlineResult<String> {
        let mut oauth_params = vec![
            (
                "oauth_consumer_key".to_string(),
                credentials.consumer_key.clone(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
        ];
        if !credentials.access_token.is_empty() {
            oauth_params.push(("oauth_token".to_string(), credentials.access_token.clone()));
        }
        oauth_params.push(("oauth_version".to_string(), "1.0".to_string()));

        let base = signature_base_string(method, uri, &oauth_params);
        trace!(base_string = %base, "Computed OAuth signature base string");

        let signature = sign_base_string(
            &base,
            &credentials.consumer_secret,
            &credentials.access_token_secret,
        )?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let fields = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }
}

impl Signer for OAuth1Signer {
    fn authorization_header(
        &self,
        uri: &Url,
        credentials: &Credentials,
        method: Option<Method>,
    ) -> TweetlineResult<String> {
        let method = method.unwrap_or(Method::GET);
        self.sign_with(uri, credentials, &method, &generate_nonce(), unix_timestamp())
    }
}

/// Build `METHOD&enc(base uri)&enc(sorted params)`. Query parameters of `uri`
/// are signed together with the oauth parameters.
pub fn signature_base_string(
    method: &Method,
    uri: &Url,
    oauth_params: &[(String, String)],
) -> String {
    let mut params: Vec<(String, String)> = uri
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .collect();
    params.extend(
        oauth_params
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v))),
    );
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut base_uri = uri.clone();
    base_uri.set_query(None);
    base_uri.set_fragment(None);

    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        percent_encode(base_uri.as_str()),
        percent_encode(&param_string)
    )
}

fn sign_base_string(
    base: &str,
    consumer_secret: &str,
    token_secret: &str,
) -> TweetlineResult<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| TweetlineError::InvalidArgument(format!("Invalid signing key: {}", e)))?;
    mac.update(base.as_bytes());
    Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
