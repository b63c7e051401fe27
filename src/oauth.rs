//! # OAuth 1.0 Request Signing
//!
//! Produces the `Authorization` header for NetSuite token-based authentication
//! (OAuth 1.0a, HMAC-SHA256). Signing is a pure function of its inputs: the
//! nonce and timestamp are supplied by the caller so a signature can be
//! reproduced exactly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distr::Alphanumeric;
use rand::Rng;
use sha2::Sha256;
use url::Url;

use crate::profile::Credentials;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";
pub const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

/// RFC 3986 unreserved characters are the only ones left as-is
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string the way OAuth 1.0 requires
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// A fresh random nonce for one request
pub fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Current Unix time in seconds
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The `oauth_*` protocol parameters, in header order
fn protocol_params(credentials: &Credentials, nonce: &str, timestamp: i64) -> Vec<(String, String)> {
    vec![
        ("oauth_consumer_key".to_string(), credentials.consumer_key.clone()),
        ("oauth_token".to_string(), credentials.token.clone()),
        ("oauth_signature_method".to_string(), SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp".to_string(), timestamp.to_string()),
        ("oauth_nonce".to_string(), nonce.to_string()),
        ("oauth_version".to_string(), OAUTH_VERSION.to_string()),
    ]
}

/// Scheme, host, non-default port and path of `url`, without query or fragment
pub fn base_url(url: &Url) -> String {
    let scheme = url.scheme().to_lowercase();
    let host = url.host_str().unwrap_or_default().to_lowercase();
    match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}{}", url.path()),
        None => format!("{scheme}://{host}{}", url.path()),
    }
}

/// Encode, sort and join the request and protocol parameters
pub fn normalized_parameters(url: &Url, oauth_params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .chain(
            oauth_params
                .iter()
                .map(|(k, v)| (percent_encode(k), percent_encode(v))),
        )
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(base_url)&enc(parameters)`
pub fn signature_base_string(method: &str, url: &Url, oauth_params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(&base_url(url)),
        percent_encode(&normalized_parameters(url, oauth_params))
    )
}

fn compute_signature(base_string: &str, credentials: &Credentials) -> String {
    let key = format!(
        "{}&{}",
        percent_encode(&credentials.consumer_secret),
        percent_encode(&credentials.token_secret)
    );
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(base_string.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Build the `Authorization` header value for one request.
///
/// `url` must be the exact target URL, query string included.
pub fn sign(
    method: &str,
    url: &Url,
    credentials: &Credentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let mut params = protocol_params(credentials, nonce, timestamp);
    let base_string = signature_base_string(method, url, &params);
    tracing::trace!("OAuth signature base string: {}", base_string);

    let signature = compute_signature(&base_string, credentials);
    params.push(("oauth_signature".to_string(), signature));

    let fields = std::iter::once(("realm".to_string(), credentials.account_id.clone()))
        .chain(params)
        .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(&v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {fields}")
}
