//! Canonical request construction for `bce-auth-v1`.
//!
//! The string that gets signed is:
//!
//! ```text
//! HTTPMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders
//! ```
//!
//! Each component is percent-encoded and sorted so that client and server
//! derive byte-identical input for the HMAC.

use http::HeaderMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped: `A-Z a-z 0-9 - _ . ~`. Everything else is `%XX`.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Headers signed when the caller does not supply an explicit list.
pub const DEFAULT_HEADERS_TO_SIGN: [&str; 4] =
    ["host", "content-md5", "content-length", "content-type"];

/// Headers with this prefix are always signed.
pub const BCE_HEADER_PREFIX: &str = "x-bce-";

/// Query parameter that carries the token in presigned URLs; never signed.
pub const AUTHORIZATION_PARAM: &str = "authorization";

/// Canonical headers together with the list of names that were signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalHeaders {
    /// Sorted `name:value` lines joined with `\n`.
    pub canonical: String,
    /// Encoded lowercase header names, in the same order as the lines.
    pub signed_headers: Vec<String>,
}

/// Percent-encode a string, escaping `/` as well.
///
/// # Examples
///
/// ```
/// use bce_auth::canonical::uri_encode;
///
/// assert_eq!(uri_encode("a b/c*"), "a%20b%2Fc%2A");
/// assert_eq!(uri_encode("AZaz09-_.~"), "AZaz09-_.~");
/// ```
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Canonicalize a resource path: encode every segment, keep `/` separators.
///
/// # Examples
///
/// ```
/// use bce_auth::canonical::build_canonical_uri;
///
/// assert_eq!(build_canonical_uri("/v1/bucket/object1"), "/v1/bucket/object1");
/// assert_eq!(build_canonical_uri("/v1/b/a b+c"), "/v1/b/a%20b%2Bc");
/// ```
#[must_use]
pub fn build_canonical_uri(path: &str) -> String {
    path.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Canonicalize query parameters.
///
/// The `authorization` key is skipped (case-insensitively). Missing values
/// encode as the empty string. The `key=value` strings are sorted as whole
/// strings, so the result does not depend on iteration order.
///
/// # Examples
///
/// ```
/// use bce_auth::canonical::build_canonical_query_string;
///
/// let params = [("b", Some("")), ("A", None), ("C", Some("d"))];
/// assert_eq!(build_canonical_query_string(params), "A=&C=d&b=");
/// ```
#[must_use]
pub fn build_canonical_query_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut pairs: Vec<String> = params
        .into_iter()
        .filter(|(key, _)| !key.eq_ignore_ascii_case(AUTHORIZATION_PARAM))
        .map(|(key, value)| format!("{}={}", uri_encode(key), uri_encode(value.unwrap_or(""))))
        .collect();

    pairs.sort_unstable();
    pairs.join("&")
}

/// Canonicalize headers.
///
/// A header is signed when its lowercased name is in `headers_to_sign` (or in
/// [`DEFAULT_HEADERS_TO_SIGN`] when that is `None` or empty), or when it
/// starts with [`BCE_HEADER_PREFIX`]. Values are trimmed; empty values and
/// values that are not valid UTF-8 are skipped.
#[must_use]
pub fn build_canonical_headers(
    headers: &HeaderMap,
    headers_to_sign: Option<&[String]>,
) -> CanonicalHeaders {
    let allowlist: Vec<String> = match headers_to_sign {
        Some(list) if !list.is_empty() => list.iter().map(|h| h.to_ascii_lowercase()).collect(),
        _ => DEFAULT_HEADERS_TO_SIGN.iter().map(|h| (*h).to_owned()).collect(),
    };

    let mut lines: Vec<(String, String)> = headers
        .iter()
        .filter_map(|(name, value)| {
            // HeaderName is already lowercase.
            let name = name.as_str();
            if !name.starts_with(BCE_HEADER_PREFIX) && !allowlist.iter().any(|h| h == name) {
                return None;
            }
            let value = value.to_str().ok()?.trim();
            if value.is_empty() {
                return None;
            }
            let encoded_name = uri_encode(name);
            let line = format!("{encoded_name}:{}", uri_encode(value));
            Some((line, encoded_name))
        })
        .collect();

    lines.sort_unstable();

    let (canonical, signed_headers): (Vec<String>, Vec<String>) = lines.into_iter().unzip();
    CanonicalHeaders {
        canonical: canonical.join("\n"),
        signed_headers,
    }
}

/// Assemble the raw string that is HMAC'd with the session key.
#[must_use]
pub fn build_raw_signature(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    canonical_headers: &str,
) -> String {
    format!("{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}")
}
