//! Presigned query parameters.
//!
//! A presigned URL carries the token in an `authorization` query parameter
//! instead of a header. Because the canonical query string skips that key,
//! the token can be computed over the remaining parameters and appended
//! afterwards without invalidating itself.

use std::collections::BTreeMap;

use crate::canonical::{AUTHORIZATION_PARAM, uri_encode};
use crate::credentials::Credentials;
use crate::signer::{SigningRequest, sign};

/// Sign `request` and return its query parameters with `authorization` added.
///
/// # Examples
///
/// ```
/// use bce_auth::credentials::Credentials;
/// use bce_auth::presigned::presign;
/// use bce_auth::signer::{HttpMethod, SigningRequest};
///
/// let creds = Credentials::new("ak", "sk");
/// let request = SigningRequest::builder()
///     .method(HttpMethod::Get)
///     .path("/v1/bucket/key")
///     .timestamp(1_402_639_056)
///     .build();
/// let params = presign(&creds, &request);
/// assert!(params["authorization"].as_deref().unwrap().starts_with("bce-auth-v1/ak/"));
/// ```
#[must_use]
pub fn presign(
    credentials: &Credentials,
    request: &SigningRequest,
) -> BTreeMap<String, Option<String>> {
    let token = sign(credentials, request);
    let mut params = request.params.clone();
    params.insert(AUTHORIZATION_PARAM.to_owned(), Some(token));
    params
}

/// Render query parameters as `k=v&k2=v2`, percent-encoding both sides.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use bce_auth::presigned::presigned_query_string;
///
/// let mut params = BTreeMap::new();
/// params.insert("authorization".to_owned(), Some("bce-auth-v1/ak".to_owned()));
/// params.insert("uploads".to_owned(), None);
/// assert_eq!(presigned_query_string(&params), "authorization=bce-auth-v1%2Fak&uploads=");
/// ```
#[must_use]
pub fn presigned_query_string(params: &BTreeMap<String, Option<String>>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", uri_encode(k), uri_encode(v.as_deref().unwrap_or(""))))
        .collect::<Vec<_>>()
        .join("&")
}
