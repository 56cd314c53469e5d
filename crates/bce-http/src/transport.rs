//! Signed request execution.

use std::time::Duration;

use async_trait::async_trait;
use bce_auth::canonical::{build_canonical_uri, uri_encode};
use bce_auth::signer::format_timestamp;
use bce_core::{BceConfig, Endpoint};
use chrono::Utc;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, HOST, HeaderValue};
use tracing::{debug, warn};

use crate::error::{HttpError, RemoteApiError};
use crate::request::{BCE_DATE, BCE_REQUEST_ID, HttpRequest, HttpResponse};
use crate::signer::RequestSigner;

/// Sends requests to a service endpoint.
///
/// Implementations add the transport-owned headers, call the signer, and map
/// non-2xx responses to [`HttpError::Remote`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sign and send `request`, returning the full response on success.
    async fn send(
        &self,
        request: HttpRequest,
        signer: &dyn RequestSigner,
    ) -> Result<HttpResponse, HttpError>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    endpoint: Endpoint,
}

impl ReqwestTransport {
    /// Create a transport using an existing client.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }

    /// Create a transport from client configuration.
    ///
    /// # Errors
    /// Returns [`HttpError::InvalidUrl`] if the endpoint cannot be parsed and
    /// [`HttpError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &BceConfig) -> Result<Self, HttpError> {
        let endpoint = config
            .resolve_endpoint()
            .map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let mut builder = reqwest::Client::builder();
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }

        Ok(Self::new(builder.build()?, endpoint))
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Build the absolute URL for `request`, encoding path and query the same
    /// way the signer canonicalizes them.
    fn url(&self, request: &HttpRequest) -> Result<reqwest::Url, HttpError> {
        let mut url = format!(
            "{}{}",
            self.endpoint.base_url(),
            build_canonical_uri(&request.path)
        );

        if !request.params.is_empty() {
            let query = request
                .params
                .iter()
                .map(|(key, value)| {
                    format!("{}={}", uri_encode(key), uri_encode(value.as_deref().unwrap_or("")))
                })
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        reqwest::Url::parse(&url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))
    }
}

fn header_value(value: &str) -> Result<HeaderValue, HttpError> {
    HeaderValue::from_str(value).map_err(|_| HttpError::InvalidHeader(value.to_owned()))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        mut request: HttpRequest,
        signer: &dyn RequestSigner,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.url(&request)?;
        let timestamp = Utc::now().timestamp();

        request
            .headers
            .insert(HOST, header_value(self.endpoint.host())?);
        request
            .headers
            .insert(BCE_DATE, header_value(&format_timestamp(Some(timestamp)))?);
        request
            .headers
            .insert(CONTENT_LENGTH, HeaderValue::from(request.body.len()));

        let authorization = signer.authorization(&request, timestamp)?;
        request
            .headers
            .insert(AUTHORIZATION, header_value(&authorization)?);

        debug!(
            method = %request.method,
            %url,
            body_len = request.body.len(),
            "Sending request"
        );

        let response = self
            .client
            .request(request.method.into(), url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if status.is_success() {
            debug!(status = status.as_u16(), "Request succeeded");
            return Ok(HttpResponse {
                status,
                headers,
                body,
            });
        }

        let request_id = headers.get(BCE_REQUEST_ID).and_then(|v| v.to_str().ok());
        let remote = RemoteApiError::from_response(status, request_id, &body);
        warn!(error = %remote, "Request rejected by service");
        Err(HttpError::Remote(remote))
    }
}
