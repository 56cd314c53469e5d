//! In-process BOS server used by the end-to-end tests.
//!
//! Implements the object and multipart endpoints the upload path uses, keeps
//! everything in memory, and rejects any request whose `bce-auth-v1`
//! signature does not verify.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use bce_auth::{AuthError, Credentials, HttpMethod, SigningRequest, verify_token};
use bce_bos_model::{
    CompleteMultipartUploadInput, CompleteMultipartUploadOutput, InitiateMultipartUploadOutput,
    MAX_PART_NUMBER, MIN_PART_NUMBER,
};
use bce_http::CONTENT_MD5;
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONTENT_TYPE, ETAG};
use http::request::Parts;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use md5::{Digest, Md5};
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const REQUEST_ID: &str = "x-bce-request-id";
const USER_METADATA_PREFIX: &str = "x-bce-meta-";

/// An object stored by the server.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object contents.
    pub body: Bytes,
    /// ETag without quotes.
    pub e_tag: String,
    /// `Content-Type` given at upload time.
    pub content_type: Option<String>,
    /// `x-bce-meta-*` headers, keyed by the name after the prefix.
    pub user_metadata: BTreeMap<String, String>,
}

#[derive(Debug)]
struct PendingUpload {
    bucket: String,
    key: String,
    content_type: Option<String>,
    user_metadata: BTreeMap<String, String>,
    parts: BTreeMap<u32, (Bytes, String)>,
}

#[derive(Debug, Default)]
struct Store {
    objects: HashMap<(String, String), StoredObject>,
    uploads: HashMap<String, PendingUpload>,
    aborted: Vec<String>,
}

#[derive(Debug)]
struct ServerState {
    credentials: Credentials,
    store: Mutex<Store>,
    fail_part: Mutex<Option<u32>>,
    requests: AtomicUsize,
    rejected: AtomicUsize,
}

/// Error returned to the client as a BOS JSON error body.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = match err {
            AuthError::SignatureDoesNotMatch => "SignatureDoesNotMatch",
            AuthError::RequestExpired => "RequestExpired",
            AuthError::AccessKeyNotFound(_) => "InvalidAccessKeyId",
            _ => "AccessDenied",
        };
        Self::new(StatusCode::FORBIDDEN, code, err.to_string())
    }
}

/// A running in-process server. Stops when dropped.
#[derive(Debug)]
pub struct MockBosServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl Drop for MockBosServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockBosServer {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start(credentials: Credentials) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock server")?;
        let addr = listener.local_addr()?;

        let state = Arc::new(ServerState {
            credentials,
            store: Mutex::new(Store::default()),
            fail_part: Mutex::new(None),
            requests: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        });

        let handle = tokio::spawn(serve(listener, Arc::clone(&state)));
        debug!(%addr, "mock BOS server listening");

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Base URL of the server.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `host:port` the server is bound to.
    #[must_use]
    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    /// A stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.state
            .store
            .lock()
            .objects
            .get(&(bucket.to_owned(), key.to_owned()))
            .cloned()
    }

    /// Number of sessions initiated but neither completed nor aborted.
    #[must_use]
    pub fn pending_uploads(&self) -> usize {
        self.state.store.lock().uploads.len()
    }

    /// Ids of aborted sessions.
    #[must_use]
    pub fn aborted_uploads(&self) -> Vec<String> {
        self.state.store.lock().aborted.clone()
    }

    /// Make every upload of `part_number` fail with a 500.
    pub fn fail_part(&self, part_number: u32) {
        *self.state.fail_part.lock() = Some(part_number);
    }

    /// Requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Requests rejected during authentication.
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.state.rejected.load(Ordering::SeqCst)
    }
}

async fn serve(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        let (stream, peer_addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |req| handle(Arc::clone(&state), req));
            if let Err(e) = HttpConnBuilder::new(TokioExecutor::new())
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(%peer_addr, error = %e, "connection closed with error");
            }
        });
    }
}

async fn handle(
    state: Arc<ServerState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let request_id = uuid::Uuid::new_v4().to_string();

    let (parts, body) = req.into_parts();
    let result = match body.collect().await {
        Ok(collected) => route(&state, &parts, collected.to_bytes()),
        Err(e) => Err(ApiError::bad_request("InvalidRequest", e.to_string())),
    };

    let mut response = result.unwrap_or_else(|err| {
        debug!(method = %parts.method, uri = %parts.uri, code = err.code, "request failed");
        let body = serde_json::json!({
            "code": err.code,
            "message": err.message,
            "requestId": request_id,
        });
        json_response(err.status, &body)
    });
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    Ok(response)
}

fn route(state: &ServerState, parts: &Parts, body: Bytes) -> Result<Response<Full<Bytes>>, ApiError> {
    let path = decode(parts.uri.path())?;
    let params = parse_query(parts.uri.query())?;

    if let Err(err) = authenticate(state, parts, &path, &params) {
        state.rejected.fetch_add(1, Ordering::SeqCst);
        return Err(err);
    }

    let (bucket, key) = path
        .strip_prefix("/v1/")
        .and_then(|rest| rest.split_once('/'))
        .filter(|(bucket, key)| !bucket.is_empty() && !key.is_empty())
        .ok_or_else(|| ApiError::bad_request("InvalidURI", format!("not an object path: {path}")))?;

    let upload_id = params.get("uploadId").cloned().flatten();
    match (parts.method.as_str(), upload_id) {
        ("POST", None) if params.contains_key("uploads") => initiate(state, parts, bucket, key),
        ("PUT", Some(upload_id)) => upload_part(state, parts, &params, &upload_id, body),
        ("POST", Some(upload_id)) => complete(state, bucket, key, &upload_id, &body),
        ("DELETE", Some(upload_id)) => abort(state, &upload_id),
        ("PUT", None) => put_object(state, parts, bucket, key, body),
        ("GET", None) => get_object(state, bucket, key),
        _ => Err(ApiError::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "MethodNotAllowed",
            format!("{} {path}", parts.method),
        )),
    }
}

/// Verify the token from the `Authorization` header or the `authorization` query parameter.
fn authenticate(
    state: &ServerState,
    parts: &Parts,
    path: &str,
    params: &BTreeMap<String, Option<String>>,
) -> Result<(), ApiError> {
    let token = match parts.headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().ok().map(ToOwned::to_owned),
        None => params.get("authorization").cloned().flatten(),
    }
    .ok_or_else(|| ApiError::new(StatusCode::FORBIDDEN, "AccessDenied", "missing authorization"))?;

    let method = HttpMethod::try_from(&parts.method)
        .map_err(|e| ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed", e.to_string()))?;
    let request = SigningRequest::builder()
        .method(method)
        .path(path)
        .params(params.clone())
        .headers(parts.headers.clone())
        .build();

    verify_token(&state.credentials, &request, &token, chrono::Utc::now().timestamp())?;
    Ok(())
}

fn initiate(
    state: &ServerState,
    parts: &Parts,
    bucket: &str,
    key: &str,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let upload_id = uuid::Uuid::new_v4().simple().to_string();
    state.store.lock().uploads.insert(
        upload_id.clone(),
        PendingUpload {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            content_type: header(parts, CONTENT_TYPE.as_str()),
            user_metadata: user_metadata(parts),
            parts: BTreeMap::new(),
        },
    );

    let output = InitiateMultipartUploadOutput {
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        upload_id,
    };
    Ok(json_response(StatusCode::OK, &output))
}

fn upload_part(
    state: &ServerState,
    parts: &Parts,
    params: &BTreeMap<String, Option<String>>,
    upload_id: &str,
    body: Bytes,
) -> Result<Response<Full<Bytes>>, ApiError> {
    let part_number = params
        .get("partNumber")
        .cloned()
        .flatten()
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|n| (MIN_PART_NUMBER..=MAX_PART_NUMBER).contains(n))
        .ok_or_else(|| ApiError::bad_request("InvalidArgument", "invalid partNumber"))?;

    if *state.fail_part.lock() == Some(part_number) {
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalError",
            format!("injected failure for part {part_number}"),
        ));
    }

    check_content_md5(parts, &body)?;
    let e_tag = hex::encode(Md5::digest(&body));

    let mut store = state.store.lock();
    let upload = store
        .uploads
        .get_mut(upload_id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NoSuchUpload", upload_id))?;
    upload.parts.insert(part_number, (body, e_tag.clone()));

    Ok(etag_response(&e_tag))
}

fn complete(
    state: &ServerState,
    bucket: &str,
    key: &str,
    upload_id: &str,
    body: &[u8],
) -> Result<Response<Full<Bytes>>, ApiError> {
    let input: CompleteMultipartUploadInput = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request("MalformedJSON", e.to_string()))?;

    if input.parts.is_empty() {
        return Err(ApiError::bad_request("MalformedJSON", "no parts"));
    }
    if input
        .parts
        .windows(2)
        .any(|pair| pair[0].part_number >= pair[1].part_number)
    {
        return Err(ApiError::bad_request(
            "InvalidPartOrder",
            "parts must be listed in ascending order",
        ));
    }

    let no_such_upload = || ApiError::new(StatusCode::NOT_FOUND, "NoSuchUpload", upload_id);
    let mut store = state.store.lock();
    let pending = store.uploads.get(upload_id).ok_or_else(no_such_upload)?;

    let mut assembled = Vec::new();
    for part in &input.parts {
        match pending.parts.get(&part.part_number) {
            Some((data, e_tag)) if *e_tag == part.e_tag => assembled.extend_from_slice(data),
            _ => {
                return Err(ApiError::bad_request(
                    "InvalidPart",
                    format!("part {} was not uploaded with that ETag", part.part_number),
                ));
            }
        }
    }
    let upload = store.uploads.remove(upload_id).ok_or_else(no_such_upload)?;

    let e_tag = format!("{}-{}", hex::encode(Md5::digest(&assembled)), input.parts.len());
    store.objects.insert(
        (upload.bucket.clone(), upload.key.clone()),
        StoredObject {
            body: Bytes::from(assembled),
            e_tag: e_tag.clone(),
            content_type: upload.content_type,
            user_metadata: upload.user_metadata,
        },
    );

    let output = CompleteMultipartUploadOutput {
        location: format!("/v1/{bucket}/{key}"),
        bucket: bucket.to_owned(),
        key: key.to_owned(),
        e_tag,
    };
    Ok(json_response(StatusCode::OK, &output))
}

fn abort(state: &ServerState, upload_id: &str) -> Result<Response<Full<Bytes>>, ApiError> {
    let mut store = state.store.lock();
    if store.uploads.remove(upload_id).is_none() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "NoSuchUpload", upload_id));
    }
    store.aborted.push(upload_id.to_owned());
    Ok(empty_response(StatusCode::OK))
}

fn put_object(
    state: &ServerState,
    parts: &Parts,
    bucket: &str,
    key: &str,
    body: Bytes,
) -> Result<Response<Full<Bytes>>, ApiError> {
    check_content_md5(parts, &body)?;
    let e_tag = hex::encode(Md5::digest(&body));
    state.store.lock().objects.insert(
        (bucket.to_owned(), key.to_owned()),
        StoredObject {
            body,
            e_tag: e_tag.clone(),
            content_type: header(parts, CONTENT_TYPE.as_str()),
            user_metadata: user_metadata(parts),
        },
    );
    Ok(etag_response(&e_tag))
}

fn get_object(state: &ServerState, bucket: &str, key: &str) -> Result<Response<Full<Bytes>>, ApiError> {
    let store = state.store.lock();
    let object = store
        .objects
        .get(&(bucket.to_owned(), key.to_owned()))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "NoSuchKey", key))?;

    let mut response = Response::new(Full::new(object.body.clone()));
    if let Ok(value) = HeaderValue::from_str(&format!("\"{}\"", object.e_tag)) {
        response.headers_mut().insert(ETAG, value);
    }
    Ok(response)
}

fn check_content_md5(parts: &Parts, body: &[u8]) -> Result<(), ApiError> {
    if let Some(provided) = header(parts, CONTENT_MD5) {
        if provided != BASE64_STANDARD.encode(Md5::digest(body)) {
            return Err(ApiError::bad_request("BadDigest", "Content-MD5 does not match body"));
        }
    }
    Ok(())
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

fn user_metadata(parts: &Parts) -> BTreeMap<String, String> {
    parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            let name = name.as_str().strip_prefix(USER_METADATA_PREFIX)?;
            Some((name.to_owned(), value.to_str().ok()?.to_owned()))
        })
        .collect()
}

fn decode(value: &str) -> Result<String, ApiError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| ApiError::bad_request("InvalidURI", "path is not valid UTF-8"))
}

fn parse_query(query: Option<&str>) -> Result<BTreeMap<String, Option<String>>, ApiError> {
    let mut params = BTreeMap::new();
    for pair in query.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (decode(key)?, Some(decode(value)?)),
            None => (decode(pair)?, None),
        };
        params.insert(key, value);
    }
    Ok(params)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn etag_response(e_tag: &str) -> Response<Full<Bytes>> {
    let mut response = empty_response(StatusCode::OK);
    if let Ok(value) = HeaderValue::from_str(&format!("\"{e_tag}\"")) {
        response.headers_mut().insert(ETAG, value);
    }
    response
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
