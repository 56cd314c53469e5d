//! Signed HTTP transport for the BCE client.
//!
//! Service clients describe a request with [`HttpRequest`] and hand it to an
//! [`HttpTransport`] together with a [`RequestSigner`]. The transport fills in
//! `Host`, `x-bce-date` and `Content-Length`, asks the signer for the
//! `Authorization` header, sends the request, and turns non-2xx responses into
//! [`RemoteApiError`].

pub mod error;
pub mod request;
pub mod signer;
pub mod transport;

pub use error::{HttpError, RemoteApiError};
pub use request::{BCE_DATE, BCE_REQUEST_ID, CONTENT_MD5, HttpRequest, HttpResponse};
pub use signer::{BceSigner, RequestSigner};
pub use transport::{HttpTransport, ReqwestTransport};
