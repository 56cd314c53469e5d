//! Request signing against the mock server.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use bce_auth::canonical::build_canonical_uri;
    use bce_auth::{
        Credentials, HttpMethod, SigningRequest, StaticCredentialProvider, presign,
        presigned_query_string,
    };
    use bce_bos_core::{BosClient, StorageOps};
    use bce_bos_model::PutOptions;
    use bce_http::{BceSigner, HttpError, HttpRequest, HttpTransport, ReqwestTransport};
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};

    use crate::{
        TEST_ACCESS_KEY, TEST_SECRET_KEY, bos_client, bos_client_with_secret, client_config,
        http_client, start_server, transport,
    };

    #[tokio::test]
    async fn test_should_accept_signed_put() {
        let server = start_server().await;
        let client = bos_client(&server);

        let options = PutOptions {
            content_type: Some("text/plain".to_owned()),
            user_metadata: BTreeMap::from([("Owner".to_owned(), "alice".to_owned())]),
        };
        let output = client
            .put_direct("bucket", "hello.txt", Bytes::from_static(b"hello"), &options)
            .await
            .expect("signed put should succeed");

        let stored = server.object("bucket", "hello.txt").expect("object stored");
        assert_eq!(stored.body, Bytes::from_static(b"hello"));
        assert_eq!(output.e_tag, stored.e_tag);
        assert_eq!(stored.content_type.as_deref(), Some("text/plain"));
        assert_eq!(stored.user_metadata["owner"], "alice");
        assert_eq!(server.rejected_count(), 0);
    }

    #[tokio::test]
    async fn test_should_reject_wrong_secret_with_remote_error() {
        let server = start_server().await;
        let client = bos_client_with_secret(&server, "not-the-secret");

        let err = client
            .put_direct("bucket", "k", Bytes::from_static(b"x"), &PutOptions::default())
            .await
            .unwrap_err();

        let remote = err.as_remote().expect("remote error");
        assert_eq!(remote.status, StatusCode::FORBIDDEN);
        assert_eq!(remote.code.as_deref(), Some("SignatureDoesNotMatch"));
        assert!(remote.request_id.is_some());
        assert_eq!(server.rejected_count(), 1);
        assert!(server.object("bucket", "k").is_none());
    }

    #[tokio::test]
    async fn test_should_sign_keys_needing_encoding() {
        let server = start_server().await;
        let client = bos_client(&server);
        let key = "dir/a b+c/中文 (1)*.txt";

        client
            .put_direct("bucket", key, Bytes::from_static(b"data"), &PutOptions::default())
            .await
            .expect("put with encoded key");

        assert!(server.object("bucket", key).is_some());
    }

    #[tokio::test]
    async fn test_should_send_through_transport_with_custom_signer() {
        let server = start_server().await;
        let signer = BceSigner::new(Arc::new(StaticCredentialProvider::new(
            TEST_ACCESS_KEY,
            TEST_SECRET_KEY,
        )))
        .with_expiration(300)
        .with_headers_to_sign(vec!["host".to_owned(), "content-md5".to_owned()]);

        let request = HttpRequest::new(HttpMethod::Put, "/v1/bucket/raw")
            .header("content-md5", "CY9rzUYh03PK3k6DJie09g==")
            .unwrap()
            .body(Bytes::from_static(b"test"));
        let response = transport(&server)
            .send(request, &signer)
            .await
            .expect("send");

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.request_id().is_some());
        assert_eq!(
            response.e_tag().as_deref(),
            Some("098f6bcd4621d373cade4e832627b4f6")
        );
    }

    #[tokio::test]
    async fn test_should_report_missing_object_as_remote_error() {
        let server = start_server().await;
        let signer = BceSigner::new(Arc::new(StaticCredentialProvider::new(
            TEST_ACCESS_KEY,
            TEST_SECRET_KEY,
        )));

        let err = transport(&server)
            .send(HttpRequest::new(HttpMethod::Get, "/v1/bucket/missing"), &signer)
            .await
            .unwrap_err();
        assert!(matches!(err, HttpError::Remote(_)));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_should_serve_presigned_get() {
        let server = start_server().await;
        bos_client(&server)
            .put_direct("bucket", "shared.bin", Bytes::from_static(b"shared"), &PutOptions::default())
            .await
            .expect("put");

        let mut headers = HeaderMap::new();
        headers.insert(
            "host",
            HeaderValue::from_str(&server.authority()).expect("host header"),
        );
        let path = "/v1/bucket/shared.bin";
        let request = SigningRequest::builder()
            .method(HttpMethod::Get)
            .path(path)
            .headers(headers)
            .timestamp(chrono::Utc::now().timestamp())
            .expiration_seconds(600)
            .build();
        let params = presign(&Credentials::new(TEST_ACCESS_KEY, TEST_SECRET_KEY), &request);
        let url = format!(
            "{}{}?{}",
            server.endpoint(),
            build_canonical_uri(path),
            presigned_query_string(&params)
        );

        let client = http_client();
        let response = client.get(&url).send().await.expect("presigned get");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.bytes().await.expect("body"), Bytes::from_static(b"shared"));

        let tampered = url.replace("shared.bin", "other.bin");
        let response = client.get(&tampered).send().await.expect("tampered get");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_build_client_from_config() {
        let server = start_server().await;
        let config = client_config(&server, TEST_SECRET_KEY);
        let transport = ReqwestTransport::from_config(&config).expect("transport");
        assert_eq!(transport.endpoint().host(), server.authority());

        let client = BosClient::from_config(&config).expect("client");
        // A system proxy would intercept loopback traffic from the default client.
        if std::env::var_os("HTTP_PROXY").is_none() && std::env::var_os("http_proxy").is_none() {
            client
                .put_direct("bucket", "cfg.txt", Bytes::from_static(b"cfg"), &PutOptions::default())
                .await
                .expect("put via configured client");
            assert!(server.object("bucket", "cfg.txt").is_some());
        }
    }
}
