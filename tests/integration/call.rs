//! Single-exchange call behaviour against a mockito server.

use super::mock_server::MockServerFixture;
use super::{client_for, PUBLIC_KEY, SECRET};
use serde::Deserialize;
use serde_json::json;
use signed_rpc::protocol::RpcRequest;
use signed_rpc::{Error, Hmac256Signer, RpcClient, Signer};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Payload {
    key: String,
}

#[tokio::test]
async fn call_decodes_result() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(200, r#"{"jsonrpc": "2.0","result": {"key": "Value"},"id": "1"}"#)
        .await;

    let result: Payload = fixture
        .client(0)
        .call("any.method", &json!({}))
        .await
        .unwrap();

    assert_eq!(result.key, "Value");
    mock.assert_async().await;
}

#[tokio::test]
async fn call_surfaces_rpc_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture
        .mock_json_response(
            200,
            r#"{"jsonrpc": "2.0","error": {"code": 1, "message": "test error"},"id": "1"}"#,
        )
        .await;

    let err = fixture
        .client(3)
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rpc { code: 1, .. }));
    assert_eq!(err.to_string(), "test error (1)");
}

#[tokio::test]
async fn call_sends_signed_envelope() {
    let fixture = MockServerFixture::new().await;
    let params = json!({"merchant_id": 1});
    let body = RpcRequest::new("merchant.details", &params, "1")
        .to_vec()
        .unwrap();
    let signature = Hmac256Signer.sign(PUBLIC_KEY, SECRET, &body).unwrap();

    let mock = fixture
        .mock_signed_request(
            &format!("Basic {}", signature),
            json!({"jsonrpc": "2.0", "method": "merchant.details", "params": {"merchant_id": 1}, "id": "1"}),
            "{}",
        )
        .await;

    // An envelope without a result decodes into a unit result.
    let result: () = fixture
        .client(0)
        .call("merchant.details", &params)
        .await
        .unwrap();

    assert_eq!(result, ());
    mock.assert_async().await;
}

#[tokio::test]
async fn custom_signer_is_used() {
    let fixture = MockServerFixture::new().await;
    let mock = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/")
            .match_header("authorization", "Basic static-token")
            .with_status(200)
            .with_body(r#"{"result": 42}"#)
            .create_async()
            .await
    };

    let client = RpcClient::builder()
        .config(super::config_for(&fixture.base_url, 0, Duration::ZERO))
        .signer(|_: &str, _: &str, _: &[u8]| -> signed_rpc::Result<String> {
            Ok("static-token".to_string())
        })
        .build()
        .unwrap();

    let result: u32 = client.call("any.method", &()).await.unwrap();
    assert_eq!(result, 42);
    mock.assert_async().await;
}

#[tokio::test]
async fn signing_failure_sends_nothing() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json_response_times(200, "{}", 0).await;

    let client = RpcClient::builder()
        .config(super::config_for(&fixture.base_url, 0, Duration::ZERO))
        .signer(|_: &str, _: &str, _: &[u8]| -> signed_rpc::Result<String> {
            Err(Error::signing("key unavailable"))
        })
        .build()
        .unwrap();

    let err = client
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "request signing failed: key unavailable");
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json_response_times(401, "{}", 1).await;

    let err = fixture
        .client(0)
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "unexpected HTTP status: 401 Unauthorized");
    mock.assert_async().await;
}

#[tokio::test]
async fn server_error_with_single_attempt() {
    let fixture = MockServerFixture::new().await;
    let mock = fixture.mock_json_response_times(500, "", 1).await;

    let err = fixture
        .client(1)
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("500 Internal Server Error"));
    assert!(err.is_retryable());
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_json_response(200, "<html>").await;

    let err = fixture
        .client(2)
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Json(_)));
}

#[tokio::test]
async fn redirect_limit_is_permanent() {
    let fixture = MockServerFixture::new().await;
    let mocks = fixture.mock_redirect_chain(12).await;

    let mut config = super::config_for(&fixture.base_url, 3, Duration::ZERO);
    config.max_redirects = 3;
    let client = RpcClient::new(config).unwrap();

    let err = client
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("POST \""), "{}", message);
    assert!(message.ends_with("stopped after 3 redirects"), "{}", message);
    assert!(!err.is_retryable());

    // A retried call would enter the chain a second time.
    mocks[0].assert_async().await;
}

#[tokio::test]
async fn unsupported_scheme_is_permanent() {
    let client = client_for("ftp://example.net", 3, Duration::from_secs(30));

    let started = std::time::Instant::now();
    let err = client
        .call::<_, serde_json::Value>("any.method", &json!({}))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("POST \"ftp://example.net"), "{}", message);
    assert!(
        message.ends_with("unsupported protocol scheme \"ftp\""),
        "{}",
        message
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}
