//! Contract tests for IpfsBlobStore against the IPFS HTTP API.
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/api/v0/add?pin=true` | `publish_*` |
//! | POST   | `/api/v0/cat?arg={cid}` | `fetch_*` |

use docseal_client::{ClientConfig, DocsealClient};
use docseal_core::{BlobError, BlobStore, ContentReference};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build a client with the IPFS URL pointed at a wiremock server.
fn test_client(mock_server: &MockServer) -> DocsealClient {
    let config = ClientConfig {
        ipfs_api_url: mock_server.uri().parse().unwrap(),
        ..ClientConfig::local_mock(19000, 19001).unwrap()
    };
    DocsealClient::new(config).unwrap()
}

#[tokio::test]
async fn publish_pins_and_returns_hash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .and(query_param("pin", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Name": "certificate.pdf",
            "Hash": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
            "Size": "1234"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let cid = client.ipfs().publish(b"%PDF-1.5 test").await.unwrap();
    assert_eq!(cid.as_str(), "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG");
}

#[tokio::test]
async fn publish_sends_multipart_file_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Hash": "QmA"})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.ipfs().publish(b"payload-bytes").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("payload-bytes"));
}

#[tokio::test]
async fn publish_api_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .respond_with(ResponseTemplate::new(500).set_body_string("repo full"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.ipfs().publish(b"x").await.unwrap_err();
    match err {
        BlobError::Api { status, body, .. } => {
            assert_eq!(status, 500);
            assert!(body.contains("repo full"));
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn publish_with_invalid_hash_is_a_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"Hash": ""})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let err = client.ipfs().publish(b"x").await.unwrap_err();
    assert!(matches!(err, BlobError::Deserialization { .. }));
}

#[tokio::test]
async fn publish_to_unreachable_node_is_transport_error() {
    let client = DocsealClient::new(ClientConfig::local_mock(1, 1).unwrap()).unwrap();
    let err = client.ipfs().publish(b"x").await.unwrap_err();
    assert!(matches!(err, BlobError::Transport { .. }));
}

#[tokio::test]
async fn fetch_returns_raw_bytes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v0/cat"))
        .and(query_param("arg", "QmA"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.5 body".to_vec()))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let bytes = client
        .ipfs()
        .fetch(&ContentReference::new("QmA").unwrap())
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.5 body");
}
