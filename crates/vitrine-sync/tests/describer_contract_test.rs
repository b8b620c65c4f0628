//! Contract tests for HttpDescriber against a mocked describe endpoint.

use url::Url;
use vitrine_core::ArtifactMetadata;
use vitrine_store::Credential;
use vitrine_sync::{fill_metadata, DescribeError, Describer, HttpDescriber};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn describer(server: &MockServer, key: Option<&str>) -> HttpDescriber {
    let endpoint = Url::parse(&format!("{}/describe", server.uri())).unwrap();
    HttpDescriber::new(endpoint, key.map(Credential::new), 5).unwrap()
}

#[tokio::test]
async fn posts_base64_image_and_parses_suggestion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/describe"))
        .and(header("authorization", "Bearer describe-key"))
        .and(body_json(serde_json::json!({
            "mimeType": "image/png",
            "data": "aW1n",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "Tidal flats",
            "description": "Low tide at dawn",
            "medium": "Photograph",
            "tags": [" coast ", "", "dawn"],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let suggestion = describer(&server, Some("describe-key"))
        .describe(b"img", "image/png")
        .await
        .unwrap();

    assert_eq!(suggestion.title, "Tidal flats");
    assert_eq!(suggestion.tags, vec!["coast".to_string(), "dawn".to_string()]);
}

#[tokio::test]
async fn partial_response_leaves_fields_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "title": "Only" })),
        )
        .mount(&server)
        .await;

    let suggestion = describer(&server, None)
        .describe(b"img", "image/jpeg")
        .await
        .unwrap();

    assert_eq!(suggestion.title, "Only");
    assert!(suggestion.description.is_empty());
    assert!(suggestion.tags.is_empty());
}

#[tokio::test]
async fn server_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = describer(&server, None)
        .describe(b"img", "image/png")
        .await
        .unwrap_err();

    assert!(matches!(err, DescribeError::Api { status: 503, .. }));
}

#[tokio::test]
async fn garbage_response_is_a_deserialization_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = describer(&server, None)
        .describe(b"img", "image/png")
        .await
        .unwrap_err();

    assert!(matches!(err, DescribeError::Deserialization(_)));
}

#[tokio::test]
async fn failing_describer_keeps_manual_entry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let manual = ArtifactMetadata {
        title: "Mine".into(),
        medium: "Ink".into(),
        ..Default::default()
    };
    let filled = fill_metadata(&describer(&server, None), b"img", "image/png", manual.clone()).await;

    assert_eq!(filled, manual);
}
