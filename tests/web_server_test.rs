use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use profile_chat::service::{ChatService, ConfigSource};
use profile_chat::{constants, web_server, Profile, ProviderConfig};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn profile() -> Arc<Profile> {
    Arc::new(
        Profile::from_json(
            r#"{ "name": "Ada Example", "skills": ["SQL", "AWS"], "employer": "Acme" }"#,
        )
        .unwrap(),
    )
}

fn provider_config(base_url: String, api_key: Option<&str>) -> ProviderConfig {
    ProviderConfig {
        base_url,
        api_key: api_key.map(str::to_string),
        model: "gemini-test".to_string(),
        temperature: constants::TEMPERATURE,
    }
}

fn test_server(provider: &MockServer) -> TestServer {
    let service = ChatService::new(
        profile(),
        ConfigSource::Fixed(provider_config(provider.uri(), Some("test-key"))),
    )
    .with_deadline(Duration::from_millis(300));
    TestServer::new(web_server::router(service)).unwrap()
}

#[tokio::test]
async fn test_chat_returns_extracted_reply() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("What skills does he have?"))
        .and(body_string_contains("Ada Example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"candidates":[{"content":{"parts":[{"text":"- SQL\n- AWS"}]}}]}),
        ))
        .expect(1)
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "What skills does he have?" }))
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "reply": "- SQL\n- AWS" }));
}

#[tokio::test]
async fn test_provider_error_is_soft() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "quota exceeded"}})),
        )
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    let response = server.post("/api/chat").json(&json!({ "message": "hi" })).await;

    response.assert_status_ok();
    let reply = response.json::<Value>()["reply"].as_str().unwrap().to_string();
    assert!(reply.contains("429"), "{}", reply);
    assert!(reply.contains("quota exceeded"), "{}", reply);
}

#[tokio::test]
async fn test_timeout_is_soft() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    let response = server.post("/api/chat").json(&json!({ "message": "hi" })).await;

    response.assert_status_ok();
    assert!(response.json::<Value>()["reply"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_empty_reply_uses_fallback() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    let response = server.post("/api/chat").json(&json!({ "message": "hi" })).await;

    response.assert_status_ok();
    response.assert_json(&json!({ "reply": profile_chat::extract::NO_TEXT_FALLBACK }));
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    for body in [json!({ "message": "" }), json!({ "message": "   " }), json!({})] {
        let response = server.post("/api/chat").json(&body).expect_failure().await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "reply": "Please type a question." }));
    }
}

#[tokio::test]
async fn test_long_message_is_truncated() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}),
        ))
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    let question = format!("{}{}", "a".repeat(constants::MAX_QUESTION_CHARS), "TAIL");
    server
        .post("/api/chat")
        .json(&json!({ "message": question }))
        .await
        .assert_status_ok();

    let received = provider.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.ends_with(&"a".repeat(constants::MAX_QUESTION_CHARS)));
    assert!(!prompt.contains("TAIL"));
}

#[tokio::test]
async fn test_missing_credential_is_reported() {
    let provider = MockServer::start().await;
    let service = ChatService::new(
        profile(),
        ConfigSource::Fixed(provider_config(provider.uri(), None)),
    );
    let server = TestServer::new(web_server::router(service)).unwrap();

    let response = server
        .post("/api/chat")
        .json(&json!({ "message": "hi" }))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["reply"].as_str().unwrap().contains("misconfigured"));
    assert!(provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_gets_soft_reply() {
    let provider = MockServer::start().await;
    let server = test_server(&provider);

    let response = server
        .post("/api/chat")
        .text("{ not json")
        .content_type("application/json")
        .await;

    response.assert_status_ok();
    response.assert_json(&json!({ "reply": "Server error. Please try again." }));
}

#[tokio::test]
async fn test_profile_and_health() {
    let provider = MockServer::start().await;
    let server = test_server(&provider);

    let profile = server.get("/api/profile").await.json::<Value>();
    assert_eq!(profile["name"], "Ada Example");
    assert_eq!(profile["skills"], json!(["SQL", "AWS"]));

    server.get("/health").await.assert_text("ok");
}

#[tokio::test]
async fn test_body_parsed_without_json_content_type() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("Where is she based?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"candidates":[{"content":{"parts":[{"text":"Leeds"}]}}]}),
        ))
        .expect(2)
        .mount(&provider)
        .await;

    let server = test_server(&provider);
    for content_type in ["text/plain;charset=UTF-8", "application/octet-stream"] {
        let response = server
            .post("/api/chat")
            .text(r#"{ "message": "Where is she based?" }"#)
            .content_type(content_type)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "reply": "Leeds" }));
    }
}

#[tokio::test]
async fn test_nested_profile_fields_reach_the_provider() {
    let provider = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("https://ada.dev"))
        .and(body_string_contains("Remote"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"candidates":[{"content":{"parts":[{"text":"ok"}]}}]}),
        ))
        .expect(1)
        .mount(&provider)
        .await;

    let profile = Profile::from_json(
        r#"{
            "name": "Ada Example",
            "links": { "portfolio": "https://ada.dev" },
            "work": [{ "title": "Analyst", "location": "Remote", "date": 2023 }]
        }"#,
    )
    .unwrap();
    let service = ChatService::new(
        Arc::new(profile),
        ConfigSource::Fixed(provider_config(provider.uri(), Some("test-key"))),
    );
    let server = TestServer::new(web_server::router(service)).unwrap();

    let response = server.post("/api/chat").json(&json!({ "message": "hi" })).await;
    response.assert_json(&json!({ "reply": "ok" }));
}
