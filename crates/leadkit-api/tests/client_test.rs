#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadkit_api::types::{CreateWebsiteBody, DetectFormsBody, LoginRequest};
use leadkit_api::{Anonymous, ApiClient, Error, LeadQuery, StaticToken, TokenSource};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(
        &server.uri(),
        reqwest::Client::new(),
        Arc::new(StaticToken(SecretString::from("tok-123"))),
    )
    .unwrap();
    (server, client)
}

/// Token source whose value can change between requests.
#[derive(Default)]
struct SwitchableToken(Mutex<Option<String>>);

impl TokenSource for SwitchableToken {
    fn bearer_token(&self) -> Option<SecretString> {
        self.0.lock().unwrap().clone().map(SecretString::from)
    }
}

// ── Auth header ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_attached() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client.list_websites().await.unwrap();
    assert!(sites.websites.is_empty());
}

#[tokio::test]
async fn test_anonymous_request_has_no_auth_header() {
    let server = MockServer::start().await;
    let client =
        ApiClient::from_reqwest(&server.uri(), reqwest::Client::new(), Arc::new(Anonymous))
            .unwrap();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh",
            "user": { "id": "u1", "email": "a@b.co" }
        })))
        .mount(&server)
        .await;

    let resp = client
        .login(&LoginRequest {
            email: "a@b.co".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();
    assert_eq!(resp.token, "fresh");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_token_read_per_request() {
    let server = MockServer::start().await;
    let tokens = Arc::new(SwitchableToken::default());
    let client =
        ApiClient::from_reqwest(&server.uri(), reqwest::Client::new(), tokens.clone()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .mount(&server)
        .await;

    client.list_websites().await.unwrap();
    *tokens.0.lock().unwrap() = Some("second".into());
    client.list_websites().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(
        requests[1].headers.get("authorization").unwrap(),
        "Bearer second"
    );
}

// ── Error classification ────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_uses_server_message() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/websites"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid URL format" })),
        )
        .mount(&server)
        .await;

    let result = client
        .create_website(&CreateWebsiteBody {
            url: "nope".into(),
            name: None,
        })
        .await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid URL format");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_api_error_falls_back_to_message_field() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/forms/f9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Form not found" })),
        )
        .mount(&server)
        .await;

    let err = client.delete_form("f9").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Form not found"));
}

#[tokio::test]
async fn test_unauthorized_is_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/leads"))
        .respond_with(ResponseTemplate::new(401).set_body_string(""))
        .mount(&server)
        .await;

    let err = client.list_leads(&LeadQuery::default()).await.unwrap_err();
    assert!(err.is_auth_failure());
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_websites().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_detect_forms_sends_camel_case_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .and(body_json(json!({ "websiteId": "w1", "url": "https://x.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forms": [
                { "url": "https://x.com/contact", "fields": [
                    { "name": "email", "type": "email", "required": true }
                ]}
            ]
        })))
        .mount(&server)
        .await;

    let detected = client
        .detect_forms(&DetectFormsBody {
            website_id: "w1".into(),
            url: "https://x.com".into(),
        })
        .await
        .unwrap();

    assert_eq!(detected.forms.len(), 1);
    assert_eq!(detected.forms[0].fields[0].name, "email");
}

#[tokio::test]
async fn test_list_leads_passes_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/leads"))
        .and(query_param("formId", "f1"))
        .and(query_param("startDate", "2024-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "leads": [{
                "id": "l1",
                "formId": "f1",
                "data": { "email": "x@y.z" },
                "createdAt": "2024-06-02T10:00:00.000Z"
            }]
        })))
        .mount(&server)
        .await;

    let leads = client
        .list_leads(&LeadQuery {
            form_id: Some("f1".into()),
            start_date: Some("2024-06-01".into()),
            end_date: None,
        })
        .await
        .unwrap();

    assert_eq!(leads.leads.len(), 1);
    assert_eq!(leads.leads[0].data["email"], "x@y.z");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].url.query().unwrap_or("").contains("endDate"));
}

#[tokio::test]
async fn test_leads_per_day_sends_days() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/analytics/leads-per-day"))
        .and(query_param("days", "30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "date": "2024-06-01", "count": 3 },
                { "date": "2024-06-02", "count": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let per_day = client.leads_per_day(30).await.unwrap();
    assert_eq!(per_day.data.len(), 2);
    assert_eq!(per_day.data[0].count, 3);
}

#[tokio::test]
async fn test_get_snippet() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/forms/f1/snippet"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "snippet": "<script></script>" })),
        )
        .mount(&server)
        .await;

    let snippet = client.get_snippet("f1").await.unwrap();
    assert_eq!(snippet.snippet, "<script></script>");
}
