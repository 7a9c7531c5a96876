#![allow(clippy::unwrap_used)]
// End-to-end behaviour of the dashboard core against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use leadkit_core::{
    CacheKey, CoreError, Dashboard, DashboardConfig, DetectionState, EntityId, LeadFilter,
    MemoryStorage, Mutation, MutationKind, SessionStore, WebsiteDraft, WebsiteFormState,
    WorkflowError,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let config = DashboardConfig::from_url(&server.uri()).unwrap();
    let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
    let dashboard = Dashboard::new(config, session).unwrap();
    (server, dashboard)
}

async fn logged_in() -> (MockServer, Dashboard) {
    let (server, dashboard) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-abc",
            "user": { "id": "u1", "email": "ada@example.com", "name": "Ada" }
        })))
        .mount(&server)
        .await;

    dashboard
        .login("ada@example.com", &SecretString::from("hunter2"))
        .await
        .unwrap();
    (server, dashboard)
}

fn detected_forms() -> serde_json::Value {
    json!({
        "forms": [
            {
                "url": "https://x.com/contact",
                "fields": [
                    { "name": "email", "type": "email", "label": "Email", "required": true },
                    { "name": "message", "type": "textarea", "required": false }
                ]
            },
            {
                "url": "https://x.com/contact",
                "fields": [ { "name": "q", "type": "search", "required": false } ]
            }
        ]
    })
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_sets_credential_and_authorizes_reads() {
    let (server, dashboard) = logged_in().await;

    assert!(dashboard.is_authenticated());
    assert_eq!(dashboard.current_user().unwrap().email, "ada@example.com");

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .and(header("authorization", "Bearer tok-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "websites": [{ "id": "w1", "url": "https://x.com", "forms": [] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = dashboard.websites().await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].id, EntityId::from("w1"));
}

#[tokio::test]
async fn test_auth_failure_does_not_clear_session() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid token" })))
        .mount(&server)
        .await;

    let err = dashboard.websites().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(dashboard.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_and_cache() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .mount(&server)
        .await;

    dashboard.websites().await.unwrap();
    assert!(!dashboard.cache().is_empty());

    dashboard.logout().unwrap();
    assert!(!dashboard.is_authenticated());
    assert!(dashboard.cache().is_empty());
    assert!(dashboard.require_session().is_err());
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_leads_is_not_an_error() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/leads"))
        .and(query_param("formId", "f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "leads": [] })))
        .mount(&server)
        .await;

    let leads = dashboard.leads(&LeadFilter::for_form("f1")).await.unwrap();
    assert!(leads.is_empty());
}

#[tokio::test]
async fn test_concurrent_analytics_reads_share_one_fetch() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/analytics/leads-per-day"))
        .and(query_param("days", "30"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [ { "date": "2024-06-01", "count": 5 } ] }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let other_view = dashboard.clone();
    let (a, b) = tokio::join!(dashboard.leads_per_day(30), other_view.leads_per_day(30));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a[0].count, 5);
}

#[tokio::test]
async fn test_website_lookup_uses_cached_list() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "websites": [
                { "id": "w1", "url": "https://x.com",
                  "forms": [{ "id": "f1", "name": "Contact", "url": "https://x.com/c" }] },
                { "id": "w2", "url": "https://y.com", "name": "Y",
                  "forms": [{ "id": "f2", "name": "Signup", "url": "https://y.com/s" }] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let site = dashboard.website(&"w2".into()).await.unwrap().unwrap();
    assert_eq!(site.display_name(), "Y");
    assert!(dashboard.website(&"nope".into()).await.unwrap().is_none());

    let forms = dashboard.all_forms().await.unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[1].website_id, EntityId::from("w2"));
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_mutation_leaves_cache_untouched() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid URL" })))
        .mount(&server)
        .await;

    dashboard.websites().await.unwrap();
    let version = dashboard.cache().version();

    let err = dashboard
        .execute(Mutation::CreateWebsite {
            url: "https://x.com".into(),
            name: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Invalid URL");
    assert_eq!(dashboard.cache().version(), version);
    assert!(dashboard.cache().is_fresh(&CacheKey::websites()));
    dashboard.websites().await.unwrap();
}

#[tokio::test]
async fn test_successful_mutation_invalidates_before_returning() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "websites": [] })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/websites/w1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    dashboard.websites().await.unwrap();
    dashboard
        .execute(Mutation::DeleteWebsite { id: "w1".into() })
        .await
        .unwrap();

    assert!(!dashboard.cache().is_fresh(&CacheKey::websites()));
    let stale = dashboard
        .cache()
        .peek::<Vec<leadkit_core::Website>>(&CacheKey::websites())
        .unwrap();
    assert!(stale.stale);

    dashboard.websites().await.unwrap();
}

#[tokio::test]
async fn test_pending_flag_tracks_in_flight_mutation() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/websites"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "id": "w9", "url": "https://z.com" }))
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let worker = dashboard.clone();
    let handle = tokio::spawn(async move {
        worker
            .execute(Mutation::CreateWebsite {
                url: "https://z.com".into(),
                name: Some(String::new()),
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(dashboard.is_pending(MutationKind::CreateWebsite));
    assert!(!dashboard.is_pending(MutationKind::DeleteForm));

    handle.await.unwrap().unwrap();
    assert!(!dashboard.is_pending(MutationKind::CreateWebsite));

    let requests = server.received_requests().await.unwrap();
    let create = requests.iter().find(|r| r.url.path() == "/api/websites").unwrap();
    let body: serde_json::Value = serde_json::from_slice(&create.body).unwrap();
    assert!(body.get("name").is_none());
}

// ── Detection workflow ──────────────────────────────────────────────

#[tokio::test]
async fn test_detect_promote_refreshes_forms_and_keeps_other_candidate() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("GET"))
        .and(path("/api/forms/website/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "forms": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/forms/website/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "forms": [{
                "id": "f1", "websiteId": "w1", "name": "Form 1", "url": "https://x.com/contact",
                "fields": [
                    { "id": "fld1", "name": "email", "type": "email", "label": "Email", "required": true },
                    { "id": "fld2", "name": "message", "type": "textarea", "required": false }
                ],
                "_count": { "leads": 0 }
            }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .and(body_partial_json(json!({ "websiteId": "w1", "url": "https://x.com/contact" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(detected_forms()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .and(body_partial_json(json!({ "websiteId": "w1", "name": "Form 1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "f1", "websiteId": "w1", "name": "Form 1", "url": "https://x.com/contact",
            "fields": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let website = EntityId::from("w1");
    assert!(dashboard.forms(&website).await.unwrap().is_empty());

    let workflow = dashboard.detection(website.clone());
    let candidates = workflow.scan("https://x.com/contact").await.unwrap();
    assert_eq!(candidates.len(), 2);

    let (first, second) = (candidates[0].id, candidates[1].id);
    let form = workflow.promote(first, None).await.unwrap();
    assert_eq!(form.name, "Form 1");
    assert!(!dashboard.cache().is_fresh(&CacheKey::forms(&website)));

    let forms = dashboard.forms(&website).await.unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0].fields.len(), 2);
    assert_eq!(forms[0].fields[0].name, "email");

    match workflow.state() {
        DetectionState::Reviewing { candidates, .. } => {
            assert_eq!(candidates.len(), 1);
            assert_eq!(candidates[0].id, second);
            assert_eq!(candidates[0].position, 2);
        }
        other => panic!("expected Reviewing, got {other:?}"),
    }

    let again = workflow.promote(first, None).await.unwrap_err();
    assert_eq!(
        again,
        CoreError::Workflow(WorkflowError::UnknownCandidate { id: first.get() })
    );
}

#[tokio::test]
async fn test_failed_promotion_keeps_candidate() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detected_forms()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db down" })))
        .mount(&server)
        .await;

    let workflow = dashboard.detection("w1".into());
    let candidates = workflow.scan("https://x.com/contact").await.unwrap();

    let err = workflow
        .promote(candidates[1].id, Some("Search".into()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(workflow.candidates().len(), 2);
    assert_eq!(workflow.last_error(), Some(err));
    assert!(!workflow.is_busy());
}

#[tokio::test]
async fn test_failed_scan_returns_to_idle() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(json!({ "error": "Could not fetch page" })),
        )
        .mount(&server)
        .await;

    let workflow = dashboard.detection("w1".into());
    let err = workflow.scan("https://x.com/contact").await.unwrap_err();

    assert_eq!(err.user_message(), "Could not fetch page");
    assert_eq!(workflow.state(), DetectionState::Idle);
    assert!(workflow.candidates().is_empty());
}

#[tokio::test]
async fn test_close_discards_late_scan_and_workflow_restarts() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(detected_forms())
                .set_delay(Duration::from_millis(150)),
        )
        .mount(&server)
        .await;

    let workflow = dashboard.detection("w1".into());
    let scanning = {
        let workflow = workflow.clone();
        tokio::spawn(async move { workflow.scan("https://x.com/contact").await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(workflow.is_busy());
    workflow.close();

    let late = scanning.await.unwrap();
    assert_eq!(late.unwrap_err(), CoreError::Workflow(WorkflowError::Superseded));
    assert_eq!(workflow.state(), DetectionState::Closed);
    assert!(workflow.candidates().is_empty());

    let fresh = workflow.scan("https://x.com/contact").await.unwrap();
    assert_eq!(fresh.len(), 2);
    assert!(matches!(workflow.state(), DetectionState::Reviewing { .. }));
}

#[tokio::test]
async fn test_second_promotion_is_rejected_and_close_keeps_saved_form() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/forms/detect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detected_forms()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/forms"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({
                    "id": "f1", "websiteId": "w1", "name": "Form 1",
                    "url": "https://x.com/contact", "fields": []
                }))
                .set_delay(Duration::from_millis(150)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let workflow = dashboard.detection("w1".into());
    let candidates = workflow.scan("https://x.com/contact").await.unwrap();
    let (first, second) = (candidates[0].id, candidates[1].id);

    let promoting = {
        let workflow = workflow.clone();
        tokio::spawn(async move { workflow.promote(first, None).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(workflow.state(), DetectionState::Promoting { .. }));
    assert!(dashboard.is_pending(MutationKind::CreateForm));

    let err = workflow.promote(second, None).await.unwrap_err();
    assert_eq!(
        err,
        CoreError::Workflow(WorkflowError::PromotionInProgress { id: first.get() })
    );

    workflow.close();

    let form = promoting.await.unwrap().unwrap();
    assert_eq!(form.id, EntityId::from("f1"));
    assert_eq!(workflow.state(), DetectionState::Closed);
    assert!(workflow.candidates().is_empty());
    assert!(!dashboard.is_pending(MutationKind::CreateForm));
}

#[tokio::test]
async fn test_promote_requires_reviewing_state() {
    let (_server, dashboard) = logged_in().await;

    let workflow = dashboard.detection("w1".into());
    let err = workflow.promote(1.into(), None).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Workflow(WorkflowError::InvalidState { state: "idle", .. })
    ));
}

// ── Website creation workflow ───────────────────────────────────────

#[tokio::test]
async fn test_website_form_validation_and_server_errors() {
    let (server, dashboard) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/websites"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Website already exists" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/websites"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "w2", "url": "https://shop.example.com", "name": "Shop"
        })))
        .mount(&server)
        .await;

    let form = dashboard.website_form();
    form.open();

    form.edit(WebsiteDraft {
        url: "shop.example.com".into(),
        name: "Shop".into(),
    })
    .unwrap();
    let err = form.submit().await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/api/websites"));

    form.edit(WebsiteDraft {
        url: "https://shop.example.com".into(),
        name: "Shop".into(),
    })
    .unwrap();
    form.submit().await.unwrap_err();
    match form.state() {
        WebsiteFormState::Editing { draft, error } => {
            assert_eq!(draft.url, "https://shop.example.com");
            assert_eq!(error.as_deref(), Some("Website already exists"));
        }
        other => panic!("expected Editing, got {other:?}"),
    }

    let site = form.submit().await.unwrap();
    assert_eq!(site.display_name(), "Shop");
    assert_eq!(form.state(), WebsiteFormState::Closed);
}
