//! Integration tests for the gate HTTP API.
//!
//! Spins up the real router on an ephemeral port and drives it with a
//! plain HTTP client, seeding the store directly where a scenario needs
//! existing codes or participants.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::Duration;
use gatekeeper_server::{build_router, AdminSessions, AppState};
use gatekeeper_ticketing::providers::{CodeStore, ParticipantStore};
use gatekeeper_ticketing::{
    generate_token, CodeRecord, ParticipantUpsert, ScanLog, SqliteStore, VerificationEngine,
};
use serde_json::{json, Value};

const ADMIN_PASSWORD: &str = "integration-password";

struct TestApp {
    base_url: String,
    store: SqliteStore,
    client: reqwest::Client,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn login(&self) -> String {
        let response = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&json!({ "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

async fn spawn_app() -> TestApp {
    let suffix = generate_token(8);
    let db_path = std::env::temp_dir().join(format!("gatekeeper-http-{suffix}.db"));
    let log_path = std::env::temp_dir().join(format!("gatekeeper-http-{suffix}.log"));

    let store = SqliteStore::new(&db_path).await.unwrap();
    let scan_log = ScanLog::new(log_path);
    let engine = VerificationEngine::new(store.clone(), scan_log.clone());
    let sessions = AdminSessions::new(ADMIN_PASSWORD.to_string(), Duration::minutes(60));
    let app = build_router(AppState::new(engine, store.clone(), sessions, scan_log));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{addr}"),
        store,
        client: reqwest::Client::new(),
    }
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = spawn_app().await;

    let health = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let ready = app.client.get(app.url("/ready")).send().await.unwrap();
    assert_eq!(ready.status(), 200);
    let body: Value = ready.json().await.unwrap();
    assert_eq!(body["ready"], true);
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn test_scan_without_token_is_still_200() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/scan")).send().await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "No QR code supplied.");
    assert_eq!(body["code"], "(empty)");
    assert_eq!(body["timestamp"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn test_scan_admits_once_then_rejects() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("GATETESTTOKEN1".to_string()))
        .await
        .unwrap();

    // First scan admits
    let body = app.get_json("/scan?token=GATETESTTOKEN1").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Ticket valid. Welcome!");
    assert_eq!(body["code"], "GATETESTTOKEN1");

    // Second scan inside the reuse window rejects
    let body = app.get_json("/scan?token=GATETESTTOKEN1").await;
    assert_eq!(body["status"], "used");
    assert_eq!(
        body["message"],
        "Code already used within the last 24 hours."
    );
}

#[tokio::test]
async fn test_scan_unknown_token() {
    let app = spawn_app().await;

    let body = app.get_json("/scan?token=NEVERMINTED").await;
    assert_eq!(body["status"], "invalid");
    assert_eq!(body["message"], "Code not found.");
}

#[tokio::test]
async fn test_scan_accepts_legacy_id_parameter() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("LEGACYTOKEN01".to_string()))
        .await
        .unwrap();

    // Old QR batches encode ?id=; an empty token parameter also falls
    // through to it.
    let body = app.get_json("/scan?token=&id=LEGACYTOKEN01").await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["code"], "LEGACYTOKEN01");
}

#[tokio::test]
async fn test_ticket_lookup_normalizes_code() {
    let app = spawn_app().await;
    app.store
        .upsert_participant(&ParticipantUpsert {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            status: "PAID".to_string(),
            code: Some("TICKETCODE42".to_string()),
            sent_at: Some("2025-02-20 09:15:00".to_string()),
            ..ParticipantUpsert::default()
        })
        .await
        .unwrap();

    // Lowercase with stray whitespace still resolves
    let response = app
        .client
        .get(app.url("/api/tickets/%20ticketcode42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TICKETCODE42");
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["status"], "PAID");
    assert_eq!(body["sent_at"], "2025-02-20 09:15:00");
}

#[tokio::test]
async fn test_ticket_lookup_unknown_is_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/tickets/UNKNOWN99"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["message"], "Ticket UNKNOWN99 not found");
}

#[tokio::test]
async fn test_admin_login_rejects_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/admin/login"))
        .json(&json!({ "password": "letmein" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_admin_stats_requires_bearer() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth("bogus-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_admin_stats_counts_and_scan_feed() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("STATSTOKEN001".to_string()))
        .await
        .unwrap();
    app.store
        .create(&CodeRecord::fresh("STATSTOKEN002".to_string()))
        .await
        .unwrap();

    // One admission plus one rejected attempt to populate the feed
    app.get_json("/scan?token=STATSTOKEN001").await;
    app.get_json("/scan?token=NEVERMINTED").await;

    let token = app.login().await;
    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["valid"], 2);
    assert_eq!(body["used"], 1);
    assert_eq!(body["unused"], 1);

    let feed = body["recent_scans"].as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert!(feed[0].as_str().unwrap().contains("STATSTOKEN001 - ok"));
    assert!(feed[1].as_str().unwrap().contains("NEVERMINTED - invalid"));
}

#[tokio::test]
async fn test_admin_logout_ends_session() {
    let app = spawn_app().await;
    let token = app.login().await;

    let response = app
        .client
        .post(app.url("/api/admin/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(app.url("/api/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_admin_reset_all_readmits_used_code() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("RESETTOKEN001".to_string()))
        .await
        .unwrap();

    let body = app.get_json("/scan?token=RESETTOKEN001").await;
    assert_eq!(body["status"], "ok");
    let body = app.get_json("/scan?token=RESETTOKEN001").await;
    assert_eq!(body["status"], "used");

    let token = app.login().await;
    let response = app
        .client
        .post(app.url("/api/admin/reset?mode=all"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "All codes have been reset.");
    assert_eq!(body["affected"], 1);

    // The gate admits the code again
    let body = app.get_json("/scan?token=RESETTOKEN001").await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_admin_reset_default_mode_spares_recent_use() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("FRESHUSE00001".to_string()))
        .await
        .unwrap();
    app.get_json("/scan?token=FRESHUSE00001").await;

    let token = app.login().await;
    let response = app
        .client
        .post(app.url("/api/admin/reset"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Used minutes ago, well inside the window: nothing to clear
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Codes used more than 24 hours ago have been reset."
    );
    assert_eq!(body["affected"], 0);

    let body = app.get_json("/scan?token=FRESHUSE00001").await;
    assert_eq!(body["status"], "used");
}

#[tokio::test]
async fn test_admin_delete_valid_purges_codes() {
    let app = spawn_app().await;
    app.store
        .create(&CodeRecord::fresh("PURGETOKEN001".to_string()))
        .await
        .unwrap();
    app.store
        .create(&CodeRecord::fresh("PURGETOKEN002".to_string()))
        .await
        .unwrap();

    let token = app.login().await;
    let response = app
        .client
        .post(app.url("/api/admin/delete-valid"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["deleted"], 2);
    assert_eq!(
        body["message"],
        "Deleted 2 valid tickets from the database."
    );

    // Purged codes no longer admit
    let body = app.get_json("/scan?token=PURGETOKEN001").await;
    assert_eq!(body["status"], "invalid");
}
