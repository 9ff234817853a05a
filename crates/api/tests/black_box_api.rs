use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use uuid::Uuid;

use gestor_api::app::{build_app_with, Backend};
use gestor_auth::{Argon2Hasher, PasswordHasher, TokenConfig, TokenSigner};
use gestor_core::{TenantId, UserId};
use gestor_store::records::{CompanyRecord, MembershipRecord, ProfileRecord, UserRecord};
use gestor_store::{BreakerConfig, MemoryStore, ResilientStore, ScopedStore};

const JWT_SECRET: &str = "test-secret";
const PASSWORD: &str = "Secret123!";

struct TestServer {
    base_url: String,
    tenant_a: TenantId,
    tenant_b: TenantId,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod, ephemeral port, seeded backend:
    /// - `multi@x.com` belongs to two tenants (ADMIN in A, VIEWER in B)
    /// - `solo@x.com` belongs only to tenant A (VIEWER)
    async fn spawn() -> Self {
        let store: Arc<Backend> = Arc::new(ScopedStore::new(ResilientStore::new(
            MemoryStore::new(),
            BreakerConfig::default(),
        )));

        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let memory = store.inner().inner();

        memory.seed([
            CompanyRecord::new(tenant_a, "Empresa A"),
            CompanyRecord::new(tenant_b, "Empresa B"),
        ]);

        let admin_a = Uuid::new_v4();
        let viewer_a = Uuid::new_v4();
        let viewer_b = Uuid::new_v4();
        memory.seed([
            ProfileRecord::new(
                admin_a,
                tenant_a,
                "ADMIN",
                "Administrator",
                vec!["READ_EMPRESAS".to_string(), "READ_PERFIS".to_string()],
            ),
            ProfileRecord::new(
                viewer_a,
                tenant_a,
                "VIEWER",
                "Viewer",
                vec!["READ_PERFIS".to_string()],
            ),
            ProfileRecord::new(
                viewer_b,
                tenant_b,
                "VIEWER",
                "Viewer",
                vec!["READ_PERFIS".to_string()],
            ),
        ]);

        let hash = Argon2Hasher.hash(PASSWORD).expect("hash password");
        memory.seed([
            UserRecord::new(UserId::new(1), "multi@x.com", "Multi", hash.clone()),
            UserRecord::new(UserId::new(2), "solo@x.com", "Solo", hash),
        ]);
        memory.seed([
            MembershipRecord::new(Uuid::new_v4(), UserId::new(1), tenant_a, vec![admin_a]),
            MembershipRecord::new(Uuid::new_v4(), UserId::new(1), tenant_b, vec![viewer_b]),
            MembershipRecord::new(Uuid::new_v4(), UserId::new(2), tenant_a, vec![viewer_a]),
        ]);

        let app = build_app_with(store, JWT_SECRET.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            tenant_a,
            tenant_b,
            handle,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn login(client: &reqwest::Client, srv: &TestServer, email: &str) -> serde_json::Value {
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": email, "senha": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    res.json().await.unwrap()
}

fn access(tokens: &serde_json::Value) -> &str {
    tokens["access_token"].as_str().unwrap()
}

fn refresh_token(tokens: &serde_json::Value) -> &str {
    tokens["refresh_token"].as_str().unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "multi@x.com", "senha": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Unknown email answers identically.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .json(&json!({ "email": "ghost@x.com", "senha": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn me_reflects_the_token_snapshot() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/me", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let tokens = login(&client, &srv, "multi@x.com").await;
    let res = client
        .get(format!("{}/me", srv.base_url))
        .bearer_auth(access(&tokens))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["sub"], 1);
    assert_eq!(body["empresas"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn refresh_rotates_and_reuse_revokes_the_family() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let first = login(&client, &srv, "multi@x.com").await;

    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token(&first) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let second: serde_json::Value = res.json().await.unwrap();

    // Replaying the consumed token trips the theft response.
    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token(&first) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "suspicious_activity");

    // The legitimate successor died with the family.
    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token(&second) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_kills_the_session() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "multi@x.com").await;

    let res = client
        .post(format!("{}/auth/logout", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token(&tokens) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .post(format!("{}/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token(&tokens) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn guarded_routes_require_authentication() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/empresas", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_access_token_is_a_distinct_401() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let signer = TokenSigner::new(TokenConfig::new(JWT_SECRET));
    let stale = signer
        .sign(
            UserId::new(1),
            "multi@x.com",
            &[],
            Utc::now() - ChronoDuration::hours(1),
        )
        .unwrap();

    let res = client
        .get(format!("{}/me", srv.base_url))
        .bearer_auth(stale)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn multi_tenant_user_must_select_a_tenant() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "multi@x.com").await;

    let res = client
        .get(format!("{}/perfis", srv.base_url))
        .bearer_auth(access(&tokens))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_tenant_header");
    assert!(body["message"].as_str().unwrap().contains("x-empresa-id"));
}

#[tokio::test]
async fn tenant_header_scopes_what_the_request_sees() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "multi@x.com").await;

    for (tenant, expected_code) in [(srv.tenant_a, "ADMIN"), (srv.tenant_b, "VIEWER")] {
        let res = client
            .get(format!("{}/perfis", srv.base_url))
            .bearer_auth(access(&tokens))
            .header("x-empresa-id", tenant.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        let profiles = body.as_array().unwrap();
        assert!(
            profiles.iter().any(|p| p["codigo"] == expected_code),
            "tenant {tenant} should see {expected_code}: {profiles:?}"
        );
        // Never both tenants' profiles at once.
        assert!(profiles.len() < 3);
    }
}

#[tokio::test]
async fn even_a_single_membership_is_not_a_tenant_selector() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "solo@x.com").await;

    // An unambiguous membership still requires the explicit header.
    let res = client
        .get(format!("{}/perfis", srv.base_url))
        .bearer_auth(access(&tokens))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_tenant_header");

    // The selector check precedes the permission check: without the header
    // this is never reported as a permission mismatch, even on a route the
    // user could not access anyway.
    let res = client
        .get(format!("{}/empresas", srv.base_url))
        .bearer_auth(access(&tokens))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_tenant_header");

    // With the header the same route resolves normally.
    let res = client
        .get(format!("{}/perfis", srv.base_url))
        .bearer_auth(access(&tokens))
        .header("x-empresa-id", srv.tenant_a.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_with_a_tenant_header_keeps_the_full_snapshot() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // Clients attach the header to every request; on the unauthenticated
    // login path it must not scope the membership lookup.
    let res = client
        .post(format!("{}/auth/login", srv.base_url))
        .header("x-empresa-id", srv.tenant_a.to_string())
        .json(&json!({ "email": "multi@x.com", "senha": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let tokens: serde_json::Value = res.json().await.unwrap();

    let res = client
        .get(format!("{}/me", srv.base_url))
        .bearer_auth(access(&tokens))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["empresas"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn permission_and_tenant_denials_are_distinct() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "solo@x.com").await;

    // Right tenant, missing permission code.
    let res = client
        .get(format!("{}/empresas", srv.base_url))
        .bearer_auth(access(&tokens))
        .header("x-empresa-id", srv.tenant_a.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_permission");

    // Tenant the user does not belong to.
    let res = client
        .get(format!("{}/perfis", srv.base_url))
        .bearer_auth(access(&tokens))
        .header("x-empresa-id", srv.tenant_b.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_tenant_access");
}

#[tokio::test]
async fn malformed_tenant_header_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let tokens = login(&client, &srv, "multi@x.com").await;

    let res = client
        .get(format!("{}/perfis", srv.base_url))
        .bearer_auth(access(&tokens))
        .header("x-empresa-id", "not-a-uuid")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn request_id_is_echoed_and_generated() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/me", srv.base_url))
        .header("x-request-id", "trace-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-42");

    let res = client.get(format!("{}/me", srv.base_url)).send().await.unwrap();
    assert!(!res.headers()["x-request-id"].is_empty());
}
