// Tenant identification and access guard over the HTTP surface

mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{test_config, TestApp, TestRequest};
use matter_api_rust::config::Environment;
use matter_api_rust::database::MemoryBackend;
use matter_api_rust::tenancy::TenantDirectory;

const TENANT_HEADER: &str = "X-Tenant-ID";

#[tokio::test]
async fn tenant_user_reaches_home_tenant_without_header() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let user = app.tenant_user("t1", "associate").await?;

    let response = app.send(TestRequest::get("/api/context").auth(&user)).await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t1");
    assert_eq!(response.data()["tenant"]["name"], "Tenant T1");
    assert_eq!(response.data()["tenant"]["logoRef"], "https://cdn.test/t1.png");

    app.send(TestRequest::get("/api/clients").auth(&user))
        .await?
        .assert_status(StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn super_admin_without_selection_is_refused() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;

    app.send(TestRequest::get("/api/clients").auth(&admin))
        .await?
        .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn super_admin_operates_in_selected_tenant() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    app.tenant("t2").await?;
    let admin = app.super_admin().await?;
    app.select_in_session(&admin, "t2").await?;

    let response = app.send(TestRequest::get("/api/context").auth(&admin)).await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t2");
    assert_eq!(response.data()["auth"]["isSuperAdmin"], true);
    Ok(())
}

#[tokio::test]
async fn header_fallback_identifies_tenant_in_testing() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t2").await?;
    let admin = app.super_admin().await?;

    assert!(app.strategy_names().contains(&"header-fallback"));

    let response = app
        .send(
            TestRequest::get("/api/context")
                .auth(&admin)
                .header(TENANT_HEADER, "t2"),
        )
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t2");
    Ok(())
}

#[tokio::test]
async fn home_tenant_wins_over_header() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    app.tenant("t2").await?;
    let user = app.tenant_user("t1", "associate").await?;

    let response = app
        .send(
            TestRequest::get("/api/context")
                .auth(&user)
                .header(TENANT_HEADER, "t2"),
        )
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t1");
    Ok(())
}

#[tokio::test]
async fn domain_of_another_tenant_is_refused() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    app.tenant("t2").await?;
    app.bind_domain("t2", "beta.example.com").await?;
    let user = app.tenant_user("t1", "tenant-admin").await?;

    app.send(
        TestRequest::get("/api/clients")
            .auth(&user)
            .host("beta.example.com"),
    )
    .await?
    .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn unknown_header_tenant_is_refused() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;

    app.send(
        TestRequest::get("/api/clients")
            .auth(&admin)
            .header(TENANT_HEADER, "does-not-exist"),
    )
    .await?
    .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn elevated_identity_follows_subdomain_and_sees_only_that_tenant() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t3").await?;
    app.tenant("t9").await?;
    app.bind_domain("t3", "gamma").await?;
    app.bind_domain("t9", "omega").await?;
    let admin = app.super_admin().await?;

    for (host, name) in [("gamma.central.test", "Gamma LLP"), ("omega.central.test", "Omega Ltd")] {
        app.send(
            TestRequest::post("/api/clients", json!({ "name": name }))
                .auth(&admin)
                .host(host),
        )
        .await?
        .assert_status(StatusCode::CREATED);
    }

    let response = app
        .send(
            TestRequest::get("/api/clients")
                .auth(&admin)
                .host("gamma.central.test:8080"),
        )
        .await?;
    response.assert_status(StatusCode::OK);

    let clients = response.data().as_array().cloned().unwrap_or_default();
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0]["name"], "Gamma LLP");
    assert_eq!(clients[0]["tenant_id"], "t3");
    Ok(())
}

#[tokio::test]
async fn pinned_selection_blocks_other_tenant_domains() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t4").await?;
    app.tenant("t5").await?;
    app.bind_domain("t4", "delta.example.com").await?;
    app.bind_domain("t5", "epsilon.example.com").await?;
    let admin = app.super_admin().await?;

    app.send(TestRequest::put("/settings/tenant-context", json!({ "tenant_id": "t4" })).auth(&admin))
        .await?
        .assert_status(StatusCode::OK);

    app.send(
        TestRequest::get("/api/clients")
            .auth(&admin)
            .host("epsilon.example.com"),
    )
    .await?
    .assert_tenant_denied();

    app.send(
        TestRequest::get("/api/clients")
            .auth(&admin)
            .host("delta.example.com"),
    )
    .await?
    .assert_status(StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn stale_selection_is_cleared_and_does_not_pin() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t3").await?;
    app.bind_domain("t3", "gamma").await?;
    let admin = app.super_admin().await?;
    app.select_in_session(&admin, "deleted-tenant").await?;

    let response = app
        .send(
            TestRequest::get("/api/context")
                .auth(&admin)
                .host("gamma.central.test"),
        )
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t3");
    assert_eq!(response.data()["tenantContext"]["activeTenantId"], json!(null));
    assert_eq!(app.session_selection(&admin).await?, None);
    Ok(())
}

#[tokio::test]
async fn selection_of_deleted_tenant_no_longer_grants_access() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;
    app.select_in_session(&admin, "t1").await?;

    app.backend.delete_tenant("t1").await?;

    app.send(TestRequest::get("/api/clients").auth(&admin))
        .await?
        .assert_tenant_denied();
    assert_eq!(app.session_selection(&admin).await?, None);
    Ok(())
}

#[tokio::test]
async fn production_ignores_tenant_header() -> Result<()> {
    let app = TestApp::in_environment(Environment::Production).await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;

    assert!(!app.strategy_names().contains(&"header-fallback"));

    app.send(
        TestRequest::get("/api/clients")
            .auth(&admin)
            .header(TENANT_HEADER, "t1"),
    )
    .await?
    .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn anonymous_request_is_refused_even_when_tenant_resolves() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;

    app.send(TestRequest::get("/api/clients").header(TENANT_HEADER, "t1"))
        .await?
        .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;

    let response = app
        .send(TestRequest::get("/api/clients").bearer("not-a-jwt"))
        .await?;
    response.assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn preflight_requests_skip_tenant_resolution() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .send(TestRequest::new(Method::OPTIONS, "/api/clients"))
        .await?;
    assert_ne!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn missing_domain_table_falls_through_to_home_tenant() -> Result<()> {
    let app = TestApp::with_config(
        test_config(Environment::Testing),
        MemoryBackend::without_domain_table(),
    )
    .await?;
    app.tenant("t1").await?;
    let user = app.tenant_user("t1", "associate").await?;

    let response = app
        .send(
            TestRequest::get("/api/context")
                .auth(&user)
                .host("anything.central.test"),
        )
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["tenant"]["id"], "t1");
    Ok(())
}

#[tokio::test]
async fn public_routes_need_no_tenant() -> Result<()> {
    let app = TestApp::new().await?;

    app.send(TestRequest::get("/")).await?.assert_status(StatusCode::OK);

    let health = app.send(TestRequest::get("/health")).await?;
    health.assert_status(StatusCode::OK);
    Ok(())
}
