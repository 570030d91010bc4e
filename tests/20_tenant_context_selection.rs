// Super-admin tenant context selection (/settings/tenant-context)

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, TestRequest};

const SETTINGS: &str = "/settings/tenant-context";

#[tokio::test]
async fn super_admin_sees_every_tenant_by_name() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("zz").await?;
    app.tenant("aa").await?;
    let admin = app.super_admin().await?;

    let response = app.send(TestRequest::get(SETTINGS).auth(&admin)).await?;
    response.assert_status(StatusCode::OK);

    let data = response.data();
    let names: Vec<&str> = data["tenants"]
        .as_array()
        .map(|tenants| tenants.iter().filter_map(|t| t["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, vec!["Tenant AA", "Tenant ZZ"]);
    assert_eq!(data["activeTenantId"], json!(null));
    assert_eq!(data["tenantContext"]["canSelect"], true);
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_use_the_selector() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let tenant_admin = app.tenant_user("t1", "tenant-admin").await?;

    app.send(TestRequest::get(SETTINGS).auth(&tenant_admin))
        .await?
        .assert_status(StatusCode::FORBIDDEN);

    app.send(TestRequest::put(SETTINGS, json!({ "tenant_id": "t1" })).auth(&tenant_admin))
        .await?
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(app.session_selection(&tenant_admin).await?, None);

    app.send(TestRequest::delete(SETTINGS).auth(&tenant_admin))
        .await?
        .assert_status(StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn selector_requires_authentication() -> Result<()> {
    let app = TestApp::new().await?;

    app.send(TestRequest::get(SETTINGS))
        .await?
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn selection_is_stored_and_opens_tenant_routes() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    app.tenant("t2").await?;
    let admin = app.super_admin().await?;

    let response = app
        .send(TestRequest::put(SETTINGS, json!({ "tenant_id": "t2" })).auth(&admin))
        .await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["activeTenantId"], "t2");
    assert_eq!(response.data()["tenantContext"]["activeTenant"]["name"], "Tenant T2");
    assert_eq!(app.session_selection(&admin).await?.as_deref(), Some("t2"));

    let context = app.send(TestRequest::get("/api/context").auth(&admin)).await?;
    context.assert_status(StatusCode::OK);
    assert_eq!(context.data()["tenant"]["id"], "t2");
    assert_eq!(context.data()["tenantContext"]["activeTenantId"], "t2");
    Ok(())
}

#[tokio::test]
async fn clearing_selection_removes_tenant_access() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;
    app.select_in_session(&admin, "t1").await?;

    app.send(TestRequest::get("/api/clients").auth(&admin))
        .await?
        .assert_status(StatusCode::OK);

    let response = app.send(TestRequest::delete(SETTINGS).auth(&admin)).await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["activeTenantId"], json!(null));
    assert_eq!(app.session_selection(&admin).await?, None);

    app.send(TestRequest::get("/api/clients").auth(&admin))
        .await?
        .assert_tenant_denied();
    Ok(())
}

#[tokio::test]
async fn invalid_selections_report_the_failing_rule() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;

    let cases = [
        (json!({}), "Select a tenant before saving your context."),
        (json!({ "tenant_id": null }), "Select a tenant before saving your context."),
        (json!({ "tenant_id": "" }), "Select a tenant before saving your context."),
        (json!({ "tenant_id": 42 }), "The tenant id field must be a string."),
        (json!({ "tenant_id": "gone" }), "The selected tenant is no longer available."),
    ];

    for (body, message) in cases {
        let response = app.send(TestRequest::put(SETTINGS, body.clone()).auth(&admin)).await?;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "body: {}", body);
        assert_eq!(response.body["field_errors"]["tenant_id"], message, "body: {}", body);
    }

    assert_eq!(app.session_selection(&admin).await?, None);
    Ok(())
}

#[tokio::test]
async fn stale_selection_is_cleared_when_viewed() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;
    app.select_in_session(&admin, "deleted-tenant").await?;

    let response = app.send(TestRequest::get(SETTINGS).auth(&admin)).await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.data()["activeTenantId"], json!(null));
    assert_eq!(response.data()["tenantContext"]["activeTenant"], json!(null));
    assert_eq!(app.session_selection(&admin).await?, None);
    Ok(())
}

#[tokio::test]
async fn shared_state_is_empty_for_tenant_users() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let user = app.tenant_user("t1", "partner").await?;

    let response = app.send(TestRequest::get("/api/context").auth(&user)).await?;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.data()["tenantContext"],
        json!({ "canSelect": false, "activeTenantId": null, "activeTenant": null })
    );
    assert_eq!(response.data()["auth"]["isSuperAdmin"], false);
    assert_eq!(response.data()["auth"]["roles"], json!(["partner"]));
    Ok(())
}

#[tokio::test]
async fn selections_are_per_session() -> Result<()> {
    let app = TestApp::new().await?;
    app.tenant("t1").await?;
    let admin = app.super_admin().await?;
    let second_browser = app.login(admin.user.clone())?;

    app.send(TestRequest::put(SETTINGS, json!({ "tenant_id": "t1" })).auth(&admin))
        .await?
        .assert_status(StatusCode::OK);

    assert_eq!(app.session_selection(&second_browser).await?, None);
    app.send(TestRequest::get("/api/clients").auth(&second_browser))
        .await?
        .assert_tenant_denied();
    Ok(())
}
