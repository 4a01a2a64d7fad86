//! End-to-end tests through the HTTP router
//!
//! These tests need a running PostgreSQL instance:
//!
//! ```bash
//! export DATABASE_URL=postgresql://localhost/taskboard_test
//! cargo test -p taskboard-api --test integration_test -- --ignored
//! ```

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use common::{unique_email, TestContext, TEST_JWT_SECRET};
use serde_json::json;
use taskboard_shared::{
    auth::jwt::{create_token, Claims},
    realtime::TaskEvent,
};
use tokio::sync::broadcast::error::TryRecvError;

#[tokio::test]
#[ignore]
async fn test_register_twice_conflicts() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register().await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": user.email.to_uppercase(), "password": "another-password" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_register_requires_credentials() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send("POST", "/api/auth/register", None, Some(json!({ "email": unique_email() })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");

    let (status, _) = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "secret-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_login_does_not_reveal_which_field_failed() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register_with_password("the-right-password").await;

    let (status, body) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": user.email, "password": "the-right-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user.id);
    assert!(body["token"].as_str().is_some());

    let (wrong_password, wrong_password_body) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": user.email, "password": "the-wrong-password" })),
        )
        .await;
    let (unknown_email, unknown_email_body) = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": unique_email(), "password": "the-right-password" })),
        )
        .await;

    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password_body, unknown_email_body);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_profile_returns_current_user() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register().await;

    let (status, body) = ctx.send("GET", "/api/auth/profile", Some(&user), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user.id);
    assert_eq!(body["email"], user.email);
    assert!(body.get("password_hash").is_none());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_protected_routes_reject_bad_tokens() {
    let ctx = TestContext::new().await.unwrap();
    let user = ctx.register().await;

    let (status, _) = ctx.send("GET", "/api/tenants", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = create_token(
        &Claims::new(user.id, &user.email, chrono::Duration::seconds(-30)),
        TEST_JWT_SECRET,
    )
    .unwrap();
    let foreign = create_token(
        &Claims::new(user.id, &user.email, chrono::Duration::hours(1)),
        "some-other-secret-that-is-long-enough!!",
    )
    .unwrap();

    for header in [
        format!("Bearer {expired}"),
        format!("Bearer {foreign}"),
        "Bearer not.a.jwt".to_string(),
        format!("Token {}", user.token),
    ] {
        let request = Request::builder()
            .method("GET")
            .uri("/api/tenants")
            .header("authorization", header)
            .body(Body::empty())
            .unwrap();
        let (status, body) = ctx.send_request(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_tenant_creator_becomes_admin() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;

    let (status, body) = ctx.send("GET", "/api/tenants", Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|tenant| tenant["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![tenant_id]);

    let (status, body) = ctx
        .send("GET", &format!("/api/tenants/{tenant_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, body) = ctx
        .send("POST", "/api/tenants", Some(&owner), Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Tenant name is required");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_tenant_access_checks_in_order() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let outsider = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;

    let (status, _) = ctx.send("GET", "/api/tenants/abc", Some(&owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send("GET", "/api/tenants/999999999/projects", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .send("GET", &format!("/api/tenants/{tenant_id}/projects"), Some(&outsider), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_only_admins_add_members() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let member = ctx.register().await;
    let newcomer = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;

    ctx.add_member(&owner, tenant_id, &member).await;

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/api/tenants/{tenant_id}/users"),
            Some(&member),
            Some(json!({ "email": newcomer.email })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only tenant admins can perform this action");

    let (status, _) = ctx
        .send(
            "POST",
            &format!("/api/tenants/{tenant_id}/users"),
            Some(&owner),
            Some(json!({ "email": member.email })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx
        .send(
            "POST",
            &format!("/api/tenants/{tenant_id}/users"),
            Some(&owner),
            Some(json!({ "email": unique_email() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = ctx
        .send("GET", &format!("/api/tenants/{tenant_id}/users"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = ctx
        .send("GET", &format!("/api/tenants/{tenant_id}"), Some(&member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "member");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_project_seeds_default_statuses() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, tenant_id).await;

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/api/tenants/{tenant_id}/projects/{project_id}/statuses"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let statuses = body.as_array().unwrap();
    let names: Vec<&str> = statuses.iter().map(|s| s["name"].as_str().unwrap()).collect();
    let positions: Vec<i64> = statuses.iter().map(|s| s["position"].as_i64().unwrap()).collect();
    assert_eq!(names, ["To Do", "In Progress", "Done"]);
    assert_eq!(positions, [1, 2, 3]);

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/api/tenants/{tenant_id}/projects"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_tenant_without_projects_lists_empty_array() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;

    let (status, body) = ctx
        .send(
            "GET",
            &format!("/api/tenants/{tenant_id}/projects"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_project_in_other_tenant_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let first = ctx.create_tenant(&owner).await;
    let second = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, first).await;

    let (status, _) = ctx
        .send(
            "GET",
            &format!("/api/tenants/{second}/projects/{project_id}/tasks"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_task_lifecycle_publishes_events() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, tenant_id).await;
    let base = format!("/api/tenants/{tenant_id}/projects/{project_id}");

    let (_, statuses) = ctx.send("GET", &format!("{base}/statuses"), Some(&owner), None).await;
    let todo_id = statuses[0]["id"].as_i64().unwrap();
    let done_id = statuses[2]["id"].as_i64().unwrap();

    let mut rx = ctx.hub.subscribe(project_id).await;

    // No status given: lands in the lowest-positioned column
    let (status, created) = ctx
        .send(
            "POST",
            &format!("{base}/tasks"),
            Some(&owner),
            Some(json!({ "title": "Write docs" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status_id"], todo_id);
    let task_id = created["id"].as_i64().unwrap();

    let event = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(event["event"], "taskCreated");
    assert_eq!(event["data"], created);

    let (status, listed) = ctx.send("GET", &format!("{base}/tasks"), Some(&owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], task_id);
    assert_eq!(listed[0]["status_name"], "To Do");

    let (status, updated) = ctx
        .send(
            "PUT",
            &format!("{base}/tasks/{task_id}"),
            Some(&owner),
            Some(json!({ "status_id": done_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status_id"], done_id);
    assert_eq!(updated["title"], "Write docs");

    let event = serde_json::to_value(rx.recv().await.unwrap()).unwrap();
    assert_eq!(event["event"], "taskUpdated");
    assert_eq!(event["data"], updated);

    let (status, fetched) = ctx
        .send("GET", &format!("{base}/tasks/{task_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status_name"], "Done");

    let (status, _) = ctx
        .send("DELETE", &format!("{base}/tasks/{task_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(rx.recv().await.unwrap(), TaskEvent::TaskDeleted { id: task_id });

    // Deleting again is a 404 and publishes nothing
    let (status, body) = ctx
        .send("DELETE", &format!("{base}/tasks/{task_id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_status_from_other_project_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, tenant_id).await;
    let other_project_id = ctx.create_project(&owner, tenant_id).await;
    let base = format!("/api/tenants/{tenant_id}/projects/{project_id}");

    let (_, foreign) = ctx
        .send(
            "GET",
            &format!("/api/tenants/{tenant_id}/projects/{other_project_id}/statuses"),
            Some(&owner),
            None,
        )
        .await;
    let foreign_status = foreign[0]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(
            "POST",
            &format!("{base}/tasks"),
            Some(&owner),
            Some(json!({ "title": "Misfiled", "status_id": foreign_status })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status_id for this project");

    let (_, created) = ctx
        .send(
            "POST",
            &format!("{base}/tasks"),
            Some(&owner),
            Some(json!({ "title": "Stays put" })),
        )
        .await;
    let task_id = created["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send(
            "PUT",
            &format!("{base}/tasks/{task_id}"),
            Some(&owner),
            Some(json!({ "title": "Renamed", "status_id": foreign_status })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, fetched) = ctx
        .send("GET", &format!("{base}/tasks/{task_id}"), Some(&owner), None)
        .await;
    assert_eq!(fetched["title"], "Stays put");
    assert_eq!(fetched["status_id"], created["status_id"]);

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("{base}/tasks/{task_id}"),
            Some(&owner),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_null_status_id_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, tenant_id).await;
    let base = format!("/api/tenants/{tenant_id}/projects/{project_id}");

    let (_, created) = ctx
        .send(
            "POST",
            &format!("{base}/tasks"),
            Some(&owner),
            Some(json!({ "title": "Keep my column" })),
        )
        .await;
    let task_id = created["id"].as_i64().unwrap();
    let mut events = ctx.hub.subscribe(project_id).await;

    let (status, body) = ctx
        .send(
            "PUT",
            &format!("{base}/tasks/{task_id}"),
            Some(&owner),
            Some(json!({ "title": "Moved nowhere", "status_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid status_id for this project");
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    let (_, fetched) = ctx
        .send("GET", &format!("{base}/tasks/{task_id}"), Some(&owner), None)
        .await;
    assert_eq!(fetched["title"], "Keep my column");
    assert_eq!(fetched["status_id"], created["status_id"]);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_custom_status_is_listed_by_position() {
    let ctx = TestContext::new().await.unwrap();
    let owner = ctx.register().await;
    let tenant_id = ctx.create_tenant(&owner).await;
    let project_id = ctx.create_project(&owner, tenant_id).await;
    let base = format!("/api/tenants/{tenant_id}/projects/{project_id}");

    let (status, created) = ctx
        .send(
            "POST",
            &format!("{base}/statuses"),
            Some(&owner),
            Some(json!({ "name": "Review", "color": "#0000FF", "position": 4 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["project_id"], project_id);

    let (_, statuses) = ctx.send("GET", &format!("{base}/statuses"), Some(&owner), None).await;
    let names: Vec<&str> = statuses
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["To Do", "In Progress", "Done", "Review"]);

    let (status, _) = ctx
        .send("POST", &format!("{base}/statuses"), Some(&owner), Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_unknown_route_returns_json_404() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/api/does-not-exist", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not_found", "message": "Resource not found" }));
}

#[tokio::test]
#[ignore]
async fn test_health_reports_database() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
