mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;
use ordo::types::Role;

#[tokio::test]
async fn health_endpoints_respond() -> Result<()> {
    let app = TestApp::new();

    let res = app.request(Method::GET, "/health", None, &[]).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");
    assert_eq!(res.body["service"], "ordo");

    let res = app.call("health", json!({}), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "ok");

    let res = app.request(Method::GET, "/", None, &[]).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["name"], "Ordo");
    Ok(())
}

#[tokio::test]
async fn unknown_procedure_is_not_found() -> Result<()> {
    let app = TestApp::new();
    let res = app.call("menu.doesNotExist", json!({}), None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], true);
    assert_eq!(res.code(), "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn register_then_me_with_bearer_and_cookie() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .call(
            "auth.register",
            json!({ "email": "Ana@Example.com", "password": "s3cret-pass", "name": "Ana" }),
            None,
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.data()["user"]["email"], "ana@example.com");
    assert_eq!(res.data()["user"]["role"], "CUSTOMER");
    assert!(res.data()["user"].get("passwordHash").is_none());

    let cookie = res.set_cookie.clone().expect("session cookie");
    assert!(cookie.starts_with("ordo_session="));
    assert!(cookie.contains("HttpOnly"));

    let token = res.data()["token"].as_str().unwrap().to_string();
    let me = app.call("auth.me", json!({}), Some(&token)).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["name"], "Ana");

    let session = cookie.split(';').next().unwrap().to_string();
    let me = app
        .request(Method::POST, "/rpc/auth.me", Some(json!({})), &[("cookie", session)])
        .await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["email"], "ana@example.com");
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials() -> Result<()> {
    let app = TestApp::new();
    app.call(
        "auth.register",
        json!({ "email": "bo@example.com", "password": "correct-horse", "name": "Bo" }),
        None,
    )
    .await?;

    let res = app
        .call("auth.login", json!({ "email": "bo@example.com", "password": "wrong-horse" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "UNAUTHORIZED");

    let res = app
        .call("auth.login", json!({ "email": "nobody@example.com", "password": "correct-horse" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .call("auth.login", json!({ "email": "bo@example.com", "password": "correct-horse" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["token"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> Result<()> {
    let app = TestApp::new();
    let input = json!({ "email": "cy@example.com", "password": "password-1", "name": "Cy" });

    assert_eq!(app.call("auth.register", input.clone(), None).await?.status, StatusCode::OK);
    let res = app.call("auth.register", input, None).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.code(), "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_bad_request() -> Result<()> {
    let app = TestApp::new();

    let res = app
        .call("auth.register", json!({ "email": "dee@example.com", "password": "short", "name": "Dee" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.code(), "BAD_REQUEST");
    assert!(res.body["field_errors"]["password"].is_string());

    let res = app
        .request(
            Method::POST,
            "/rpc/auth.login",
            None,
            &[("content-type", "application/json".to_string())],
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn me_requires_a_session() -> Result<()> {
    let app = TestApp::new();

    let res = app.call("auth.me", json!({}), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app.call("auth.me", json!({}), Some("not-a-jwt")).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn bad_credentials_leave_public_procedures_anonymous() -> Result<()> {
    let app = TestApp::new();
    let item_id = app.seed_item("Pastor", "85.00").await?;
    let expired = app.expired_token_for(Role::Admin).await?;

    for token in ["not-a-jwt", expired.as_str()] {
        let res = app.call("menu.getCategories", json!({}), Some(token)).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);

        let res = app
            .call(
                "order.create",
                json!({
                    "orderType": "TAKEOUT",
                    "items": [{ "menuItemId": item_id, "quantity": 1 }],
                    "customer": { "name": "Lucia", "phone": "5512345678" },
                }),
                Some(token),
            )
            .await?;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    }

    let res = app
        .request(
            Method::POST,
            "/rpc/menu.getFullMenu",
            Some(json!({})),
            &[("cookie", "ordo_session=garbage".to_string())],
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn expired_sessions_are_rejected_by_guards() -> Result<()> {
    let app = TestApp::new();
    let expired = app.expired_token_for(Role::Admin).await?;

    let res = app.call("auth.me", json!({}), Some(&expired)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.code(), "UNAUTHORIZED");

    let res = app.call("auth.listStaff", json!({}), Some(&expired)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn staff_management_is_admin_only() -> Result<()> {
    let app = TestApp::new();
    let customer = app.token_for(Role::Customer).await?;
    let kitchen = app.token_for(Role::Kitchen).await?;
    let admin = app.token_for(Role::Admin).await?;

    assert_eq!(app.call("auth.listStaff", json!({}), None).await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.call("auth.listStaff", json!({}), Some(&customer)).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.call("auth.listStaff", json!({}), Some(&kitchen)).await?.status, StatusCode::FORBIDDEN);

    let created = app
        .call(
            "auth.createStaff",
            json!({ "email": "waiter@ordo.test", "password": "floor-staff", "name": "Wes", "role": "WAITER" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.data()["role"], "WAITER");

    let staff = app.call("auth.listStaff", json!({}), Some(&admin)).await?;
    assert_eq!(staff.status, StatusCode::OK);
    let roles: Vec<&str> = staff.data().as_array().unwrap().iter().filter_map(|u| u["role"].as_str()).collect();
    assert!(roles.contains(&"WAITER"));
    assert!(!roles.contains(&"CUSTOMER"));
    Ok(())
}

#[tokio::test]
async fn admin_cannot_deactivate_self_and_deactivated_sessions_stop_working() -> Result<()> {
    let app = TestApp::new();
    let admin_user = app.user(Role::Admin).await?;
    let admin = ordo::auth::generate_jwt(&ordo::auth::Claims::new(
        admin_user.id,
        admin_user.email.clone(),
        admin_user.role,
    ))?;

    let res = app.call("auth.deactivateStaff", json!({ "id": admin_user.id }), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);

    let cashier_user = app.user(Role::Cashier).await?;
    let cashier = ordo::auth::generate_jwt(&ordo::auth::Claims::new(
        cashier_user.id,
        cashier_user.email.clone(),
        cashier_user.role,
    ))?;
    assert_eq!(app.call("auth.me", json!({}), Some(&cashier)).await?.status, StatusCode::OK);

    let res = app.call("auth.deactivateStaff", json!({ "id": cashier_user.id }), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["isActive"], false);

    assert_eq!(app.call("auth.me", json!({}), Some(&cashier)).await?.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_cookie() -> Result<()> {
    let app = TestApp::new();
    let res = app
        .request(
            Method::POST,
            "/rpc/auth.logout",
            Some(json!({})),
            &[("cookie", "ordo_session=stale-token".to_string())],
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.set_cookie.expect("removal cookie");
    assert!(cookie.starts_with("ordo_session="));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn admin_updates_staff_but_not_their_own_role() -> Result<()> {
    let app = TestApp::new();
    let admin_user = app.user(Role::Admin).await?;
    let admin = ordo::auth::generate_jwt(&ordo::auth::Claims::new(
        admin_user.id,
        admin_user.email.clone(),
        admin_user.role,
    ))?;
    let waiter_user = app.user(Role::Waiter).await?;

    let res = app
        .call(
            "auth.updateStaff",
            json!({ "id": waiter_user.id, "role": "CASHIER", "name": "Wes Cash", "phone": "5544443333" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["role"], "CASHIER");
    assert_eq!(res.data()["name"], "Wes Cash");
    assert!(res.data().get("passwordHash").is_none());

    let res = app
        .call("auth.updateStaff", json!({ "id": admin_user.id, "role": "KITCHEN" }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);

    let res = app
        .call("auth.updateStaff", json!({ "id": admin_user.id, "name": "Head Admin" }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::OK);

    let res = app
        .call(
            "auth.updateStaff",
            json!({ "id": "00000000-0000-0000-0000-000000000000", "name": "Nobody" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}
