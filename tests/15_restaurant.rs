mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{dec, TestApp, MONDAY};
use ordo::types::Role;

#[tokio::test]
async fn config_lookups_are_public() -> Result<()> {
    let app = TestApp::new();

    let res = app.call("restaurant.getConfig", json!({}), None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), "NOT_FOUND");

    let closed = app.call("restaurant.isOpen", json!({}), None).await?;
    assert_eq!(closed.status, StatusCode::OK);
    assert_eq!(closed.data()["isOpen"], false);
    assert!(closed.data()["today"].is_null());

    app.seed_default_restaurant().await?;

    let config = app.call("restaurant.getConfig", json!({}), None).await?;
    assert_eq!(config.status, StatusCode::OK);
    assert_eq!(config.data()["slug"], "casa-ordo");
    assert_eq!(config.data()["isActive"], true);
    assert_eq!(config.data()["openingHours"]["sunday"]["is_closed"], true);

    let by_slug = app.call("restaurant.getBySlug", json!({ "slug": "casa-ordo" }), None).await?;
    assert_eq!(by_slug.status, StatusCode::OK);
    assert_eq!(by_slug.data()["name"], "Casa Ordo");

    let missing = app.call("restaurant.getBySlug", json!({ "slug": "elsewhere" }), None).await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let open = app.call("restaurant.isOpen", json!({}), None).await?;
    assert_eq!(open.status, StatusCode::OK);
    assert!(open.data()["isOpen"].is_boolean());
    assert_eq!(open.data()["today"]["open"], "09:00");
    Ok(())
}

#[tokio::test]
async fn only_one_active_config() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let first = app.seed_default_restaurant().await?;

    let mut second = json!({
        "slug": "second-site",
        "name": "Second",
        "openingHours": first["openingHours"],
        "services": first["services"],
        "deliveryConfig": first["deliveryConfig"],
    });
    let res = app.call("restaurant.create", second.clone(), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);

    second["slug"] = json!("Not A Slug");
    let res = app.call("restaurant.create", second, Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["slug"].is_string());
    Ok(())
}

#[tokio::test]
async fn admin_updates_config() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let waiter = app.token_for(Role::Waiter).await?;
    let config = app.seed_default_restaurant().await?;

    let input = json!({ "id": config["id"], "name": "Casa Ordo Centro", "phone": "5550001111" });
    let res = app.call("restaurant.update", input.clone(), Some(&waiter)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.call("restaurant.update", input, Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["name"], "Casa Ordo Centro");
    assert_eq!(res.data()["phone"], "5550001111");
    assert_eq!(res.data()["slug"], "casa-ordo");

    let res = app
        .call(
            "restaurant.update",
            json!({ "id": "00000000-0000-0000-0000-000000000000", "name": "Ghost" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn tables_are_managed_by_admin_and_listed_for_staff() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let waiter = app.token_for(Role::Waiter).await?;
    let customer = app.token_for(Role::Customer).await?;

    let table = app
        .call("restaurant.createTable", json!({ "label": "T1", "seats": 4 }), Some(&admin))
        .await?;
    assert_eq!(table.status, StatusCode::OK, "{}", table.body);
    assert_eq!(table.data()["isActive"], true);

    let duplicate = app
        .call("restaurant.createTable", json!({ "label": "T1", "seats": 2 }), Some(&admin))
        .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let no_seats = app
        .call("restaurant.createTable", json!({ "label": "T2", "seats": 0 }), Some(&admin))
        .await?;
    assert_eq!(no_seats.status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.call("restaurant.listTables", json!({}), Some(&customer)).await?.status,
        StatusCode::FORBIDDEN
    );

    let updated = app
        .call(
            "restaurant.updateTable",
            json!({ "id": table.data()["id"], "seats": 6, "isActive": false }),
            Some(&admin),
        )
        .await?;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.data()["seats"], 6);
    assert_eq!(updated.data()["isActive"], false);

    let listed = app.call("restaurant.listTables", json!({}), Some(&waiter)).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.data().as_array().map(Vec::len), Some(1));
    assert_eq!(listed.data()[0]["label"], "T1");

    let ghost = app
        .call(
            "restaurant.updateTable",
            json!({ "id": "00000000-0000-0000-0000-000000000000", "seats": 2 }),
            Some(&admin),
        )
        .await?;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn dashboard_stats_count_todays_activity() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    app.seed_default_restaurant().await?;
    let item_id = app.seed_item("Pastor", "85.00").await?;

    let order = app
        .call(
            "order.create",
            json!({
                "orderType": "TAKEOUT",
                "items": [{ "menuItemId": item_id, "quantity": 2 }],
                "customer": { "name": "Lucia", "phone": "5512345678" },
            }),
            None,
        )
        .await?;
    assert_eq!(order.status, StatusCode::OK, "{}", order.body);

    let booking = app
        .call(
            "reservation.create",
            json!({ "name": "Elena", "phone": "5511112222", "date": MONDAY, "time": "19:00", "partySize": 2 }),
            None,
        )
        .await?;
    assert_eq!(booking.status, StatusCode::OK, "{}", booking.body);

    let stats = app.call("restaurant.getStats", json!({}), Some(&admin)).await?;
    assert_eq!(stats.status, StatusCode::OK, "{}", stats.body);
    let data = stats.data();
    assert_eq!(data["todayOrders"], 1);
    assert_eq!(dec(&data["todayRevenue"]), dec(&json!("197.2")));
    assert_eq!(data["activeOrders"], 1);
    assert_eq!(data["todayReservations"], 0);
    assert_eq!(data["upcomingReservations"], 1);
    assert_eq!(data["menuItems"], 1);
    assert_eq!(data["customers"], 2);
    Ok(())
}
