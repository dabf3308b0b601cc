mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{dec, TestApp};
use ordo::types::Role;

#[tokio::test]
async fn menu_reads_are_public() -> Result<()> {
    let app = TestApp::new();
    let item_id = app.seed_item("Pastor", "85.00").await?;

    let menu = app.call("menu.getFullMenu", json!({}), None).await?;
    assert_eq!(menu.status, StatusCode::OK);
    let categories = menu.data().as_array().unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["items"][0]["name"], "Pastor");
    assert_eq!(dec(&categories[0]["items"][0]["price"]), dec(&json!("85")));

    let item = app.call("menu.getItem", json!({ "id": item_id }), None).await?;
    assert_eq!(item.status, StatusCode::OK);
    assert_eq!(item.data()["modifiers"], json!([]));

    let missing = app
        .call("menu.getItem", json!({ "id": "00000000-0000-0000-0000-000000000000" }), None)
        .await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn menu_mutations_need_admin() -> Result<()> {
    let app = TestApp::new();
    let kitchen = app.token_for(Role::Kitchen).await?;
    let customer = app.token_for(Role::Customer).await?;

    let input = json!({ "name": "Drinks" });
    assert_eq!(app.call("menu.createCategory", input.clone(), None).await?.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.call("menu.createCategory", input.clone(), Some(&customer)).await?.status, StatusCode::FORBIDDEN);
    assert_eq!(app.call("menu.createCategory", input, Some(&kitchen)).await?.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn create_item_validates_price_and_category() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let category = app.call("menu.createCategory", json!({ "name": "Tacos" }), Some(&admin)).await?;

    let res = app
        .call(
            "menu.createItem",
            json!({ "categoryId": category.data()["id"], "name": "Free taco", "price": "0" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call(
            "menu.createItem",
            json!({ "categoryId": "00000000-0000-0000-0000-000000000000", "name": "Orphan", "price": "10" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn kitchen_toggles_availability_idempotently() -> Result<()> {
    let app = TestApp::new();
    let kitchen = app.token_for(Role::Kitchen).await?;
    let waiter = app.token_for(Role::Waiter).await?;
    let item_id = app.seed_item("Suadero", "80.00").await?;

    let input = json!({ "id": item_id, "isAvailable": false });
    assert_eq!(
        app.call("menu.toggleAvailability", input.clone(), Some(&waiter)).await?.status,
        StatusCode::FORBIDDEN
    );

    for _ in 0..2 {
        let res = app.call("menu.toggleAvailability", input.clone(), Some(&kitchen)).await?;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.data()["isAvailable"], false);
    }

    let menu = app.call("menu.getFullMenu", json!({}), None).await?;
    assert_eq!(menu.data()[0]["items"], json!([]));
    Ok(())
}

#[tokio::test]
async fn search_matches_name_and_description() -> Result<()> {
    let app = TestApp::new();
    app.seed_item("Pastor", "85.00").await?;
    app.seed_item("Horchata", "35.00").await?;

    let res = app.call("menu.searchItems", json!({ "query": "PAST" }), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let res = app.call("menu.searchItems", json!({ "query": "house" }), None).await?;
    assert_eq!(res.data().as_array().unwrap().len(), 2);

    let res = app.call("menu.searchItems", json!({ "query": "  " }), None).await?;
    assert_eq!(res.data(), &json!([]));
    Ok(())
}

#[tokio::test]
async fn delete_category_blocks_while_items_are_available() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let item_id = app.seed_item("Gringa", "95.00").await?;
    let item = app.call("menu.getItem", json!({ "id": item_id }), None).await?;
    let category_id = item.data()["categoryId"].clone();

    let res = app.call("menu.deleteCategory", json!({ "id": category_id }), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);

    app.call("menu.toggleAvailability", json!({ "id": item_id, "isAvailable": false }), Some(&admin))
        .await?;
    let res = app.call("menu.deleteCategory", json!({ "id": category_id }), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["isActive"], false);

    let visible = app.call("menu.getCategories", json!({}), None).await?;
    assert_eq!(visible.data(), &json!([]));
    let all = app.call("menu.getCategories", json!({ "includeInactive": true }), Some(&admin)).await?;
    assert_eq!(all.data().as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn modifiers_attach_to_items() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let item_id = app.seed_item("Quesadilla", "60.00").await?;

    let modifier = app
        .call(
            "menu.createModifier",
            json!({ "menuItemId": item_id, "name": "Extra cheese", "priceAdjustment": "15.00" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(modifier.status, StatusCode::OK);

    let item = app.call("menu.getItem", json!({ "id": item_id }), None).await?;
    assert_eq!(item.data()["modifiers"][0]["name"], "Extra cheese");

    let res = app
        .call("menu.deleteModifier", json!({ "id": modifier.data()["id"] }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app
        .call("menu.deleteModifier", json!({ "id": modifier.data()["id"] }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_edits_flow_into_public_listings() -> Result<()> {
    let app = TestApp::new();
    let admin = app.token_for(Role::Admin).await?;
    let item_id = app.seed_item("Birria", "95.00").await?;
    let item = app.call("menu.getItem", json!({ "id": item_id }), None).await?;
    let category_id = item.data()["categoryId"].clone();

    let featured = app.call("menu.getFeaturedItems", json!({}), None).await?;
    assert_eq!(featured.data(), &json!([]));

    let res = app
        .call("menu.updateItem", json!({ "id": item_id, "price": "99.50", "isFeatured": true }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(dec(&res.data()["price"]), dec(&json!("99.5")));

    let res = app.call("menu.updateItem", json!({ "id": item_id, "price": "-1" }), Some(&admin)).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let featured = app.call("menu.getFeaturedItems", json!({}), None).await?;
    assert_eq!(featured.data()[0]["id"], json!(item_id));

    let res = app
        .call("menu.updateCategory", json!({ "id": category_id, "name": "Stews", "sortOrder": 2 }), Some(&admin))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["name"], "Stews");

    let modifier = app
        .call(
            "menu.createModifier",
            json!({ "menuItemId": item_id, "name": "Consome", "priceAdjustment": "10.00" }),
            Some(&admin),
        )
        .await?;
    let res = app
        .call(
            "menu.updateModifier",
            json!({ "id": modifier.data()["id"], "priceAdjustment": "12.00" }),
            Some(&admin),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    let listed = app.call("menu.getItemsByCategory", json!({ "categoryId": category_id }), None).await?;
    assert_eq!(listed.status, StatusCode::OK);
    let items = listed.data().as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(dec(&items[0]["modifiers"][0]["priceAdjustment"]), dec(&json!("12")));
    Ok(())
}
