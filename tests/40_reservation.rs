mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Local, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{TestApp, MONDAY, SUNDAY};
use ordo::database::models::Reservation;
use ordo::types::{ReservationStatus, Role};

fn booking(date: &str, time: &str, party_size: i32, phone: &str) -> Value {
    json!({
        "name": "Elena",
        "phone": phone,
        "date": date,
        "time": time,
        "partySize": party_size,
    })
}

#[tokio::test]
async fn reservation_needs_an_open_day_and_window() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;

    let res = app.call("reservation.create", booking(SUNDAY, "19:00", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    // closes 22:00 with a two hour seating buffer
    let res = app.call("reservation.create", booking(MONDAY, "20:30", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let res = app.call("reservation.create", booking(MONDAY, "08:30", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.reservation_count().await, 0);

    let res = app.call("reservation.create", booking(MONDAY, "20:00", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.data()["status"], "PENDING");
    assert_eq!(res.data()["reservationTime"], "20:00");
    Ok(())
}

#[tokio::test]
async fn past_dates_and_bad_times_fail_validation() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;

    let res = app.call("reservation.create", booking("2020-01-06", "19:00", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["field_errors"]["date"].is_string());

    let res = app.call("reservation.create", booking(MONDAY, "7pm", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.call("reservation.create", booking(MONDAY, "19:00", 0, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn reservations_disabled_is_forbidden() -> Result<()> {
    let app = TestApp::new();
    app.seed_restaurant(json!({ "dine_in": true, "takeout": true, "delivery": true, "reservations": false }))
        .await?;
    let res = app.call("reservation.create", booking(MONDAY, "19:00", 2, "5511112222"), None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn slot_capacity_is_three_parties() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;

    for phone in ["5500000001", "5500000002", "5500000003"] {
        let res = app.call("reservation.create", booking(MONDAY, "19:00", 4, phone), None).await?;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    }

    let res = app.call("reservation.create", booking(MONDAY, "19:00", 2, "5500000004"), None).await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);

    let times = app
        .call("reservation.getAvailableTimes", json!({ "date": MONDAY, "partySize": 2 }), None)
        .await?;
    assert_eq!(times.status, StatusCode::OK);
    assert_eq!(times.data()["isClosed"], false);
    let slots = times.data()["slots"].as_array().unwrap();
    assert!(slots.iter().all(|s| s["time"] != "19:00"));
    assert_eq!(slots[0]["time"], "09:00");
    assert_eq!(slots[0]["remaining"], 3);
    assert_eq!(slots.last().unwrap()["time"], "20:00");
    Ok(())
}

#[tokio::test]
async fn closed_day_has_no_slots() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;

    let times = app
        .call("reservation.getAvailableTimes", json!({ "date": SUNDAY, "partySize": 2 }), None)
        .await?;
    assert_eq!(times.status, StatusCode::OK);
    assert_eq!(times.data()["isClosed"], true);
    assert_eq!(times.data()["slots"], json!([]));
    Ok(())
}

#[tokio::test]
async fn guests_look_up_and_cancel_their_own_reservations() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;

    let created = app.call("reservation.create", booking(MONDAY, "19:00", 2, "55 1111 2222"), None).await?;
    let id = created.data()["id"].clone();

    let mine = app.call("reservation.getByPhone", json!({ "phone": "5511112222" }), None).await?;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.data().as_array().unwrap().len(), 1);

    let res = app
        .call("reservation.cancel", json!({ "id": id, "phone": "5599998888" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    let res = app.call("reservation.cancel", json!({ "id": id }), None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call("reservation.cancel", json!({ "id": id, "phone": "5511112222", "reason": "Plans changed" }), None)
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "CANCELLED");
    assert_eq!(res.data()["cancellationReason"], "Plans changed");
    assert!(res.data()["cancelledAt"].is_string());
    Ok(())
}

#[tokio::test]
async fn staff_confirm_seat_and_cancel() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;
    let admin = app.token_for(Role::Admin).await?;
    let waiter = app.token_for(Role::Waiter).await?;
    let customer = app.token_for(Role::Customer).await?;

    let created = app.call("reservation.create", booking(MONDAY, "19:00", 4, "5511112222"), None).await?;
    let id = created.data()["id"].clone();

    assert_eq!(
        app.call("reservation.getById", json!({ "id": id }), Some(&customer)).await?.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.call("reservation.getById", json!({ "id": id }), Some(&waiter)).await?.status, StatusCode::OK);

    let small = app.call("restaurant.createTable", json!({ "label": "T1", "seats": 2 }), Some(&admin)).await?;
    let large = app.call("restaurant.createTable", json!({ "label": "T2", "seats": 6 }), Some(&admin)).await?;
    assert_eq!(small.status, StatusCode::OK);

    let res = app
        .call("reservation.confirm", json!({ "id": id, "tableId": small.data()["id"] }), Some(&waiter))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .call("reservation.confirm", json!({ "id": id, "tableId": large.data()["id"] }), Some(&waiter))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["status"], "CONFIRMED");
    assert_eq!(res.data()["tableId"], large.data()["id"]);
    assert!(res.data()["confirmedAt"].is_string());

    let res = app.call("reservation.markSeated", json!({ "id": id }), Some(&waiter)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.data()["seatedAt"].is_string());

    // seated parties can no longer be cancelled, even by staff
    let res = app.call("reservation.cancel", json!({ "id": id }), Some(&waiter)).await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);

    let res = app
        .call("reservation.update", json!({ "id": id, "status": "COMPLETED" }), Some(&waiter))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    let res = app
        .call("reservation.update", json!({ "id": id, "status": "PENDING" }), Some(&waiter))
        .await?;
    assert_eq!(res.status, StatusCode::PRECONDITION_FAILED);
    Ok(())
}

#[tokio::test]
async fn stats_are_admin_only() -> Result<()> {
    let app = TestApp::new();
    app.seed_default_restaurant().await?;
    let admin = app.token_for(Role::Admin).await?;
    let waiter = app.token_for(Role::Waiter).await?;

    app.call("reservation.create", booking(MONDAY, "19:00", 4, "5500000001"), None).await?;
    app.call("reservation.create", booking(MONDAY, "19:30", 2, "5500000002"), None).await?;

    assert_eq!(app.call("reservation.getStats", json!({}), Some(&waiter)).await?.status, StatusCode::FORBIDDEN);
    let stats = app.call("reservation.getStats", json!({}), Some(&admin)).await?;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.data()["total"], 2);
    assert_eq!(stats.data()["totalGuests"], 6);
    assert_eq!(stats.data()["byStatus"]["PENDING"], 2);
    Ok(())
}

#[tokio::test]
async fn staff_see_todays_and_upcoming_bookings() -> Result<()> {
    let app = TestApp::new();
    let waiter = app.token_for(Role::Waiter).await?;
    let today = Local::now().date_naive();

    for (offset, time) in [(0, "19:00"), (0, "13:00"), (3, "20:00"), (30, "20:00")] {
        let now = Utc::now();
        app.state
            .reservations
            .insert(&Reservation {
                id: Uuid::new_v4(),
                customer_id: Uuid::new_v4(),
                customer_name: "Elena".into(),
                customer_phone: "5511112222".into(),
                customer_email: None,
                reservation_date: today + Duration::days(offset),
                reservation_time: time.into(),
                party_size: 2,
                status: ReservationStatus::Pending,
                special_requests: None,
                table_id: None,
                cancellation_reason: None,
                confirmed_at: None,
                seated_at: None,
                cancelled_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    let todays = app.call("reservation.getTodayReservations", json!({}), Some(&waiter)).await?;
    assert_eq!(todays.status, StatusCode::OK);
    let list = todays.data().as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["reservationTime"], "13:00");

    let week = app.call("reservation.getUpcoming", json!({}), Some(&waiter)).await?;
    assert_eq!(week.data().as_array().map(Vec::len), Some(3));

    let month = app.call("reservation.getUpcoming", json!({ "days": 45 }), Some(&waiter)).await?;
    assert_eq!(month.data().as_array().map(Vec::len), Some(4));

    let too_far = app.call("reservation.getUpcoming", json!({ "days": 365 }), Some(&waiter)).await?;
    assert_eq!(too_far.status, StatusCode::BAD_REQUEST);

    assert_eq!(
        app.call("reservation.getTodayReservations", json!({}), None).await?.status,
        StatusCode::UNAUTHORIZED
    );
    Ok(())
}
