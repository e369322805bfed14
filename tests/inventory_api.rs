mod common;

use axum::http::{Method, StatusCode};
use common::{get, json_request, read_json, spawn_app, TestApp};
use rapidxcel_logistics::models::Role;
use serde_json::{json, Value};

async fn create_supplier(test: &TestApp, cookie: &str, name: &str) -> Value {
    let response = test
        .send(json_request(
            Method::POST,
            "/api/suppliers",
            Some(cookie),
            Some(json!({ "name": name, "contact_email": "sales@example.com" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn create_item(test: &TestApp, cookie: &str, body: Value) -> Value {
    let response = test
        .send(json_request(Method::POST, "/api/stock", Some(cookie), Some(body)))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

async fn adjust(test: &TestApp, cookie: &str, id: i64, delta: i64) -> (StatusCode, Value) {
    let response = test
        .send(json_request(
            Method::POST,
            &format!("/api/stock/{id}/adjust"),
            Some(cookie),
            Some(json!({ "delta": delta })),
        ))
        .await;
    let status = response.status();
    (status, read_json(response).await)
}

#[tokio::test]
async fn supplier_directory_is_admin_managed() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let (_, customer) = test.user_with_session("wes", Role::Customer).await;

    let supplier = create_supplier(&test, &admin, "Northern Freight").await;
    assert_eq!(supplier["name"], "Northern Freight");

    let duplicate = test
        .send(json_request(
            Method::POST,
            "/api/suppliers",
            Some(&admin),
            Some(json!({ "name": "Northern Freight" })),
        ))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let refused = test
        .send(json_request(
            Method::POST,
            "/api/suppliers",
            Some(&customer),
            Some(json!({ "name": "Sneaky Supplies" })),
        ))
        .await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);

    let listed = read_json(test.send(get("/api/suppliers", &customer)).await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let updated = test
        .send(json_request(
            Method::PUT,
            &format!("/api/suppliers/{}", supplier["id"]),
            Some(&admin),
            Some(json!({ "phone": "0113 496 0000" })),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = read_json(updated).await;
    assert_eq!(updated["phone"], "0113 496 0000");
    assert_eq!(updated["contact_email"], "sales@example.com");
}

#[tokio::test]
async fn stock_items_validate_supplier_and_sku() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let (_, supplier_user) = test.user_with_session("acme", Role::Supplier).await;
    let (_, customer) = test.user_with_session("xia", Role::Customer).await;
    let supplier = create_supplier(&test, &admin, "Acme Parts").await;

    let body = json!({
        "sku": "BOLT-M8",
        "name": "M8 bolts (box of 100)",
        "quantity": 40,
        "unit_price": 3.25,
        "supplier_id": supplier["id"],
    });
    let item = create_item(&test, &supplier_user, body.clone()).await;
    assert_eq!(item["quantity"], 40);
    assert_eq!(item["supplier_id"], supplier["id"]);

    let duplicate = test
        .send(json_request(Method::POST, "/api/stock", Some(&admin), Some(body)))
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let orphan = test
        .send(json_request(
            Method::POST,
            "/api/stock",
            Some(&admin),
            Some(json!({ "sku": "NUT-M8", "name": "M8 nuts", "supplier_id": 9999 })),
        ))
        .await;
    assert_eq!(orphan.status(), StatusCode::BAD_REQUEST);

    let negative = test
        .send(json_request(
            Method::POST,
            "/api/stock",
            Some(&admin),
            Some(json!({ "sku": "NUT-M6", "name": "M6 nuts", "quantity": -1 })),
        ))
        .await;
    assert_eq!(negative.status(), StatusCode::BAD_REQUEST);

    let refused = test
        .send(json_request(
            Method::POST,
            "/api/stock",
            Some(&customer),
            Some(json!({ "sku": "WASHER", "name": "Washers" })),
        ))
        .await;
    assert_eq!(refused.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn adjustments_never_go_negative() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let item = create_item(
        &test,
        &admin,
        json!({ "sku": "TAPE-50", "name": "Packing tape", "quantity": 5, "unit_price": 1.2 }),
    )
    .await;
    let id = item["id"].as_i64().unwrap();

    let (status, body) = adjust(&test, &admin, id, -3).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 2);

    let (status, body) = adjust(&test, &admin, id, -5).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = adjust(&test, &admin, id, 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = adjust(&test, &admin, id, 10).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 12);

    let (status, _) = adjust(&test, &admin, 9999, 1).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let current = read_json(test.send(get(&format!("/api/stock/{id}"), &admin)).await).await;
    assert_eq!(current["quantity"], 12);
}

#[tokio::test]
async fn stock_listing_filters() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let supplier = create_supplier(&test, &admin, "Boxes Ltd").await;

    create_item(
        &test,
        &admin,
        json!({ "sku": "BOX-S", "name": "Small box", "quantity": 3, "supplier_id": supplier["id"] }),
    )
    .await;
    create_item(
        &test,
        &admin,
        json!({ "sku": "BOX-L", "name": "Large box", "quantity": 300, "supplier_id": supplier["id"] }),
    )
    .await;
    create_item(&test, &admin, json!({ "sku": "GLUE", "name": "Glue", "quantity": 1 })).await;

    let low = read_json(test.send(get("/api/stock?low_stock=5", &admin)).await).await;
    assert_eq!(low.as_array().unwrap().len(), 2);

    let from_supplier = read_json(
        test.send(get(&format!("/api/stock?supplier_id={}", supplier["id"]), &admin))
            .await,
    )
    .await;
    assert_eq!(from_supplier.as_array().unwrap().len(), 2);

    let via_supplier = read_json(
        test.send(get(&format!("/api/suppliers/{}/stock", supplier["id"]), &admin))
            .await,
    )
    .await;
    let names: Vec<&str> = via_supplier
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Large box", "Small box"]);
}

#[tokio::test]
async fn supplier_with_stock_cannot_be_deleted() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let supplier = create_supplier(&test, &admin, "Pallets R Us").await;
    let supplier_id = supplier["id"].as_i64().unwrap();
    let item = create_item(
        &test,
        &admin,
        json!({ "sku": "PALLET", "name": "Euro pallet", "quantity": 8, "supplier_id": supplier_id }),
    )
    .await;

    let blocked = test
        .send(json_request(
            Method::DELETE,
            &format!("/api/suppliers/{supplier_id}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(blocked.status(), StatusCode::CONFLICT);

    let removed = test
        .send(json_request(
            Method::DELETE,
            &format!("/api/stock/{}", item["id"]),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let deleted = test
        .send(json_request(
            Method::DELETE,
            &format!("/api/suppliers/{supplier_id}"),
            Some(&admin),
            None,
        ))
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = test.send(get(&format!("/api/suppliers/{supplier_id}"), &admin)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_quantities_are_rejected() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;
    let item = create_item(
        &test,
        &admin,
        json!({ "sku": "STRAP", "name": "Ratchet strap", "quantity": 1, "unit_price": 6.0 }),
    )
    .await;
    let id = item["id"].as_i64().unwrap();

    let (status, body) = adjust(&test, &admin, id, i64::MAX).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = adjust(&test, &admin, id, 1_000_000_000).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let current = test.send(get(&format!("/api/stock/{id}"), &admin)).await;
    assert_eq!(current.status(), StatusCode::OK);
    assert_eq!(read_json(current).await["quantity"], 1);

    let listed = test.send(get("/api/stock", &admin)).await;
    assert_eq!(listed.status(), StatusCode::OK);
    assert_eq!(read_json(listed).await.as_array().unwrap().len(), 1);

    let too_many = test
        .send(json_request(
            Method::POST,
            "/api/stock",
            Some(&admin),
            Some(json!({ "sku": "SAND", "name": "Sand", "quantity": i64::MAX })),
        ))
        .await;
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stock_bodies_with_wrong_types_get_the_error_envelope() {
    let test = spawn_app().await;
    let (_, admin) = test.user_with_session("root", Role::Admin).await;

    let response = test
        .send(json_request(
            Method::POST,
            "/api/stock",
            Some(&admin),
            Some(json!({ "sku": "ROPE", "name": "Rope", "quantity": "lots" })),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"]["code"], "BAD_REQUEST");
}
