//! End-to-end tests for the subscription intake path.
//!
//! Requires a running server and database; see the crate docs for setup.

use serde_json::{Value, json};

use restock_alerts_integration_tests::{TestContext, nonce};

async fn post_subscribe(ctx: &TestContext, body: &Value) -> (u16, Value) {
    let resp = ctx
        .client
        .post(format!("{}/api/subscribe", ctx.base_url))
        .json(body)
        .send()
        .await
        .expect("subscribe request failed");
    let status = resp.status().as_u16();
    let body: Value = resp.json().await.expect("subscribe response not JSON");
    (status, body)
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn duplicate_subscription_yields_one_pending_lead() {
    let ctx = TestContext::new().await;
    let shop = format!("intake-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;

    let body = json!({
        "shop": shop,
        "product_id": "1001",
        "product_title": "Widget",
        "customer_name": "Jo",
        "phone_number": "+1 555 0100"
    });

    let (status, first) = post_subscribe(&ctx, &body).await;
    assert_eq!(status, 200);
    assert_eq!(first["status"], "success");

    let (status, second) = post_subscribe(&ctx, &body).await;
    assert_eq!(status, 200);
    assert_eq!(second["status"], "already_subscribed");

    assert_eq!(ctx.count_leads(&shop, "1001", "pending").await, 1);
    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn unknown_shop_is_rejected_without_a_lead() {
    let ctx = TestContext::new().await;
    let shop = format!("never-installed-{}.myshopify.com", nonce());

    let (status, body) = post_subscribe(
        &ctx,
        &json!({
            "shop": shop,
            "product_id": "1001",
            "product_title": "Widget",
            "customer_name": "Jo",
            "phone_number": "15550100"
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "error");
    assert_eq!(ctx.count_leads(&shop, "1001", "pending").await, 0);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn numeric_product_id_is_accepted_and_canonicalized() {
    let ctx = TestContext::new().await;
    let shop = format!("intake-num-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;

    let (status, body) = post_subscribe(
        &ctx,
        &json!({
            "shop": shop,
            "product_id": 8_675_309,
            "product_title": "Widget",
            "customer_name": "Jo",
            "phone_number": "15550100"
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["status"], "success");
    // Stored as the string form the webhook path will look up.
    assert_eq!(ctx.count_leads(&shop, "8675309", "pending").await, 1);
    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn invalid_phone_number_is_a_bad_request() {
    let ctx = TestContext::new().await;
    let shop = format!("intake-bad-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;

    let resp = ctx
        .client
        .post(format!("{}/api/subscribe", ctx.base_url))
        .json(&json!({
            "shop": shop,
            "product_id": "1001",
            "product_title": "Widget",
            "customer_name": "Jo",
            "phone_number": "not a number"
        }))
        .send()
        .await
        .expect("subscribe request failed");

    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(ctx.count_leads(&shop, "1001", "pending").await, 0);
}
