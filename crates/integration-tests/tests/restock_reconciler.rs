//! End-to-end tests for the restock reconciliation path.
//!
//! Requires a running server (with `WA_API_BASE` pointed at a stub that
//! accepts sends) and its database; see the crate docs for setup.

use serde_json::{Value, json};

use restock_alerts_integration_tests::{TestContext, nonce};

async fn subscribe(ctx: &TestContext, shop: &str, product_id: &str, phone: &str) {
    let resp = ctx
        .client
        .post(format!("{}/api/subscribe", ctx.base_url))
        .json(&json!({
            "shop": shop,
            "product_id": product_id,
            "product_title": "Widget",
            "customer_name": "Jo",
            "phone_number": phone
        }))
        .send()
        .await
        .expect("subscribe request failed");
    let body: Value = resp.json().await.expect("subscribe response not JSON");
    assert_eq!(body["status"], "success", "subscription setup failed");
}

/// Deliver a product-update webhook the way Shopify does: tenant in the
/// header, numeric product id in the payload.
async fn deliver_webhook(ctx: &TestContext, shop: &str, product_id: i64, stock: i64) -> Value {
    let resp = ctx
        .client
        .post(format!("{}/api/webhooks/product_update", ctx.base_url))
        .header("X-Shopify-Shop-Domain", shop)
        .json(&json!({
            "id": product_id,
            "variants": [{"inventory_quantity": stock}]
        }))
        .send()
        .await
        .expect("webhook request failed");

    assert_eq!(resp.status().as_u16(), 200, "webhook must always ack 200");
    resp.json().await.expect("webhook response not JSON")
}

#[tokio::test]
#[ignore = "Requires running server (WhatsApp stub) and database"]
async fn restock_notifies_only_matching_pending_leads() {
    let ctx = TestContext::new().await;
    let shop_x = format!("recon-x-{}.myshopify.com", nonce());
    let shop_y = format!("recon-y-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop_x).await;
    ctx.seed_shop(&shop_y).await;

    // Product A at shop X, product B at shop X, product A at shop Y.
    subscribe(&ctx, &shop_x, "2001", "15550101").await;
    subscribe(&ctx, &shop_x, "2002", "15550102").await;
    subscribe(&ctx, &shop_y, "2001", "15550103").await;

    let body = deliver_webhook(&ctx, &shop_x, 2001, 5).await;
    assert_eq!(body["status"], "success");

    // Exactly the (shop X, product A) lead transitions.
    assert_eq!(ctx.count_leads(&shop_x, "2001", "notified").await, 1);
    assert_eq!(ctx.count_leads(&shop_x, "2002", "pending").await, 1);
    assert_eq!(ctx.count_leads(&shop_y, "2001", "pending").await, 1);

    ctx.clear_leads(&shop_x).await;
    ctx.clear_leads(&shop_y).await;
}

#[tokio::test]
#[ignore = "Requires running server (WhatsApp stub) and database"]
async fn zero_stock_webhook_is_a_no_op() {
    let ctx = TestContext::new().await;
    let shop = format!("recon-zero-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;
    subscribe(&ctx, &shop, "2003", "15550104").await;

    let body = deliver_webhook(&ctx, &shop, 2003, 0).await;
    assert_eq!(body["status"], "success");

    assert_eq!(ctx.count_leads(&shop, "2003", "pending").await, 1);
    assert_eq!(ctx.count_leads(&shop, "2003", "notified").await, 0);
    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server (WhatsApp stub) and database"]
async fn second_restock_event_does_not_renotify() {
    let ctx = TestContext::new().await;
    let shop = format!("recon-idem-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;
    subscribe(&ctx, &shop, "2004", "15550105").await;

    deliver_webhook(&ctx, &shop, 2004, 3).await;
    assert_eq!(ctx.count_leads(&shop, "2004", "notified").await, 1);

    // Duplicate delivery: no pending leads remain, nothing to send.
    let body = deliver_webhook(&ctx, &shop, 2004, 3).await;
    assert_eq!(body["status"], "success");
    assert_eq!(ctx.count_leads(&shop, "2004", "notified").await, 1);
    assert_eq!(ctx.count_leads(&shop, "2004", "pending").await, 0);
    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server (WhatsApp stub) and database"]
async fn end_to_end_subscribe_then_restock() {
    let ctx = TestContext::new().await;
    let shop = format!("recon-e2e-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;

    // Stored with formatting; normalized only when the send goes out.
    subscribe(&ctx, &shop, "42", "+1 555 0100").await;
    assert_eq!(ctx.count_leads(&shop, "42", "pending").await, 1);

    // Numeric payload id must match the string-stored product id.
    deliver_webhook(&ctx, &shop, 42, 3).await;

    assert_eq!(ctx.count_leads(&shop, "42", "notified").await, 1);

    // notified_at is set exactly when the transition commits.
    let missing_timestamp = sqlx::query_scalar::<_, i64>(
        r"
        SELECT COUNT(*) FROM lead
        WHERE shop = $1 AND status = 'notified' AND notified_at IS NULL
        ",
    )
    .bind(&shop)
    .fetch_one(&ctx.pool)
    .await
    .expect("failed to check notified_at");
    assert_eq!(missing_timestamp, 0);

    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server WITHOUT WhatsApp credentials and database"]
async fn failed_sends_do_not_abort_the_batch() {
    // Every send fails against a credential-less server. Each lead must
    // still get its own attempt and end up released, not stuck behind the
    // first failure.
    let ctx = TestContext::new().await;
    let shop = format!("recon-batch-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;
    subscribe(&ctx, &shop, "2006", "15550107").await;
    subscribe(&ctx, &shop, "2006", "15550108").await;

    let body = deliver_webhook(&ctx, &shop, 2006, 2).await;
    assert_eq!(body["status"], "success");

    // Both leads went through the claim/send/release cycle.
    assert_eq!(ctx.count_leads(&shop, "2006", "pending").await, 2);
    assert_eq!(ctx.count_leads(&shop, "2006", "notified").await, 0);
    ctx.clear_leads(&shop).await;
}

#[tokio::test]
#[ignore = "Requires running server WITHOUT WhatsApp credentials and database"]
async fn failed_send_preserves_retry_eligibility() {
    // Against a credential-less server every send fails, so the lead must
    // stay pending and be matched again by the next event.
    let ctx = TestContext::new().await;
    let shop = format!("recon-fail-{}.myshopify.com", nonce());
    ctx.seed_shop(&shop).await;
    subscribe(&ctx, &shop, "2005", "15550106").await;

    deliver_webhook(&ctx, &shop, 2005, 4).await;
    assert_eq!(ctx.count_leads(&shop, "2005", "pending").await, 1);
    assert_eq!(ctx.count_leads(&shop, "2005", "notified").await, 0);

    // Still selectable by a later event for the same product.
    deliver_webhook(&ctx, &shop, 2005, 4).await;
    assert_eq!(ctx.count_leads(&shop, "2005", "pending").await, 1);
    ctx.clear_leads(&shop).await;
}
