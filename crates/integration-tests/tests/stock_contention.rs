//! Cross-session contention: concurrent decrements must serialize through
//! the store's revision guard, never through any in-process lock.

use std::sync::Arc;

use truesoul_core::{Price, UserId};
use truesoul_integration_tests::TestContext;
use truesoul_services::reconcile::PlacedLine;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn last_unit_goes_to_exactly_one_buyer() {
    let ctx = Arc::new(TestContext::new());
    let product = ctx.seed_product("Premium Basmati Rice", 120, 1).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let ctx = Arc::clone(&ctx);
        let product = product.clone();
        handles.push(tokio::spawn(async move {
            ctx.products.decrement_stock(&product, 1).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("join").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1, "only one session may take the last unit");
    assert_eq!(ctx.stock_of(&product).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_never_oversell() {
    let ctx = Arc::new(TestContext::new());
    let product = ctx.seed_product("Raw Groundnuts", 80, 6).await;

    // Ten shoppers race to buy 2 each; only three orders can fit
    let mut handles = Vec::new();
    for i in 0..10 {
        let ctx = Arc::clone(&ctx);
        let product = product.clone();
        handles.push(tokio::spawn(async move {
            ctx.workflow
                .place_order(
                    &UserId::new(format!("uid-{i}")),
                    &[PlacedLine {
                        product_id: product.clone(),
                        quantity: 2,
                    }],
                    Price::from_rupees(160),
                    None,
                )
                .await
        }));
    }

    let mut placed = 0u32;
    for handle in handles {
        if handle.await.expect("join").is_ok() {
            placed += 1;
        }
    }

    let remaining = ctx.stock_of(&product).await;
    assert_eq!(
        remaining + placed * 2,
        6,
        "sold quantity must match what left the shelf"
    );
    assert!(placed <= 3, "cannot sell more than stock allows");

    let orders = ctx.orders.list().await.expect("list");
    assert_eq!(orders.len() as u32, placed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cancellations_of_separate_orders_converge() {
    let ctx = Arc::new(TestContext::new());

    // One order per product; cancellations on distinct documents can run
    // concurrently without racing each other's restores
    let mut order_ids = Vec::new();
    let mut product_ids = Vec::new();
    for i in 0..5 {
        let product = ctx.seed_product(&format!("Jasmine Rice {i}"), 110, 10).await;
        let order = ctx
            .workflow
            .place_order(
                &UserId::new(format!("uid-{i}")),
                &[PlacedLine {
                    product_id: product.clone(),
                    quantity: 3,
                }],
                Price::from_rupees(330),
                None,
            )
            .await
            .expect("place");
        order_ids.push(order.id);
        product_ids.push(product);
    }

    let mut handles = Vec::new();
    for id in order_ids {
        let ctx = Arc::clone(&ctx);
        handles.push(tokio::spawn(async move {
            ctx.workflow.cancel_order(&id).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("cancel");
    }

    for product in &product_ids {
        assert_eq!(ctx.stock_of(product).await, 10, "every unit returned");
    }
}
