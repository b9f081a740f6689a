//! End-to-end order lifecycle: placement, status movement, cancellation,
//! and the stock counts that must stay consistent throughout.

use truesoul_core::{OrderStatus, Price, UserId};
use truesoul_integration_tests::TestContext;
use truesoul_services::StoreError;
use truesoul_services::reconcile::PlacedLine;

fn user() -> UserId {
    UserId::new("uid-shopper")
}

fn line(id: &truesoul_core::ProductId, quantity: u32) -> PlacedLine {
    PlacedLine {
        product_id: id.clone(),
        quantity,
    }
}

#[tokio::test]
async fn successful_order_decrements_stock_and_starts_pending() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 5).await;

    let order = ctx
        .workflow
        .place_order(&user(), &[line(&p1, 2)], Price::from_rupees(240), None)
        .await
        .expect("place order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Price::from_rupees(240));
    assert_eq!(ctx.stock_of(&p1).await, 3);

    let listed = ctx.orders.list_by_user(&user()).await.expect("list");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn mixed_availability_order_rejects_and_rolls_back() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 5).await;
    let p2 = ctx.seed_product("Raw Groundnuts", 80, 0).await;

    let err = ctx
        .workflow
        .place_order(
            &user(),
            &[line(&p1, 2), line(&p2, 1)],
            Price::from_rupees(320),
            None,
        )
        .await
        .expect_err("p2 has no stock");

    assert!(matches!(err, StoreError::OrderRejected { .. }));
    // P1 must be back at 5 - rolled back, not left at 3
    assert_eq!(ctx.stock_of(&p1).await, 5);
    assert_eq!(ctx.stock_of(&p2).await, 0);
    assert!(ctx.orders.list().await.expect("list").is_empty());
}

#[tokio::test]
async fn stock_never_negative_across_decrement_restore_sequences() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Jasmine Rice", 110, 3).await;

    // Drain the stock in small bites, over-asking along the way
    for amount in [2u32, 2, 1, 4] {
        let _ = ctx.products.decrement_stock(&p1, amount).await;
        let stock = ctx.stock_of(&p1).await;
        assert!(stock <= 3, "stock grew without a restore");
    }
    assert_eq!(ctx.stock_of(&p1).await, 0);

    // Restore and over-drain again
    ctx.products.set_stock(&p1, 2).await.expect("restore");
    let err = ctx.products.decrement_stock(&p1, 5).await.expect_err("over-ask");
    assert!(matches!(err, StoreError::InsufficientStock { .. }));
    assert_eq!(ctx.stock_of(&p1).await, 2);
}

#[tokio::test]
async fn cancelling_shipped_order_restores_stock() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 5).await;
    let p2 = ctx.seed_product("Salted Groundnuts", 110, 8).await;

    let order = ctx
        .workflow
        .place_order(
            &user(),
            &[line(&p1, 2), line(&p2, 3)],
            Price::from_rupees(570),
            None,
        )
        .await
        .expect("place order");
    assert_eq!(ctx.stock_of(&p1).await, 3);
    assert_eq!(ctx.stock_of(&p2).await, 5);

    ctx.orders
        .update_status(&order.id, OrderStatus::Shipped)
        .await
        .expect("ship");

    let cancelled = ctx.workflow.cancel_order(&order.id).await.expect("cancel");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(ctx.stock_of(&p1).await, 5);
    assert_eq!(ctx.stock_of(&p2).await, 8);
}

#[tokio::test]
async fn cancelling_delivered_order_fails_with_stock_untouched() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 5).await;

    let order = ctx
        .workflow
        .place_order(&user(), &[line(&p1, 2)], Price::from_rupees(240), None)
        .await
        .expect("place order");
    ctx.orders
        .update_status(&order.id, OrderStatus::Delivered)
        .await
        .expect("deliver");

    let err = ctx
        .workflow
        .cancel_order(&order.id)
        .await
        .expect_err("delivered orders cannot be cancelled");
    assert!(matches!(err, StoreError::InvalidTransition { .. }));
    assert_eq!(ctx.stock_of(&p1).await, 3);

    let fetched = ctx.orders.get(&order.id).await.expect("get");
    assert_eq!(fetched.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn status_chain_is_forward_only() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 5).await;
    let order = ctx
        .workflow
        .place_order(&user(), &[line(&p1, 1)], Price::from_rupees(120), None)
        .await
        .expect("place order");

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        ctx.orders
            .update_status(&order.id, status)
            .await
            .expect("forward move");
    }

    let backward = ctx.orders.update_status(&order.id, OrderStatus::Pending).await;
    assert!(matches!(backward, Err(StoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn order_total_uses_prices_at_creation_time() {
    let ctx = TestContext::new();
    let p1 = ctx.seed_product("Premium Basmati Rice", 120, 10).await;

    let order = ctx
        .workflow
        .place_order(&user(), &[line(&p1, 2)], Price::from_rupees(240), None)
        .await
        .expect("place order");

    // The price changes after the order is placed
    ctx.products
        .update(
            &p1,
            truesoul_services::products::ProductPatch {
                price: Some(Price::from_rupees(150)),
                ..Default::default()
            },
        )
        .await
        .expect("price change");

    let fetched = ctx.orders.get(&order.id).await.expect("get");
    assert_eq!(fetched.total_amount, Price::from_rupees(240));
    assert_eq!(
        fetched.items.first().map(|i| i.product.price),
        Some(Price::from_rupees(120)),
        "line snapshot keeps the order-time price"
    );
}
