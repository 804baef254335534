//! Cart mutations and their on-disk persistence across restarts.

use rust_decimal::Decimal;
use serde_json::{Value, json};
use subify_core::ProductId;
use subify_integration_tests::{MockApi, MockCatalog, MockGeocoder, TestServices, UserResponse};
use subify_storefront::cart::{CART_STORAGE_KEY, CartItem, CartStoreError};
use subify_storefront::{AppError, AppState};

async fn services() -> TestServices {
    TestServices::start(
        MockApi::new(UserResponse::Rejected("Not logged in".to_string())),
        MockCatalog::new(Vec::new()),
        MockGeocoder::Resolving,
    )
    .await
}

fn item(id: i64, price: i64) -> CartItem {
    CartItem::new(
        ProductId::new(id),
        &format!("p{id}"),
        Decimal::from(price),
        &format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
    )
    .expect("valid item")
}

/// The JSON array stored under the cart slot of the storage file.
fn persisted_slot(services: &TestServices) -> Vec<Value> {
    let raw = std::fs::read_to_string(services.storage_path()).expect("storage file exists");
    let slots: Value = serde_json::from_str(&raw).expect("storage file is JSON");
    let cart = slots[CART_STORAGE_KEY].as_str().expect("cart slot is a string");
    serde_json::from_str(cart).expect("cart slot is a JSON array")
}

#[tokio::test]
async fn test_add_add_remove_example() {
    let services = services().await;
    let state = AppState::new(services.config())
        .await
        .expect("Failed to build app state");
    let context = state.context();

    context.add_to_cart(item(1, 10)).await;
    context.add_to_cart(item(2, 20)).await;
    context.flush().await;
    assert_eq!(context.current_view().await.cart, vec![item(1, 10), item(2, 20)]);
    assert_eq!(persisted_slot(&services).len(), 2);

    context.remove_from_cart(0).await;
    context.flush().await;
    assert_eq!(context.current_view().await.cart, vec![item(2, 20)]);

    let slot = persisted_slot(&services);
    assert_eq!(slot.len(), 1);
    assert_eq!(slot[0]["productId"], json!(2));
    assert_eq!(slot[0]["price"], json!(20.0));
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let services = services().await;

    let first = AppState::new(services.config())
        .await
        .expect("Failed to build app state");
    for id in 1..=4 {
        first.context().add_to_cart(item(id, id * 5)).await;
    }
    first.context().remove_from_cart(2).await;
    first.context().remove_from_cart(99).await;
    first.context().flush().await;
    let before = first.context().current_view().await.cart;
    drop(first);

    let second = AppState::new(services.config())
        .await
        .expect("Failed to rebuild app state");
    assert_eq!(second.context().current_view().await.cart, before);
    assert_eq!(
        before.iter().map(|i| i.product_id().as_i64()).collect::<Vec<_>>(),
        vec![1, 2, 4]
    );
}

#[tokio::test]
async fn test_fractional_prices_survive_restart() {
    let services = services().await;
    let priced = |id: i64, price: &str| {
        CartItem::new(
            ProductId::new(id),
            &format!("p{id}"),
            price.parse::<Decimal>().expect("decimal literal"),
            &format!("https://cdn.dummyjson.com/products/{id}/thumbnail.png"),
        )
        .expect("valid item")
    };

    let first = AppState::new(services.config())
        .await
        .expect("Failed to build app state");
    first.context().add_to_cart(priced(1, "12.3456789012345678")).await;
    first.context().add_to_cart(priced(2, "9.99")).await;
    first.context().add_to_cart(priced(3, "0.1")).await;
    first.context().flush().await;
    let before = first.context().current_view().await.cart;
    drop(first);

    assert_eq!(before[0].price().amount(), Decimal::new(1235, 2));
    assert_eq!(persisted_slot(&services)[0]["price"], json!(12.35));

    let second = AppState::new(services.config())
        .await
        .expect("Failed to rebuild app state");
    assert_eq!(second.context().current_view().await.cart, before);
}

#[tokio::test]
async fn test_every_mutation_round_trips() {
    let services = services().await;
    let state = AppState::new(services.config())
        .await
        .expect("Failed to build app state");
    let context = state.context();

    let steps: [(bool, i64); 6] = [(true, 1), (true, 2), (false, 5), (true, 3), (false, 0), (false, 1)];
    for (add, value) in steps {
        if add {
            context.add_to_cart(item(value, value)).await;
        } else {
            context
                .remove_from_cart(usize::try_from(value).expect("small index"))
                .await;
        }
        context.flush().await;

        let reloaded: Vec<CartItem> = persisted_slot(&services)
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("valid persisted item"))
            .collect();
        assert_eq!(reloaded, context.current_view().await.cart);
    }
}

#[tokio::test]
async fn test_corrupt_cart_fails_startup_by_default() {
    let services = services().await;
    std::fs::write(
        services.storage_path(),
        json!({ CART_STORAGE_KEY: "{not json" }).to_string(),
    )
    .expect("write storage file");

    let result = AppState::new(services.config()).await;
    assert!(matches!(
        result,
        Err(AppError::CartStore(CartStoreError::Corrupt(_)))
    ));
}

#[tokio::test]
async fn test_corrupt_cart_resets_when_configured() {
    let services = services().await;
    std::fs::write(
        services.storage_path(),
        json!({ CART_STORAGE_KEY: r#"[{"productId":-4,"title":"","price":1}]"# }).to_string(),
    )
    .expect("write storage file");

    let mut config = services.config();
    config.reset_corrupt_cart = true;
    let state = AppState::new(config)
        .await
        .expect("Reset policy should recover");

    assert!(state.context().current_view().await.cart.is_empty());
    assert!(persisted_slot(&services).is_empty());
}
