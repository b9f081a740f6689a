//! Integration tests for TrueSoul.
//!
//! Everything runs against the in-memory document backend with a fixed
//! clock: the same stores and workflow the binaries use, minus the hosted
//! services. The storefront tests additionally spin the real axum router up
//! on an ephemeral port and drive it with a cookie-carrying `reqwest`
//! client, so sessions behave exactly as they do in production.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p truesoul-integration-tests
//! ```

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use url::Url;

use truesoul_core::{Category, Price, ProductId};
use truesoul_services::assistant::AssistantConfig;
use truesoul_services::backend::{DocStoreConfig, MemoryBackend};
use truesoul_services::clock::FixedClock;
use truesoul_services::identity::IdentityConfig;
use truesoul_services::orders::OrderStore;
use truesoul_services::products::{NewProduct, ProductStore};
use truesoul_services::reconcile::OrderWorkflow;
use truesoul_services::reviews::ReviewStore;
use truesoul_services::users::UserStore;
use truesoul_storefront::config::StorefrontConfig;
use truesoul_storefront::state::AppState;

/// Shared test fixture: stores and workflow over one in-memory backend.
pub struct TestContext {
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<FixedClock>,
    pub products: ProductStore,
    pub orders: OrderStore,
    pub reviews: ReviewStore,
    pub users: UserStore,
    pub workflow: OrderWorkflow,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ));

        let products = ProductStore::new(
            Arc::clone(&backend) as _,
            Arc::clone(&clock) as _,
        );
        let orders = OrderStore::new(Arc::clone(&backend) as _, Arc::clone(&clock) as _);
        let reviews = ReviewStore::new(
            Arc::clone(&backend) as _,
            Arc::clone(&clock) as _,
            products.clone(),
        );
        let users = UserStore::new(Arc::clone(&backend) as _, Arc::clone(&clock) as _);
        let workflow = OrderWorkflow::new(products.clone(), orders.clone());

        Self {
            backend,
            clock,
            products,
            orders,
            reviews,
            users,
            workflow,
        }
    }

    /// Seed one product and return its id.
    pub async fn seed_product(&self, name: &str, price: u64, stock: u32) -> ProductId {
        self.products
            .create(NewProduct {
                name: name.to_owned(),
                description: format!("{name} description"),
                price: Price::from_rupees(price),
                category: Category::Rice,
                image_url: None,
                stock_quantity: stock,
                unit: "kg".to_owned(),
            })
            .await
            .expect("seed product")
            .id
    }

    /// Current stock for a product.
    pub async fn stock_of(&self, id: &ProductId) -> u32 {
        self.products.get(id).await.expect("product").stock_quantity
    }

    /// Spawn the storefront router on an ephemeral port and return its base
    /// URL.
    ///
    /// The server shares this context's backend and clock. The identity and
    /// assistant clients are configured but point at nothing reachable;
    /// tests cover the routes that do not need them (or exercise their
    /// degraded paths).
    pub async fn spawn_storefront(&self) -> String {
        let config = storefront_test_config();
        let state = AppState::with_backend(
            config,
            Arc::clone(&self.backend) as _,
            Arc::clone(&self.clock) as _,
        );

        let session_layer = truesoul_storefront::middleware::create_session_layer();
        let app = axum::Router::new()
            .merge(truesoul_storefront::routes::routes())
            .layer(session_layer)
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        format!("http://{addr}")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A storefront config that never touches a live service.
fn storefront_test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid ip"),
        port: 0,
        base_url: "http://localhost:0".to_owned(),
        docstore: DocStoreConfig {
            url: Url::parse("http://127.0.0.1:1/").expect("valid url"),
            prefix: "truesoul-test".to_owned(),
            username: None,
            password: None,
        },
        identity: IdentityConfig {
            api_key: SecretString::from("kQ4v9Zr2pXw7Lm1Tn8Bd3Hs6"),
            base_url: Some("http://127.0.0.1:1".to_owned()),
        },
        assistant: AssistantConfig::default(),
        payments: None,
        whatsapp_phone: "919876543210".to_owned(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Cookie-carrying HTTP client for storefront tests.
#[must_use]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("build client")
}
