//! Application state shared across handlers.

use std::sync::Arc;

use truesoul_services::assistant::AssistantClient;
use truesoul_services::backend::{DocumentBackend, HttpBackend};
use truesoul_services::clock::{Clock, SystemClock};
use truesoul_services::identity::IdentityClient;
use truesoul_services::orders::OrderStore;
use truesoul_services::payments::PaymentClient;
use truesoul_services::products::ProductStore;
use truesoul_services::reconcile::OrderWorkflow;
use truesoul_services::reviews::ReviewStore;
use truesoul_services::users::UserStore;
use truesoul_services::StoreError;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// stores, the workflow, and the external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    products: ProductStore,
    orders: OrderStore,
    reviews: ReviewStore,
    users: UserStore,
    workflow: OrderWorkflow,
    identity: IdentityClient,
    assistant: AssistantClient,
    payments: Option<PaymentClient>,
}

impl AppState {
    /// Create application state backed by the hosted document store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StoreError> {
        let backend = Arc::new(HttpBackend::new(config.docstore.clone())?);
        Ok(Self::with_backend(config, backend, Arc::new(SystemClock)))
    }

    /// Create application state over an explicit backend and clock.
    ///
    /// Tests use this with the in-memory backend and a fixed clock.
    #[must_use]
    pub fn with_backend(
        config: StorefrontConfig,
        backend: Arc<dyn DocumentBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let products = ProductStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let orders = OrderStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let reviews = ReviewStore::new(
            Arc::clone(&backend),
            Arc::clone(&clock),
            products.clone(),
        );
        let users = UserStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let workflow = OrderWorkflow::new(products.clone(), orders.clone());
        let identity = IdentityClient::new(&config.identity);
        let assistant = AssistantClient::new(config.assistant.clone());
        let payments = config.payments.clone().map(PaymentClient::new);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                orders,
                reviews,
                users,
                workflow,
                identity,
                assistant,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the product store.
    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    /// Get a reference to the review store.
    #[must_use]
    pub fn reviews(&self) -> &ReviewStore {
        &self.inner.reviews
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    /// Get a reference to the reconciliation workflow.
    #[must_use]
    pub fn workflow(&self) -> &OrderWorkflow {
        &self.inner.workflow
    }

    /// Get a reference to the identity-provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the assistant gateway.
    #[must_use]
    pub fn assistant(&self) -> &AssistantClient {
        &self.inner.assistant
    }

    /// Get a reference to the payment client, if configured.
    #[must_use]
    pub fn payments(&self) -> Option<&PaymentClient> {
        self.inner.payments.as_ref()
    }
}
