//! Application state shared across admin handlers.

use std::sync::Arc;

use truesoul_services::StoreError;
use truesoul_services::backend::{DocumentBackend, HttpBackend};
use truesoul_services::clock::{Clock, SystemClock};
use truesoul_services::identity::IdentityClient;
use truesoul_services::orders::OrderStore;
use truesoul_services::products::ProductStore;
use truesoul_services::reconcile::OrderWorkflow;
use truesoul_services::users::UserStore;

use crate::config::AdminConfig;

/// Application state shared across all admin handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    products: ProductStore,
    orders: OrderStore,
    users: UserStore,
    workflow: OrderWorkflow,
    identity: IdentityClient,
}

impl AppState {
    /// Create application state backed by the hosted document store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, StoreError> {
        let backend = Arc::new(HttpBackend::new(config.docstore.clone())?);
        Ok(Self::with_backend(config, backend, Arc::new(SystemClock)))
    }

    /// Create application state over an explicit backend and clock.
    #[must_use]
    pub fn with_backend(
        config: AdminConfig,
        backend: Arc<dyn DocumentBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let products = ProductStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let orders = OrderStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let users = UserStore::new(Arc::clone(&backend), Arc::clone(&clock));
        let workflow = OrderWorkflow::new(products.clone(), orders.clone());
        let identity = IdentityClient::new(&config.identity);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                products,
                orders,
                users,
                workflow,
                identity,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
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
}
