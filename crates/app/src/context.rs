//! App Context

use std::{sync::Arc, time::Duration};

use estante::{
    cart::CartReservation,
    checkout::freight::WeightBasedFreight,
    clock::SystemClock,
    fixtures::{Fixture, FixtureError},
    inventory::Inventory,
    repository::InMemoryRepository,
    storage::FileStore,
};
use jiff::SignedDuration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    domain::{
        Books, Customers, Orders, SharedClock, SharedStore,
        carts::{CartLifecycle, CartsService, InMemoryCartsService, TICK_PERIOD},
        catalog::{CatalogService, InMemoryCatalogService},
        checkout::{CheckoutService, InMemoryCheckoutService},
        customers::{CustomersService, InMemoryCustomersService},
        inventory::{InMemoryInventoryService, InventoryService},
        orders::{InMemoryOrdersService, OrdersService},
        session::{Delays, InMemorySessionService, SessionService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to load fixtures")]
    Fixtures(#[source] FixtureError),
}

#[derive(Clone)]
pub struct AppContext {
    pub catalog: Arc<dyn CatalogService>,
    pub session: Arc<dyn SessionService>,
    pub carts: Arc<dyn CartsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub customers: Arc<dyn CustomersService>,
    pub orders: Arc<dyn OrdersService>,
    pub inventory: Arc<dyn InventoryService>,
}

impl AppContext {
    /// Seed the repositories from the configured fixture set and open the
    /// file-backed store.
    ///
    /// # Errors
    ///
    /// Returns an error when the fixture set cannot be loaded.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let fixture = Fixture::from_set_in(&config.store.fixtures_dir, &config.store.fixture_set)
            .map_err(AppInitError::Fixtures)?;

        Ok(Self::seeded(
            &fixture,
            Arc::new(FileStore::new(&config.storage.data_dir)),
            Arc::new(SystemClock),
            config.store.cart_ttl(),
            TICK_PERIOD,
            Delays {
                login: Duration::from_millis(config.store.login_delay_ms),
                register: Duration::from_millis(config.store.register_delay_ms),
            },
        ))
    }

    /// Wire every service over in-memory repositories seeded from `fixture`.
    #[must_use]
    pub fn seeded(
        fixture: &Fixture,
        store: SharedStore,
        clock: SharedClock,
        cart_ttl: SignedDuration,
        tick_period: Duration,
        delays: Delays,
    ) -> Self {
        let books: Books = Arc::new(InMemoryRepository::with_entries(fixture.books().to_vec()));
        let customers: Customers =
            Arc::new(InMemoryRepository::with_entries(fixture.customers().to_vec()));
        let orders: Orders = Arc::new(InMemoryRepository::with_entries(fixture.orders().to_vec()));

        let cart = Arc::new(Mutex::new(
            CartLifecycle::new(
                CartReservation::new(Arc::clone(&store), Arc::clone(&clock)).with_ttl(cart_ttl),
            )
            .with_tick_period(tick_period),
        ));
        let inventory = Arc::new(Mutex::new(Inventory::new(Arc::clone(&books))));

        Self {
            catalog: Arc::new(InMemoryCatalogService::new(Arc::clone(&books), Arc::clone(&clock))),
            session: Arc::new(InMemorySessionService::new(
                Arc::clone(&customers),
                fixture.admins().to_vec(),
                Arc::clone(&store),
                Arc::clone(&clock),
                delays,
            )),
            carts: Arc::new(InMemoryCartsService::new(Arc::clone(&books), Arc::clone(&cart))),
            customers: Arc::new(InMemoryCustomersService::new(
                Arc::clone(&customers),
                Arc::clone(&clock),
            )),
            checkout: Arc::new(InMemoryCheckoutService::new(
                customers,
                Arc::clone(&orders),
                fixture.coupons().to_vec(),
                cart,
                Arc::clone(&clock),
                Arc::new(WeightBasedFreight::default()),
            )),
            orders: Arc::new(InMemoryOrdersService::new(
                orders,
                Arc::clone(&inventory),
                Arc::clone(&clock),
                estante::orders::LogNotifier,
            )),
            inventory: Arc::new(InMemoryInventoryService::new(books, inventory, clock)),
        }
    }
}
