//! Estante prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    books::{Book, BookError, BookStatus, BookUuid, PricingGroup, StatusReason, StockStatus},
    cart::{
        CART_TTL, Cart, CartError, CartItem, CartReservation, TickOutcome, snapshot::Restored,
    },
    catalog::{CatalogQuery, SortKey, SortOrder},
    checkout::{
        Checkout, CheckoutError, NewCard,
        freight::{FreightCalculator, FreightError, FreightQuote, WeightBasedFreight},
        payments::{Allocation, Coupon, CouponKind, Instrument, InstrumentId, PaymentAggregator, PaymentError},
    },
    clock::{Clock, ManualClock, SystemClock},
    customers::{Address, AddressType, AdminAccount, Customer, CustomerUuid, SavedCard, User},
    fixtures::{Fixture, FixtureError},
    ids::TypedUuid,
    inventory::{EntryType, Inventory, InventoryError, NewStockEntry, StockEntry, StockMovement},
    orders::{
        ExchangeNotifier, LogNotifier, NewOrder, Order, OrderAction, OrderLine, OrderQuery,
        OrderStatus, OrderUuid, Restock, TransitionError, dispatch,
    },
    repository::{Entity, InMemoryRepository, Repository, RepositoryError},
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
    validation::ValidationError,
};
