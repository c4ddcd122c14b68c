//! Orders service.

use async_trait::async_trait;
use estante::{
    customers::CustomerUuid,
    orders::{self, ExchangeNotifier, LogNotifier, Order, OrderLineUuid, OrderQuery, OrderUuid},
};
use mockall::automock;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::{Orders, SharedClock, SharedInventory, orders::errors::OrdersServiceError};

pub struct InMemoryOrdersService<N = LogNotifier> {
    orders: Orders,
    inventory: SharedInventory,
    clock: SharedClock,
    notifier: N,
    /// Held from load to save so two sessions cannot both move an order out
    /// of the same state.
    transitions: Mutex<()>,
}

impl<N> InMemoryOrdersService<N> {
    #[must_use]
    pub fn new(orders: Orders, inventory: SharedInventory, clock: SharedClock, notifier: N) -> Self {
        Self {
            orders,
            inventory,
            clock,
            notifier,
            transitions: Mutex::new(()),
        }
    }

    fn find(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.orders
            .find_by_id(uuid)?
            .ok_or(OrdersServiceError::NotFound(uuid))
    }

    /// Load, change and save one order. A failed change saves nothing.
    async fn transition(
        &self,
        uuid: OrderUuid,
        change: impl FnOnce(&mut Order) -> Result<(), OrdersServiceError> + Send,
    ) -> Result<Order, OrdersServiceError> {
        let _guard = self.transitions.lock().await;
        let mut order = self.find(uuid)?;

        change(&mut order)?;

        self.orders.save(order.clone())?;

        info!(order = %uuid, status = %order.status, "order status changed");

        Ok(order)
    }
}

#[async_trait]
impl<N> OrdersService for InMemoryOrdersService<N>
where
    N: ExchangeNotifier + Send + Sync,
{
    async fn list(&self, query: OrderQuery) -> Result<Vec<Order>, OrdersServiceError> {
        let orders = self.orders.list()?;

        Ok(query.apply(&orders).into_iter().cloned().collect())
    }

    async fn get(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        self.find(uuid)
    }

    #[tracing::instrument(name = "orders.service.approve", skip(self), fields(order = %uuid), err)]
    async fn approve(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(uuid, |order| Ok(order.approve(now)?)).await
    }

    #[tracing::instrument(name = "orders.service.reject", skip(self), fields(order = %uuid), err)]
    async fn reject(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(uuid, |order| Ok(order.reject(now)?)).await
    }

    #[tracing::instrument(name = "orders.service.dispatch", skip(self, uuids), fields(count = uuids.len()), err)]
    async fn dispatch(
        &self,
        uuids: Vec<OrderUuid>,
        tracking_code: String,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let _guard = self.transitions.lock().await;
        let mut batch = uuids
            .into_iter()
            .map(|uuid| self.find(uuid))
            .collect::<Result<Vec<_>, _>>()?;

        orders::dispatch(&mut batch, &tracking_code, self.clock.now())?;

        for order in &batch {
            self.orders.save(order.clone())?;
        }

        info!(count = batch.len(), tracking_code = %tracking_code.trim(), "dispatched orders");

        Ok(batch)
    }

    #[tracing::instrument(name = "orders.service.mark_delivered", skip(self), fields(order = %uuid), err)]
    async fn mark_delivered(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(uuid, |order| Ok(order.mark_delivered(now)?)).await
    }

    #[tracing::instrument(name = "orders.service.request_exchange", skip(self, lines, reason), fields(order = %uuid), err)]
    async fn request_exchange(
        &self,
        customer: CustomerUuid,
        uuid: OrderUuid,
        lines: Vec<OrderLineUuid>,
        reason: Option<String>,
    ) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(uuid, |order| {
            if order.customer != customer {
                return Err(OrdersServiceError::NotOwner(uuid));
            }

            Ok(order.request_exchange(&lines, reason, now)?)
        })
        .await
    }

    #[tracing::instrument(name = "orders.service.authorize_exchange", skip(self), fields(order = %uuid), err)]
    async fn authorize_exchange(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();

        self.transition(uuid, |order| Ok(order.authorize_exchange(&self.notifier, now)?))
            .await
    }

    #[tracing::instrument(name = "orders.service.confirm_exchange_received", skip(self), fields(order = %uuid), err)]
    async fn confirm_exchange_received(
        &self,
        uuid: OrderUuid,
        return_to_stock: bool,
    ) -> Result<Order, OrdersServiceError> {
        let now = self.clock.now();
        let _guard = self.transitions.lock().await;
        let mut order = self.find(uuid)?;

        let restocks = order.confirm_exchange_received(return_to_stock, now)?;

        if !restocks.is_empty() {
            self.inventory.lock().await.restock(uuid, &restocks, now)?;
        }

        self.orders.save(order.clone())?;

        info!(order = %uuid, restocked = restocks.len(), "exchange received");

        Ok(order)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Orders matching `query`, newest first.
    async fn list(&self, query: OrderQuery) -> Result<Vec<Order>, OrdersServiceError>;

    async fn get(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError>;

    async fn approve(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError>;

    async fn reject(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Ship a batch of approved orders under one tracking code, all or
    /// nothing.
    async fn dispatch(
        &self,
        uuids: Vec<OrderUuid>,
        tracking_code: String,
    ) -> Result<Vec<Order>, OrdersServiceError>;

    async fn mark_delivered(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Ask to exchange lines of one of `customer`'s delivered orders.
    async fn request_exchange(
        &self,
        customer: CustomerUuid,
        uuid: OrderUuid,
        lines: Vec<OrderLineUuid>,
        reason: Option<String>,
    ) -> Result<Order, OrdersServiceError>;

    async fn authorize_exchange(&self, uuid: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Close the exchange, optionally crediting the items back to stock.
    async fn confirm_exchange_received(
        &self,
        uuid: OrderUuid,
        return_to_stock: bool,
    ) -> Result<Order, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use estante::orders::{OrderStatus, TransitionError};
    use testresult::TestResult;

    use super::*;
    use crate::test::TestContext;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<OrderUuid>>>);

    impl Recorder {
        fn notified(&self) -> Vec<OrderUuid> {
            self.0.lock().map(|n| n.clone()).unwrap_or_default()
        }
    }

    impl ExchangeNotifier for Recorder {
        fn exchange_authorized(&self, order: &Order) {
            if let Ok(mut notified) = self.0.lock() {
                notified.push(order.uuid);
            }
        }
    }

    fn order_of(ctx: &TestContext, customer: &str) -> Result<Order, Box<dyn std::error::Error>> {
        let customer = ctx.fixture.customer(customer)?.uuid;

        ctx.fixture
            .orders()
            .iter()
            .find(|o| o.customer == customer)
            .cloned()
            .ok_or_else(|| "no order".into())
    }

    #[tokio::test]
    async fn exchange_round_trip_restocks_books() -> TestResult {
        let ctx = TestContext::new()?;
        let recorder = Recorder::default();
        let service = InMemoryOrdersService::new(
            ctx.order_records.clone(),
            Arc::clone(&ctx.inventory),
            ctx.shared_clock(),
            recorder.clone(),
        );

        let order = order_of(&ctx, "ana")?;
        let nineteen = ctx.fixture.book("1984")?;
        let line = order
            .lines
            .iter()
            .find(|l| l.book_id == nineteen.uuid)
            .map(|l| l.uuid)
            .ok_or("no line")?;

        let joao = ctx.fixture.customer("joao")?.uuid;
        let ana = ctx.fixture.customer("ana")?.uuid;

        let stolen = service
            .request_exchange(joao, order.uuid, vec![line], None)
            .await;

        assert!(matches!(stolen, Err(OrdersServiceError::NotOwner(_))));

        service
            .request_exchange(ana, order.uuid, vec![line], Some("páginas faltando".to_string()))
            .await?;
        service.authorize_exchange(order.uuid).await?;

        assert_eq!(recorder.notified(), vec![order.uuid]);

        let done = service.confirm_exchange_received(order.uuid, true).await?;

        assert_eq!(done.status, OrderStatus::Exchanged);
        assert_eq!(
            ctx.books.find_by_id(nineteen.uuid)?.map(|b| b.stock),
            Some(nineteen.stock + 2)
        );
        assert_eq!(ctx.inventory.lock().await.entries().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_exchange_receipts_restock_once() -> TestResult {
        let ctx = TestContext::new()?;
        let order = order_of(&ctx, "ana")?;
        let nineteen = ctx.fixture.book("1984")?;
        let line = order
            .lines
            .iter()
            .find(|l| l.book_id == nineteen.uuid)
            .ok_or("no line")?;
        let returned = line.quantity;

        ctx.orders
            .request_exchange(order.customer, order.uuid, vec![line.uuid], None)
            .await?;
        ctx.orders.authorize_exchange(order.uuid).await?;

        let held = ctx.inventory.lock().await;
        let release = async move {
            tokio::task::yield_now().await;
            drop(held);
        };

        let (first, second, ()) = tokio::join!(
            ctx.orders.confirm_exchange_received(order.uuid, true),
            ctx.orders.confirm_exchange_received(order.uuid, true),
            release,
        );

        assert_eq!(first?.status, OrderStatus::Exchanged);
        assert!(matches!(
            second,
            Err(OrdersServiceError::Transition(TransitionError::InvalidTransition {
                from: OrderStatus::Exchanged,
                ..
            }))
        ));
        assert_eq!(
            ctx.books.find_by_id(nineteen.uuid)?.map(|b| b.stock),
            Some(nineteen.stock + returned)
        );
        assert_eq!(ctx.inventory.lock().await.entries().len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn rejected_transitions_are_not_saved() -> TestResult {
        let ctx = TestContext::new()?;
        let order = order_of(&ctx, "joao")?;

        let result = ctx.orders.approve(order.uuid).await;

        assert!(matches!(
            result,
            Err(OrdersServiceError::Transition(TransitionError::InvalidTransition {
                from: OrderStatus::InTransit,
                ..
            }))
        ));
        assert_eq!(ctx.orders.get(order.uuid).await?, order);

        let delivered = ctx.orders.mark_delivered(order.uuid).await?;

        assert_eq!(delivered.status, OrderStatus::Delivered);

        let line = delivered.lines.first().map(|l| l.uuid).ok_or("no line")?;
        let final_sale = ctx
            .orders
            .request_exchange(delivered.customer, order.uuid, vec![line], None)
            .await;

        assert!(matches!(
            final_sale,
            Err(OrdersServiceError::Transition(TransitionError::NotExchangeable { .. }))
        ));
        assert_eq!(ctx.orders.get(order.uuid).await?.status, OrderStatus::Delivered);

        Ok(())
    }

    #[tokio::test]
    async fn dispatch_ships_approved_orders_together() -> TestResult {
        let ctx = TestContext::new()?;
        let placed = ctx.place_order("ana", &[("dom-casmurro", 1)]).await?;
        let in_transit = order_of(&ctx, "joao")?;

        ctx.orders.approve(placed.uuid).await?;

        let mixed = ctx
            .orders
            .dispatch(vec![placed.uuid, in_transit.uuid], "BR123456789SP".to_string())
            .await;

        assert!(mixed.is_err());
        assert_eq!(ctx.orders.get(placed.uuid).await?.status, OrderStatus::Approved);

        let shipped = ctx
            .orders
            .dispatch(vec![placed.uuid], "BR123456789SP".to_string())
            .await?;

        assert_eq!(shipped.len(), 1);

        let stored = ctx.orders.get(placed.uuid).await?;

        assert_eq!(stored.status, OrderStatus::InTransit);
        assert_eq!(stored.tracking_code.as_deref(), Some("BR123456789SP"));

        Ok(())
    }

    #[tokio::test]
    async fn customers_see_only_their_orders() -> TestResult {
        let ctx = TestContext::new()?;
        let ana = ctx.fixture.customer("ana")?.uuid;

        ctx.place_order("ana", &[("pequeno-principe", 2)]).await?;

        let own = ctx.orders.list(OrderQuery::for_customer(ana)).await?;

        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|o| o.customer == ana));
        assert_eq!(own.first().map(|o| o.status), Some(OrderStatus::Processing));

        let processing = ctx
            .orders
            .list(OrderQuery {
                status: Some(OrderStatus::Processing),
                ..OrderQuery::default()
            })
            .await?;

        assert_eq!(processing.len(), 1);

        Ok(())
    }
}
