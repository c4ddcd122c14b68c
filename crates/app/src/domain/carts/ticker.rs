//! Cart expiry ticker
//!
//! A cart that exists has exactly one countdown task; a cart that does not
//! has none. The task handle lives in [`CartLifecycle`] next to the
//! reservation it counts down, so every change to the cart starts or cancels
//! it under the same lock.

use std::{sync::Arc, time::Duration};

use estante::cart::TickOutcome;
use tokio::{
    sync::watch,
    task::{self, JoinHandle},
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

use crate::domain::{Reservation, SharedCart};

/// How often the cart countdown advances.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// The reservation engine together with its countdown task.
pub struct CartLifecycle {
    engine: Reservation,
    period: Duration,
    timer: Option<JoinHandle<()>>,
    outcomes: watch::Sender<TickOutcome>,
}

impl CartLifecycle {
    #[must_use]
    pub fn new(engine: Reservation) -> Self {
        let (outcomes, _initial) = watch::channel(TickOutcome::Idle);

        Self {
            engine,
            period: TICK_PERIOD,
            timer: None,
            outcomes,
        }
    }

    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn engine(&self) -> &Reservation {
        &self.engine
    }

    /// Mutable engine access. Call [`CartLifecycle::sync`] once done so the
    /// countdown follows the cart.
    pub fn engine_mut(&mut self) -> &mut Reservation {
        &mut self.engine
    }

    /// Whether a countdown task is live.
    pub fn is_ticking(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Receiver of countdown outcomes; only changes are published.
    pub fn subscribe(&self) -> watch::Receiver<TickOutcome> {
        self.outcomes.subscribe()
    }

    /// Advance the countdown now, stopping the task if the cart is gone.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.engine.tick();

        self.publish(outcome);

        if !matches!(outcome, TickOutcome::Active { .. }) {
            self.cancel();
        }

        outcome
    }

    /// Start the countdown if a cart exists without one, or cancel it if
    /// the cart is gone. `shared` must be the lock guarding `self`.
    pub fn sync(shared: &SharedCart, live: &mut Self) {
        match (live.engine.cart().is_some(), live.is_ticking()) {
            (true, false) => {
                live.timer = Some(spawn(Arc::clone(shared), live.period));

                debug!(period = ?live.period, "cart countdown started");
            }
            (false, _) => live.cancel(),
            (true, true) => {}
        }
    }

    /// Stop the countdown, if any.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();

            debug!("cart countdown cancelled");
        }

        if self.engine.cart().is_none() {
            self.publish(TickOutcome::Idle);
        }
    }

    fn publish(&self, outcome: TickOutcome) {
        self.outcomes.send_if_modified(|last| {
            let changed = *last != outcome;
            *last = outcome;
            changed
        });
    }

    fn owns_timer(&self) -> bool {
        self.timer
            .as_ref()
            .is_some_and(|timer| task::try_id() == Some(timer.id()))
    }
}

fn spawn(shared: SharedCart, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;

            let mut live = shared.lock().await;

            if !live.owns_timer() {
                break;
            }

            let outcome = live.engine.tick();

            live.publish(outcome);

            if !matches!(outcome, TickOutcome::Active { .. }) {
                live.timer = None;

                debug!(?outcome, "cart countdown finished");

                break;
            }
        }
    })
}
