//! The client entity: one order at a time, paid per delivered quantity.

use log::{debug, info};
use rand::Rng;
use uuid::Uuid;

use crate::core::components::traits::Consignee;
use crate::core::components::types::{ComponentError, Priority};
use crate::core::execution::config::{ClientConfig, OrderTerms};
use crate::core::types::{ComponentId, QUANTITY_EPSILON};

/// Order lifecycle of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    OrderPlaced,
    WaitForCompletion,
    Completed,
}

impl ClientState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientState::Idle => "idle",
            ClientState::OrderPlaced => "order_placed",
            ClientState::WaitForCompletion => "wait_for_completion",
            ClientState::Completed => "completed",
        }
    }

    /// An order is open and accepting deliveries
    pub fn is_active(&self) -> bool {
        matches!(self, ClientState::OrderPlaced | ClientState::WaitForCompletion)
    }
}

impl std::fmt::Display for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order placed by the client
#[derive(Debug, Clone)]
struct Order {
    order_id: String,
    priority: Priority,
    terms: OrderTerms,
}

/// The Client, who places one order and pays for every delivery against it
#[derive(Debug, Clone)]
pub struct Client {
    id: ComponentId,
    config: ClientConfig,
    state: ClientState,
    order: Option<Order>,
    time_passed: u32,
    order_quantity: f64,
    current_payment: f64,
}

impl Client {
    /// Creates a new idle `Client`.
    pub fn new(id: ComponentId, config: ClientConfig) -> Self {
        Self {
            id,
            config,
            state: ClientState::Idle,
            order: None,
            time_passed: 0,
            order_quantity: 0.0,
            current_payment: 0.0,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Priority of the current or last completed order
    pub fn priority(&self) -> Option<Priority> {
        self.order.as_ref().map(|o| o.priority)
    }

    pub fn order_id(&self) -> Option<&str> {
        self.order.as_ref().map(|o| o.order_id.as_str())
    }

    pub fn deadline(&self) -> Option<u32> {
        self.order.as_ref().map(|o| o.terms.deadline)
    }

    pub fn time_passed(&self) -> u32 {
        self.time_passed
    }

    /// Fraction of the order delivered so far, in [0, 1]
    pub fn order_quantity(&self) -> f64 {
        self.order_quantity
    }

    pub fn current_payment(&self) -> f64 {
        self.current_payment
    }

    /// Whether elapsed time is still within the deadline, `None` without an order
    pub fn in_time(&self) -> Option<bool> {
        self.deadline().map(|deadline| self.time_passed <= deadline)
    }

    pub fn is_completed(&self) -> bool {
        self.state == ClientState::Completed
    }

    /// Place a new order, sampling its priority from the configured weights
    ///
    /// The draw is uniform in [0, 1) and the weights are walked cumulatively
    /// in their declared order; the first priority whose cumulative weight
    /// reaches the draw is taken.
    pub fn place_order<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Priority, ComponentError> {
        if self.state != ClientState::Idle {
            return Err(ComponentError::InvalidTransition(format!(
                "Client {} cannot place an order while {}",
                self.id, self.state
            )));
        }

        let priority = self.sample_priority(rng)?;
        let terms = *self.config.terms.get(priority);
        let order_id = format!("order_{}", Uuid::new_v4());

        info!(
            "[Client {}] Placed {} priority order {} (deadline {})",
            self.id, priority, order_id, terms.deadline
        );

        self.order = Some(Order {
            order_id,
            priority,
            terms,
        });
        self.state = ClientState::OrderPlaced;
        self.time_passed = 0;
        self.order_quantity = 0.0;
        self.current_payment = 0.0;

        Ok(priority)
    }

    fn sample_priority<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Priority, ComponentError> {
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;

        for (priority, weight) in &self.config.priority_distribution {
            cumulative += weight;
            if draw <= cumulative {
                return Ok(*priority);
            }
        }

        // Weights summing below one leave a gap at the top of the range
        self.config
            .priority_distribution
            .last()
            .map(|(priority, _)| *priority)
            .ok_or_else(|| {
                ComponentError::InvalidConfiguration("priority distribution is empty".to_string())
            })
    }

    /// Record a delivered quantity and return the payment it earned
    ///
    /// The rate is decided by the elapsed time at this delivery: in-time
    /// rate while `time_passed <= deadline`, late rate afterwards.
    pub fn quantity_shipped(&mut self, quantity: f64) -> Result<f64, ComponentError> {
        let terms = match (&self.order, self.state.is_active()) {
            (Some(order), true) => order.terms,
            _ => {
                return Err(ComponentError::InvalidTransition(format!(
                    "Client {} cannot receive a shipment while {}",
                    self.id, self.state
                )))
            }
        };

        if quantity <= 0.0 || self.order_quantity + quantity > 1.0 + QUANTITY_EPSILON {
            return Err(ComponentError::InvalidQuantity(format!(
                "{} on top of {} already delivered",
                quantity, self.order_quantity
            )));
        }

        let rate = if self.time_passed <= terms.deadline {
            terms.in_time_payment
        } else {
            terms.late_payment
        };
        let payment = quantity * rate;

        self.order_quantity += quantity;
        self.current_payment += payment;

        if self.order_quantity >= 1.0 - QUANTITY_EPSILON {
            self.order_quantity = 1.0;
            self.state = ClientState::Completed;
            info!(
                "[Client {}] Order completed after {} ticks, payment {:.2}",
                self.id, self.time_passed, self.current_payment
            );
        } else {
            self.state = ClientState::WaitForCompletion;
            debug!(
                "[Client {}] Received {:.3}, total {:.3}",
                self.id, quantity, self.order_quantity
            );
        }

        Ok(payment)
    }

    /// Advance elapsed order time by one tick
    ///
    /// Returns whether the order is still within its deadline; `false` when
    /// no order is open.
    pub fn step_time(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.time_passed += 1;
        self.in_time().unwrap_or(false)
    }

    /// Return to idle, dropping the current order
    pub fn reset(&mut self) {
        self.state = ClientState::Idle;
        self.order = None;
        self.time_passed = 0;
        self.order_quantity = 0.0;
        self.current_payment = 0.0;
    }
}

impl Consignee for Client {
    fn consignee_id(&self) -> &ComponentId {
        &self.id
    }

    fn quantity_shipped(&mut self, quantity: f64) -> Result<f64, ComponentError> {
        Client::quantity_shipped(self, quantity)
    }
}
