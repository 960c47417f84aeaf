use log::{debug, info};

use crate::core::components::traits::{check_wiring, Consignee, MaterialSource};
use crate::core::components::types::ComponentError;
use crate::core::execution::config::TruckConfig;
use crate::core::types::ComponentId;

/// Delivery cycle of a truck
///
/// The load lives inside `Delivering`, so an available truck carries
/// nothing by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TruckState {
    Available,
    Delivering { load: f64, remaining: u32 },
}

/// A truck that carries finished goods from a machine to the client
#[derive(Debug, Clone)]
pub struct Truck {
    id: ComponentId,
    capacity: f64,
    time_to_deliver: u32,
    state: TruckState,
    source: Option<ComponentId>,
    client: Option<ComponentId>,
}

impl Truck {
    pub fn new(id: ComponentId, config: TruckConfig) -> Self {
        Self {
            id,
            capacity: config.capacity,
            time_to_deliver: config.time_to_deliver,
            state: TruckState::Available,
            source: None,
            client: None,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn state(&self) -> TruckState {
        self.state
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn is_available(&self) -> bool {
        self.state == TruckState::Available
    }

    pub fn current_load(&self) -> f64 {
        match self.state {
            TruckState::Available => 0.0,
            TruckState::Delivering { load, .. } => load,
        }
    }

    pub fn time_remaining(&self) -> u32 {
        match self.state {
            TruckState::Available => 0,
            TruckState::Delivering { remaining, .. } => remaining,
        }
    }

    /// Record the machine shipments are loaded from
    pub fn set_machine(&mut self, machine: ComponentId) {
        self.source = Some(machine);
    }

    /// Record the client shipments are delivered to
    pub fn set_client(&mut self, client: ComponentId) {
        self.client = Some(client);
    }

    /// Load up to capacity from `source` and set off
    ///
    /// Reports `Ok(false)` when the truck is out, not fully wired, or the
    /// source has nothing to load.
    pub fn request_shipment(
        &mut self,
        source: &mut dyn MaterialSource,
    ) -> Result<bool, ComponentError> {
        if !self.is_available() {
            return Ok(false);
        }
        let expected = match (&self.source, &self.client) {
            (Some(machine), Some(_)) => machine,
            _ => return Ok(false),
        };
        check_wiring(&self.id, expected, source.source_id())?;

        let load = source.retrieve_quantity(self.capacity);
        if load <= 0.0 {
            return Ok(false);
        }

        self.state = TruckState::Delivering {
            load,
            remaining: self.time_to_deliver,
        };
        info!(
            "[Truck {}] Loaded {:.3} from {}, delivering in {} ticks",
            self.id, load, expected, self.time_to_deliver
        );
        Ok(true)
    }

    /// Advance by one tick, handing the load to `client` on arrival
    ///
    /// Returns the payment earned when a delivery completes. The truck is
    /// back to available after arrival even if the client rejects the load.
    pub fn step(&mut self, client: &mut dyn Consignee) -> Result<Option<f64>, ComponentError> {
        let (load, remaining) = match self.state {
            TruckState::Available => return Ok(None),
            TruckState::Delivering { load, remaining } => (load, remaining.saturating_sub(1)),
        };

        if remaining > 0 {
            self.state = TruckState::Delivering { load, remaining };
            return Ok(None);
        }

        self.state = TruckState::Available;
        let expected = self.client.as_ref().ok_or_else(|| {
            ComponentError::UnboundConnection(format!("Truck {} has no client", self.id))
        })?;
        check_wiring(&self.id, expected, client.consignee_id())?;

        let payment = client.quantity_shipped(load)?;
        debug!(
            "[Truck {}] Delivered {:.3} to {} for {:.2}",
            self.id, load, expected, payment
        );
        Ok(Some(payment))
    }

    pub fn reset(&mut self) {
        self.state = TruckState::Available;
    }
}
