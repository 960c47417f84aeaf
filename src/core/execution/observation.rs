//! The externally visible state of the system.
//!
//! Quantities are discretised to sixths and entity states are reduced to
//! short status tags, giving a bounded observation space for controllers.

use serde::{Serialize, Serializer};

use crate::core::components::client::Client;
use crate::core::components::machine::{Machine, MachineState};
use crate::core::components::truck::{Truck, TruckState};
use crate::core::components::types::{BatchSize, Priority};
use crate::core::types::THIRD;

/// Map a quantity to the nearest lower multiple of 1/6 in [0, 1]
pub fn quantize(value: f64) -> f64 {
    let clamped = value.max(0.0).min(1.0);
    (clamped * 6.0).floor() / 6.0
}

/// Status tag of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    Idle,
    Maintenance,
    Processing(BatchSize),
}

impl MachineStatus {
    pub fn of(machine: &Machine) -> Self {
        match machine.state() {
            MachineState::Idle => MachineStatus::Idle,
            MachineState::Maintenance { .. } => MachineStatus::Maintenance,
            MachineState::Processing { batch, .. } => MachineStatus::Processing(batch),
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MachineStatus::Idle => f.write_str("idle"),
            MachineStatus::Maintenance => f.write_str("maintenance"),
            MachineStatus::Processing(batch) => write!(f, "processing_{}", batch),
        }
    }
}

impl Serialize for MachineStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Which of the two delivery slots a truck fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruckRole {
    Small,
    Big,
}

/// Status tag of a truck, derived from its load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruckStatus {
    Idle,
    ShippingZero,
    ShippingThird,
    ShippingHalf,
    ShippingFull,
}

impl TruckStatus {
    /// The small truck only ever reports `shipping_third` for a non-empty
    /// load; the big truck is tiered by its quantised load.
    pub fn of(truck: &Truck, role: TruckRole) -> Self {
        let load = match truck.state() {
            TruckState::Available => return TruckStatus::Idle,
            TruckState::Delivering { load, .. } => load,
        };

        if role == TruckRole::Small {
            return if load == 0.0 {
                TruckStatus::ShippingZero
            } else {
                TruckStatus::ShippingThird
            };
        }

        let load = quantize(load);
        if load == 0.0 {
            TruckStatus::ShippingZero
        } else if load <= THIRD {
            TruckStatus::ShippingThird
        } else if load <= 2.0 / 3.0 {
            TruckStatus::ShippingHalf
        } else {
            TruckStatus::ShippingFull
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TruckStatus::Idle => "idle",
            TruckStatus::ShippingZero => "shipping_zero",
            TruckStatus::ShippingThird => "shipping_third",
            TruckStatus::ShippingHalf => "shipping_half",
            TruckStatus::ShippingFull => "shipping_full",
        }
    }
}

impl std::fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TruckStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single rendered value in an observation string
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "'{}'", text),
            FieldValue::Float(value) => write!(f, "{:.2}", value),
            FieldValue::Int(value) => write!(f, "{}", value),
            FieldValue::Bool(true) => f.write_str("True"),
            FieldValue::Bool(false) => f.write_str("False"),
        }
    }
}

/// Render `{name:value, name:value, ...}`
pub fn render_fields<'a>(fields: impl IntoIterator<Item = (&'a str, FieldValue)>) -> String {
    let body = fields
        .into_iter()
        .map(|(name, value)| format!("{}:{}", name, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{}}}", body)
}

/// The 13-field observation returned by every system command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub client_current_priority: Option<Priority>,
    pub quantity_shipped_to_the_client: f64,
    /// Ticks left before late payment, or -1 without an open in-time order
    pub time_to_penalty: i64,
    pub m1_status: MachineStatus,
    pub m1_stored: f64,
    pub m1_to_completion: u32,
    pub m2_status: MachineStatus,
    pub m2_stored: f64,
    pub m2_to_completion: u32,
    pub ts_status: TruckStatus,
    pub ts_to_completion: u32,
    pub tb_status: TruckStatus,
    pub tb_to_completion: u32,
}

impl Observation {
    pub const FIELD_NAMES: [&'static str; 13] = [
        "client_current_priority",
        "quantity_shipped_to_the_client",
        "time_to_penalty",
        "m1_status",
        "m1_stored",
        "m1_to_completion",
        "m2_status",
        "m2_stored",
        "m2_to_completion",
        "ts_status",
        "ts_to_completion",
        "tb_status",
        "tb_to_completion",
    ];

    pub fn capture(
        client: &Client,
        m1: &Machine,
        m2: &Machine,
        small_truck: &Truck,
        big_truck: &Truck,
    ) -> Self {
        Self {
            client_current_priority: client.priority(),
            quantity_shipped_to_the_client: quantize(client.order_quantity()),
            time_to_penalty: time_to_penalty(client),
            m1_status: MachineStatus::of(m1),
            m1_stored: quantize(m1.stored_output()),
            m1_to_completion: processing_time_left(m1),
            m2_status: MachineStatus::of(m2),
            m2_stored: quantize(m2.stored_output()),
            m2_to_completion: processing_time_left(m2),
            ts_status: TruckStatus::of(small_truck, TruckRole::Small),
            ts_to_completion: small_truck.time_remaining(),
            tb_status: TruckStatus::of(big_truck, TruckRole::Big),
            tb_to_completion: big_truck.time_remaining(),
        }
    }

    /// Field values in their fixed order
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let priority = self
            .client_current_priority
            .map_or("none", |priority| priority.as_str());
        let values = [
            FieldValue::Text(priority.to_string()),
            FieldValue::Float(self.quantity_shipped_to_the_client),
            FieldValue::Int(self.time_to_penalty),
            FieldValue::Text(self.m1_status.to_string()),
            FieldValue::Float(self.m1_stored),
            FieldValue::Int(self.m1_to_completion.into()),
            FieldValue::Text(self.m2_status.to_string()),
            FieldValue::Float(self.m2_stored),
            FieldValue::Int(self.m2_to_completion.into()),
            FieldValue::Text(self.ts_status.to_string()),
            FieldValue::Int(self.ts_to_completion.into()),
            FieldValue::Text(self.tb_status.to_string()),
            FieldValue::Int(self.tb_to_completion.into()),
        ];
        Self::FIELD_NAMES.into_iter().zip(values).collect()
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_fields(self.fields()))
    }
}

fn time_to_penalty(client: &Client) -> i64 {
    match client.deadline() {
        Some(deadline) if client.state().is_active() && client.time_passed() <= deadline => {
            i64::from(deadline) - i64::from(client.time_passed())
        }
        _ => -1,
    }
}

/// Only processing runs report their countdown; maintenance shows 0
fn processing_time_left(machine: &Machine) -> u32 {
    match machine.state() {
        MachineState::Processing { remaining, .. } => remaining,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::{MachineConfig, TruckConfig};
    use crate::core::types::ComponentId;
    use rand::rngs::mock::StepRng;

    /// A truck of `capacity` loaded from a machine holding one full unit
    fn loaded_truck(capacity: f64) -> Truck {
        let mut machine = Machine::new(ComponentId::machine("M2"), MachineConfig::default());
        let mut rng = StepRng::new(0, 0);
        machine.request_processing(BatchSize::Full, None).unwrap();
        while machine.step(&mut rng).unwrap().is_none() {}

        let mut truck = Truck::new(ComponentId::truck("t"), TruckConfig::new(capacity, 2));
        truck.set_machine(ComponentId::machine("M2"));
        truck.set_client(ComponentId::client("client"));
        assert!(truck.request_shipment(&mut machine).unwrap());
        truck
    }

    #[test]
    fn test_quantize_buckets() {
        assert_eq!(quantize(0.0), 0.0);
        assert_eq!(quantize(0.1), 0.0);
        assert_eq!(quantize(1.0 / 6.0), 1.0 / 6.0);
        assert_eq!(quantize(THIRD), 2.0 / 6.0);
        assert_eq!(quantize(0.5), 3.0 / 6.0);
        assert_eq!(quantize(0.99), 5.0 / 6.0);
        assert_eq!(quantize(1.0), 1.0);
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(-0.5), 0.0);
        assert_eq!(quantize(3.7), 1.0);
        assert_eq!(quantize(f64::NAN), 0.0);
    }

    #[test]
    fn test_quantize_properties() {
        let mut previous = quantize(0.0);
        for i in 0..=1000 {
            let q = i as f64 / 1000.0;
            let bucket = quantize(q);
            assert!(bucket <= q, "quantize({}) = {} exceeds input", q, bucket);
            assert!(bucket >= previous, "quantize not monotonic at {}", q);
            let sixths = bucket * 6.0;
            assert!((sixths - sixths.round()).abs() < 1e-12);
            previous = bucket;
        }
    }

    #[test]
    fn test_field_value_rendering() {
        assert_eq!(FieldValue::Text("idle".to_string()).to_string(), "'idle'");
        assert_eq!(FieldValue::Float(1.0 / 3.0).to_string(), "0.33");
        assert_eq!(FieldValue::Int(-1).to_string(), "-1");
        assert_eq!(FieldValue::Bool(true).to_string(), "True");
    }

    #[test]
    fn test_render_fields() {
        let rendered = render_fields(vec![
            ("a", FieldValue::Int(3)),
            ("b", FieldValue::Text("x".to_string())),
        ]);
        assert_eq!(rendered, "{a:3, b:'x'}");
        assert_eq!(render_fields(Vec::new()), "{}");
    }

    #[test]
    fn test_machine_status_tags() {
        assert_eq!(MachineStatus::Idle.to_string(), "idle");
        assert_eq!(MachineStatus::Maintenance.to_string(), "maintenance");
        assert_eq!(
            MachineStatus::Processing(BatchSize::Half).to_string(),
            "processing_half"
        );
    }

    #[test]
    fn test_truck_status_follows_role_not_capacity() {
        let truck = loaded_truck(1.0);
        assert_eq!(TruckStatus::of(&truck, TruckRole::Small), TruckStatus::ShippingThird);
        assert_eq!(TruckStatus::of(&truck, TruckRole::Big), TruckStatus::ShippingFull);

        let truck = loaded_truck(0.5);
        assert_eq!(TruckStatus::of(&truck, TruckRole::Big), TruckStatus::ShippingHalf);
        assert_eq!(TruckStatus::of(&truck, TruckRole::Small), TruckStatus::ShippingThird);
    }
}
