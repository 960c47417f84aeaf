pub mod core;

// Re-export commonly used types
pub use crate::core::components::types::{BatchSize, ComponentError, Priority};
pub use crate::core::execution::config::{
    ClientConfig, MachineConfig, SimulationConfig, SystemConfig, TruckConfig,
};
pub use crate::core::execution::observation::{quantize, Observation};
pub use crate::core::execution::{Action, Command, Completion, StrategyField, System};
pub use crate::core::types::ComponentId;
