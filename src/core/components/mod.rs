pub mod client;
pub mod machine;
pub mod traits;
pub mod truck;
pub mod types;

// Re-export commonly used types
pub use client::{Client, ClientState};
pub use machine::{Machine, MachineEvent, MachineState};
pub use traits::{Consignee, MaterialSource};
pub use truck::{Truck, TruckState};
pub use types::{BatchSize, ComponentError, Outcome, Priority};
