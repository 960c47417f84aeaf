pub mod batch;
pub mod command;
pub mod config;
pub mod observation;
pub mod strategy;
pub mod system;

// Re-export commonly used types
pub use batch::{run_batch, run_episode, BatchSummary, EpisodeResult};
pub use command::{Action, Command};
pub use config::{
    BatchDurations, ClientConfig, ConcurrencyMode, MachineConfig, OrderTerms, OutcomeTable,
    PriorityTerms, SimulationConfig, SystemConfig, TruckConfig,
};
pub use observation::{quantize, FieldValue, MachineStatus, Observation, TruckRole, TruckStatus};
pub use strategy::{Completion, DecisionVariables, StrategyField, StrategyOutcome, StrategyReport};
pub use system::System;
