use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::types::THIRD;

/// Batch size a machine can be asked to process
///
/// The batch size fixes both the raw input drawn when processing starts
/// and the best output the machine can produce when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSize {
    Full,
    Half,
    Third,
}

impl BatchSize {
    pub const ALL: [BatchSize; 3] = [BatchSize::Full, BatchSize::Half, BatchSize::Third];

    /// Quantity of material this batch represents (1, 1/2 or 1/3)
    pub fn quantity(&self) -> f64 {
        match self {
            BatchSize::Full => 1.0,
            BatchSize::Half => 0.5,
            BatchSize::Third => THIRD,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchSize::Full => "full",
            BatchSize::Half => "half",
            BatchSize::Third => "third",
        }
    }
}

impl std::fmt::Display for BatchSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchSize {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(BatchSize::Full),
            "half" => Ok(BatchSize::Half),
            "third" => Ok(BatchSize::Third),
            other => Err(ComponentError::InvalidBatchSize(other.to_string())),
        }
    }
}

/// Result of a finished processing run: the size actually produced, or
/// `None` when the batch was lost
pub type Outcome = Option<BatchSize>;

/// Quantity added to stored output for an outcome
pub fn outcome_quantity(outcome: Outcome) -> f64 {
    outcome.map_or(0.0, |size| size.quantity())
}

/// Client order urgency tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ComponentError::InvalidConfiguration(format!(
                "unknown priority '{}'",
                other
            ))),
        }
    }
}

/// Error types for entity and orchestrator operations
///
/// These are contract violations by the caller. An entity that merely
/// cannot start right now (busy, short of material) reports `Ok(false)`
/// instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentError {
    /// Operation not allowed in the entity's current state
    InvalidTransition(String),
    /// Shipment quantity is non-positive or would overfill the order
    InvalidQuantity(String),
    /// Batch size name not recognised
    InvalidBatchSize(String),
    /// Configuration values that cannot drive a simulation
    InvalidConfiguration(String),
    /// Entity has a peer recorded but none was supplied for the call
    UnboundConnection(String),
    /// Supplied peer is not the one the entity was wired to
    WiringMismatch(String),
    /// Command name outside the action alphabet
    UnknownCommand(String),
    /// Observation field name not recognised
    UnknownField(String),
}

impl std::fmt::Display for ComponentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentError::InvalidTransition(msg) => write!(f, "Invalid transition: {}", msg),
            ComponentError::InvalidQuantity(msg) => write!(f, "Invalid quantity: {}", msg),
            ComponentError::InvalidBatchSize(msg) => write!(f, "Invalid batch size: {}", msg),
            ComponentError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
            ComponentError::UnboundConnection(msg) => write!(f, "Unbound connection: {}", msg),
            ComponentError::WiringMismatch(msg) => write!(f, "Wiring mismatch: {}", msg),
            ComponentError::UnknownCommand(msg) => write!(f, "Unknown action: {}", msg),
            ComponentError::UnknownField(msg) => write!(f, "Unknown field: {}", msg),
        }
    }
}

impl std::error::Error for ComponentError {}
