//! Configuration for the manufacturing-and-delivery simulation
//!
//! Every record carries the default values of the fixed two-machine,
//! two-truck, one-client setup, so `Default::default()` reproduces the
//! reference configuration and callers override only what they need.

use serde::{Deserialize, Serialize};

use crate::core::components::types::{BatchSize, ComponentError, Outcome, Priority};
use crate::core::types::THIRD;

/// Enumeration of supported concurrency modes for batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Episodes run one after another on the calling thread
    Sequential,
    /// Episodes are spread over a Rayon thread pool
    Rayon,
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        ConcurrencyMode::Sequential
    }
}

/// Deadline and unit payments attached to one priority class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderTerms {
    /// Ticks after placement within which a delivery is paid in time
    pub deadline: u32,
    /// Payment per unit delivered within the deadline
    pub in_time_payment: f64,
    /// Payment per unit delivered after the deadline
    pub late_payment: f64,
}

impl OrderTerms {
    pub fn new(deadline: u32, in_time_payment: f64, late_payment: f64) -> Self {
        Self {
            deadline,
            in_time_payment,
            late_payment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityTerms {
    pub low: OrderTerms,
    pub medium: OrderTerms,
    pub high: OrderTerms,
}

impl PriorityTerms {
    pub fn get(&self, priority: Priority) -> &OrderTerms {
        match priority {
            Priority::Low => &self.low,
            Priority::Medium => &self.medium,
            Priority::High => &self.high,
        }
    }

    pub fn get_mut(&mut self, priority: Priority) -> &mut OrderTerms {
        match priority {
            Priority::Low => &mut self.low,
            Priority::Medium => &mut self.medium,
            Priority::High => &mut self.high,
        }
    }
}

impl Default for PriorityTerms {
    fn default() -> Self {
        Self {
            low: OrderTerms::new(20, 5.0, 1.0),
            medium: OrderTerms::new(15, 10.0, 2.0),
            high: OrderTerms::new(10, 15.0, 1.0),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Priority weights, walked in declared order when sampling
    pub priority_distribution: Vec<(Priority, f64)>,
    /// Deadline and payment rates per priority
    pub terms: PriorityTerms,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority_distribution(mut self, distribution: Vec<(Priority, f64)>) -> Self {
        self.priority_distribution = distribution;
        self
    }

    pub fn with_terms(mut self, priority: Priority, terms: OrderTerms) -> Self {
        *self.terms.get_mut(priority) = terms;
        self
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        validate_weights(
            "priority distribution",
            self.priority_distribution.iter().map(|(_, w)| *w),
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            priority_distribution: vec![
                (Priority::Low, 0.4),
                (Priority::Medium, 0.5),
                (Priority::High, 0.1),
            ],
            terms: PriorityTerms::default(),
        }
    }
}

/// Processing duration for each batch size, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDurations {
    pub full: u32,
    pub half: u32,
    pub third: u32,
}

impl BatchDurations {
    pub fn get(&self, batch: BatchSize) -> u32 {
        match batch {
            BatchSize::Full => self.full,
            BatchSize::Half => self.half,
            BatchSize::Third => self.third,
        }
    }
}

impl Default for BatchDurations {
    fn default() -> Self {
        Self {
            full: 3,
            half: 2,
            third: 1,
        }
    }
}

/// Outcome distribution for each batch size
///
/// Each entry lists the possible outcomes with their weights, in the order
/// they are handed to the weighted sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTable {
    pub full: Vec<(Outcome, f64)>,
    pub half: Vec<(Outcome, f64)>,
    pub third: Vec<(Outcome, f64)>,
}

impl OutcomeTable {
    /// Outcomes of a machine that has never been maintained
    pub fn baseline() -> Self {
        Self {
            full: vec![
                (Some(BatchSize::Full), 0.7),
                (Some(BatchSize::Half), 0.05),
                (Some(BatchSize::Third), 0.2),
                (None, 0.05),
            ],
            half: vec![
                (Some(BatchSize::Half), 0.8),
                (Some(BatchSize::Third), 0.15),
                (None, 0.05),
            ],
            third: vec![(Some(BatchSize::Third), 0.85), (None, 0.15)],
        }
    }

    /// Outcomes once maintenance has been carried out
    pub fn improved() -> Self {
        Self {
            full: vec![
                (Some(BatchSize::Full), 0.75),
                (Some(BatchSize::Half), 0.15),
                (Some(BatchSize::Third), 0.05),
                (None, 0.05),
            ],
            half: vec![
                (Some(BatchSize::Half), 0.85),
                (Some(BatchSize::Third), 0.10),
                (None, 0.05),
            ],
            third: vec![(Some(BatchSize::Third), 0.9), (None, 0.1)],
        }
    }

    /// Table where every batch always comes out at its own size
    pub fn lossless() -> Self {
        Self {
            full: vec![(Some(BatchSize::Full), 1.0)],
            half: vec![(Some(BatchSize::Half), 1.0)],
            third: vec![(Some(BatchSize::Third), 1.0)],
        }
    }

    pub fn get(&self, batch: BatchSize) -> &[(Outcome, f64)] {
        match batch {
            BatchSize::Full => &self.full,
            BatchSize::Half => &self.half,
            BatchSize::Third => &self.third,
        }
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        for batch in BatchSize::ALL {
            validate_weights(
                &format!("{} outcome table", batch),
                self.get(batch).iter().map(|(_, w)| *w),
            )?;
        }
        Ok(())
    }
}

/// Machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub processing_times: BatchDurations,
    pub baseline_outcomes: OutcomeTable,
    pub improved_outcomes: OutcomeTable,
    pub maintenance_time: u32,
    /// Operator time charged for every maintenance run
    pub maintenance_operator_cost: u32,
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processing_times(mut self, times: BatchDurations) -> Self {
        self.processing_times = times;
        self
    }

    pub fn with_outcomes(mut self, baseline: OutcomeTable, improved: OutcomeTable) -> Self {
        self.baseline_outcomes = baseline;
        self.improved_outcomes = improved;
        self
    }

    pub fn with_maintenance(mut self, time: u32, operator_cost: u32) -> Self {
        self.maintenance_time = time;
        self.maintenance_operator_cost = operator_cost;
        self
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        self.baseline_outcomes.validate()?;
        self.improved_outcomes.validate()
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            processing_times: BatchDurations::default(),
            baseline_outcomes: OutcomeTable::baseline(),
            improved_outcomes: OutcomeTable::improved(),
            maintenance_time: 2,
            maintenance_operator_cost: 1,
        }
    }
}

/// Truck configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruckConfig {
    /// Largest quantity loaded per delivery
    pub capacity: f64,
    /// Ticks for a full delivery cycle
    pub time_to_deliver: u32,
}

impl TruckConfig {
    pub fn new(capacity: f64, time_to_deliver: u32) -> Self {
        Self {
            capacity,
            time_to_deliver,
        }
    }

    pub fn small() -> Self {
        Self::new(THIRD, 2)
    }

    pub fn big() -> Self {
        Self::new(1.0, 3)
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        if self.capacity.is_finite() && self.capacity > 0.0 {
            Ok(())
        } else {
            Err(ComponentError::InvalidConfiguration(format!(
                "truck capacity must be positive, got {}",
                self.capacity
            )))
        }
    }
}

/// Configuration of the whole two-machine, two-truck, one-client system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub client: ClientConfig,
    pub m1: MachineConfig,
    pub m2: MachineConfig,
    pub small_truck: TruckConfig,
    pub big_truck: TruckConfig,
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Use the same machine configuration for M1 and M2
    pub fn with_machines(mut self, machine: MachineConfig) -> Self {
        self.m1 = machine.clone();
        self.m2 = machine;
        self
    }

    pub fn validate(&self) -> Result<(), ComponentError> {
        self.client.validate()?;
        self.m1.validate()?;
        self.m2.validate()?;
        self.small_truck.validate()?;
        self.big_truck.validate()
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            m1: MachineConfig::default(),
            m2: MachineConfig::default(),
            small_truck: TruckConfig::small(),
            big_truck: TruckConfig::big(),
        }
    }
}

/// Configuration for batch execution of the built-in strategy
///
/// Controls how many seeded episodes are run, how they are spread over
/// threads, and the system every episode is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
    /// Number of episodes to run
    pub episodes: u64,
    /// Seed of the first episode; episode `i` uses `base_seed + i`
    pub base_seed: u64,
    /// Strategy decisions allowed per episode before it is abandoned
    pub max_decisions: u64,
    pub system: SystemConfig,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration uses Sequential mode with no thread pool
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
            episodes: 100,
            base_seed: 0,
            max_decisions: 10_000,
            system: SystemConfig::default(),
        }
    }

    /// Set the concurrency mode for the simulation
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    pub fn with_episodes(mut self, episodes: u64) -> Self {
        self.episodes = episodes;
        self
    }

    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    pub fn with_max_decisions(mut self, max_decisions: u64) -> Self {
        self.max_decisions = max_decisions;
        self
    }

    pub fn with_system(mut self, system: SystemConfig) -> Self {
        self.system = system;
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_weights(
    what: &str,
    weights: impl Iterator<Item = f64>,
) -> Result<(), ComponentError> {
    let mut total = 0.0;
    let mut count = 0;
    for weight in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(ComponentError::InvalidConfiguration(format!(
                "{} has invalid weight {}",
                what, weight
            )));
        }
        total += weight;
        count += 1;
    }
    if count == 0 || total <= 0.0 {
        return Err(ComponentError::InvalidConfiguration(format!(
            "{} needs at least one positive weight",
            what
        )));
    }
    Ok(())
}
