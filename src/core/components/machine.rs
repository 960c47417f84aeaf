//! Machines turn raw input into stored output, one batch at a time.

use log::{debug, info};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::core::components::traits::{check_wiring, MaterialSource};
use crate::core::components::types::{outcome_quantity, BatchSize, ComponentError, Outcome};
use crate::core::execution::config::MachineConfig;
use crate::core::types::{ComponentId, QUANTITY_EPSILON};

/// Activity of a machine; exactly one at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Idle,
    Processing { batch: BatchSize, remaining: u32 },
    Maintenance { remaining: u32 },
}

/// What a call to [`Machine::step`] finished, if anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineEvent {
    BatchCompleted { batch: BatchSize, outcome: Outcome },
    MaintenanceCompleted,
}

/// A processing machine with a probabilistic outcome per batch
///
/// Without a source machine the raw input is unlimited and only counted in
/// `raw_material_consumed`. With one, every batch pulls its input from the
/// source's stored output.
#[derive(Debug, Clone)]
pub struct Machine {
    id: ComponentId,
    config: MachineConfig,
    state: MachineState,
    stored_output: f64,
    source: Option<ComponentId>,
    raw_material_consumed: f64,
    maintenance_active: bool,
    total_operator_time: u32,
}

impl Machine {
    pub fn new(id: ComponentId, config: MachineConfig) -> Self {
        Self {
            id,
            config,
            state: MachineState::Idle,
            stored_output: 0.0,
            source: None,
            raw_material_consumed: 0.0,
            maintenance_active: false,
            total_operator_time: 0,
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == MachineState::Idle
    }

    pub fn is_under_maintenance(&self) -> bool {
        matches!(self.state, MachineState::Maintenance { .. })
    }

    /// Batch being processed, if any
    pub fn current_batch_size(&self) -> Option<BatchSize> {
        match self.state {
            MachineState::Processing { batch, .. } => Some(batch),
            _ => None,
        }
    }

    /// Ticks left on the current processing or maintenance run
    pub fn time_remaining(&self) -> u32 {
        match self.state {
            MachineState::Idle => 0,
            MachineState::Processing { remaining, .. } => remaining,
            MachineState::Maintenance { remaining } => remaining,
        }
    }

    pub fn stored_output(&self) -> f64 {
        self.stored_output
    }

    pub fn source_machine(&self) -> Option<&ComponentId> {
        self.source.as_ref()
    }

    pub fn raw_material_consumed(&self) -> f64 {
        self.raw_material_consumed
    }

    /// Set once the first maintenance run completes, never cleared except by reset
    pub fn maintenance_active(&self) -> bool {
        self.maintenance_active
    }

    pub fn total_operator_time(&self) -> u32 {
        self.total_operator_time
    }

    /// Record the upstream machine this one pulls its input from
    pub fn set_source_machine(&mut self, source: ComponentId) {
        self.source = Some(source);
    }

    /// Take `min(max_quantity, stored_output)` from stored output
    ///
    /// A residue below `QUANTITY_EPSILON` left behind is rounding dust and
    /// is cleared rather than kept as stock.
    pub fn retrieve_quantity(&mut self, max_quantity: f64) -> f64 {
        let quantity = max_quantity.min(self.stored_output).max(0.0);
        self.stored_output -= quantity;
        if self.stored_output < QUANTITY_EPSILON {
            self.stored_output = 0.0;
        }
        quantity
    }

    /// Start maintenance if idle
    pub fn request_maintenance(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }

        self.state = MachineState::Maintenance {
            remaining: self.config.maintenance_time,
        };
        self.total_operator_time += self.config.maintenance_operator_cost;
        info!(
            "[Machine {}] Maintenance started ({} ticks)",
            self.id, self.config.maintenance_time
        );
        true
    }

    /// Start processing a batch if idle and enough input is available
    ///
    /// `upstream` must be the machine recorded with
    /// [`set_source_machine`](Self::set_source_machine) when one was set, and
    /// `None` otherwise. Input is pulled from the source before the
    /// sufficiency check: a short retrieval is consumed and the request
    /// reports `Ok(false)`.
    pub fn request_processing(
        &mut self,
        batch: BatchSize,
        upstream: Option<&mut dyn MaterialSource>,
    ) -> Result<bool, ComponentError> {
        if !self.is_idle() {
            return Ok(false);
        }

        let needed = batch.quantity();
        match (&self.source, upstream) {
            (Some(expected), Some(source)) => {
                check_wiring(&self.id, expected, source.source_id())?;
                let available = source.retrieve_quantity(needed);
                if available + QUANTITY_EPSILON < needed {
                    debug!(
                        "[Machine {}] Needed {:.3} from {} but got {:.3}",
                        self.id, needed, expected, available
                    );
                    return Ok(false);
                }
            }
            (Some(expected), None) => {
                return Err(ComponentError::UnboundConnection(format!(
                    "Machine {} pulls from {} but no source was supplied",
                    self.id, expected
                )));
            }
            (None, Some(source)) => {
                return Err(ComponentError::WiringMismatch(format!(
                    "Machine {} has no source but was given {}",
                    self.id,
                    source.source_id()
                )));
            }
            (None, None) => {
                self.raw_material_consumed += needed;
            }
        }

        let remaining = self.config.processing_times.get(batch);
        self.state = MachineState::Processing { batch, remaining };
        debug!(
            "[Machine {}] Processing {} batch ({} ticks)",
            self.id, batch, remaining
        );
        Ok(true)
    }

    /// Advance by one tick, sampling the batch outcome on completion
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<MachineEvent>, ComponentError> {
        match self.state {
            MachineState::Idle => Ok(None),
            MachineState::Processing { batch, remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.state = MachineState::Processing { batch, remaining };
                    return Ok(None);
                }

                self.state = MachineState::Idle;
                let outcome = self.sample_outcome(batch, rng)?;
                self.stored_output += outcome_quantity(outcome);
                info!(
                    "[Machine {}] Finished {} batch with outcome {}, stored {:.3}",
                    self.id,
                    batch,
                    outcome.map_or("none", |size| size.as_str()),
                    self.stored_output
                );
                Ok(Some(MachineEvent::BatchCompleted { batch, outcome }))
            }
            MachineState::Maintenance { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.state = MachineState::Maintenance { remaining };
                    return Ok(None);
                }

                self.state = MachineState::Idle;
                self.maintenance_active = true;
                info!("[Machine {}] Maintenance completed", self.id);
                Ok(Some(MachineEvent::MaintenanceCompleted))
            }
        }
    }

    fn sample_outcome<R: Rng + ?Sized>(
        &self,
        batch: BatchSize,
        rng: &mut R,
    ) -> Result<Outcome, ComponentError> {
        let table = if self.maintenance_active {
            &self.config.improved_outcomes
        } else {
            &self.config.baseline_outcomes
        };
        let entries = table.get(batch);

        let index = WeightedIndex::new(entries.iter().map(|(_, weight)| *weight)).map_err(|e| {
            ComponentError::InvalidConfiguration(format!(
                "Machine {} {} outcome table: {}",
                self.id, batch, e
            ))
        })?;

        Ok(entries[index.sample(rng)].0)
    }

    /// Return to the initial idle, unmaintained, empty state
    pub fn reset(&mut self) {
        self.state = MachineState::Idle;
        self.stored_output = 0.0;
        self.raw_material_consumed = 0.0;
        self.maintenance_active = false;
        self.total_operator_time = 0;
    }
}

impl MaterialSource for Machine {
    fn source_id(&self) -> &ComponentId {
        &self.id
    }

    fn retrieve_quantity(&mut self, max_quantity: f64) -> f64 {
        Machine::retrieve_quantity(self, max_quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::OutcomeTable;
    use crate::core::types::THIRD;
    use rand::rngs::mock::StepRng;

    fn machine(id: &str) -> Machine {
        Machine::new(ComponentId::machine(id), MachineConfig::default())
    }

    /// Zero draws pick the first entry of every outcome table
    fn first_outcome() -> StepRng {
        StepRng::new(0, 0)
    }

    #[test]
    fn test_full_batch_runs_three_ticks() {
        let mut m1 = machine("M1");
        let mut rng = first_outcome();

        assert!(m1.request_processing(BatchSize::Full, None).unwrap());
        assert_eq!(m1.current_batch_size(), Some(BatchSize::Full));
        assert_eq!(m1.time_remaining(), 3);
        assert_eq!(m1.raw_material_consumed(), 1.0);

        assert_eq!(m1.step(&mut rng).unwrap(), None);
        assert_eq!(m1.step(&mut rng).unwrap(), None);
        let event = m1.step(&mut rng).unwrap();

        assert_eq!(
            event,
            Some(MachineEvent::BatchCompleted {
                batch: BatchSize::Full,
                outcome: Some(BatchSize::Full)
            })
        );
        assert!(m1.is_idle());
        assert_eq!(m1.stored_output(), 1.0);
    }

    #[test]
    fn test_busy_machine_refuses_requests() {
        let mut m1 = machine("M1");
        assert!(m1.request_processing(BatchSize::Third, None).unwrap());
        assert!(!m1.request_processing(BatchSize::Full, None).unwrap());
        assert!(!m1.request_maintenance());
        assert_eq!(m1.raw_material_consumed(), THIRD);
    }

    #[test]
    fn test_maintenance_is_permanent() {
        let mut m1 = machine("M1");
        let mut rng = first_outcome();

        assert!(m1.request_maintenance());
        assert!(m1.is_under_maintenance());
        assert_eq!(m1.total_operator_time(), 1);
        m1.step(&mut rng).unwrap();
        assert!(!m1.maintenance_active());
        assert_eq!(
            m1.step(&mut rng).unwrap(),
            Some(MachineEvent::MaintenanceCompleted)
        );
        assert!(m1.is_idle());
        assert!(m1.maintenance_active());

        m1.request_processing(BatchSize::Third, None).unwrap();
        m1.step(&mut rng).unwrap();
        assert!(m1.maintenance_active());
    }

    #[test]
    fn test_improved_table_used_after_maintenance() {
        // Baseline always loses the batch, improved always keeps it
        let config = MachineConfig::new().with_outcomes(
            OutcomeTable {
                full: vec![(None, 1.0)],
                half: vec![(None, 1.0)],
                third: vec![(None, 1.0)],
            },
            OutcomeTable::lossless(),
        );
        let mut m = Machine::new(ComponentId::machine("M"), config);
        let mut rng = first_outcome();

        m.request_processing(BatchSize::Half, None).unwrap();
        m.step(&mut rng).unwrap();
        m.step(&mut rng).unwrap();
        assert_eq!(m.stored_output(), 0.0);

        m.request_maintenance();
        m.step(&mut rng).unwrap();
        m.step(&mut rng).unwrap();

        m.request_processing(BatchSize::Half, None).unwrap();
        m.step(&mut rng).unwrap();
        m.step(&mut rng).unwrap();
        assert_eq!(m.stored_output(), 0.5);
    }

    #[test]
    fn test_pulls_from_source_machine() {
        let mut m1 = machine("M1");
        let mut m2 = machine("M2");
        m2.set_source_machine(m1.id().clone());
        let mut rng = first_outcome();

        m1.request_processing(BatchSize::Full, None).unwrap();
        for _ in 0..3 {
            m1.step(&mut rng).unwrap();
        }

        assert!(m2
            .request_processing(BatchSize::Third, Some(&mut m1))
            .unwrap());
        assert!((m1.stored_output() - 2.0 * THIRD).abs() < 1e-12);
        assert_eq!(m2.raw_material_consumed(), 0.0);
    }

    #[test]
    fn test_shortfall_consumes_and_fails() {
        let mut m1 = machine("M1");
        let mut m2 = machine("M2");
        m2.set_source_machine(m1.id().clone());
        let mut rng = first_outcome();

        m1.request_processing(BatchSize::Half, None).unwrap();
        m1.step(&mut rng).unwrap();
        m1.step(&mut rng).unwrap();
        assert_eq!(m1.stored_output(), 0.5);

        assert!(!m2.request_processing(BatchSize::Full, Some(&mut m1)).unwrap());
        assert!(m2.is_idle());
        assert_eq!(m1.stored_output(), 0.0);
    }

    #[test]
    fn test_wiring_is_checked() {
        let mut m1 = machine("M1");
        let mut other = machine("X");
        let mut m2 = machine("M2");
        m2.set_source_machine(m1.id().clone());

        assert!(matches!(
            m2.request_processing(BatchSize::Third, None),
            Err(ComponentError::UnboundConnection(_))
        ));
        assert!(matches!(
            m2.request_processing(BatchSize::Third, Some(&mut other)),
            Err(ComponentError::WiringMismatch(_))
        ));
        assert!(matches!(
            m1.request_processing(BatchSize::Third, Some(&mut other)),
            Err(ComponentError::WiringMismatch(_))
        ));
        assert!(m2.is_idle());
    }

    #[test]
    fn test_retrieve_quantity_is_bounded() {
        let mut m = machine("M");
        assert_eq!(m.retrieve_quantity(1.0), 0.0);

        m.stored_output = 0.5;
        assert_eq!(m.retrieve_quantity(THIRD), THIRD);
        let rest = m.retrieve_quantity(THIRD);
        assert!((rest - (0.5 - THIRD)).abs() < 1e-12);
        assert_eq!(m.stored_output(), 0.0);
    }

    #[test]
    fn test_retrieve_sweeps_rounding_residue() {
        let mut m = machine("M");
        m.stored_output = THIRD + THIRD + THIRD;
        m.retrieve_quantity(THIRD);
        m.retrieve_quantity(THIRD);
        assert!(m.retrieve_quantity(THIRD) <= THIRD);
        assert_eq!(m.stored_output(), 0.0);
    }

    #[test]
    fn test_retrieve_never_exceeds_request() {
        let mut m = machine("M");
        m.stored_output = 0.5;

        let requested = 0.5 - 5e-10;
        assert_eq!(m.retrieve_quantity(requested), requested);
        assert_eq!(m.stored_output(), 0.0);

        m.stored_output = 0.5;
        assert_eq!(m.retrieve_quantity(0.25), 0.25);
        assert_eq!(m.stored_output(), 0.25);
    }

    #[test]
    fn test_reset() {
        let mut m = machine("M");
        let mut rng = first_outcome();
        m.request_maintenance();
        m.step(&mut rng).unwrap();
        m.step(&mut rng).unwrap();
        m.request_processing(BatchSize::Full, None).unwrap();

        m.reset();
        assert!(m.is_idle());
        assert!(!m.maintenance_active());
        assert_eq!(m.raw_material_consumed(), 0.0);
        assert_eq!(m.total_operator_time(), 0);
        assert_eq!(m.time_remaining(), 0);
    }
}
