use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::components::client::Client;
use crate::core::components::machine::Machine;
use crate::core::components::truck::Truck;
use crate::core::components::types::{BatchSize, ComponentError};
use crate::core::execution::command::{Action, Command};
use crate::core::execution::config::SystemConfig;
use crate::core::execution::observation::Observation;
use crate::core::types::ComponentId;

/// The fixed manufacturing-and-delivery system
///
/// Owns one client, two chained machines (M1 feeds M2, M1 has unlimited raw
/// material) and two trucks that both load from M2 and deliver to the
/// client. Every command returns the resulting [`Observation`]; commands an
/// entity refuses are no-ops, so controllers can fire any command at any time
/// and watch what changed.
///
/// Randomness comes from `R`. Use [`System::with_seed`] or
/// [`System::with_config`] for reproducible runs.
pub struct System<R: Rng = StdRng> {
    client: Client,
    m1: Machine,
    m2: Machine,
    small_truck: Truck,
    big_truck: Truck,
    rng: R,
    current_tick: u64,
}

impl System<StdRng> {
    /// Default configuration seeded from system entropy
    pub fn new() -> Self {
        Self::build(SystemConfig::default(), StdRng::from_entropy())
    }

    /// Default configuration with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self::build(SystemConfig::default(), StdRng::seed_from_u64(seed))
    }
}

impl Default for System<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> System<R> {
    /// Build a system from a validated configuration and a random source
    pub fn with_config(config: SystemConfig, rng: R) -> Result<Self, ComponentError> {
        config.validate()?;
        Ok(Self::build(config, rng))
    }

    fn build(config: SystemConfig, rng: R) -> Self {
        let client = Client::new(ComponentId::client("Client"), config.client);
        let m1 = Machine::new(ComponentId::machine("M1"), config.m1);
        let mut m2 = Machine::new(ComponentId::machine("M2"), config.m2);
        m2.set_source_machine(m1.id().clone());

        let mut small_truck = Truck::new(ComponentId::truck("Small Truck"), config.small_truck);
        let mut big_truck = Truck::new(ComponentId::truck("Big Truck"), config.big_truck);
        for truck in [&mut small_truck, &mut big_truck] {
            truck.set_machine(m2.id().clone());
            truck.set_client(client.id().clone());
        }

        let mut system = Self {
            client,
            m1,
            m2,
            small_truck,
            big_truck,
            rng,
            current_tick: 0,
        };
        system.open_order();
        system
    }

    /// Place a fresh order and start M1 on a full batch
    fn open_order(&mut self) {
        match self.client.place_order(&mut self.rng) {
            Ok(priority) => {
                info!("[System] New {} priority order", priority);
                self.m1_processing_full();
            }
            Err(e) => warn!("[System] Could not place order: {}", e),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn m1(&self) -> &Machine {
        &self.m1
    }

    pub fn m2(&self) -> &Machine {
        &self.m2
    }

    pub fn small_truck(&self) -> &Truck {
        &self.small_truck
    }

    pub fn big_truck(&self) -> &Truck {
        &self.big_truck
    }

    /// Ticks advanced since construction or the last reset
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Current discretised observation
    pub fn get_state(&self) -> Observation {
        Observation::capture(
            &self.client,
            &self.m1,
            &self.m2,
            &self.small_truck,
            &self.big_truck,
        )
    }

    /// Issue one command and return the resulting observation
    ///
    /// A command the target entity refuses, or rejects with an error, leaves
    /// the system unchanged.
    pub fn execute(&mut self, command: Command) -> Observation {
        let result = match command {
            Command::M1ProcessingThird | Command::M1ProcessingHalf | Command::M1ProcessingFull => {
                batch_of(command).and_then(|batch| self.m1.request_processing(batch, None))
            }
            Command::M1Maintenance => Ok(self.m1.request_maintenance()),
            Command::M2ProcessingThird | Command::M2ProcessingHalf | Command::M2ProcessingFull => {
                batch_of(command)
                    .and_then(|batch| self.m2.request_processing(batch, Some(&mut self.m1)))
            }
            Command::M2Maintenance => Ok(self.m2.request_maintenance()),
            Command::SmallTruckShipment => self.small_truck.request_shipment(&mut self.m2),
            Command::BigTruckShipment => self.big_truck.request_shipment(&mut self.m2),
            Command::Step => return self.step(),
        };

        match result {
            Ok(true) => debug!("[System] {} started", command),
            Ok(false) => debug!("[System] {} had no effect", command),
            Err(e) => warn!("[System] {} failed: {}", command, e),
        }
        self.get_state()
    }

    pub fn m1_processing_third(&mut self) -> Observation {
        self.execute(Command::M1ProcessingThird)
    }

    pub fn m1_processing_half(&mut self) -> Observation {
        self.execute(Command::M1ProcessingHalf)
    }

    pub fn m1_processing_full(&mut self) -> Observation {
        self.execute(Command::M1ProcessingFull)
    }

    pub fn m1_maintenance(&mut self) -> Observation {
        self.execute(Command::M1Maintenance)
    }

    pub fn m2_processing_third(&mut self) -> Observation {
        self.execute(Command::M2ProcessingThird)
    }

    pub fn m2_processing_half(&mut self) -> Observation {
        self.execute(Command::M2ProcessingHalf)
    }

    pub fn m2_processing_full(&mut self) -> Observation {
        self.execute(Command::M2ProcessingFull)
    }

    pub fn m2_maintenance(&mut self) -> Observation {
        self.execute(Command::M2Maintenance)
    }

    pub fn small_truck_shipment(&mut self) -> Observation {
        self.execute(Command::SmallTruckShipment)
    }

    pub fn big_truck_shipment(&mut self) -> Observation {
        self.execute(Command::BigTruckShipment)
    }

    /// Advance every entity by one tick
    ///
    /// Order is fixed: M1, M2, small truck, big truck, client. Output a
    /// machine finishes this tick is stored before the trucks step, but
    /// trucks only load on a shipment command, so it is picked up at the
    /// earliest by the next command.
    pub fn step(&mut self) -> Observation {
        self.current_tick += 1;

        let result = self.m1.step(&mut self.rng);
        discard(self.m1.id(), result);
        let result = self.m2.step(&mut self.rng);
        discard(self.m2.id(), result);
        let result = self.small_truck.step(&mut self.client);
        discard(self.small_truck.id(), result);
        let result = self.big_truck.step(&mut self.client);
        discard(self.big_truck.id(), result);
        self.client.step_time();

        self.get_state()
    }

    /// Reset every entity, place a new order, and start M1 again
    pub fn reset(&mut self) -> Observation {
        self.client.reset();
        self.m1.reset();
        self.m2.reset();
        self.small_truck.reset();
        self.big_truck.reset();
        self.current_tick = 0;

        self.open_order();
        self.get_state()
    }

    /// Dispatch an action
    pub fn perform(&mut self, action: Action) -> Observation {
        match action {
            Action::Command(command) => self.execute(command),
            Action::Reset => self.reset(),
        }
    }

    /// Dispatch an action by name
    ///
    /// Accepts the alphabet entries and `reset`; any other name is an error
    /// and leaves the system untouched.
    pub fn action(&mut self, name: &str) -> Result<Observation, ComponentError> {
        let action: Action = name.parse()?;
        Ok(self.perform(action))
    }

    /// Like [`action`](Self::action) but renders the observation as
    /// `{name:value, ...}`
    pub fn action_repr(&mut self, name: &str) -> Result<String, ComponentError> {
        self.action(name).map(|observation| observation.to_string())
    }

    /// The command names a controller may issue, excluding `reset`
    pub fn alphabet(&self) -> Vec<&'static str> {
        Command::ALPHABET.iter().map(|command| command.as_str()).collect()
    }
}

fn batch_of(command: Command) -> Result<BatchSize, ComponentError> {
    command
        .batch_size()
        .ok_or_else(|| ComponentError::InvalidBatchSize(command.to_string()))
}

fn discard<T>(entity: &ComponentId, result: Result<T, ComponentError>) {
    if let Err(e) = result {
        warn!("[{} {}] Step failed: {}", entity.kind(), entity, e);
    }
}
