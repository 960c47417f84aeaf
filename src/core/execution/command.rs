use std::str::FromStr;

use crate::core::components::types::{BatchSize, ComponentError};

/// The commands a controller may issue against the system
///
/// Each variant either asks one entity to start something or advances
/// simulated time. `reset` is deliberately not a `Command`; see [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    M1ProcessingThird,
    M1ProcessingHalf,
    M1ProcessingFull,
    M1Maintenance,
    M2ProcessingThird,
    M2ProcessingHalf,
    M2ProcessingFull,
    M2Maintenance,
    SmallTruckShipment,
    BigTruckShipment,
    Step,
}

impl Command {
    /// The action alphabet, in its fixed order
    pub const ALPHABET: [Command; 11] = [
        Command::M1ProcessingThird,
        Command::M1ProcessingHalf,
        Command::M1ProcessingFull,
        Command::M1Maintenance,
        Command::M2ProcessingThird,
        Command::M2ProcessingHalf,
        Command::M2ProcessingFull,
        Command::M2Maintenance,
        Command::SmallTruckShipment,
        Command::BigTruckShipment,
        Command::Step,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::M1ProcessingThird => "m1_processing_third",
            Command::M1ProcessingHalf => "m1_processing_half",
            Command::M1ProcessingFull => "m1_processing_full",
            Command::M1Maintenance => "m1_maintenance",
            Command::M2ProcessingThird => "m2_processing_third",
            Command::M2ProcessingHalf => "m2_processing_half",
            Command::M2ProcessingFull => "m2_processing_full",
            Command::M2Maintenance => "m2_maintenance",
            Command::SmallTruckShipment => "small_truck_shipment",
            Command::BigTruckShipment => "big_truck_shipment",
            Command::Step => "step",
        }
    }

    /// Batch size for the processing commands
    pub fn batch_size(&self) -> Option<BatchSize> {
        match self {
            Command::M1ProcessingThird | Command::M2ProcessingThird => Some(BatchSize::Third),
            Command::M1ProcessingHalf | Command::M2ProcessingHalf => Some(BatchSize::Half),
            Command::M1ProcessingFull | Command::M2ProcessingFull => Some(BatchSize::Full),
            _ => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALPHABET
            .iter()
            .copied()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| ComponentError::UnknownCommand(s.to_string()))
    }
}

/// Anything the action dispatcher accepts: an alphabet command or `reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Command(Command),
    Reset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Command(command) => command.as_str(),
            Action::Reset => "reset",
        }
    }
}

impl From<Command> for Action {
    fn from(command: Command) -> Self {
        Action::Command(command)
    }
}

impl FromStr for Action {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "reset" {
            Ok(Action::Reset)
        } else {
            s.parse().map(Action::Command)
        }
    }
}
