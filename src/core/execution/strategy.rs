//! Built-in greedy control policy.
//!
//! Each call either reports that the order is complete or picks exactly one
//! command by walking a fixed list of rules, executes it, and reports the
//! resulting observation together with the variables the decision used.

use rand::Rng;
use std::str::FromStr;

use crate::core::components::types::{ComponentError, Priority};
use crate::core::execution::command::Command;
use crate::core::execution::observation::{render_fields, FieldValue, Observation};
use crate::core::execution::system::System;

/// Terminal result of an order: whether it finished in time, and its priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Completion {
    pub on_time: bool,
    pub priority: Priority,
}

impl Completion {
    /// Human readable label, e.g. `On Time Medium Priority`
    pub fn label(&self) -> String {
        let timing = if self.on_time { "On Time" } else { "Late" };
        let priority = match self.priority {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        };
        format!("{} {} Priority", timing, priority)
    }
}

/// Renders the terminal string `Completed <True|False> <priority>`
impl std::fmt::Display for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Completed {} {}",
            FieldValue::Bool(self.on_time),
            self.priority
        )
    }
}

impl FromStr for Completion {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ComponentError::InvalidTransition(format!("not a completion: '{}'", s));
        let mut parts = s.split_whitespace();
        if parts.next() != Some("Completed") {
            return Err(invalid());
        }
        let on_time = match parts.next() {
            Some("True") => true,
            Some("False") => false,
            _ => return Err(invalid()),
        };
        let priority = parts.next().ok_or_else(invalid)?.parse()?;
        Ok(Self { on_time, priority })
    }
}

/// Fields a strategy report can include, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyField {
    ClientCurrentPriority,
    QuantityShippedToTheClient,
    TimeToPenalty,
    M1Status,
    M1Stored,
    M1ToCompletion,
    M2Status,
    M2Stored,
    M2ToCompletion,
    TsStatus,
    TsToCompletion,
    TbStatus,
    TbToCompletion,
    CommandExecuted,
    CurrentRevenue,
    M1Running,
    M2Running,
    TsRunning,
    TbRunning,
    M1MaintenanceActive,
    M2MaintenanceActive,
    ProcessingM2Amount,
    ShippedM2Amount,
    ClientQuantity,
    TotalMaterial,
}

impl StrategyField {
    pub const ALL: [StrategyField; 25] = [
        StrategyField::ClientCurrentPriority,
        StrategyField::QuantityShippedToTheClient,
        StrategyField::TimeToPenalty,
        StrategyField::M1Status,
        StrategyField::M1Stored,
        StrategyField::M1ToCompletion,
        StrategyField::M2Status,
        StrategyField::M2Stored,
        StrategyField::M2ToCompletion,
        StrategyField::TsStatus,
        StrategyField::TsToCompletion,
        StrategyField::TbStatus,
        StrategyField::TbToCompletion,
        StrategyField::CommandExecuted,
        StrategyField::CurrentRevenue,
        StrategyField::M1Running,
        StrategyField::M2Running,
        StrategyField::TsRunning,
        StrategyField::TbRunning,
        StrategyField::M1MaintenanceActive,
        StrategyField::M2MaintenanceActive,
        StrategyField::ProcessingM2Amount,
        StrategyField::ShippedM2Amount,
        StrategyField::ClientQuantity,
        StrategyField::TotalMaterial,
    ];

    /// Fields reported when no selection is given: the plain observation
    pub fn base() -> &'static [StrategyField] {
        &Self::ALL[..Observation::FIELD_NAMES.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyField::ClientCurrentPriority => "client_current_priority",
            StrategyField::QuantityShippedToTheClient => "quantity_shipped_to_the_client",
            StrategyField::TimeToPenalty => "time_to_penalty",
            StrategyField::M1Status => "m1_status",
            StrategyField::M1Stored => "m1_stored",
            StrategyField::M1ToCompletion => "m1_to_completion",
            StrategyField::M2Status => "m2_status",
            StrategyField::M2Stored => "m2_stored",
            StrategyField::M2ToCompletion => "m2_to_completion",
            StrategyField::TsStatus => "ts_status",
            StrategyField::TsToCompletion => "ts_to_completion",
            StrategyField::TbStatus => "tb_status",
            StrategyField::TbToCompletion => "tb_to_completion",
            StrategyField::CommandExecuted => "command_executed",
            StrategyField::CurrentRevenue => "current_revenue",
            StrategyField::M1Running => "m1_running",
            StrategyField::M2Running => "m2_running",
            StrategyField::TsRunning => "ts_running",
            StrategyField::TbRunning => "tb_running",
            StrategyField::M1MaintenanceActive => "m1_maintenance_active",
            StrategyField::M2MaintenanceActive => "m2_maintenance_active",
            StrategyField::ProcessingM2Amount => "processing_m2_amount",
            StrategyField::ShippedM2Amount => "shipped_m2_amount",
            StrategyField::ClientQuantity => "client_quantity",
            StrategyField::TotalMaterial => "total_material",
        }
    }
}

impl FromStr for StrategyField {
    type Err = ComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ComponentError::UnknownField(s.to_string()))
    }
}

/// Decision inputs, sampled before the chosen command runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionVariables {
    pub m1_running: bool,
    pub m2_running: bool,
    pub ts_running: bool,
    pub tb_running: bool,
    /// Maintained, or under maintenance right now
    pub m1_maintenance_active: bool,
    pub m2_maintenance_active: bool,
    pub m1_stored: f64,
    pub m2_stored: f64,
    /// Input M2 is currently processing
    pub processing_m2_amount: f64,
    /// Load on both trucks
    pub shipped_m2_amount: f64,
    pub client_quantity: f64,
    pub total_material: f64,
}

impl DecisionVariables {
    pub fn sample<R: Rng>(system: &System<R>) -> Self {
        let m1 = system.m1();
        let m2 = system.m2();
        let small = system.small_truck();
        let big = system.big_truck();

        let processing_m2_amount = m2.current_batch_size().map_or(0.0, |b| b.quantity());
        let shipped_m2_amount = small.current_load() + big.current_load();
        let client_quantity = system.client().order_quantity();

        Self {
            m1_running: !m1.is_idle(),
            m2_running: !m2.is_idle(),
            ts_running: !small.is_available(),
            tb_running: !big.is_available(),
            m1_maintenance_active: m1.maintenance_active() || m1.is_under_maintenance(),
            m2_maintenance_active: m2.maintenance_active() || m2.is_under_maintenance(),
            m1_stored: m1.stored_output(),
            m2_stored: m2.stored_output(),
            processing_m2_amount,
            shipped_m2_amount,
            client_quantity,
            total_material: m1.stored_output()
                + processing_m2_amount
                + m2.stored_output()
                + shipped_m2_amount
                + client_quantity,
        }
    }

    /// First matching rule wins; nothing matching means advance time
    pub fn choose_command(&self) -> Command {
        let order_open = self.client_quantity < 1.0;

        if !self.m2_maintenance_active {
            Command::M2Maintenance
        } else if !self.m2_running && self.m1_stored > 0.0 && order_open {
            Command::M2ProcessingThird
        } else if !self.m1_running && !self.m1_maintenance_active && order_open {
            Command::M1Maintenance
        } else if !self.m1_running && order_open {
            Command::M1ProcessingFull
        } else if !self.ts_running && self.m2_stored > 0.0 {
            Command::SmallTruckShipment
        } else if !self.ts_running && !self.tb_running && self.m2_stored > 0.0 {
            Command::BigTruckShipment
        } else {
            Command::Step
        }
    }
}

/// What one strategy decision did and saw
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    /// Observation after the command ran
    pub observation: Observation,
    pub command: Command,
    /// Payment accrued after the command ran
    pub current_revenue: f64,
    pub decision: DecisionVariables,
}

impl StrategyReport {
    /// All fields in their canonical order
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        let d = &self.decision;
        let mut fields = self.observation.fields();
        fields.extend([
            (
                StrategyField::CommandExecuted.as_str(),
                FieldValue::Text(self.command.as_str().to_string()),
            ),
            (
                StrategyField::CurrentRevenue.as_str(),
                FieldValue::Float(self.current_revenue),
            ),
            (StrategyField::M1Running.as_str(), FieldValue::Bool(d.m1_running)),
            (StrategyField::M2Running.as_str(), FieldValue::Bool(d.m2_running)),
            (StrategyField::TsRunning.as_str(), FieldValue::Bool(d.ts_running)),
            (StrategyField::TbRunning.as_str(), FieldValue::Bool(d.tb_running)),
            (
                StrategyField::M1MaintenanceActive.as_str(),
                FieldValue::Bool(d.m1_maintenance_active),
            ),
            (
                StrategyField::M2MaintenanceActive.as_str(),
                FieldValue::Bool(d.m2_maintenance_active),
            ),
            (
                StrategyField::ProcessingM2Amount.as_str(),
                FieldValue::Float(d.processing_m2_amount),
            ),
            (
                StrategyField::ShippedM2Amount.as_str(),
                FieldValue::Float(d.shipped_m2_amount),
            ),
            (
                StrategyField::ClientQuantity.as_str(),
                FieldValue::Float(d.client_quantity),
            ),
            (
                StrategyField::TotalMaterial.as_str(),
                FieldValue::Float(d.total_material),
            ),
        ]);
        fields
    }

    /// Render the selected fields, keeping canonical order regardless of
    /// the order of `selection`; `None` selects the base observation
    pub fn render(&self, selection: Option<&[StrategyField]>) -> String {
        let selection = selection.unwrap_or(StrategyField::base());
        render_fields(
            self.fields()
                .into_iter()
                .filter(|(name, _)| selection.iter().any(|field| field.as_str() == *name)),
        )
    }
}

/// Result of one strategy call
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Completed(Completion),
    Acted(StrategyReport),
}

impl<R: Rng> System<R> {
    /// Terminal result of the current order, once it is complete
    pub fn completion(&self) -> Option<Completion> {
        let client = self.client();
        if !client.is_completed() {
            return None;
        }
        match (client.priority(), client.in_time()) {
            (Some(priority), Some(on_time)) => Some(Completion { on_time, priority }),
            _ => None,
        }
    }

    /// Run one decision of the greedy strategy
    pub fn strategy_step(&mut self) -> StrategyOutcome {
        if let Some(completion) = self.completion() {
            return StrategyOutcome::Completed(completion);
        }

        let decision = DecisionVariables::sample(self);
        let command = decision.choose_command();
        let observation = self.execute(command);

        StrategyOutcome::Acted(StrategyReport {
            observation,
            command,
            current_revenue: self.client().current_payment(),
            decision,
        })
    }

    /// Run one decision and render it
    ///
    /// Returns `Completed <True|False> <priority>` once the order is done,
    /// otherwise the selected report fields as `{name:value, ...}`.
    pub fn enact_strategy(&mut self, selection: Option<&[StrategyField]>) -> String {
        match self.strategy_step() {
            StrategyOutcome::Completed(completion) => completion.to_string(),
            StrategyOutcome::Acted(report) => report.render(selection),
        }
    }
}
