// Tests for the greedy strategy driving a whole order
#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;

    use crate::core::{
        components::types::Priority,
        execution::command::Command,
        execution::config::{MachineConfig, OutcomeTable, SystemConfig},
        execution::strategy::{Completion, StrategyField, StrategyOutcome},
        execution::system::System,
        types::QUANTITY_EPSILON,
    };

    const MAX_DECISIONS: usize = 10_000;

    fn lossless_system() -> System<StepRng> {
        let machine =
            MachineConfig::new().with_outcomes(OutcomeTable::lossless(), OutcomeTable::lossless());
        let config = SystemConfig::new().with_machines(machine);
        System::with_config(config, StepRng::new(0, 0)).unwrap()
    }

    fn run_to_completion(system: &mut System) -> Completion {
        for _ in 0..MAX_DECISIONS {
            if let StrategyOutcome::Completed(completion) = system.strategy_step() {
                return completion;
            }
        }
        panic!("strategy did not complete within {} decisions", MAX_DECISIONS);
    }

    #[test]
    fn test_strategy_terminates_across_seeds() {
        for seed in 0..25 {
            let mut system = System::with_seed(seed);
            let completion = run_to_completion(&mut system);

            let rendered = system.enact_strategy(None);
            assert_eq!(rendered, completion.to_string());
            assert!(
                rendered.starts_with("Completed True ") || rendered.starts_with("Completed False "),
                "unexpected terminal string {}",
                rendered
            );
            assert_eq!(rendered.parse::<Completion>(), Ok(completion));
            assert_eq!(system.client().order_quantity(), 1.0);

            // Stays terminal until reset
            assert_eq!(system.enact_strategy(None), rendered);
        }
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = System::with_seed(8);
        let mut b = System::with_seed(8);
        let all = StrategyField::ALL;

        loop {
            let line = a.enact_strategy(Some(&all[..]));
            assert_eq!(line, b.enact_strategy(Some(&all[..])));
            if line.starts_with("Completed") {
                break;
            }
        }
    }

    #[test]
    fn test_first_decision_maintains_m2() {
        let mut system = lossless_system();
        let selection = [StrategyField::TotalMaterial, StrategyField::CommandExecuted];

        assert_eq!(
            system.enact_strategy(Some(&selection[..])),
            "{command_executed:'m2_maintenance', total_material:0.00}"
        );
        assert!(system.m2().is_under_maintenance());
    }

    #[test]
    fn test_default_report_is_the_observation() {
        let mut system = lossless_system();
        let line = system.enact_strategy(None);
        assert_eq!(line, system.get_state().to_string());
        assert_eq!(line.matches(", ").count(), 12);
    }

    #[test]
    fn test_lossless_run_conserves_material() {
        let mut system = lossless_system();
        let mut decisions = 0;

        loop {
            let report = match system.strategy_step() {
                StrategyOutcome::Completed(completion) => {
                    assert_eq!(
                        completion,
                        Completion {
                            on_time: true,
                            priority: Priority::Low
                        }
                    );
                    break;
                }
                StrategyOutcome::Acted(report) => report,
            };
            decisions += 1;
            assert!(decisions < MAX_DECISIONS);

            let m1 = system.m1();
            let m2 = system.m2();
            let in_m1 = m1.current_batch_size().map_or(0.0, |b| b.quantity());
            let in_m2 = m2.current_batch_size().map_or(0.0, |b| b.quantity());
            let downstream = m1.stored_output()
                + in_m2
                + m2.stored_output()
                + system.small_truck().current_load()
                + system.big_truck().current_load()
                + system.client().order_quantity();

            assert!(
                (m1.raw_material_consumed() - in_m1 - downstream).abs() < 1e-9,
                "material lost after {}",
                report.command
            );
            assert!(report.decision.total_material >= 0.0);
        }

        assert!((system.client().current_payment() - 5.0).abs() < 1e-9);
        assert!(system.m1().maintenance_active());
        assert!(system.m2().maintenance_active());
    }

    #[test]
    fn test_decision_variables_sampled_before_command() {
        let mut system = lossless_system();

        let report = match system.strategy_step() {
            StrategyOutcome::Acted(report) => report,
            StrategyOutcome::Completed(_) => panic!("fresh order cannot be complete"),
        };
        assert_eq!(report.command, Command::M2Maintenance);
        assert!(!report.decision.m2_maintenance_active);
        assert!(!report.decision.m2_running);
        assert!(report.decision.m1_running);
        assert_eq!(report.current_revenue, 0.0);

        // M2 is busy with maintenance and nothing is stored yet
        let report = match system.strategy_step() {
            StrategyOutcome::Acted(report) => report,
            StrategyOutcome::Completed(_) => panic!("order completed too early"),
        };
        assert_eq!(report.command, Command::Step);
        assert!(report.decision.m2_maintenance_active);
    }

    #[test]
    fn test_only_small_truck_used() {
        let mut system = System::with_seed(4);
        loop {
            match system.strategy_step() {
                StrategyOutcome::Completed(_) => break,
                StrategyOutcome::Acted(report) => {
                    assert_ne!(report.command, Command::BigTruckShipment);
                    assert!(report.decision.shipped_m2_amount <= 1.0 / 3.0 + QUANTITY_EPSILON);
                }
            }
        }
    }
}
