use mdsim::core::execution::batch::run_batch;
use mdsim::core::execution::config::ConcurrencyMode;
use mdsim::core::execution::observation::{MachineStatus, TruckStatus};
use mdsim::{
    quantize, Action, Command, Completion, ComponentError, Observation, Priority,
    SimulationConfig, StrategyField, System, SystemConfig, TruckConfig,
};

/// Drive a system with the built-in strategy until the order completes
fn play(system: &mut System, selection: Option<&[StrategyField]>) -> (Vec<String>, Completion) {
    let mut lines = Vec::new();
    for _ in 0..10_000 {
        let line = system.enact_strategy(selection);
        if let Ok(completion) = line.parse::<Completion>() {
            return (lines, completion);
        }
        lines.push(line);
    }
    panic!("order never completed");
}

#[test]
fn test_observation_field_names() {
    let mut system = System::with_seed(1);
    let state: Observation = system.step();

    let names: Vec<&str> = state.fields().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, Observation::FIELD_NAMES.to_vec());
    assert_eq!(names[0], "client_current_priority");
    assert_eq!(names[12], "tb_to_completion");
}

#[test]
fn test_every_alphabet_entry_is_accepted() {
    let mut system = System::with_seed(2);
    let alphabet = system.alphabet();

    for name in alphabet {
        let rendered = system.action_repr(name).unwrap();
        assert!(rendered.starts_with('{') && rendered.ends_with('}'));
    }
    assert!(system.action("reset").is_ok());
}

#[test]
fn test_unknown_action_leaves_state() {
    let mut system = System::with_seed(3);
    let before = system.get_state();

    let err = system.action("m1_processing_double").unwrap_err();
    assert!(matches!(err, ComponentError::UnknownCommand(_)));
    assert_eq!(err.to_string(), "Unknown action: m1_processing_double");
    assert_eq!(system.get_state(), before);
}

#[test]
fn test_perform_matches_named_commands() {
    let mut by_name = System::with_seed(5);
    let mut by_action = System::with_seed(5);

    for command in [Command::Step, Command::Step, Command::Step, Command::M2ProcessingHalf] {
        let expected = by_name.action(command.as_str()).unwrap();
        assert_eq!(by_action.perform(Action::from(command)), expected);
    }
    assert_eq!(by_action.perform(Action::Reset).m2_status, MachineStatus::Idle);
}

#[test]
fn test_strategy_run_with_all_fields() {
    let mut system = System::with_seed(21);
    let (lines, completion) = play(&mut system, Some(&StrategyField::ALL[..]));

    assert!(!lines.is_empty());
    for line in &lines {
        assert!(line.contains("command_executed:'"));
        assert!(line.contains("total_material:"));
    }
    assert_eq!(Some(completion), system.completion());
    assert_eq!(system.client().priority(), Some(completion.priority));
}

#[test]
fn test_strategy_after_reset_starts_over() {
    let mut system = System::with_seed(9);
    play(&mut system, None);

    let state = system.reset();
    assert_eq!(state.quantity_shipped_to_the_client, 0.0);
    assert_eq!(state.ts_status, TruckStatus::Idle);
    assert!(system.completion().is_none());

    let (_, completion) = play(&mut system, None);
    assert!(matches!(
        completion.priority,
        Priority::Low | Priority::Medium | Priority::High
    ));
}

#[test]
fn test_custom_configuration() {
    let mut config = SystemConfig::default();
    config.big_truck = TruckConfig::new(0.5, 1);

    let mut system = System::with_config(config, rand::rngs::mock::StepRng::new(0, 0)).unwrap();
    for _ in 0..3 {
        system.step();
    }
    system.m2_processing_full();
    for _ in 0..3 {
        system.step();
    }
    let state = system.big_truck_shipment();
    assert_eq!(state.tb_to_completion, 1);
    assert_eq!(state.m2_stored, quantize(0.5));

    let state = system.step();
    assert_eq!(state.quantity_shipped_to_the_client, 0.5);
}

#[test]
fn test_invalid_configuration() {
    let mut config = SystemConfig::default();
    config.small_truck = TruckConfig::new(-1.0, 2);
    assert!(System::with_config(config, rand::thread_rng()).is_err());
}

#[test]
fn test_monte_carlo_batch() {
    let config = SimulationConfig::new()
        .with_episodes(12)
        .with_base_seed(1000)
        .with_concurrency(ConcurrencyMode::Rayon);
    let summary = run_batch(&config).unwrap();

    assert_eq!(summary.episodes.len(), 12);
    assert_eq!(summary.completed() + summary.capped(), 12);
    assert!((0.0..=1.0).contains(&summary.on_time_rate()));
    assert!(summary.mean_revenue() > 0.0);
}
