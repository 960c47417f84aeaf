use mdsim::{Completion, StrategyField, System};

/// Usage: enact_strategy [seed] [field,field,...]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .format_timestamp(None)
        .init();

    let mut args = std::env::args().skip(1);
    let mut system = match args.next() {
        Some(seed) => System::with_seed(seed.parse()?),
        None => System::new(),
    };
    let selection = args
        .next()
        .map(|list| {
            list.split(',')
                .map(|name| name.trim().parse::<StrategyField>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    println!("Initial state: {}", system.get_state());

    let mut decisions = 0;
    loop {
        let line = system.enact_strategy(selection.as_deref());
        println!("{}", line);

        if let Ok(completion) = line.parse::<Completion>() {
            println!(
                "{} after {} decisions and {} ticks, payment {:.2}",
                completion.label(),
                decisions,
                system.current_tick(),
                system.client().current_payment()
            );
            break;
        }
        decisions += 1;
    }

    Ok(())
}
