use mdsim::core::execution::batch::run_batch;
use mdsim::core::execution::config::ConcurrencyMode;
use mdsim::SimulationConfig;

/// Usage: monte_carlo [episodes] [base_seed] [threads]
///
/// Runs sequentially unless a thread count is given.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = SimulationConfig::new();
    if let Some(episodes) = args.first() {
        config = config.with_episodes(episodes.parse()?);
    }
    if let Some(seed) = args.get(1) {
        config = config.with_base_seed(seed.parse()?);
    }
    if let Some(threads) = args.get(2) {
        config = config
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(threads.parse()?);
    }

    println!("Configuration:");
    println!(
        "  episodes={}, base_seed={}, max_decisions={}, mode={:?}",
        config.episodes, config.base_seed, config.max_decisions, config.concurrency_mode
    );

    let summary = run_batch(&config)?;
    println!("{}", summary);
    Ok(())
}
