use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;

use crate::core::components::types::{ComponentError, Priority};
use crate::core::execution::config::{ConcurrencyMode, SimulationConfig, SystemConfig};
use crate::core::execution::strategy::{Completion, StrategyOutcome};
use crate::core::execution::system::System;

/// Result of running the greedy strategy on one seeded system
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeResult {
    pub seed: u64,
    /// `None` when the decision cap was hit first
    pub completion: Option<Completion>,
    pub decisions: u64,
    pub ticks: u64,
    pub revenue: f64,
}

/// Run the strategy on a fresh system until the order completes or
/// `max_decisions` decisions have been taken
pub fn run_episode(
    config: &SystemConfig,
    seed: u64,
    max_decisions: u64,
) -> Result<EpisodeResult, ComponentError> {
    let mut system = System::with_config(config.clone(), StdRng::seed_from_u64(seed))?;
    let mut decisions = 0;

    let completion = loop {
        if decisions >= max_decisions {
            break system.completion();
        }
        match system.strategy_step() {
            StrategyOutcome::Completed(completion) => break Some(completion),
            StrategyOutcome::Acted(_) => decisions += 1,
        }
    };

    debug!(
        "[Episode {}] {} after {} decisions",
        seed,
        completion.map_or_else(|| "capped".to_string(), |c| c.to_string()),
        decisions
    );

    Ok(EpisodeResult {
        seed,
        completion,
        decisions,
        ticks: system.current_tick(),
        revenue: system.client().current_payment(),
    })
}

/// Aggregated outcome of a batch of episodes
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub episodes: Vec<EpisodeResult>,
    counts: HashMap<Completion, u64>,
}

impl BatchSummary {
    pub fn from_episodes(episodes: Vec<EpisodeResult>) -> Self {
        let mut counts = HashMap::new();
        for completion in episodes.iter().filter_map(|e| e.completion) {
            *counts.entry(completion).or_insert(0) += 1;
        }
        Self { episodes, counts }
    }

    /// Episodes that ended with this completion
    pub fn count(&self, completion: Completion) -> u64 {
        self.counts.get(&completion).copied().unwrap_or(0)
    }

    pub fn completed(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Episodes stopped by the decision cap
    pub fn capped(&self) -> u64 {
        self.episodes.len() as u64 - self.completed()
    }

    /// Share of completed episodes delivered on time
    pub fn on_time_rate(&self) -> f64 {
        let completed = self.completed();
        if completed == 0 {
            return 0.0;
        }
        let on_time: u64 = self
            .counts
            .iter()
            .filter(|(completion, _)| completion.on_time)
            .map(|(_, count)| count)
            .sum();
        on_time as f64 / completed as f64
    }

    pub fn mean_revenue(&self) -> f64 {
        self.mean(|e| e.revenue)
    }

    pub fn mean_ticks(&self) -> f64 {
        self.mean(|e| e.ticks as f64)
    }

    fn mean(&self, value: impl Fn(&EpisodeResult) -> f64) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        self.episodes.iter().map(value).sum::<f64>() / self.episodes.len() as f64
    }

    /// Counts per completion label in a stable order
    pub fn label_counts(&self) -> Vec<(String, u64)> {
        let mut rows = Vec::new();
        for priority in [Priority::Low, Priority::Medium, Priority::High] {
            for on_time in [true, false] {
                let completion = Completion { on_time, priority };
                rows.push((completion.label(), self.count(completion)));
            }
        }
        rows
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Episodes: {}", self.episodes.len())?;
        for (label, count) in self.label_counts() {
            writeln!(f, "  {:<24} {}", label, count)?;
        }
        writeln!(f, "  {:<24} {}", "Capped", self.capped())?;
        writeln!(f, "On-time rate: {:.2}", self.on_time_rate())?;
        writeln!(f, "Mean revenue: {:.2}", self.mean_revenue())?;
        write!(f, "Mean ticks:   {:.2}", self.mean_ticks())
    }
}

/// Run `config.episodes` seeded episodes and summarise them
///
/// Episode `i` is seeded with `base_seed + i`, so a batch gives the same
/// summary in either concurrency mode.
pub fn run_batch(config: &SimulationConfig) -> Result<BatchSummary, ComponentError> {
    config.system.validate()?;
    let seeds: Vec<u64> = (0..config.episodes)
        .map(|i| config.base_seed.wrapping_add(i))
        .collect();
    let run = |seed: u64| run_episode(&config.system, seed, config.max_decisions);

    info!(
        "[Batch] Running {} episodes ({:?})",
        seeds.len(),
        config.concurrency_mode
    );

    let episodes = match config.concurrency_mode {
        ConcurrencyMode::Sequential => seeds
            .iter()
            .map(|seed| run(*seed))
            .collect::<Result<Vec<_>, _>>()?,
        ConcurrencyMode::Rayon => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.thread_pool_size.unwrap_or(0))
                .build()
                .map_err(|e| ComponentError::InvalidConfiguration(e.to_string()))?;
            pool.install(|| {
                seeds
                    .par_iter()
                    .map(|seed| run(*seed))
                    .collect::<Result<Vec<_>, _>>()
            })?
        }
    };

    let summary = BatchSummary::from_episodes(episodes);
    info!(
        "[Batch] {} completed, {} capped, on-time rate {:.2}",
        summary.completed(),
        summary.capped(),
        summary.on_time_rate()
    );
    Ok(summary)
}
