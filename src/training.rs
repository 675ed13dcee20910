//! Training sessions with periodic checkpoints to a `ProgressStore`.
//!
//! Storage is best effort: a store that cannot be read bootstraps empty
//! tables, and a checkpoint that cannot be written is logged and skipped.

use crate::agent::SolverAgent;
use crate::error::OfcResult;
use crate::storage::ProgressStore;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub iterations: usize,
    /// Episodes between checkpoints; 0 saves only at the end.
    pub checkpoint_every: usize,
    /// Run each batch on rayon workers.
    pub parallel: bool,
    /// History snapshots kept after each checkpoint; `None` keeps all.
    pub keep_last: Option<usize>,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            iterations: 1000,
            checkpoint_every: 250,
            parallel: false,
            keep_last: Some(crate::storage::DEFAULT_KEEP_LAST),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub episodes: usize,
    pub checkpoints: usize,
    pub failed_checkpoints: usize,
    pub mean_utility: f64,
    pub info_sets: usize,
}

/// Load the stored state into `agent`. Returns `true` if a saved state was
/// applied. Missing, unreadable or incompatible state leaves the agent empty.
pub fn bootstrap(agent: &SolverAgent, store: &dyn ProgressStore) -> bool {
    let blob = match store.load() {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            log::info!("{:<32}", "no saved progress, starting fresh");
            return false;
        }
        Err(e) => {
            log::warn!("could not read saved progress: {}", e);
            return false;
        }
    };
    match agent.load_state(&blob) {
        Ok(()) => {
            log::info!(
                "{:<32}{:<16}{} info sets",
                "loaded saved progress",
                agent.episodes(),
                agent.info_set_count()
            );
            true
        }
        Err(e) => {
            log::warn!("ignoring saved progress: {}", e);
            false
        }
    }
}

/// Serialize the agent and hand it to the store.
pub fn checkpoint(agent: &SolverAgent, store: &dyn ProgressStore) -> OfcResult<()> {
    let blob = agent.save_state()?;
    store.save(&blob)
}

/// Train for `options.iterations` episodes, checkpointing along the way.
pub fn run(
    agent: &SolverAgent,
    store: Option<&dyn ProgressStore>,
    options: &TrainingOptions,
) -> TrainingReport {
    let batch = if options.checkpoint_every == 0 {
        options.iterations.max(1)
    } else {
        options.checkpoint_every
    };

    let mut report = TrainingReport::default();
    let mut utility_sum = 0.0;
    let mut done = 0;

    while done < options.iterations {
        let n = batch.min(options.iterations - done);
        let mean = if options.parallel {
            agent.train_parallel(n)
        } else {
            agent.train(n)
        };
        utility_sum += mean * n as f64;
        done += n;

        log::info!(
            "{:<32}{:>8}/{:<8}{:>10.3} mean utility",
            "training",
            done,
            options.iterations,
            utility_sum / done as f64
        );

        if let Some(store) = store {
            match checkpoint(agent, store) {
                Ok(()) => {
                    report.checkpoints += 1;
                    if let Some(keep) = options.keep_last {
                        if let Err(e) = store.clean_history(keep) {
                            log::warn!("history cleanup failed: {}", e);
                        }
                    }
                }
                Err(e) => {
                    report.failed_checkpoints += 1;
                    log::warn!("checkpoint failed, continuing in memory: {}", e);
                }
            }
        }
    }

    report.episodes = done;
    report.mean_utility = if done == 0 { 0.0 } else { utility_sum / done as f64 };
    report.info_sets = agent.info_set_count();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentConfig;
    use crate::storage::MemoryStore;

    fn agent() -> SolverAgent {
        SolverAgent::new(AgentConfig {
            horizon: 2,
            ..AgentConfig::default()
        })
    }

    #[test]
    fn checkpoints_per_batch() {
        let agent = agent();
        let store = MemoryStore::new();
        let options = TrainingOptions {
            iterations: 5,
            checkpoint_every: 2,
            parallel: false,
            keep_last: None,
        };
        let report = run(&agent, Some(&store), &options);
        assert_eq!(report.episodes, 5);
        assert_eq!(report.checkpoints, 3);
        assert_eq!(store.history(10).unwrap().len(), 3);
    }

    #[test]
    fn failing_store_does_not_stop_training() {
        let agent = agent();
        let store = MemoryStore::failing();
        let options = TrainingOptions {
            iterations: 4,
            checkpoint_every: 2,
            parallel: false,
            keep_last: None,
        };
        let report = run(&agent, Some(&store), &options);
        assert_eq!(report.episodes, 4);
        assert_eq!(report.failed_checkpoints, 2);
        assert_eq!(agent.episodes(), 4);
    }

    #[test]
    fn bootstrap_empty_store() {
        let agent = agent();
        assert!(!bootstrap(&agent, &MemoryStore::new()));
        assert!(!bootstrap(&agent, &MemoryStore::failing()));
        assert_eq!(agent.info_set_count(), 0);
    }
}
