mod config;
pub mod blocs;
pub mod builder;
pub mod candidates;
pub mod electorate;
pub mod guthrie;
pub mod manual;
pub mod methods;
pub mod position;
pub mod random;
pub mod stats;

use log::{debug, info};

pub use crate::config::*;

use crate::blocs::VoterBlocs;
use crate::candidates::{select_candidates, Candidate, CandidateId};
use crate::electorate::Electorate;
use crate::guthrie::run_guthrie;
use crate::random::RandomSource;
use crate::stats::{condorcet, monotonicity, SummaryAccumulator, UtilitySummary};

/// A sequence of trials sharing one random stream.
///
/// ```
/// use guthrie_voting::{Simulation, SimulationConfig};
///
/// let mut config = SimulationConfig::DEFAULT;
/// config.trials = 3;
/// config.voters = 101;
/// config.seed = 12;
/// let report = Simulation::new(&config)?.run()?;
/// assert_eq!(report.trials.len(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Simulation {
    config: SimulationConfig,
    rng: RandomSource,
    accumulator: SummaryAccumulator,
}

impl Simulation {
    pub fn new(config: &SimulationConfig) -> Result<Simulation, ConfigError> {
        let config = config.validate()?;
        let rng = RandomSource::new(config.seed);
        Ok(Simulation {
            config,
            rng,
            accumulator: SummaryAccumulator::new(),
        })
    }

    /// The configuration after validation.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Generates a new electorate and candidates, and runs all the counts on them.
    /// The result is added to the running summary.
    pub fn run_trial(&mut self, trial: u32) -> Result<TrialResult, VotingErrors> {
        let electorate = Electorate::generate(&self.config, &mut self.rng);
        let candidates = select_candidates(&electorate, &self.config, &mut self.rng);
        let res = evaluate_trial(trial, &electorate, candidates, &self.config)?;
        self.accumulator.add(&res);
        Ok(res)
    }

    /// The summary of the trials run so far.
    pub fn summary(&self) -> Summary {
        self.accumulator.summary()
    }

    /// Runs all the trials of the configuration.
    pub fn run(&mut self) -> Result<SimulationReport, VotingErrors> {
        info!(
            "Simulation: {} trials, {} voters, {} candidates, seed {}",
            self.config.trials,
            self.config.voters,
            self.config.candidates,
            self.seed()
        );
        let mut trials: Vec<TrialResult> = Vec::new();
        for trial in 1..=self.config.trials {
            trials.push(self.run_trial(trial)?);
        }
        let summary = self.summary();
        info!("Simulation: done, summary: {:?}", summary);
        Ok(SimulationReport {
            seed: self.seed(),
            trials,
            summary,
        })
    }
}

/// Runs all the counts of a trial for a fixed electorate and set of candidates.
///
/// The candidates are expected to be ranked (see `candidates::roster`).
pub fn evaluate_trial(
    trial: u32,
    electorate: &Electorate,
    mut candidates: Vec<Candidate>,
    config: &SimulationConfig,
) -> Result<TrialResult, VotingErrors> {
    if electorate.is_empty() || candidates.is_empty() {
        return Err(VotingErrors::EmptyElection);
    }
    let blocs = VoterBlocs::build(electorate, &candidates);
    if config.show_blocs {
        blocs.log(&candidates);
    }

    let utilities = blocs.utilities();
    for (c, u) in candidates.iter_mut().zip(utilities.iter()) {
        c.utility = *u;
    }
    let utility_summary = UtilitySummary::new(&utilities).ok_or(VotingErrors::EmptyElection)?;

    let outcome = run_guthrie(&candidates, &blocs, config.show_rounds)?;
    let condorcet_winner = condorcet(&blocs);
    let monotonicity_report = monotonicity(electorate, &candidates, outcome.winner)?;
    let plurality_winner = methods::plurality(&blocs)?;
    let instant_runoff_winner = methods::instant_runoff(&blocs)?;

    let name = |cid: CandidateId| candidates[cid.index()].name.clone();
    let reports: Vec<CandidateReport> = candidates
        .iter()
        .map(|c| CandidateReport {
            name: c.name.clone(),
            position: c.position.coords().to_vec(),
            utility: c.utility,
            satisfaction: utility_summary.satisfaction(c.utility),
            rankings: c.rankings.iter().map(|cid| name(*cid)).collect(),
        })
        .collect();
    if config.show_distribution {
        for r in reports.iter() {
            debug!(
                "Trial {}: candidate {} at {:?} utility {:.3} satisfaction {:.3} rankings {:?}",
                trial, r.name, r.position, r.utility, r.satisfaction, r.rankings
            );
        }
    }

    let res = TrialResult {
        trial,
        candidates: reports,
        rounds: outcome.rounds,
        winner: name(outcome.winner),
        won_first_round: outcome.won_first_round,
        best_candidate: name(utility_summary.best),
        condorcet: match condorcet_winner {
            Some(cid) => CondorcetOutcome::Winner(name(cid)),
            None => CondorcetOutcome::Cycle,
        },
        monotonicity: monotonicity_report,
        plurality_winner: name(plurality_winner),
        instant_runoff_winner: name(instant_runoff_winner),
    };
    debug!(
        "Trial {}: winner {} (first round: {}), best {}, condorcet {:?}, monotonicity flips {:?}",
        trial,
        res.winner,
        res.won_first_round,
        res.best_candidate,
        res.condorcet,
        res.monotonicity.flips
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(seed: u64) -> SimulationConfig {
        let mut c = SimulationConfig::DEFAULT;
        c.trials = 20;
        c.voters = 201;
        c.seed = seed;
        c
    }

    #[test]
    fn same_seed_same_simulation() {
        let _ = env_logger::builder().is_test(true).try_init();
        let r1 = Simulation::new(&small_config(4242)).unwrap().run().unwrap();
        let r2 = Simulation::new(&small_config(4242)).unwrap().run().unwrap();
        assert_eq!(r1.seed, 4242);
        assert_eq!(r1, r2);
    }

    #[test]
    fn every_method_and_generator_runs() {
        for method in [
            GenerationMethod::Uniform,
            GenerationMethod::Random,
            GenerationMethod::Clustered,
        ] {
            for candidate_method in [CandidateMethod::Exact, CandidateMethod::Primary] {
                let mut c = small_config(9);
                c.method = method;
                c.candidate_method = candidate_method;
                c.axes = 3;
                c.show_blocs = true;
                c.show_rounds = true;
                c.show_distribution = true;
                let report = Simulation::new(&c).unwrap().run().unwrap();
                assert_eq!(report.trials.len(), 20);
                assert_eq!(report.summary.trials, 20);
                for t in report.trials.iter() {
                    assert_eq!(t.candidates.len(), c.candidates);
                    assert!(t.rounds.len() <= c.candidates);
                    let last = t.rounds.last().unwrap();
                    assert_eq!(last.elected, Some(t.winner.clone()));
                    let best = t
                        .candidates
                        .iter()
                        .find(|r| r.name == t.best_candidate)
                        .unwrap();
                    assert!((best.satisfaction - 1.0).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn summary_rates_are_percentages() {
        let report = Simulation::new(&small_config(31)).unwrap().run().unwrap();
        let s = report.summary;
        for rate in [
            s.true_majority_rate,
            s.monotonicity_rate,
            s.condorcet_cycle_rate,
        ] {
            assert!((0.0..=100.0).contains(&rate));
        }
        assert_eq!(s.methods.len(), 3);
        let expected_majority = report.trials.iter().filter(|t| t.won_first_round).count();
        assert!((s.true_majority_rate - 100.0 * expected_majority as f64 / 20.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let mut c = small_config(1);
        c.candidates = 2;
        assert!(matches!(
            Simulation::new(&c),
            Err(ConfigError::TooFewCandidates(2))
        ));
    }
}
