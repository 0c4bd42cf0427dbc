// ********* Configuration **********

use log::warn;
use std::error::Error;
use std::fmt::Display;

/// How the positions of the voters are generated.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum GenerationMethod {
    /// Voters evenly spaced on a single axis. Does not use the random source.
    Uniform,
    /// Every coordinate is an independent uniform draw.
    Random,
    /// Voters seated around randomly placed cluster centers, one axis at a time.
    Clustered,
}

/// How the candidates are picked from the electorate.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CandidateMethod {
    /// Exactly the target number of candidates is sampled.
    Exact,
    /// A larger pool is sampled and narrowed down by a primary, eliminating
    /// the candidate with the fewest first-place votes until the target is reached.
    Primary,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SimulationConfig {
    pub trials: u32,
    pub voters: usize,
    pub candidates: usize,
    pub method: GenerationMethod,
    pub axes: usize,
    /// Weight multiplier applied to each axis after the first one.
    pub axis_decay: f64,
    /// Only used by the clustered method.
    pub clusters: usize,
    pub candidate_method: CandidateMethod,
    /// The size of the primary pool is voters^primary_power.
    pub primary_power: f64,
    /// 0 means: derive a seed from the clock.
    pub seed: u64,
    pub show_distribution: bool,
    pub show_blocs: bool,
    pub show_rounds: bool,
}

impl SimulationConfig {
    pub const DEFAULT: SimulationConfig = SimulationConfig {
        trials: 1000,
        voters: 1001,
        candidates: 5,
        method: GenerationMethod::Clustered,
        axes: 2,
        axis_decay: 0.5,
        clusters: 3,
        candidate_method: CandidateMethod::Primary,
        primary_power: 0.4,
        seed: 0,
        show_distribution: false,
        show_blocs: false,
        show_rounds: false,
    };

    /// Checks the configuration before any simulation work.
    ///
    /// The uniform method only makes sense on a single axis: a different axis count is
    /// corrected with a warning instead of failing.
    pub fn validate(&self) -> Result<SimulationConfig, ConfigError> {
        if self.trials < 1 {
            return Err(ConfigError::TooFewTrials(self.trials));
        }
        if self.candidates < 3 {
            return Err(ConfigError::TooFewCandidates(self.candidates));
        }
        if self.voters < self.candidates {
            return Err(ConfigError::TooFewVoters {
                voters: self.voters,
                candidates: self.candidates,
            });
        }
        if self.axes < 1 {
            return Err(ConfigError::NoAxes);
        }
        if !(self.axis_decay > 0.0 && self.axis_decay <= 1.0) {
            return Err(ConfigError::InvalidDecay(self.axis_decay));
        }
        if self.method == GenerationMethod::Clustered && self.clusters < 1 {
            return Err(ConfigError::TooFewClusters(self.clusters));
        }
        if self.candidate_method == CandidateMethod::Primary
            && !(self.primary_power > 0.0 && self.primary_power <= 1.0)
        {
            return Err(ConfigError::InvalidPrimaryPower(self.primary_power));
        }

        let mut res = self.clone();
        if res.method == GenerationMethod::Uniform && res.axes != 1 {
            warn!(
                "validate: the uniform method requires a single axis, using 1 axis instead of {}",
                res.axes
            );
            res.axes = 1;
        }
        Ok(res)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::DEFAULT
    }
}

// ******** Output data structures *********

/// Statistics for one round of the Guthrie count.
#[derive(PartialEq, Debug, Clone)]
pub struct RoundStats {
    pub round: u32,
    /// First-place votes of the candidates still running, in candidate order.
    pub tally: Vec<(String, u64)>,
    /// Last-place votes. Empty when the round found a majority.
    pub last_place: Vec<(String, u64)>,
    pub elected: Option<String>,
    pub eliminated: Option<String>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CandidateReport {
    pub name: String,
    pub position: Vec<f64>,
    /// Total distance to all the voters. Lower is better.
    pub utility: f64,
    pub satisfaction: f64,
    /// The other candidates, closest first.
    pub rankings: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CondorcetOutcome {
    Winner(String),
    /// At least two candidates share the largest number of pairwise wins.
    Cycle,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MonotonicityReport {
    /// Names of the losing candidates whose withdrawal changed the winner.
    pub flips: Vec<String>,
}

impl MonotonicityReport {
    pub fn passed(&self) -> bool {
        self.flips.is_empty()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TrialResult {
    pub trial: u32,
    pub candidates: Vec<CandidateReport>,
    pub rounds: Vec<RoundStats>,
    pub winner: String,
    pub won_first_round: bool,
    pub best_candidate: String,
    pub condorcet: CondorcetOutcome,
    pub monotonicity: MonotonicityReport,
    pub plurality_winner: String,
    pub instant_runoff_winner: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VotingMethod {
    Plurality,
    InstantRunoff,
    Guthrie,
}

impl Display for VotingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            VotingMethod::Plurality => "plurality",
            VotingMethod::InstantRunoff => "instant-runoff",
            VotingMethod::Guthrie => "guthrie",
        };
        write!(f, "{}", name)
    }
}

/// Averages for one voting method over all the trials. Rates are percentages.
#[derive(PartialEq, Debug, Clone)]
pub struct MethodSummary {
    pub method: VotingMethod,
    pub average_satisfaction: f64,
    pub best_candidate_rate: f64,
    pub condorcet_rate: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Summary {
    pub trials: u64,
    pub true_majority_rate: f64,
    pub monotonicity_rate: f64,
    pub condorcet_cycle_rate: f64,
    pub methods: Vec<MethodSummary>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct SimulationReport {
    /// The resolved seed, to replay the same simulation.
    pub seed: u64,
    pub trials: Vec<TrialResult>,
    pub summary: Summary,
}

// ******** Errors *********

/// Invalid configurations, detected before the simulation starts.
#[derive(PartialEq, Debug, Clone)]
pub enum ConfigError {
    TooFewTrials(u32),
    TooFewCandidates(usize),
    TooFewVoters { voters: usize, candidates: usize },
    NoAxes,
    InvalidDecay(f64),
    TooFewClusters(usize),
    InvalidPrimaryPower(f64),
}

impl Error for ConfigError {}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::TooFewTrials(n) => write!(f, "at least 1 trial is required, got {}", n),
            ConfigError::TooFewCandidates(n) => {
                write!(f, "at least 3 candidates are required, got {}", n)
            }
            ConfigError::TooFewVoters { voters, candidates } => write!(
                f,
                "the number of voters ({}) cannot be lower than the number of candidates ({})",
                voters, candidates
            ),
            ConfigError::NoAxes => write!(f, "at least one axis is required"),
            ConfigError::InvalidDecay(d) => {
                write!(f, "the axis decay must be in (0, 1], got {}", d)
            }
            ConfigError::TooFewClusters(n) => {
                write!(f, "the clustered method needs at least 1 cluster, got {}", n)
            }
            ConfigError::InvalidPrimaryPower(p) => {
                write!(f, "the primary power must be in (0, 1], got {}", p)
            }
        }
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(PartialEq, Debug, Clone)]
pub enum VotingErrors {
    EmptyElection,
    NoConvergence,
    AxisMismatch { expected: usize, found: usize },
    Config(ConfigError),
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyElection => write!(f, "VotingError: empty election"),
            VotingErrors::NoConvergence => {
                write!(f, "VotingError: the count did not converge to a winner")
            }
            VotingErrors::AxisMismatch { expected, found } => write!(
                f,
                "VotingError: expected a position with {} axes, got {}",
                expected, found
            ),
            VotingErrors::Config(e) => write!(f, "VotingError: invalid configuration: {}", e),
        }
    }
}

impl From<ConfigError> for VotingErrors {
    fn from(e: ConfigError) -> Self {
        VotingErrors::Config(e)
    }
}
