use clap::Parser;

/// This is a simulation program for the Guthrie voting method.
///
/// Every setting can be given in a JSON configuration file and overridden on the command line.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the simulation. All the keys are optional.
    /// See the documentation of the guthrie_voting::manual module for the list of keys.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the summary of a simulation in JSON format. If provided, guthrie will
    /// check that the produced summary matches the reference. Only useful with an explicit seed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report of the simulation will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default 1000) The number of trials.
    #[clap(short, long, value_parser)]
    pub trials: Option<u32>,

    /// (default 1001) The number of voters in each trial.
    #[clap(long, value_parser)]
    pub voters: Option<usize>,

    /// (default 5) The number of candidates in each trial. At least 3.
    #[clap(long, value_parser)]
    pub candidates: Option<usize>,

    /// (default clustered) How the voters are placed: uniform, random or clustered.
    #[clap(short, long, value_parser)]
    pub method: Option<String>,

    /// (default 2) The number of axes of the political space.
    #[clap(long, value_parser)]
    pub axes: Option<usize>,

    /// (default 0.5) The weight of each axis relative to the previous one, in (0, 1].
    #[clap(long, value_parser)]
    pub axis_decay: Option<f64>,

    /// (default 3) The number of clusters per axis, for the clustered method.
    #[clap(long, value_parser)]
    pub clusters: Option<usize>,

    /// (default primary) How the candidates are picked: exact or primary.
    #[clap(long, value_parser)]
    pub candidate_method: Option<String>,

    /// (default 0.4) The primary starts with voters^power candidates.
    #[clap(long, value_parser)]
    pub primary_power: Option<f64>,

    /// (default 0) The seed of the random generator. 0 picks a seed from the clock.
    #[clap(short, long, value_parser)]
    pub seed: Option<u64>,

    /// Logs the histogram of the voters on each axis (debug level).
    #[clap(long, takes_value = false)]
    pub show_distribution: bool,

    /// Logs the voter blocs of each trial (debug level).
    #[clap(long, takes_value = false)]
    pub show_blocs: bool,

    /// Logs the tally of each round (debug level).
    #[clap(long, takes_value = false)]
    pub show_rounds: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
