use log::{debug, info, warn};

use guthrie_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::sim::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SimError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the output to {path}: {source}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid configuration: {source}"))]
    InvalidConfig { source: ConfigError },
    #[snafu(display("Simulation failed: {source}"))]
    Voting { source: VotingErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SimResult<T> = Result<T, SimError>;

pub mod config_reader {
    use crate::sim::*;

    use serde::{Deserialize, Serialize};

    /// The settings of a simulation, as read from a JSON file.
    ///
    /// Missing keys keep their default value.
    #[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct SimConfigFile {
        pub trials: Option<u32>,
        pub voters: Option<usize>,
        pub candidates: Option<usize>,
        pub method: Option<String>,
        pub axes: Option<usize>,
        #[serde(rename = "axisDecay")]
        pub axis_decay: Option<f64>,
        pub clusters: Option<usize>,
        #[serde(rename = "candidateMethod")]
        pub candidate_method: Option<String>,
        #[serde(rename = "primaryPower")]
        pub primary_power: Option<f64>,
        pub seed: Option<u64>,
        #[serde(rename = "showDistribution")]
        pub show_distribution: Option<bool>,
        #[serde(rename = "showBlocs")]
        pub show_blocs: Option<bool>,
        #[serde(rename = "showRounds")]
        pub show_rounds: Option<bool>,
    }

    impl SimConfigFile {
        /// The settings passed on the command line. Flags that are not set are `None`.
        pub fn from_args(args: &Args) -> SimConfigFile {
            let flag = |b: bool| if b { Some(true) } else { None };
            SimConfigFile {
                trials: args.trials,
                voters: args.voters,
                candidates: args.candidates,
                method: args.method.clone(),
                axes: args.axes,
                axis_decay: args.axis_decay,
                clusters: args.clusters,
                candidate_method: args.candidate_method.clone(),
                primary_power: args.primary_power,
                seed: args.seed,
                show_distribution: flag(args.show_distribution),
                show_blocs: flag(args.show_blocs),
                show_rounds: flag(args.show_rounds),
            }
        }

        /// Replaces the settings of the configuration with the ones that are set here.
        pub fn apply(&self, config: &mut SimulationConfig) -> SimResult<()> {
            if let Some(x) = self.trials {
                config.trials = x;
            }
            if let Some(x) = self.voters {
                config.voters = x;
            }
            if let Some(x) = self.candidates {
                config.candidates = x;
            }
            if let Some(x) = &self.method {
                config.method = parse_generation_method(x)?;
            }
            if let Some(x) = self.axes {
                config.axes = x;
            }
            if let Some(x) = self.axis_decay {
                config.axis_decay = x;
            }
            if let Some(x) = self.clusters {
                config.clusters = x;
            }
            if let Some(x) = &self.candidate_method {
                config.candidate_method = parse_candidate_method(x)?;
            }
            if let Some(x) = self.primary_power {
                config.primary_power = x;
            }
            if let Some(x) = self.seed {
                config.seed = x;
            }
            if let Some(x) = self.show_distribution {
                config.show_distribution = x;
            }
            if let Some(x) = self.show_blocs {
                config.show_blocs = x;
            }
            if let Some(x) = self.show_rounds {
                config.show_rounds = x;
            }
            Ok(())
        }
    }

    pub fn read_config(path: String) -> SimResult<SimConfigFile> {
        let contents = fs::read_to_string(&path).context(OpeningJsonSnafu { path })?;
        debug!("read config: {:?}", contents);
        let config: SimConfigFile =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(config)
    }

    pub fn read_summary(path: String) -> SimResult<JSValue> {
        let contents = fs::read_to_string(&path).context(OpeningJsonSnafu { path })?;
        let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        debug!("read summary: {:?}", js["summary"]);
        Ok(js)
    }
}

fn parse_generation_method(s: &str) -> SimResult<GenerationMethod> {
    match s {
        "uniform" => Ok(GenerationMethod::Uniform),
        "random" => Ok(GenerationMethod::Random),
        "clustered" => Ok(GenerationMethod::Clustered),
        x => whatever!(
            "Unknown generation method {:?}: expected uniform, random or clustered",
            x
        ),
    }
}

fn parse_candidate_method(s: &str) -> SimResult<CandidateMethod> {
    match s {
        "exact" => Ok(CandidateMethod::Exact),
        "primary" => Ok(CandidateMethod::Primary),
        x => whatever!(
            "Unknown candidate method {:?}: expected exact or primary",
            x
        ),
    }
}

fn generation_method_name(m: GenerationMethod) -> &'static str {
    match m {
        GenerationMethod::Uniform => "uniform",
        GenerationMethod::Random => "random",
        GenerationMethod::Clustered => "clustered",
    }
}

fn candidate_method_name(m: CandidateMethod) -> &'static str {
    match m {
        CandidateMethod::Exact => "exact",
        CandidateMethod::Primary => "primary",
    }
}

/// Defaults, then the configuration file, then the command line.
pub fn build_config(args: &Args) -> SimResult<SimulationConfig> {
    let mut config = SimulationConfig::DEFAULT;
    if let Some(path) = &args.config {
        info!("Reading configuration file {:?}", path);
        read_config(path.clone())?.apply(&mut config)?;
    }
    SimConfigFile::from_args(args).apply(&mut config)?;
    Ok(config)
}

fn config_to_json(c: &SimulationConfig, seed: u64) -> JSValue {
    json!({
        "trials": c.trials,
        "voters": c.voters,
        "candidates": c.candidates,
        "method": generation_method_name(c.method),
        "axes": c.axes,
        "axisDecay": c.axis_decay,
        "clusters": c.clusters,
        "candidateMethod": candidate_method_name(c.candidate_method),
        "primaryPower": c.primary_power,
        "seed": seed,
    })
}

fn tally_to_json(tally: &[(String, u64)]) -> JSMap<String, JSValue> {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (name, count) in tally {
        m.insert(name.clone(), json!(count));
    }
    m
}

fn rounds_to_json(rounds: &[RoundStats]) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rounds {
        let mut tally_results: Vec<JSValue> = Vec::new();
        if let Some(name) = &round_stat.eliminated {
            tally_results.push(json!({
                "eliminated": name,
                "lastPlace": tally_to_json(&round_stat.last_place)
            }));
        }
        if let Some(name) = &round_stat.elected {
            tally_results.push(json!({ "elected": name }));
        }
        l.push(json!({
            "round": round_stat.round,
            "tally": tally_to_json(&round_stat.tally),
            "tallyResults": tally_results
        }));
    }
    l
}

fn trial_to_json(t: &TrialResult) -> JSValue {
    let candidates: Vec<JSValue> = t
        .candidates
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "position": c.position,
                "utility": c.utility,
                "satisfaction": c.satisfaction,
                "rankings": c.rankings,
            })
        })
        .collect();
    let condorcet = match &t.condorcet {
        CondorcetOutcome::Winner(name) => json!(name),
        CondorcetOutcome::Cycle => JSValue::Null,
    };
    json!({
        "trial": t.trial,
        "candidates": candidates,
        "rounds": rounds_to_json(&t.rounds),
        "winner": t.winner,
        "wonFirstRound": t.won_first_round,
        "bestCandidate": t.best_candidate,
        "condorcetWinner": condorcet,
        "monotonicity": {
            "passed": t.monotonicity.passed(),
            "flips": t.monotonicity.flips,
        },
        "pluralityWinner": t.plurality_winner,
        "instantRunoffWinner": t.instant_runoff_winner,
    })
}

fn summary_to_json(s: &Summary) -> JSValue {
    let methods: Vec<JSValue> = s
        .methods
        .iter()
        .map(|m| {
            json!({
                "method": m.method.to_string(),
                "averageSatisfaction": m.average_satisfaction,
                "bestCandidateRate": m.best_candidate_rate,
                "condorcetRate": m.condorcet_rate,
            })
        })
        .collect();
    json!({
        "trials": s.trials,
        "trueMajorityRate": s.true_majority_rate,
        "monotonicityRate": s.monotonicity_rate,
        "condorcetCycleRate": s.condorcet_cycle_rate,
        "methods": methods,
    })
}

fn build_report_js(config: &SimulationConfig, report: &SimulationReport) -> JSValue {
    let trials: Vec<JSValue> = report.trials.iter().map(trial_to_json).collect();
    json!({
        "config": config_to_json(config, report.seed),
        "trials": trials,
        "summary": summary_to_json(&report.summary),
    })
}

fn log_summary(report: &SimulationReport) {
    let s = &report.summary;
    info!("Summary over {} trials (seed {})", s.trials, report.seed);
    info!("  won by a true majority: {:.2}%", s.true_majority_rate);
    info!("  monotonicity passed:    {:.2}%", s.monotonicity_rate);
    info!("  condorcet cycles:       {:.2}%", s.condorcet_cycle_rate);
    for m in s.methods.iter() {
        info!(
            "  {:>14}: satisfaction {:.4}, best candidate {:.2}%, condorcet winner {:.2}%",
            m.method.to_string(),
            m.average_satisfaction,
            m.best_candidate_rate,
            m.condorcet_rate
        );
    }
}

pub fn run_simulation(args: &Args) -> SimResult<()> {
    let config = build_config(args)?;
    let mut sim = Simulation::new(&config).context(InvalidConfigSnafu {})?;
    info!("config: {:?}", sim.config());

    let report = sim.run().context(VotingSnafu {})?;
    log_summary(&report);

    let report_js = build_report_js(sim.config(), &report);
    let pretty_js_report = serde_json::to_string_pretty(&report_js).context(ParsingJsonSnafu {})?;

    match args.out.as_deref() {
        None | Some("") => {}
        Some("stdout") => println!("{}", pretty_js_report),
        Some(path) => {
            fs::write(path, pretty_js_report.as_bytes())
                .context(WritingOutputSnafu { path })?;
            info!("Report written to {:?}", path);
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_summary(reference_p.clone())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&reference["summary"]).context(ParsingJsonSnafu {})?;
        let pretty_js_summary =
            serde_json::to_string_pretty(&report_js["summary"]).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("The summary matches the reference {:?}", reference_p);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_args(seed: u64) -> Args {
        Args {
            trials: Some(5),
            voters: Some(51),
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("guthrie-{}-{}", std::process::id(), name))
            .display()
            .to_string()
    }

    #[test]
    fn reads_camel_case_keys() {
        let js = r#"{"trials": 10, "axisDecay": 0.25, "candidateMethod": "exact", "showRounds": true}"#;
        let file: SimConfigFile = serde_json::from_str(js).unwrap();
        let mut config = SimulationConfig::DEFAULT;
        file.apply(&mut config).unwrap();
        assert_eq!(config.trials, 10);
        assert_eq!(config.axis_decay, 0.25);
        assert_eq!(config.candidate_method, CandidateMethod::Exact);
        assert!(config.show_rounds);
        assert_eq!(config.voters, SimulationConfig::DEFAULT.voters);
    }

    #[test]
    fn rejects_unknown_keys_and_methods() {
        assert!(serde_json::from_str::<SimConfigFile>(r#"{"voter": 10}"#).is_err());
        let file = SimConfigFile {
            method: Some("gaussian".to_string()),
            ..Default::default()
        };
        let mut config = SimulationConfig::DEFAULT;
        assert!(file.apply(&mut config).is_err());
    }

    #[test]
    fn command_line_overrides_file() {
        let path = temp_path("overrides.json");
        fs::write(&path, r#"{"trials": 10, "voters": 99, "method": "random"}"#).unwrap();
        let args = Args {
            config: Some(path.clone()),
            voters: Some(77),
            show_blocs: true,
            ..Default::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.trials, 10);
        assert_eq!(config.voters, 77);
        assert_eq!(config.method, GenerationMethod::Random);
        assert!(config.show_blocs);
        assert!(!config.show_rounds);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_configuration_fails() {
        let mut args = small_args(3);
        args.candidates = Some(2);
        assert!(matches!(
            run_simulation(&args),
            Err(SimError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn report_matches_itself_as_reference() {
        let _ = env_logger::builder().is_test(true).try_init();
        let path = temp_path("report.json");
        let mut args = small_args(21);
        args.out = Some(path.clone());
        run_simulation(&args).unwrap();

        let js = read_summary(path.clone()).unwrap();
        assert_eq!(js["config"]["seed"], json!(21));
        assert_eq!(js["trials"].as_array().unwrap().len(), 5);
        assert_eq!(js["summary"]["trials"], json!(5));
        assert_eq!(js["summary"]["methods"].as_array().unwrap().len(), 3);
        let first = &js["trials"][0];
        assert_eq!(first["candidates"].as_array().unwrap().len(), 5);
        assert!(first["rounds"].as_array().unwrap().len() >= 1);

        let mut same = small_args(21);
        same.reference = Some(path.clone());
        assert!(run_simulation(&same).is_ok());

        let mut other = small_args(21);
        other.trials = Some(6);
        other.reference = Some(path.clone());
        assert!(run_simulation(&other).is_err());

        fs::remove_file(path).unwrap();
    }

    #[test]
    fn rounds_render_eliminations_and_winner() {
        let rounds = vec![
            RoundStats {
                round: 1,
                tally: vec![("A".to_string(), 2), ("B".to_string(), 1), ("C".to_string(), 2)],
                last_place: vec![("A".to_string(), 2), ("B".to_string(), 0), ("C".to_string(), 3)],
                elected: None,
                eliminated: Some("C".to_string()),
            },
            RoundStats {
                round: 2,
                tally: vec![("A".to_string(), 2), ("B".to_string(), 3)],
                last_place: vec![],
                elected: Some("B".to_string()),
                eliminated: None,
            },
        ];
        let js = rounds_to_json(&rounds);
        assert_eq!(js[0]["tallyResults"][0]["eliminated"], json!("C"));
        assert_eq!(js[0]["tallyResults"][0]["lastPlace"]["C"], json!(3));
        assert_eq!(js[1]["tally"]["B"], json!(3));
        assert_eq!(js[1]["tallyResults"], json!([{"elected": "B"}]));
    }
}
