pub use crate::config::*;

use crate::candidates::roster;
use crate::electorate::Electorate;
use crate::position::Position;

/// A builder for trials with fixed positions.
///
/// No random draw is involved: the voters and the candidates are placed by hand.
/// Candidates are named in the order of their first coordinate.
///
/// ```
/// use guthrie_voting::builder::Builder;
/// use guthrie_voting::SimulationConfig;
/// # use guthrie_voting::VotingErrors;
///
/// let mut builder = Builder::new(&SimulationConfig::DEFAULT)?
///     .candidates_simple(&[0.2, 0.5, 0.8])?;
///
/// builder.add_voters_simple(&[0.1, 0.45, 0.5, 0.55, 0.9])?;
/// let result = builder.run(1)?;
/// assert_eq!(result.winner, "B");
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _config: SimulationConfig,
    pub(crate) _candidates: Option<Vec<Position>>,
    pub(crate) _voters: Vec<Position>,
}

impl Builder {
    /// Only the diagnostic flags of the configuration are used.
    pub fn new(config: &SimulationConfig) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _config: config.clone(),
            _candidates: None,
            _voters: Vec::new(),
        })
    }

    pub fn candidates(self, positions: &[Position]) -> Result<Builder, VotingErrors> {
        if positions.is_empty() {
            return Err(VotingErrors::EmptyElection);
        }
        let axes = positions[0].axes();
        check_axes(positions, axes)?;
        check_axes(&self._voters, axes)?;
        Ok(Builder {
            _config: self._config,
            _candidates: Some(positions.to_vec()),
            _voters: self._voters,
        })
    }

    /// Candidates on a single axis.
    pub fn candidates_simple(self, xs: &[f64]) -> Result<Builder, VotingErrors> {
        let positions: Vec<Position> = xs.iter().map(|x| Position::on_line(*x)).collect();
        self.candidates(&positions)
    }

    pub fn add_voter(&mut self, position: Position) -> Result<(), VotingErrors> {
        let axes = self
            ._candidates
            .as_deref()
            .and_then(|c| c.first())
            .or_else(|| self._voters.first())
            .map(|p| p.axes());
        if let Some(expected) = axes {
            check_axes(std::slice::from_ref(&position), expected)?;
        }
        self._voters.push(position);
        Ok(())
    }

    /// Voters on a single axis.
    pub fn add_voters_simple(&mut self, xs: &[f64]) -> Result<(), VotingErrors> {
        for x in xs {
            self.add_voter(Position::on_line(*x))?;
        }
        Ok(())
    }

    /// Runs all the counts on the voters and candidates added so far.
    pub fn run(&self, trial: u32) -> Result<TrialResult, VotingErrors> {
        let positions = self
            ._candidates
            .clone()
            .ok_or(VotingErrors::EmptyElection)?;
        let electorate = Electorate::from_positions(self._voters.clone());
        crate::evaluate_trial(trial, &electorate, roster(positions), &self._config)
    }
}

fn check_axes(positions: &[Position], expected: usize) -> Result<(), VotingErrors> {
    match positions.iter().find(|p| p.axes() != expected) {
        Some(p) => Err(VotingErrors::AxisMismatch {
            expected,
            found: p.axes(),
        }),
        None => Ok(()),
    }
}
