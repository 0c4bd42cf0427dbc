use log::debug;

use crate::blocs::VoterBlocs;
use crate::candidates::{Candidate, CandidateId};
use crate::config::{RoundStats, VotingErrors};

/// The states of a Guthrie count.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum VoteState {
    /// Counting the given round (starting at 1).
    Round(u32),
    /// A candidate holds more than half of the first-place votes.
    MajorityFound(CandidateId),
    /// No majority: this candidate had the most last-place votes and leaves the count.
    Eliminated(CandidateId),
    Winner(CandidateId),
}

#[derive(PartialEq, Debug, Clone)]
pub struct GuthrieOutcome {
    pub winner: CandidateId,
    /// The winner already had a majority of first-place votes in the first round.
    pub won_first_round: bool,
    pub rounds: Vec<RoundStats>,
}

/// A count in progress.
///
/// Each round, the first-place votes of the blocs are counted among the candidates
/// still running. A candidate with strictly more than half of the votes wins.
/// Otherwise the candidate ranked last by the most voters is eliminated and removed
/// from the rankings of the remaining candidates.
pub struct GuthrieElection<'a> {
    blocs: &'a VoterBlocs,
    candidates: Vec<Candidate>,
    active: Vec<bool>,
    state: VoteState,
    rounds: Vec<RoundStats>,
    won_first_round: bool,
    show_rounds: bool,
}

impl<'a> GuthrieElection<'a> {
    pub fn new(candidates: &[Candidate], blocs: &'a VoterBlocs) -> GuthrieElection<'a> {
        assert_eq!(
            candidates.len(),
            blocs.candidates(),
            "the blocs were computed for another set of candidates"
        );
        GuthrieElection {
            blocs,
            candidates: candidates.to_vec(),
            active: vec![true; candidates.len()],
            state: VoteState::Round(1),
            rounds: Vec::new(),
            won_first_round: false,
            show_rounds: false,
        }
    }

    /// Writes the details of every round to the debug log.
    pub fn show_rounds(mut self, show: bool) -> GuthrieElection<'a> {
        self.show_rounds = show;
        self
    }

    pub fn state(&self) -> VoteState {
        self.state
    }

    /// The candidates still running, in candidate order.
    pub fn remaining(&self) -> Vec<CandidateId> {
        (0..self.candidates.len())
            .filter(|idx| self.active[*idx])
            .map(|idx| CandidateId(idx as u32))
            .collect()
    }

    /// The current ranking of a candidate over the other candidates still running.
    pub fn rankings(&self, cid: CandidateId) -> &[CandidateId] {
        &self.candidates[cid.index()].rankings
    }

    /// The first-place votes of a candidate in the last counted round.
    pub fn votes(&self, cid: CandidateId) -> u64 {
        self.candidates[cid.index()].votes
    }

    /// Moves the count to its next state.
    pub fn step(&mut self) -> Result<VoteState, VotingErrors> {
        self.state = match self.state {
            VoteState::Round(round) => self.count_round(round)?,
            VoteState::MajorityFound(cid) => VoteState::Winner(cid),
            VoteState::Eliminated(cid) => {
                self.eliminate(cid);
                VoteState::Round(self.rounds.len() as u32 + 1)
            }
            VoteState::Winner(cid) => VoteState::Winner(cid),
        };
        Ok(self.state)
    }

    /// Runs the count to the end.
    pub fn run(mut self) -> Result<GuthrieOutcome, VotingErrors> {
        loop {
            if let VoteState::Winner(winner) = self.step()? {
                return Ok(GuthrieOutcome {
                    winner,
                    won_first_round: self.won_first_round,
                    rounds: self.rounds,
                });
            }
        }
    }

    fn count_round(&mut self, round: u32) -> Result<VoteState, VotingErrors> {
        // One elimination per round: the last candidate standing always has a majority.
        assert!(
            round as usize <= self.candidates.len(),
            "round {} with only {} candidates",
            round,
            self.candidates.len()
        );
        let total = self.blocs.voters();
        if total == 0 {
            return Err(VotingErrors::EmptyElection);
        }

        let tally = self.blocs.first_place_tally(&self.active);
        for (c, votes) in self.candidates.iter_mut().zip(tally.iter()) {
            c.votes = *votes;
        }
        let named_tally = self.named(&tally);

        if let Some(winner) = find_majority(&tally, &self.active, total) {
            if round == 1 {
                self.won_first_round = true;
            }
            if self.show_rounds {
                debug!(
                    "Round {}: {:?} -> {} elected",
                    round, named_tally, self.candidates[winner.index()].name
                );
            }
            self.rounds.push(RoundStats {
                round,
                tally: named_tally,
                last_place: Vec::new(),
                elected: Some(self.candidates[winner.index()].name.clone()),
                eliminated: None,
            });
            return Ok(VoteState::MajorityFound(winner));
        }

        let last = self.blocs.last_place_tally(&self.active);
        let loser = find_loser(&last, &self.active).ok_or(VotingErrors::EmptyElection)?;
        let named_last = self.named(&last);
        if self.show_rounds {
            debug!(
                "Round {}: {:?} last places: {:?} -> {} eliminated",
                round,
                named_tally,
                named_last,
                self.candidates[loser.index()].name
            );
        }
        self.rounds.push(RoundStats {
            round,
            tally: named_tally,
            last_place: named_last,
            elected: None,
            eliminated: Some(self.candidates[loser.index()].name.clone()),
        });
        Ok(VoteState::Eliminated(loser))
    }

    fn eliminate(&mut self, loser: CandidateId) {
        self.active[loser.index()] = false;
        let remaining = self.remaining().len();
        for (idx, c) in self.candidates.iter_mut().enumerate() {
            c.rankings.retain(|cid| *cid != loser);
            if self.active[idx] {
                assert_eq!(
                    c.rankings.len(),
                    remaining - 1,
                    "rankings of {} out of sync",
                    c.name
                );
            }
        }
    }

    fn named(&self, counts: &[u64]) -> Vec<(String, u64)> {
        self.candidates
            .iter()
            .zip(counts.iter())
            .enumerate()
            .filter(|(idx, _)| self.active[*idx])
            .map(|(_, (c, n))| (c.name.clone(), *n))
            .collect()
    }
}

/// The candidate with strictly more than half of the votes, if any.
/// Candidates are scanned in order: the earlier candidate is preferred.
pub fn find_majority(tally: &[u64], active: &[bool], total: u64) -> Option<CandidateId> {
    tally
        .iter()
        .enumerate()
        .find(|(idx, votes)| active[*idx] && 2 * **votes > total)
        .map(|(idx, _)| CandidateId(idx as u32))
}

/// The candidate with the most last-place votes. Ties go to the later candidate.
pub fn find_loser(last_place: &[u64], active: &[bool]) -> Option<CandidateId> {
    let mut loser: Option<usize> = None;
    for (idx, count) in last_place.iter().enumerate() {
        if !active[idx] {
            continue;
        }
        match loser {
            Some(l) if *count < last_place[l] => {}
            _ => loser = Some(idx),
        }
    }
    loser.map(|idx| CandidateId(idx as u32))
}

/// Runs a complete Guthrie count.
pub fn run_guthrie(
    candidates: &[Candidate],
    blocs: &VoterBlocs,
    show_rounds: bool,
) -> Result<GuthrieOutcome, VotingErrors> {
    GuthrieElection::new(candidates, blocs)
        .show_rounds(show_rounds)
        .run()
}
