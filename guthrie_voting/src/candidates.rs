use log::debug;
use std::collections::HashSet;

use crate::blocs::VoterBlocs;
use crate::config::{CandidateMethod, SimulationConfig};
use crate::electorate::Electorate;
use crate::position::Position;
use crate::random::RandomSource;

/// Index of a candidate in the roster of a trial.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

impl CandidateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub position: Position,
    /// Support in the current round. Recomputed at every round.
    pub votes: u64,
    /// All the other candidates, closest first.
    pub rankings: Vec<CandidateId>,
    /// Total distance to all the voters. Lower is better.
    pub utility: f64,
}

impl Candidate {
    fn new(position: Position) -> Candidate {
        Candidate {
            name: String::new(),
            position,
            votes: 0,
            rankings: Vec::new(),
            utility: 0.0,
        }
    }
}

/// Orders the given candidates by increasing distance from a point.
///
/// Candidates at the same distance keep the order in which they were given.
pub fn rank_by_distance<'a, I>(from: &Position, candidates: I) -> Vec<CandidateId>
where
    I: Iterator<Item = (CandidateId, &'a Position)>,
{
    let mut dists: Vec<(CandidateId, f64)> =
        candidates.map(|(cid, p)| (cid, from.distance(p))).collect();
    // Stable sort: ties stay in insertion order.
    dists.sort_by(|a, b| a.1.total_cmp(&b.1));
    dists.into_iter().map(|(cid, _)| cid).collect()
}

/// The display name of the n-th candidate: A, B, ..., Z, AA, AB, ...
pub fn candidate_name(idx: usize) -> String {
    let mut n = idx + 1;
    let mut letters: Vec<char> = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The candidates with their ids, in roster order.
pub fn with_ids(candidates: &[Candidate]) -> impl Iterator<Item = (CandidateId, &Position)> {
    candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| (CandidateId(idx as u32), &c.position))
}

/// Computes for every candidate the ranking of all the other candidates.
pub fn rank_candidates(candidates: &mut [Candidate]) {
    let positions: Vec<Position> = candidates.iter().map(|c| c.position.clone()).collect();
    for (idx, c) in candidates.iter_mut().enumerate() {
        let others = positions
            .iter()
            .enumerate()
            .filter(|(idx2, _)| *idx2 != idx)
            .map(|(idx2, p)| (CandidateId(idx2 as u32), p));
        c.rankings = rank_by_distance(&c.position, others);
    }
}

/// Builds a roster from candidate positions: candidates are sorted along the first
/// axis, named in that order and ranked.
pub fn roster(positions: Vec<Position>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = positions.into_iter().map(Candidate::new).collect();
    candidates.sort_by(|a, b| a.position.cmp_primary(&b.position));
    for (idx, c) in candidates.iter_mut().enumerate() {
        c.name = candidate_name(idx);
    }
    rank_candidates(&mut candidates);
    candidates
}

/// The same roster with one candidate withdrawn. Names are kept, rankings are
/// computed again for the new set.
pub fn without(candidates: &[Candidate], removed: CandidateId) -> Vec<Candidate> {
    let mut res: Vec<Candidate> = candidates
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != removed.index())
        .map(|(_, c)| Candidate {
            votes: 0,
            rankings: Vec::new(),
            ..c.clone()
        })
        .collect();
    rank_candidates(&mut res);
    res
}

/// Number of candidates sampled before the primary.
pub fn pool_size(config: &SimulationConfig) -> usize {
    match config.candidate_method {
        CandidateMethod::Exact => config.candidates,
        CandidateMethod::Primary => {
            let primary = (config.voters as f64).powf(config.primary_power).round() as usize;
            primary.max(config.candidates).min(config.voters)
        }
    }
}

/// Picks the candidates of a trial among the voters.
pub fn select_candidates(
    electorate: &Electorate,
    config: &SimulationConfig,
    rng: &mut RandomSource,
) -> Vec<Candidate> {
    let size = pool_size(config);
    let voters = electorate.voters();
    assert!(size <= voters.len(), "not enough voters for the candidate pool");

    let mut picked: HashSet<usize> = HashSet::new();
    let mut pool: Vec<Candidate> = Vec::new();
    while pool.len() < size {
        let idx = rng.generate_below(voters.len());
        if picked.insert(idx) {
            pool.push(Candidate::new(voters[idx].clone()));
        }
    }

    if pool.len() > config.candidates {
        debug!(
            "select_candidates: primary with {} candidates for {} seats",
            pool.len(),
            config.candidates
        );
        run_primary(electorate, &mut pool, config.candidates);
    }

    roster(pool.into_iter().map(|c| c.position).collect())
}

/// Removes the candidate with the fewest first-place votes until only `target`
/// candidates remain. Among tied candidates, the one with the lowest index goes.
pub fn run_primary(electorate: &Electorate, pool: &mut Vec<Candidate>, target: usize) {
    while pool.len() > target {
        let blocs = VoterBlocs::build(electorate, pool);
        let active = vec![true; pool.len()];
        let tally = blocs.first_place_tally(&active);
        let mut loser = 0;
        for (idx, count) in tally.iter().enumerate() {
            if *count < tally[loser] {
                loser = idx;
            }
        }
        debug!(
            "run_primary: tally {:?}, removing candidate at {}",
            tally, pool[loser].position
        );
        pool.remove(loser);
    }
}
