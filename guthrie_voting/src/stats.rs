use log::debug;

use crate::blocs::VoterBlocs;
use crate::candidates::{without, Candidate, CandidateId};
use crate::config::{
    CondorcetOutcome, MethodSummary, MonotonicityReport, Summary, TrialResult, VotingErrors,
    VotingMethod,
};
use crate::electorate::Electorate;
use crate::guthrie::run_guthrie;

/// The reference points used to score the candidates of a trial.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct UtilitySummary {
    /// The candidate with the lowest utility. Ties go to the earlier candidate.
    pub best: CandidateId,
    pub best_utility: f64,
    pub average_utility: f64,
}

impl UtilitySummary {
    pub fn new(utilities: &[f64]) -> Option<UtilitySummary> {
        if utilities.is_empty() {
            return None;
        }
        let mut best = 0;
        for (idx, u) in utilities.iter().enumerate() {
            if *u < utilities[best] {
                best = idx;
            }
        }
        Some(UtilitySummary {
            best: CandidateId(best as u32),
            best_utility: utilities[best],
            average_utility: utilities.iter().sum::<f64>() / utilities.len() as f64,
        })
    }

    /// 1 for the best candidate, 0 for a candidate of average utility, negative
    /// below the average. All the candidates score 0 when their utilities are equal.
    pub fn satisfaction(&self, utility: f64) -> f64 {
        let spread = self.average_utility - self.best_utility;
        if spread <= 1e-12 * self.average_utility.abs().max(1.0) {
            return 0.0;
        }
        (self.average_utility - utility) / spread
    }
}

/// Pairwise contests between all the candidates.
///
/// A voter supports the candidate it ranks higher; voters at equal distance rank the
/// earlier candidate higher. A candidate wins a contest with at least half of the
/// votes. The Condorcet winner is the candidate with the most contests won; `None`
/// when several candidates share that number.
pub fn condorcet(blocs: &VoterBlocs) -> Option<CandidateId> {
    let n = blocs.candidates();
    let total = blocs.voters();
    if n == 0 {
        return None;
    }
    // rank_positions[b][c]: position of candidate c in bloc b.
    let rank_positions: Vec<Vec<usize>> = blocs
        .blocs()
        .iter()
        .map(|b| {
            let mut pos = vec![usize::MAX; n];
            for (rank, cid) in b.ranking.iter().enumerate() {
                pos[cid.index()] = rank;
            }
            pos
        })
        .collect();

    let mut wins = vec![0usize; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let votes_i: u64 = blocs
                .blocs()
                .iter()
                .zip(rank_positions.iter())
                .filter(|(_, pos)| pos[i] < pos[j])
                .map(|(b, _)| b.count)
                .sum();
            if 2 * votes_i >= total {
                wins[i] += 1;
            } else {
                wins[j] += 1;
            }
        }
    }
    debug!("condorcet: pairwise wins {:?}", wins);

    let most = wins.iter().cloned().max().unwrap_or(0);
    let leaders: Vec<usize> = (0..n).filter(|idx| wins[*idx] == most).collect();
    match leaders.as_slice() {
        [single] => Some(CandidateId(*single as u32)),
        _ => None,
    }
}

/// Runs the election again without each losing candidate, one at a time.
///
/// The winner is compared by name since the identifiers change with the roster.
pub fn monotonicity(
    electorate: &Electorate,
    candidates: &[Candidate],
    winner: CandidateId,
) -> Result<MonotonicityReport, VotingErrors> {
    let winner_name = &candidates[winner.index()].name;
    let mut flips: Vec<String> = Vec::new();
    for (idx, c) in candidates.iter().enumerate() {
        if idx == winner.index() {
            continue;
        }
        let reduced = without(candidates, CandidateId(idx as u32));
        let blocs = VoterBlocs::build(electorate, &reduced);
        let outcome = run_guthrie(&reduced, &blocs, false)?;
        let new_winner = &reduced[outcome.winner.index()].name;
        if new_winner != winner_name {
            debug!(
                "monotonicity: withdrawing {} changes the winner from {} to {}",
                c.name, winner_name, new_winner
            );
            flips.push(c.name.clone());
        }
    }
    Ok(MonotonicityReport { flips })
}

#[derive(PartialEq, Debug, Clone)]
struct MethodTotals {
    method: VotingMethod,
    satisfaction: f64,
    best: u64,
    condorcet: u64,
}

/// Running totals over the trials of a simulation.
#[derive(PartialEq, Debug, Clone)]
pub struct SummaryAccumulator {
    trials: u64,
    true_majority: u64,
    monotonic: u64,
    condorcet_cycles: u64,
    methods: Vec<MethodTotals>,
}

impl SummaryAccumulator {
    pub const METHODS: [VotingMethod; 3] = [
        VotingMethod::Plurality,
        VotingMethod::InstantRunoff,
        VotingMethod::Guthrie,
    ];

    pub fn new() -> SummaryAccumulator {
        SummaryAccumulator {
            trials: 0,
            true_majority: 0,
            monotonic: 0,
            condorcet_cycles: 0,
            methods: Self::METHODS
                .iter()
                .map(|m| MethodTotals {
                    method: *m,
                    satisfaction: 0.0,
                    best: 0,
                    condorcet: 0,
                })
                .collect(),
        }
    }

    pub fn add(&mut self, trial: &TrialResult) {
        self.trials += 1;
        if trial.won_first_round {
            self.true_majority += 1;
        }
        if trial.monotonicity.passed() {
            self.monotonic += 1;
        }
        if trial.condorcet == CondorcetOutcome::Cycle {
            self.condorcet_cycles += 1;
        }
        for totals in self.methods.iter_mut() {
            let winner = match totals.method {
                VotingMethod::Plurality => &trial.plurality_winner,
                VotingMethod::InstantRunoff => &trial.instant_runoff_winner,
                VotingMethod::Guthrie => &trial.winner,
            };
            if let Some(report) = trial.candidates.iter().find(|c| c.name == *winner) {
                totals.satisfaction += report.satisfaction;
            }
            if *winner == trial.best_candidate {
                totals.best += 1;
            }
            if trial.condorcet == CondorcetOutcome::Winner(winner.clone()) {
                totals.condorcet += 1;
            }
        }
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    /// Averages and percentages over the trials added so far.
    pub fn summary(&self) -> Summary {
        let n = self.trials.max(1) as f64;
        let pct = |count: u64| 100.0 * count as f64 / n;
        Summary {
            trials: self.trials,
            true_majority_rate: pct(self.true_majority),
            monotonicity_rate: pct(self.monotonic),
            condorcet_cycle_rate: pct(self.condorcet_cycles),
            methods: self
                .methods
                .iter()
                .map(|t| MethodSummary {
                    method: t.method,
                    average_satisfaction: t.satisfaction / n,
                    best_candidate_rate: pct(t.best),
                    condorcet_rate: pct(t.condorcet),
                })
                .collect(),
        }
    }
}

impl Default for SummaryAccumulator {
    fn default() -> Self {
        SummaryAccumulator::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::roster;
    use crate::config::CandidateReport;
    use crate::position::Position;

    fn ids(xs: &[u32]) -> Vec<CandidateId> {
        xs.iter().map(|x| CandidateId(*x)).collect()
    }

    fn line(xs: &[f64]) -> Vec<Position> {
        xs.iter().map(|x| Position::on_line(*x)).collect()
    }

    #[test]
    fn satisfaction_bounds() {
        let utilities = vec![12.5, 7.25, 30.0, 18.0];
        let s = UtilitySummary::new(&utilities).unwrap();
        assert_eq!(s.best, CandidateId(1));
        assert_eq!(s.satisfaction(s.best_utility), 1.0);
        assert_eq!(s.satisfaction(s.average_utility), 0.0);
        assert!(s.satisfaction(30.0) < 0.0);
        let mid = s.satisfaction(12.5);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn satisfaction_with_equal_utilities() {
        let s = UtilitySummary::new(&[0.1 + 0.2, 0.3, 0.3]).unwrap();
        assert_eq!(s.satisfaction(0.3), 0.0);
        assert_eq!(s.satisfaction(s.best_utility), 0.0);
        assert_eq!(UtilitySummary::new(&[]), None);
    }

    #[test]
    fn condorcet_cycle() {
        let blocs = VoterBlocs::from_ballots(
            &[
                (ids(&[0, 1, 2]), 100),
                (ids(&[1, 2, 0]), 100),
                (ids(&[2, 0, 1]), 100),
            ],
            3,
        );
        assert_eq!(condorcet(&blocs), None);
    }

    #[test]
    fn condorcet_winner_in_the_center() {
        let blocs = VoterBlocs::from_ballots(
            &[
                (ids(&[0, 1, 2]), 4),
                (ids(&[1, 0, 2]), 1),
                (ids(&[1, 2, 0]), 2),
                (ids(&[2, 1, 0]), 3),
            ],
            3,
        );
        assert_eq!(condorcet(&blocs), Some(CandidateId(1)));
    }

    #[test]
    fn condorcet_even_split_favors_earlier() {
        let blocs = VoterBlocs::from_ballots(
            &[(ids(&[0, 1, 2]), 2), (ids(&[1, 0, 2]), 2)],
            3,
        );
        // A beats B 2-2, both beat C.
        assert_eq!(condorcet(&blocs), Some(CandidateId(0)));
    }

    #[test]
    fn withdrawing_a_loser_can_change_the_winner() {
        // B wins with a majority, and keeps it whoever withdraws.
        let electorate =
            Electorate::from_positions(line(&[0.05, 0.15, 0.35, 0.45, 0.5, 0.55, 0.65, 0.85, 0.95]));
        let cands = roster(line(&[0.1, 0.5, 0.9]));
        let report = monotonicity(&electorate, &cands, CandidateId(1)).unwrap();
        assert!(report.passed());

        // Pretend A won. Without B, A still beats C 5 to 4. Without C, B wins.
        let report = monotonicity(&electorate, &cands, CandidateId(0)).unwrap();
        assert_eq!(report.flips, vec!["C".to_string()]);
    }

    fn report(name: &str, satisfaction: f64) -> CandidateReport {
        CandidateReport {
            name: name.to_string(),
            position: vec![0.0],
            utility: 0.0,
            satisfaction,
            rankings: vec![],
        }
    }

    #[test]
    fn accumulates_percentages() {
        let trial = TrialResult {
            trial: 1,
            candidates: vec![report("A", 1.0), report("B", -0.5), report("C", -0.5)],
            rounds: vec![],
            winner: "A".to_string(),
            won_first_round: true,
            best_candidate: "A".to_string(),
            condorcet: CondorcetOutcome::Winner("A".to_string()),
            monotonicity: MonotonicityReport { flips: vec![] },
            plurality_winner: "B".to_string(),
            instant_runoff_winner: "A".to_string(),
        };
        let mut other = trial.clone();
        other.won_first_round = false;
        other.condorcet = CondorcetOutcome::Cycle;
        other.monotonicity = MonotonicityReport {
            flips: vec!["C".to_string()],
        };

        let mut acc = SummaryAccumulator::new();
        acc.add(&trial);
        acc.add(&other);
        let s = acc.summary();
        assert_eq!(s.trials, 2);
        assert_eq!(s.true_majority_rate, 50.0);
        assert_eq!(s.monotonicity_rate, 50.0);
        assert_eq!(s.condorcet_cycle_rate, 50.0);

        let guthrie = s
            .methods
            .iter()
            .find(|m| m.method == VotingMethod::Guthrie)
            .unwrap();
        assert_eq!(guthrie.average_satisfaction, 1.0);
        assert_eq!(guthrie.best_candidate_rate, 100.0);
        assert_eq!(guthrie.condorcet_rate, 50.0);

        let plurality = s
            .methods
            .iter()
            .find(|m| m.method == VotingMethod::Plurality)
            .unwrap();
        assert_eq!(plurality.average_satisfaction, -0.5);
        assert_eq!(plurality.best_candidate_rate, 0.0);
    }
}
