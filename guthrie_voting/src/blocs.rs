use log::debug;
use std::collections::BTreeMap;

use crate::candidates::{rank_by_distance, with_ids, Candidate, CandidateId};
use crate::electorate::Electorate;

/// Voters that rank the candidates in exactly the same order.
#[derive(PartialEq, Debug, Clone)]
pub struct Bloc {
    /// All the candidates, preferred first.
    pub ranking: Vec<CandidateId>,
    pub count: u64,
    /// For each candidate (by index), the summed distance from the voters of this bloc.
    pub distance_sums: Vec<f64>,
}

impl Bloc {
    /// The preferred candidate that is still running.
    pub fn top(&self, active: &[bool]) -> Option<CandidateId> {
        self.ranking.iter().find(|cid| active[cid.index()]).cloned()
    }

    /// The least preferred candidate that is still running.
    pub fn bottom(&self, active: &[bool]) -> Option<CandidateId> {
        self.ranking.iter().rev().find(|cid| active[cid.index()]).cloned()
    }

    /// Position of a candidate in the ranking, lower is preferred.
    pub fn rank_of(&self, cid: CandidateId) -> Option<usize> {
        self.ranking.iter().position(|c| *c == cid)
    }
}

/// The electorate compressed by preference order.
///
/// Counting a round only needs one pass over the blocs instead of one pass over
/// the voters. The blocs are computed once for a set of candidates, and stay valid
/// while candidates are eliminated: eliminated candidates are skipped when reading
/// the rankings.
#[derive(PartialEq, Debug, Clone)]
pub struct VoterBlocs {
    blocs: Vec<Bloc>,
    voters: u64,
    candidates: usize,
}

impl VoterBlocs {
    /// Groups the voters that share the same ranking of the candidates.
    pub fn build(electorate: &Electorate, candidates: &[Candidate]) -> VoterBlocs {
        let mut map: BTreeMap<Vec<CandidateId>, (u64, Vec<f64>)> = BTreeMap::new();
        for voter in electorate.voters() {
            let ranking = rank_by_distance(voter, with_ids(candidates));
            let e = map
                .entry(ranking)
                .or_insert_with(|| (0, vec![0.0; candidates.len()]));
            e.0 += 1;
            for (sum, c) in e.1.iter_mut().zip(candidates.iter()) {
                *sum += voter.distance(&c.position);
            }
        }
        let blocs: Vec<Bloc> = map
            .into_iter()
            .map(|(ranking, (count, distance_sums))| Bloc {
                ranking,
                count,
                distance_sums,
            })
            .collect();
        let res = VoterBlocs {
            blocs,
            voters: electorate.len() as u64,
            candidates: candidates.len(),
        };
        res.check_total();
        res
    }

    /// One bloc per voter, in the order of the electorate. Gives the same counts
    /// as `build`, at the cost of one ranking per voter in every round.
    pub fn unmerged(electorate: &Electorate, candidates: &[Candidate]) -> VoterBlocs {
        let blocs: Vec<Bloc> = electorate
            .voters()
            .iter()
            .map(|voter| Bloc {
                ranking: rank_by_distance(voter, with_ids(candidates)),
                count: 1,
                distance_sums: candidates
                    .iter()
                    .map(|c| voter.distance(&c.position))
                    .collect(),
            })
            .collect();
        VoterBlocs {
            blocs,
            voters: electorate.len() as u64,
            candidates: candidates.len(),
        }
    }

    /// Blocs given directly as rankings with a number of voters, for hypothetical
    /// electorates without positions. Distances are all zero.
    pub fn from_ballots(ballots: &[(Vec<CandidateId>, u64)], candidates: usize) -> VoterBlocs {
        let blocs: Vec<Bloc> = ballots
            .iter()
            .map(|(ranking, count)| {
                assert_eq!(ranking.len(), candidates, "incomplete ranking: {:?}", ranking);
                Bloc {
                    ranking: ranking.clone(),
                    count: *count,
                    distance_sums: vec![0.0; candidates],
                }
            })
            .collect();
        let voters = blocs.iter().map(|b| b.count).sum();
        VoterBlocs {
            blocs,
            voters,
            candidates,
        }
    }

    fn check_total(&self) {
        let total: u64 = self.blocs.iter().map(|b| b.count).sum();
        assert_eq!(
            total, self.voters,
            "the blocs account for {} voters instead of {}",
            total, self.voters
        );
    }

    pub fn blocs(&self) -> &[Bloc] {
        &self.blocs
    }

    pub fn voters(&self) -> u64 {
        self.voters
    }

    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// First-place votes of every candidate (by index). Inactive candidates get 0.
    pub fn first_place_tally(&self, active: &[bool]) -> Vec<u64> {
        let mut tally = vec![0; self.candidates];
        for b in self.blocs.iter() {
            if let Some(cid) = b.top(active) {
                tally[cid.index()] += b.count;
            }
        }
        tally
    }

    /// Last-place votes of every candidate (by index). Inactive candidates get 0.
    pub fn last_place_tally(&self, active: &[bool]) -> Vec<u64> {
        let mut tally = vec![0; self.candidates];
        for b in self.blocs.iter() {
            if let Some(cid) = b.bottom(active) {
                tally[cid.index()] += b.count;
            }
        }
        tally
    }

    /// The total distance from all the voters to each candidate.
    pub fn utilities(&self) -> Vec<f64> {
        let mut res = vec![0.0; self.candidates];
        for b in self.blocs.iter() {
            for (u, d) in res.iter_mut().zip(b.distance_sums.iter()) {
                *u += d;
            }
        }
        res
    }

    /// Writes the blocs to the debug log.
    pub fn log(&self, candidates: &[Candidate]) {
        debug!(
            "VoterBlocs: {} voters in {} blocs",
            self.voters,
            self.blocs.len()
        );
        for b in self.blocs.iter() {
            let names: Vec<&str> = b
                .ranking
                .iter()
                .map(|cid| candidates[cid.index()].name.as_str())
                .collect();
            debug!("bloc {:>6} {}", b.count, names.join(">"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::roster;
    use crate::position::Position;
    use crate::random::RandomSource;

    fn line(xs: &[f64]) -> Vec<Position> {
        xs.iter().map(|x| Position::on_line(*x)).collect()
    }

    // Counts every voter on its own, looking at distances directly.
    fn naive_first_places(
        electorate: &Electorate,
        candidates: &[Candidate],
        active: &[bool],
    ) -> Vec<u64> {
        let mut tally = vec![0; candidates.len()];
        for v in electorate.voters() {
            let mut best: Option<(usize, f64)> = None;
            for (idx, c) in candidates.iter().enumerate() {
                if !active[idx] {
                    continue;
                }
                let d = v.distance(&c.position);
                if best.map(|(_, bd)| d < bd).unwrap_or(true) {
                    best = Some((idx, d));
                }
            }
            if let Some((idx, _)) = best {
                tally[idx] += 1;
            }
        }
        tally
    }

    #[test]
    fn groups_identical_rankings() {
        let electorate = Electorate::from_positions(line(&[0.05, 0.1, 0.45, 0.48, 0.55, 0.95]));
        let cands = roster(line(&[0.1, 0.5, 0.9]));
        let blocs = VoterBlocs::build(&electorate, &cands);
        assert_eq!(blocs.voters(), 6);
        assert_eq!(blocs.blocs().iter().map(|b| b.count).sum::<u64>(), 6);
        // A>B>C, B>A>C, B>C>A, C>B>A
        assert_eq!(blocs.blocs().len(), 4);
        let abc = blocs
            .blocs()
            .iter()
            .find(|b| b.ranking == vec![CandidateId(0), CandidateId(1), CandidateId(2)])
            .unwrap();
        assert_eq!(abc.count, 2);
        assert!((abc.distance_sums[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn top_and_bottom_skip_eliminated() {
        let b = Bloc {
            ranking: vec![CandidateId(2), CandidateId(0), CandidateId(1)],
            count: 3,
            distance_sums: vec![0.0; 3],
        };
        assert_eq!(b.top(&[true, true, true]), Some(CandidateId(2)));
        assert_eq!(b.bottom(&[true, true, true]), Some(CandidateId(1)));
        assert_eq!(b.top(&[true, true, false]), Some(CandidateId(0)));
        assert_eq!(b.bottom(&[true, false, true]), Some(CandidateId(0)));
        assert_eq!(b.top(&[false, false, false]), None);
        assert_eq!(b.rank_of(CandidateId(1)), Some(2));
    }

    #[test]
    fn blocs_match_voters_for_every_elimination() {
        let mut rng = RandomSource::new(17);
        let voters: Vec<Position> = (0..400)
            .map(|_| Position::new(vec![rng.generate(), rng.generate()]))
            .collect();
        let electorate = Electorate::from_positions(voters);
        let cands = roster(
            (0..6)
                .map(|_| Position::new(vec![rng.generate(), rng.generate()]))
                .collect(),
        );
        let blocs = VoterBlocs::build(&electorate, &cands);
        let unmerged = VoterBlocs::unmerged(&electorate, &cands);
        let mut active = vec![true; cands.len()];
        for eliminated in 0..cands.len() - 1 {
            let expected = naive_first_places(&electorate, &cands, &active);
            assert_eq!(blocs.first_place_tally(&active), expected);
            assert_eq!(unmerged.first_place_tally(&active), expected);
            assert_eq!(
                blocs.last_place_tally(&active),
                unmerged.last_place_tally(&active)
            );
            active[eliminated] = false;
        }
    }

    #[test]
    fn utilities_sum_distances() {
        let electorate = Electorate::from_positions(line(&[0.0, 0.5, 1.0]));
        let cands = roster(line(&[0.0, 0.5, 1.0]));
        let u = VoterBlocs::build(&electorate, &cands).utilities();
        assert_eq!(u, vec![1.5, 1.0, 1.5]);
    }

    #[test]
    fn ballots_count_voters() {
        let a = CandidateId(0);
        let b = CandidateId(1);
        let blocs = VoterBlocs::from_ballots(&[(vec![a, b], 3), (vec![b, a], 2)], 2);
        assert_eq!(blocs.voters(), 5);
        assert_eq!(blocs.first_place_tally(&[true, true]), vec![3, 2]);
        assert_eq!(blocs.last_place_tally(&[true, true]), vec![2, 3]);
    }
}
