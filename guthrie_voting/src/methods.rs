//! Other single-winner methods, run on the same blocs for comparison.

use log::debug;

use crate::blocs::VoterBlocs;
use crate::candidates::{Candidate, CandidateId};
use crate::config::{VotingErrors, VotingMethod};
use crate::guthrie::{find_majority, run_guthrie};

/// The candidate with the most first-place votes. Ties go to the earlier candidate.
pub fn plurality(blocs: &VoterBlocs) -> Result<CandidateId, VotingErrors> {
    if blocs.voters() == 0 || blocs.candidates() == 0 {
        return Err(VotingErrors::EmptyElection);
    }
    let active = vec![true; blocs.candidates()];
    let tally = blocs.first_place_tally(&active);
    let mut best = 0;
    for (idx, votes) in tally.iter().enumerate() {
        if *votes > tally[best] {
            best = idx;
        }
    }
    Ok(CandidateId(best as u32))
}

/// Instant-runoff: while no candidate has a majority of first places, the candidate
/// with the fewest first places is eliminated. Ties eliminate the earlier candidate.
pub fn instant_runoff(blocs: &VoterBlocs) -> Result<CandidateId, VotingErrors> {
    let total = blocs.voters();
    if total == 0 || blocs.candidates() == 0 {
        return Err(VotingErrors::EmptyElection);
    }
    let mut active = vec![true; blocs.candidates()];
    for round in 1..=blocs.candidates() {
        let tally = blocs.first_place_tally(&active);
        if let Some(winner) = find_majority(&tally, &active, total) {
            debug!("instant_runoff: round {}: {:?} wins", round, winner);
            return Ok(winner);
        }
        let mut loser: Option<usize> = None;
        for (idx, votes) in tally.iter().enumerate() {
            if !active[idx] {
                continue;
            }
            match loser {
                Some(l) if *votes >= tally[l] => {}
                _ => loser = Some(idx),
            }
        }
        let loser = loser.ok_or(VotingErrors::EmptyElection)?;
        debug!("instant_runoff: round {}: {} eliminated", round, loser);
        active[loser] = false;
    }
    Err(VotingErrors::NoConvergence)
}

/// The winner of the given method.
pub fn winner(
    method: VotingMethod,
    candidates: &[Candidate],
    blocs: &VoterBlocs,
) -> Result<CandidateId, VotingErrors> {
    match method {
        VotingMethod::Plurality => plurality(blocs),
        VotingMethod::InstantRunoff => instant_runoff(blocs),
        VotingMethod::Guthrie => run_guthrie(candidates, blocs, false).map(|o| o.winner),
    }
}
