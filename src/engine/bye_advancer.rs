//! C5 ByeAutoAdvancer: auto-complete first-round matches that were seeded
//! with only one team (a bye) and propagate the walkover down the bracket.
//!
//! Grounded on `examples/original_source/backend/routes/matches.py`'s bye
//! handling in `_generate_single_group_matches`, which immediately marks a
//! one-team first-round match as a win and advances that team, rather than
//! leaving a `Pending` match nothing can ever complete.

use crate::models::{Match, MatchId, MatchStatus};

/// A match is a genuine bye — not merely awaiting an opponent still in
/// play — when it holds exactly one team and every match that could ever
/// feed its empty slot has already resolved (or no such match exists). A
/// bye produces no loser, so an edge that will only ever be fed by a bye
/// still "exists" forever; what matters is whether every upstream match
/// that targets this one is Completed, not whether the edge is present.
fn is_unfillable_bye(matches: &[Match], m: &Match) -> bool {
    if m.team_count() != 1 || m.status == MatchStatus::Completed {
        return false;
    }
    !matches.iter().any(|other| {
        (other.winner_advances_to == Some(m.id) || other.loser_advances_to == Some(m.id))
            && other.status != MatchStatus::Completed
    })
}

/// Walk the match list to a fixed point, auto-completing byes and
/// propagating the sole team forward. Returns the ids completed this way.
pub fn run(matches: &mut Vec<Match>) -> Vec<MatchId> {
    let mut completed = Vec::new();
    loop {
        let bye_id = matches
            .iter()
            .find(|m| is_unfillable_bye(matches, m))
            .map(|m| m.id);

        let Some(bye_id) = bye_id else { break };

        let (winner, target) = {
            let m = matches.iter_mut().find(|m| m.id == bye_id).expect("bye id must exist");
            m.team1_score = Some(1);
            m.team2_score = Some(0);
            m.status = MatchStatus::Completed;
            (m.team1.expect("bye match must hold one team"), m.winner_advances_to)
        };

        if let Some(target_id) = target {
            if let Some(target_match) = matches.iter_mut().find(|m| m.id == target_id) {
                target_match.fill_first_empty_slot(winner);
                target_match.refresh_pending_scheduled();
            }
        }

        completed.push(bye_id);
    }
    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RoundType, Stage};

    fn bare(id: MatchId, round_type: RoundType, round_number: u32) -> Match {
        Match::new(id, Stage::GroupA, round_type, round_number, 0)
    }

    #[test]
    fn completes_a_lone_round_zero_match_and_advances_the_team() {
        let mut m0 = bare(1, RoundType::Winners, 0);
        m0.team1 = Some(7);
        m0.winner_advances_to = Some(2);
        let m1 = bare(2, RoundType::Winners, 1);

        let mut matches = vec![m0, m1];
        let completed = run(&mut matches);

        assert_eq!(completed, vec![1]);
        let m0 = matches.iter().find(|m| m.id == 1).unwrap();
        assert_eq!(m0.status, MatchStatus::Completed);
        let m1 = matches.iter().find(|m| m.id == 2).unwrap();
        assert_eq!(m1.team1, Some(7));
    }

    #[test]
    fn leaves_a_one_team_match_alone_if_an_upstream_match_still_feeds_it() {
        let mut m0 = bare(1, RoundType::Winners, 0);
        m0.team1 = Some(7);
        m0.winner_advances_to = Some(3);
        let mut feeder = bare(2, RoundType::Winners, 0);
        feeder.loser_advances_to = Some(3);
        let target = bare(3, RoundType::Winners, 1);

        let mut matches = vec![m0, feeder, target];
        let completed = run(&mut matches);

        assert!(completed.is_empty());
        let target = matches.iter().find(|m| m.id == 3).unwrap();
        assert_eq!(target.status, MatchStatus::Pending);
    }

    #[test]
    fn chains_consecutive_byes_to_a_fixed_point() {
        let mut m0 = bare(1, RoundType::Winners, 0);
        m0.team1 = Some(7);
        m0.winner_advances_to = Some(2);
        let mut m1 = bare(2, RoundType::Winners, 1);
        m1.winner_advances_to = Some(3);
        let m2 = bare(3, RoundType::Winners, 2);

        let mut matches = vec![m0, m1, m2];
        let completed = run(&mut matches);

        assert_eq!(completed, vec![1, 2]);
        let m2 = matches.iter().find(|m| m.id == 3).unwrap();
        assert_eq!(m2.team1, Some(7));
    }
}
