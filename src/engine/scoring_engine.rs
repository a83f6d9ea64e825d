//! C4 ScoringEngine: record a match result, advance teams along bracket
//! edges, and support re-scoring with local (one-hop) rollback.
//!
//! Grounded on `examples/original_source/backend/routes/matches.py`'s
//! `score_match` endpoint (re-score detection, winner/loser slot fill,
//! dynamic bracket-reset creation), reworked into a pure function over
//! `Tournament` rather than ORM row mutation + commit.

use crate::engine::bye_advancer;
use crate::engine::completion_pipeline;
use crate::engine::context::EngineContext;
use crate::engine::error::{EngineError, EngineResult};
use crate::models::{Match, MatchId, MatchStatus, RoundType, Stage, TeamId, Tournament, TournamentStatus};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScoreOutcome {
    pub match_id: MatchId,
    pub winner_team_id: TeamId,
    pub loser_team_id: Option<TeamId>,
    pub status: MatchStatus,
    pub is_rescore: bool,
    pub championship_game2_created: Option<MatchId>,
    pub tournament_completed: bool,
}

/// `ScoreMatch` per spec §4.4.
pub fn score_match(
    tournament: &mut Tournament,
    ctx: &mut EngineContext,
    match_id: MatchId,
    team1_score: u32,
    team2_score: u32,
) -> EngineResult<ScoreOutcome> {
    if !matches!(tournament.status, TournamentStatus::Scheduled | TournamentStatus::InProgress) {
        return Err(EngineError::InvalidState(
            "tournament is not Scheduled or In_Progress".into(),
        ));
    }

    let is_bye = tournament
        .match_(match_id)
        .ok_or_else(|| EngineError::NotFound(format!("match {match_id} not found")))?
        .team2
        .is_none();

    let (t1, t2) = if is_bye {
        (1, 0)
    } else {
        if team1_score == team2_score {
            return Err(EngineError::InvalidInput("tied scores are not allowed".into()));
        }
        (team1_score, team2_score)
    };

    let (was_completed, previous_winner_loser, winner_advances_to, loser_advances_to, round_type, stage, round_number) = {
        let m = tournament
            .match_mut(match_id)
            .ok_or_else(|| EngineError::NotFound(format!("match {match_id} not found")))?;

        if m.is_group_stage_championship() {
            return Err(EngineError::InvalidState(
                "group-stage championship matches cannot be scored directly".into(),
            ));
        }
        if !is_bye && !matches!(m.status, MatchStatus::InProgress | MatchStatus::Completed) {
            return Err(EngineError::InvalidState(format!(
                "match {match_id} is not In_Progress"
            )));
        }

        let was_completed = m.status == MatchStatus::Completed;
        let previous = if was_completed { m.winner_loser() } else { None };

        m.team1_score = Some(t1);
        m.team2_score = Some(t2);
        m.status = MatchStatus::Completed;
        m.station_assignment = None;

        (
            was_completed,
            previous,
            m.winner_advances_to,
            m.loser_advances_to,
            m.round_type,
            m.stage,
            m.round_number,
        )
    };

    let m = tournament.match_(match_id).unwrap();
    let (winner, loser) = if is_bye {
        (m.team1.expect("bye match must hold team1"), None)
    } else {
        let (w, l) = m.winner_loser().expect("non-bye match must have both teams scored");
        (w, Some(l))
    };
    let is_rescore = was_completed;

    if is_rescore {
        if let Some((prev_winner, prev_loser)) = previous_winner_loser {
            if prev_winner != winner {
                for target in [winner_advances_to, loser_advances_to].into_iter().flatten() {
                    if tournament.match_(target).map(|m| m.status == MatchStatus::Completed).unwrap_or(false) {
                        return Err(EngineError::InvalidState(format!(
                            "cannot re-score match {match_id}: downstream match {target} is already Completed"
                        )));
                    }
                }
                if let Some(target) = winner_advances_to {
                    clear_slot(tournament, target, prev_winner);
                }
                if let Some(target) = loser_advances_to {
                    clear_slot(tournament, target, prev_loser);
                }
            }
        }
    }

    if let Some(target) = winner_advances_to {
        fill_slot(tournament, target, winner);
    }
    if let (Some(target), Some(loser)) = (loser_advances_to, loser) {
        fill_slot(tournament, target, loser);
    }

    bye_advancer::run(&mut tournament.matches);

    let mut championship_game2_created = None;
    let mut tournament_completed = false;

    let is_real_championship = round_type == RoundType::Championship && !matches!(stage, Stage::GroupA | Stage::GroupB);

    if is_real_championship {
        // team1 is always the WB finalist by construction (§4.2); team2 is the LB finalist.
        let wb_finalist = tournament.match_(match_id).unwrap().team1.unwrap();
        if round_number == 0 {
            if winner == wb_finalist {
                tournament_completed = true;
            } else {
                let already_created = tournament
                    .matches
                    .iter()
                    .any(|m| m.stage == stage && m.round_type == RoundType::Championship && m.round_number == 1);
                if !already_created {
                    let lb_finalist = tournament.match_(match_id).unwrap().team2.unwrap();
                    let new_id = tournament.matches.iter().map(|m| m.id).max().unwrap_or(0) + 1;
                    let order = tournament.matches.iter().map(|m| m.match_order).max().unwrap_or(0) + 1;
                    let mut game2 = Match::new(new_id, stage, RoundType::Championship, 1, 0);
                    game2.team1 = Some(wb_finalist);
                    game2.team2 = Some(lb_finalist);
                    game2.status = MatchStatus::Scheduled;
                    game2.match_order = order;
                    tournament.matches.push(game2);
                    championship_game2_created = Some(new_id);
                }
            }
        } else {
            tournament_completed = true;
        }
    } else if !all_playable_matches_resolved(tournament) {
        tournament_completed = false;
    } else {
        tournament_completed = true;
    }

    if tournament_completed {
        tournament.status = TournamentStatus::Completed;
        completion_pipeline::complete(tournament, ctx)?;
    }

    Ok(ScoreOutcome {
        match_id,
        winner_team_id: winner,
        loser_team_id: loser,
        status: MatchStatus::Completed,
        is_rescore,
        championship_game2_created,
        tournament_completed,
    })
}

fn clear_slot(tournament: &mut Tournament, target: MatchId, team: TeamId) {
    if let Some(m) = tournament.match_mut(target) {
        if m.team1 == Some(team) {
            m.team1 = None;
        } else if m.team2 == Some(team) {
            m.team2 = None;
        }
        m.refresh_pending_scheduled();
    }
}

/// No-op if `team` already occupies a slot in `target` — re-scoring a match
/// with an unchanged winner must not duplicate it into the downstream match's
/// other, still-empty slot.
fn fill_slot(tournament: &mut Tournament, target: MatchId, team: TeamId) {
    if let Some(m) = tournament.match_mut(target) {
        if m.team1 == Some(team) || m.team2 == Some(team) {
            return;
        }
        m.fill_first_empty_slot(team);
        m.refresh_pending_scheduled();
    }
}

/// No `Scheduled` matches remain, and no `Pending` match still holds a team
/// waiting on a dead upstream (per spec §4.4 step 8).
fn all_playable_matches_resolved(tournament: &Tournament) -> bool {
    !tournament.matches.iter().any(|m| m.status == MatchStatus::Scheduled)
        && !tournament
            .matches
            .iter()
            .any(|m| m.status == MatchStatus::Pending && m.team_count() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::bracket_builder;
    use crate::models::{AcePotEntry, Player, PlayerId, Team, TeamHistory};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn tournament_with_bracket(n: u32) -> Tournament {
        let mut t = Tournament::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        t.status = TournamentStatus::InProgress;
        let teams: Vec<Team> = (1..=n).map(|i| Team::new_pair(i, uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), i)).collect();
        t.matches = bracket_builder::build(&teams, 1, Stage::GroupA).unwrap();
        for team in &teams {
            t.registrations.push(crate::models::Registration { player_id: team.player1, bought_ace_pot: false });
            if let Some(p2) = team.player2 {
                t.registrations.push(crate::models::Registration { player_id: p2, bought_ace_pot: false });
            }
        }
        t.teams = teams;
        t
    }

    struct Ctx {
        players: HashMap<PlayerId, Player>,
        team_history: HashMap<(PlayerId, PlayerId), TeamHistory>,
        ace_pot_ledger: Vec<AcePotEntry>,
    }

    impl Ctx {
        fn new(tournament: &Tournament) -> Self {
            let mut players = HashMap::new();
            for team in &tournament.teams {
                for pid in team.members() {
                    players.entry(pid).or_insert_with(|| Player {
                        id: pid,
                        name: pid.to_string(),
                        nickname: None,
                        division: crate::models::Division::Am,
                        seasonal_points: 0,
                        seasonal_cash: rust_decimal::Decimal::ZERO,
                    });
                }
            }
            Self { players, team_history: HashMap::new(), ace_pot_ledger: Vec::new() }
        }

        fn as_engine_ctx(&mut self) -> EngineContext<'_> {
            EngineContext {
                players: &mut self.players,
                team_history: &mut self.team_history,
                ace_pot_ledger: &mut self.ace_pot_ledger,
            }
        }
    }

    fn start_all_scheduled(t: &mut Tournament) {
        let ids: Vec<MatchId> = t
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Scheduled)
            .map(|m| m.id)
            .collect();
        for id in ids {
            t.match_mut(id).unwrap().status = MatchStatus::InProgress;
        }
    }

    #[test]
    fn rejects_tied_scores() {
        let mut t = tournament_with_bracket(4);
        let mut ctx = Ctx::new(&t);
        start_all_scheduled(&mut t);
        let m = t.matches.iter().find(|m| m.round_type == RoundType::Winners && m.team_count() == 2).unwrap().id;
        assert!(matches!(
            score_match(&mut t, &mut ctx.as_engine_ctx(), m, 5, 5),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_scoring_a_non_in_progress_match() {
        let mut t = tournament_with_bracket(4);
        let mut ctx = Ctx::new(&t);
        let m = t.matches.iter().find(|m| m.status == MatchStatus::Scheduled).unwrap().id;
        assert!(matches!(
            score_match(&mut t, &mut ctx.as_engine_ctx(), m, 11, 5),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn rescoring_with_the_same_winner_does_not_duplicate_the_team_downstream() {
        let mut t = tournament_with_bracket(4);
        let mut ctx = Ctx::new(&t);
        start_all_scheduled(&mut t);
        let m1 = t.matches.iter().find(|m| m.round_type == RoundType::Winners && m.round_number == 0).unwrap().id;
        let target = t.match_(m1).unwrap().winner_advances_to.unwrap();

        score_match(&mut t, &mut ctx.as_engine_ctx(), m1, 11, 5).unwrap();
        let winner = t.match_(target).unwrap().team1.or(t.match_(target).unwrap().team2).unwrap();

        // Re-score the same match with an unchanged winner (wider margin).
        score_match(&mut t, &mut ctx.as_engine_ctx(), m1, 15, 3).unwrap();

        let target_match = t.match_(target).unwrap();
        assert!(!(target_match.team1 == Some(winner) && target_match.team2 == Some(winner)));
    }

    #[test]
    fn four_team_tournament_completes_through_wb_path() {
        let mut t = tournament_with_bracket(4);
        let mut ctx = Ctx::new(&t);
        loop {
            start_all_scheduled(&mut t);
            let next = t
                .matches
                .iter()
                .find(|m| m.status == MatchStatus::InProgress)
                .map(|m| m.id);
            let Some(id) = next else { break };
            let outcome = score_match(&mut t, &mut ctx.as_engine_ctx(), id, 11, 5).unwrap();
            if outcome.tournament_completed {
                break;
            }
        }
        assert_eq!(t.status, TournamentStatus::Completed);
    }

    #[test]
    fn scoring_a_bye_match_does_not_panic_and_reports_no_loser() {
        let mut t = tournament_with_bracket(5);
        let mut ctx = Ctx::new(&t);
        let bye_id = t
            .matches
            .iter()
            .find(|m| m.team2.is_none() && m.team1.is_some())
            .unwrap()
            .id;

        let outcome = score_match(&mut t, &mut ctx.as_engine_ctx(), bye_id, 0, 0).unwrap();

        assert_eq!(outcome.loser_team_id, None);
        assert_eq!(t.match_(bye_id).unwrap().status, MatchStatus::Completed);
    }
}
