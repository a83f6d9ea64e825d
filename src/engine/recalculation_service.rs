//! C7 RecalculationService: reverse a completed tournament's derived
//! aggregates (preserving any manual final-place overrides) and re-run the
//! completion pipeline's aggregate steps.
//!
//! Grounded on `examples/original_source/backend/routes/tournaments.py`'s
//! `recalculate_tournament`/`update_team_place` handlers. No event ledger
//! exists (spec §9 names this a "production-grade" improvement, not a
//! requirement), so the cash-payout and teammate-history reversal below are
//! best-effort: they subtract the contribution implied by each team's
//! *current* `final_place`/`points_earned`, which is exact only when no
//! manual override has been applied between completion and recalculation.

use crate::engine::completion_pipeline;
use crate::engine::context::EngineContext;
use crate::engine::error::{EngineError, EngineResult};
use crate::models::{TeamId, Tournament, TournamentStatus};

const RECALCULATION_WARNING: &str = "recalculation is best-effort without a payout/history ledger: \
cash payouts and teammate-history averages may double-count contributions from before a manual \
final-place override";

/// `RecalculateTournament`: undo this tournament's contribution to season
/// aggregates, then rerun steps 2-5 of the completion pipeline. Returns a
/// caveat string callers should surface to the operator.
pub fn recalculate(tournament: &mut Tournament, ctx: &mut EngineContext) -> EngineResult<String> {
    if tournament.status != TournamentStatus::Completed {
        return Err(EngineError::InvalidState(
            "only a Completed tournament can be recalculated".into(),
        ));
    }

    reverse_contributions(tournament, ctx);
    completion_pipeline::apply_aggregates(tournament, ctx)?;

    Ok(RECALCULATION_WARNING.to_string())
}

/// Subtract this tournament's prior `points_earned`/teammate-history
/// contribution from the season-wide tables, without re-deriving anything.
/// Shared by `recalculate` and the `DELETE /tournaments/{id}` cascade
/// (spec §6: "if Completed, first reverse seasonal points and teammate
/// history contributions").
pub fn reverse_contributions(tournament: &Tournament, ctx: &mut EngineContext) {
    for team in &tournament.teams {
        for member in team.members() {
            if let Some(p) = ctx.players.get_mut(&member) {
                p.subtract_points(team.points_earned);
            }
        }
    }

    for team in &tournament.teams {
        let (Some(a), Some(b), Some(place)) = (Some(team.player1), team.player2, team.final_place) else {
            continue;
        };
        undo_history(ctx, a, b, place);
        undo_history(ctx, b, a, place);
    }
}

fn undo_history(ctx: &mut EngineContext, player_id: crate::models::PlayerId, teammate_id: crate::models::PlayerId, place: u32) {
    let key = (player_id, teammate_id);
    let delete = match ctx.team_history.get_mut(&key) {
        Some(h) => h.undo_place(place),
        None => return,
    };
    if delete {
        ctx.team_history.remove(&key);
    }
}

/// `UpdateTeamPlace`: write a manual override. Does not cascade; the caller
/// must invoke `recalculate` afterward to refresh derived data.
pub fn update_team_place(tournament: &mut Tournament, team_id: TeamId, new_place: u32) -> EngineResult<()> {
    let team = tournament
        .team_mut(team_id)
        .ok_or_else(|| EngineError::NotFound(format!("team {team_id} not found")))?;
    if team.is_ghost_team {
        return Err(EngineError::InvalidInput("ghost teams do not receive a final place".into()));
    }
    team.final_place = Some(new_place);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::completion_pipeline;
    use crate::models::{Division, Match, MatchStatus, Player, PlayerId, RoundType, Stage, Team};
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn player(id: PlayerId) -> Player {
        Player {
            id,
            name: id.to_string(),
            nickname: None,
            division: Division::Am,
            seasonal_points: 0,
            seasonal_cash: rust_decimal::Decimal::ZERO,
        }
    }

    fn completed_tournament() -> (Tournament, HashMap<PlayerId, Player>) {
        let mut t = Tournament::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let (a1, a2, b1, b2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        t.teams = vec![Team::new_pair(1, a1, a2, 1), Team::new_pair(2, b1, b2, 2)];
        for pid in [a1, a2, b1, b2] {
            t.registrations.push(crate::models::Registration { player_id: pid, bought_ace_pot: false });
        }
        let mut m = Match::new(1, Stage::GroupA, RoundType::Championship, 0, 0);
        m.team1 = Some(1);
        m.team2 = Some(2);
        m.team1_score = Some(11);
        m.team2_score = Some(3);
        m.status = MatchStatus::Completed;
        t.matches = vec![m];
        t.status = TournamentStatus::Completed;

        let players = [a1, a2, b1, b2].into_iter().map(|p| (p, player(p))).collect();
        (t, players)
    }

    #[test]
    fn rejects_recalculating_a_non_completed_tournament() {
        let (mut t, mut players) = completed_tournament();
        t.status = TournamentStatus::InProgress;
        let mut history = HashMap::new();
        let mut ledger = Vec::new();
        let mut ctx = EngineContext { players: &mut players, team_history: &mut history, ace_pot_ledger: &mut ledger };
        assert!(matches!(recalculate(&mut t, &mut ctx), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn preserves_manual_override_through_recalculation() {
        let (mut t, mut players) = completed_tournament();
        let mut history = HashMap::new();
        let mut ledger = Vec::new();
        {
            let mut ctx = EngineContext { players: &mut players, team_history: &mut history, ace_pot_ledger: &mut ledger };
            completion_pipeline::apply_aggregates(&mut t, &mut ctx).unwrap();
        }
        // completion_pipeline::complete would have set places; since we only
        // ran apply_aggregates here, set them directly to mimic step 1.
        t.team_mut(1).unwrap().final_place = Some(1);
        t.team_mut(2).unwrap().final_place = Some(2);

        update_team_place(&mut t, 2, 1).unwrap();
        assert_eq!(t.team(2).unwrap().final_place, Some(1));

        let mut ctx = EngineContext { players: &mut players, team_history: &mut history, ace_pot_ledger: &mut ledger };
        let warning = recalculate(&mut t, &mut ctx).unwrap();
        assert!(!warning.is_empty());
        assert_eq!(t.team(2).unwrap().final_place, Some(1));
    }
}
