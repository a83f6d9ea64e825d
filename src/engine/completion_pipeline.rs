//! C6 CompletionPipeline: final places, teammate history, seasonal points,
//! cash payouts, and ace-pot resolution, run atomically when a tournament
//! finishes.
//!
//! Grounded on `examples/original_source/backend/routes/tournaments.py`'s
//! completion handling (`complete_tournament`/payout helpers), which
//! computes the same four aggregates in the same order against the
//! database; here they run against the in-memory `Tournament` plus the
//! season-wide `EngineContext`.

use crate::engine::context::EngineContext;
use crate::engine::error::{EngineError, EngineResult};
use crate::models::{AcePotEntry, MatchStatus, RoundType, Stage, TeamHistory, TeamId, Tournament};
use rust_decimal::Decimal;

/// Run the full pipeline: assign final places, then apply the derived
/// aggregates (teammate history, seasonal points, cash, ace pot).
pub fn complete(tournament: &mut Tournament, ctx: &mut EngineContext) -> EngineResult<()> {
    assign_final_places(tournament)?;
    apply_aggregates(tournament, ctx)?;
    Ok(())
}

/// Step 1: 1st/2nd from the terminal championship match, then 3rd.. in
/// reverse elimination order by descending `match_order`. Ghost teams never
/// receive a place.
pub fn assign_final_places(tournament: &mut Tournament) -> EngineResult<()> {
    let terminal = tournament
        .matches
        .iter()
        .filter(|m| m.round_type == RoundType::Championship && !matches!(m.stage, Stage::GroupA | Stage::GroupB))
        .filter(|m| m.status == MatchStatus::Completed)
        .max_by_key(|m| m.round_number)
        .ok_or_else(|| EngineError::InvalidState("no completed championship match found".into()))?;

    let (champion, runner_up) = terminal
        .winner_loser()
        .ok_or_else(|| EngineError::InvalidState("championship match has no recorded result".into()))?;
    let terminal_id = terminal.id;

    if let Some(t) = tournament.team_mut(champion) {
        t.final_place = Some(1);
    }
    if let Some(t) = tournament.team_mut(runner_up) {
        t.final_place = Some(2);
    }

    let mut eliminated: Vec<(u32, TeamId)> = tournament
        .matches
        .iter()
        .filter(|m| m.id != terminal_id && m.round_type != RoundType::Championship)
        .filter(|m| m.status == MatchStatus::Completed)
        .filter_map(|m| m.winner_loser().map(|(_, loser)| (m.match_order, loser)))
        .collect();
    eliminated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut next_place = 3u32;
    for (_, loser) in eliminated {
        let is_ghost = tournament.team(loser).map(|t| t.is_ghost_team).unwrap_or(true);
        if is_ghost {
            continue;
        }
        let already_placed = tournament.team(loser).and_then(|t| t.final_place).is_some();
        if already_placed {
            continue;
        }
        if let Some(t) = tournament.team_mut(loser) {
            t.final_place = Some(next_place);
            next_place += 1;
        }
    }

    Ok(())
}

/// Steps 2-5: teammate history, seasonal points, cash, ace pot. Shared by
/// `complete` and `RecalculationService` (which preserves step 1's places).
pub fn apply_aggregates(tournament: &mut Tournament, ctx: &mut EngineContext) -> EngineResult<()> {
    for team in &tournament.teams {
        let (Some(a), Some(b), Some(place)) = (Some(team.player1), team.player2, team.final_place) else {
            continue;
        };
        ctx.team_history
            .entry((a, b))
            .and_modify(|h| h.record_place(place))
            .or_insert_with(|| TeamHistory::new(a, b, place));
        ctx.team_history
            .entry((b, a))
            .and_modify(|h| h.record_place(place))
            .or_insert_with(|| TeamHistory::new(b, a, place));
    }

    let mut first_place_team = None;
    for team in &mut tournament.teams {
        let (wins, losses) = match_record(&tournament.matches, team.id);
        let undefeated = losses == 0;
        let bonus_top4 = team.final_place.map(|p| p <= 4).unwrap_or(false);
        let points_earned = 1 + wins + if bonus_top4 { 2 } else { 0 } + if undefeated { 3 } else { 0 };
        team.points_earned = points_earned;
        if team.final_place == Some(1) {
            first_place_team = Some((team.id, undefeated));
        }
        for member in team.members() {
            if let Some(p) = ctx.players.get_mut(&member) {
                p.add_points(points_earned);
            }
        }
    }

    let pot = Decimal::from(5 * tournament.registrations.len() as u64);
    let (second_cash, first_cash) = if pot <= Decimal::from(60) {
        let second = Decimal::from(20);
        (second, pot - second)
    } else {
        let second = Decimal::from(40).min(pot - Decimal::from(40));
        (second, pot - second)
    };

    let first_team_id = tournament.teams.iter().find(|t| t.final_place == Some(1)).map(|t| t.id);
    let second_team_id = tournament.teams.iter().find(|t| t.final_place == Some(2)).map(|t| t.id);
    if let Some(id) = first_team_id {
        distribute_cash(tournament, ctx, id, first_cash);
    }
    if let Some(id) = second_team_id {
        distribute_cash(tournament, ctx, id, second_cash);
    }

    let balance = ctx.ace_pot_balance();
    let paid = match first_place_team {
        Some((team_id, true)) if balance > Decimal::ZERO => {
            let names = tournament
                .team(team_id)
                .map(|t| t.members())
                .unwrap_or_default()
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(" & ");
            distribute_cash(tournament, ctx, team_id, balance);
            ctx.ace_pot_ledger.push(AcePotEntry {
                tournament_id: Some(tournament.id),
                date: tournament.date,
                description: format!("Ace pot paid to undefeated champions: {names}"),
                amount: -balance,
            });
            balance
        }
        _ => Decimal::ZERO,
    };
    tournament.ace_pot_payout = paid;

    Ok(())
}

fn match_record(matches: &[crate::models::Match], team_id: TeamId) -> (u32, u32) {
    let mut wins = 0;
    let mut losses = 0;
    for m in matches {
        if m.status != MatchStatus::Completed || m.team2.is_none() {
            continue;
        }
        if let Some((winner, loser)) = m.winner_loser() {
            if winner == team_id {
                wins += 1;
            } else if loser == team_id {
                losses += 1;
            }
        }
    }
    (wins, losses)
}

fn distribute_cash(tournament: &Tournament, ctx: &mut EngineContext, team_id: TeamId, amount: Decimal) {
    let Some(team) = tournament.team(team_id) else { return };
    let members = team.members();
    if members.is_empty() {
        return;
    }
    let share = amount / Decimal::from(members.len() as u64);
    for member in members {
        if let Some(p) = ctx.players.get_mut(&member) {
            p.add_cash(share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Division, Player, PlayerId, Team};
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
            seasonal_cash: Decimal::ZERO,
        }
    }

    #[test]
    fn assigns_places_and_points_for_a_four_team_bracket() {
        let mut t = Tournament::new(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let (a1, a2, b1, b2, c1, c2, d1, d2) = (
            Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(),
            Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(),
        );
        t.teams = vec![
            Team::new_pair(1, a1, a2, 1),
            Team::new_pair(2, b1, b2, 2),
            Team::new_pair(3, c1, c2, 3),
            Team::new_pair(4, d1, d2, 4),
        ];
        for pid in [a1, a2, b1, b2, c1, c2, d1, d2] {
            t.registrations.push(crate::models::Registration { player_id: pid, bought_ace_pot: false });
        }

        let mut m1 = crate::models::Match::new(1, Stage::GroupA, RoundType::Winners, 0, 0);
        m1.team1 = Some(1);
        m1.team2 = Some(2);
        m1.team1_score = Some(11);
        m1.team2_score = Some(5);
        m1.status = MatchStatus::Completed;
        m1.match_order = 1;

        let mut m2 = crate::models::Match::new(2, Stage::GroupA, RoundType::Championship, 0, 0);
        m2.team1 = Some(1);
        m2.team2 = Some(3);
        m2.team1_score = Some(11);
        m2.team2_score = Some(7);
        m2.status = MatchStatus::Completed;
        m2.match_order = 5;

        t.matches = vec![m1, m2];

        let mut players: HashMap<PlayerId, Player> = [a1, a2, b1, b2, c1, c2, d1, d2]
            .into_iter()
            .map(|p| (p, player(p)))
            .collect();
        let mut history = HashMap::new();
        let mut ledger = Vec::new();
        let mut ctx = EngineContext { players: &mut players, team_history: &mut history, ace_pot_ledger: &mut ledger };

        complete(&mut t, &mut ctx).unwrap();

        assert_eq!(t.team(1).unwrap().final_place, Some(1));
        assert_eq!(t.team(3).unwrap().final_place, Some(2));
        assert_eq!(t.team(2).unwrap().final_place, Some(3));
        assert_eq!(ctx.players[&a1].seasonal_points, t.team(1).unwrap().points_earned);
    }
}
