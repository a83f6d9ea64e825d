//! Match: one bracket-graph node. Advancement edges are stable integer ids
//! (self-referential within a tournament), matching the relational schema in
//! `examples/original_source/backend/models.py` (`winner_advances_to_match_id`,
//! `loser_advances_to_match_id`) rather than in-memory references, so the
//! graph can be rebuilt/rewritten the same way the source clears edges to
//! null before deleting rows (see spec §9).

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// Match identity, scoped to a single tournament.
pub type MatchId = u32;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GroupA,
    GroupB,
    Finals,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RoundType {
    Winners,
    Losers,
    Championship,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Scheduled,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub stage: Stage,
    pub round_type: RoundType,
    pub round_number: u32,
    pub position_in_round: u32,
    pub match_order: u32,
    pub team1: Option<TeamId>,
    pub team2: Option<TeamId>,
    pub team1_score: Option<u32>,
    pub team2_score: Option<u32>,
    pub status: MatchStatus,
    pub station_assignment: Option<u32>,
    pub winner_advances_to: Option<MatchId>,
    pub loser_advances_to: Option<MatchId>,
}

impl Match {
    pub fn new(
        id: MatchId,
        stage: Stage,
        round_type: RoundType,
        round_number: u32,
        position_in_round: u32,
    ) -> Self {
        Self {
            id,
            stage,
            round_type,
            round_number,
            position_in_round,
            match_order: 0,
            team1: None,
            team2: None,
            team1_score: None,
            team2_score: None,
            status: MatchStatus::Pending,
            station_assignment: None,
            winner_advances_to: None,
            loser_advances_to: None,
        }
    }

    /// A bye match: exactly one team slot filled and it is the first round
    /// of its bracket (no upstream match can ever fill the second slot).
    pub fn team_count(&self) -> usize {
        self.team1.is_some() as usize + self.team2.is_some() as usize
    }

    /// Place `team` into the first empty slot (team1 preferred, else team2),
    /// per spec §4.4 step 5 / §4.5. Returns `false` if both slots are full.
    pub fn fill_first_empty_slot(&mut self, team: TeamId) -> bool {
        if self.team1.is_none() {
            self.team1 = Some(team);
            true
        } else if self.team2.is_none() {
            self.team2 = Some(team);
            true
        } else {
            false
        }
    }

    /// Recompute `status` from slot occupancy per invariant §3.1, without
    /// disturbing an `InProgress`/`Completed` match.
    pub fn refresh_pending_scheduled(&mut self) {
        if matches!(self.status, MatchStatus::InProgress | MatchStatus::Completed) {
            return;
        }
        self.status = if self.team1.is_some() && self.team2.is_some() {
            MatchStatus::Scheduled
        } else {
            MatchStatus::Pending
        };
    }

    pub fn winner_loser(&self) -> Option<(TeamId, TeamId)> {
        let (t1, t2, s1, s2) = (self.team1?, self.team2?, self.team1_score?, self.team2_score?);
        if s1 > s2 {
            Some((t1, t2))
        } else {
            Some((t2, t1))
        }
    }

    pub fn is_group_stage_championship(&self) -> bool {
        self.round_type == RoundType::Championship
            && matches!(self.stage, Stage::GroupA | Stage::GroupB)
    }
}
