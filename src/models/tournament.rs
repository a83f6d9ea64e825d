//! Tournament: the event-level container for registrations, teams, matches,
//! and the rolling ace pot.

use crate::models::match_::{Match, MatchId};
use crate::models::player::PlayerId;
use crate::models::team::{Team, TeamId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TournamentStatus {
    Scheduled,
    #[serde(rename = "In_Progress")]
    InProgress,
    Completed,
    Cancelled,
}

/// A player's registration for one tournament.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registration {
    pub player_id: PlayerId,
    pub bought_ace_pot: bool,
}

/// A rolling ace-pot ledger entry. Positive `amount` is a contribution,
/// negative is a payout; the balance is the running sum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcePotEntry {
    pub tournament_id: Option<TournamentId>,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub date: NaiveDate,
    pub status: TournamentStatus,
    pub total_teams: u32,
    pub ace_pot_payout: Decimal,
    pub station_count: u32,
    pub registrations: Vec<Registration>,
    pub teams: Vec<Team>,
    pub matches: Vec<Match>,
}

/// Default station count (`S`) per spec §3.
pub const DEFAULT_STATION_COUNT: u32 = 6;

impl Tournament {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            status: TournamentStatus::Scheduled,
            total_teams: 0,
            ace_pot_payout: Decimal::ZERO,
            station_count: DEFAULT_STATION_COUNT,
            registrations: Vec::new(),
            teams: Vec::new(),
            matches: Vec::new(),
        }
    }

    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn team_mut(&mut self, id: TeamId) -> Option<&mut Team> {
        self.teams.iter_mut().find(|t| t.id == id)
    }

    pub fn match_(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    pub fn is_registered(&self, player_id: PlayerId) -> bool {
        self.registrations.iter().any(|r| r.player_id == player_id)
    }

    /// Every match that lists `target` as a winner or loser advancement
    /// target (used by `ByeAutoAdvancer` to find upstream feeds).
    pub fn upstream_matches(&self, target: MatchId) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.winner_advances_to == Some(target) || m.loser_advances_to == Some(target))
            .collect()
    }
}
