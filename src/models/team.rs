//! Team: a pairing of two players (or one, for a ghost team) within a
//! single tournament.

use crate::models::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Team identity, scoped to a single tournament (see `DESIGN.md` for why
/// this is a sequential integer rather than a `Uuid`).
pub type TeamId = u32;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub player1: PlayerId,
    /// `None` iff `is_ghost_team`.
    pub player2: Option<PlayerId>,
    pub is_ghost_team: bool,
    pub seed_number: u32,
    pub final_place: Option<u32>,
    pub points_earned: u32,
}

impl Team {
    pub fn new_pair(id: TeamId, player1: PlayerId, player2: PlayerId, seed_number: u32) -> Self {
        Self {
            id,
            player1,
            player2: Some(player2),
            is_ghost_team: false,
            seed_number,
            final_place: None,
            points_earned: 0,
        }
    }

    pub fn new_ghost(id: TeamId, player1: PlayerId, seed_number: u32) -> Self {
        Self {
            id,
            player1,
            player2: None,
            is_ghost_team: true,
            seed_number,
            final_place: None,
            points_earned: 0,
        }
    }

    /// Both members, for fan-out over season aggregates and cash splits.
    pub fn members(&self) -> Vec<PlayerId> {
        match self.player2 {
            Some(p2) => vec![self.player1, p2],
            None => vec![self.player1],
        }
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.player1 == player_id || self.player2 == Some(player_id)
    }
}
