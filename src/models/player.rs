//! Registered player, division, and cross-tournament teammate history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a registered player (stable across tournaments).
pub type PlayerId = Uuid;

/// Skill division a player competes in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Division {
    Pro,
    Am,
    Junior,
}

/// A player registered with the league (persists across tournaments).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub nickname: Option<String>,
    pub division: Division,
    pub seasonal_points: u32,
    pub seasonal_cash: Decimal,
}

impl Player {
    /// Register a new player with zeroed season totals.
    pub fn new(name: impl Into<String>, nickname: Option<String>, division: Division) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            nickname,
            division,
            seasonal_points: 0,
            seasonal_cash: Decimal::ZERO,
        }
    }

    pub fn add_points(&mut self, points: u32) {
        self.seasonal_points += points;
    }

    /// Floored at 0 per spec §4.7 ("subtracting ... floored at 0").
    pub fn subtract_points(&mut self, points: u32) {
        self.seasonal_points = self.seasonal_points.saturating_sub(points);
    }

    pub fn add_cash(&mut self, amount: Decimal) {
        self.seasonal_cash += amount;
    }
}

/// Running teammate-pairing history, stored directed (one row per ordered
/// pair) so each player's view of a given teammate can be looked up
/// independently, mirroring `examples/original_source`'s
/// `TeamHistory(player_id, teammate_id)` composite-key table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TeamHistory {
    pub player_id: PlayerId,
    pub teammate_id: PlayerId,
    pub times_paired: u32,
    pub average_place: f64,
}

impl TeamHistory {
    pub fn new(player_id: PlayerId, teammate_id: PlayerId, first_place: u32) -> Self {
        Self {
            player_id,
            teammate_id,
            times_paired: 1,
            average_place: first_place as f64,
        }
    }

    /// Fold in another observed final place (running mean).
    pub fn record_place(&mut self, place: u32) {
        let total = self.average_place * self.times_paired as f64 + place as f64;
        self.times_paired += 1;
        self.average_place = total / self.times_paired as f64;
    }

    /// Undo a previously recorded final place. Returns `true` if the entry
    /// is now empty and the caller should delete it.
    pub fn undo_place(&mut self, place: u32) -> bool {
        if self.times_paired <= 1 {
            return true;
        }
        let total = self.average_place * self.times_paired as f64 - place as f64;
        self.times_paired -= 1;
        self.average_place = total / self.times_paired as f64;
        false
    }
}
