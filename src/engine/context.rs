//! Shared season-wide state threaded through the scoring and completion
//! path: player aggregates, cross-tournament teammate history, and the
//! rolling ace-pot ledger all outlive any single `Tournament`, so they are
//! borrowed in rather than owned by it (mirrors the teacher's single
//! `AppState` lock guarding every table at once, generalized to a borrowed
//! view so engine functions stay transaction-shaped and testable without a
//! full store).

use crate::models::{AcePotEntry, Player, PlayerId, TeamHistory};
use std::collections::HashMap;

pub struct EngineContext<'a> {
    pub players: &'a mut HashMap<PlayerId, Player>,
    pub team_history: &'a mut HashMap<(PlayerId, PlayerId), TeamHistory>,
    pub ace_pot_ledger: &'a mut Vec<AcePotEntry>,
}

impl<'a> EngineContext<'a> {
    pub fn ace_pot_balance(&self) -> rust_decimal::Decimal {
        self.ace_pot_ledger.iter().map(|e| e.amount).sum()
    }
}
