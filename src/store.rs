//! In-memory process state: every tournament, the season-wide player and
//! teammate-history tables, and the rolling ace-pot ledger, guarded by one
//! `RwLock` per the teacher's `AppState = Data<RwLock<HashMap<...>>>`
//! pattern (`src/bin/web.rs`), generalized to the full table set §3
//! describes and a `broadcast` sender per tournament for the WS hook point
//! described in §5.

use crate::engine::context::EngineContext;
use crate::models::{AcePotEntry, Player, PlayerId, TeamHistory, Tournament, TournamentId};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::broadcast;

/// Capacity of each tournament's broadcast channel; a slow/absent
/// subscriber simply misses events (fire-and-forget, per spec §5).
const BROADCAST_CAPACITY: usize = 64;

/// `match_updated` event payload, per spec §6.
#[derive(Clone, Debug, Serialize)]
pub struct MatchUpdatedEvent {
    pub tournament_id: TournamentId,
    pub match_id: u32,
    pub status: crate::models::MatchStatus,
    pub station: Option<u32>,
    pub team1_score: Option<u32>,
    pub team2_score: Option<u32>,
    pub winner_team_id: Option<u32>,
    pub is_rescore: bool,
}

#[derive(Default)]
pub struct Store {
    pub tournaments: HashMap<TournamentId, Tournament>,
    pub players: HashMap<PlayerId, Player>,
    pub team_history: HashMap<(PlayerId, PlayerId), TeamHistory>,
    pub ace_pot_ledger: Vec<AcePotEntry>,
    channels: HashMap<TournamentId, broadcast::Sender<MatchUpdatedEvent>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the season-wide tables mutably, scoped to one engine call —
    /// this borrow *is* the transaction boundary described in spec §5.
    pub fn engine_context(&mut self) -> EngineContext<'_> {
        EngineContext {
            players: &mut self.players,
            team_history: &mut self.team_history,
            ace_pot_ledger: &mut self.ace_pot_ledger,
        }
    }

    /// Lazily create a tournament's broadcast channel on first use.
    pub fn subscribe(&mut self, tournament_id: TournamentId) -> broadcast::Receiver<MatchUpdatedEvent> {
        self.channels
            .entry(tournament_id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .subscribe()
    }

    /// Fire-and-forget: a lagged/absent receiver never affects correctness.
    pub fn publish(&mut self, tournament_id: TournamentId, event: MatchUpdatedEvent) {
        if let Some(tx) = self.channels.get(&tournament_id) {
            let _ = tx.send(event);
        }
    }
}
