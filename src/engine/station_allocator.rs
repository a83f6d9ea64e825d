//! C3 StationAllocator: assign a free physical station to a match that is
//! starting.
//!
//! Grounded on `examples/original_source/backend/routes/matches.py`'s
//! `start_match` endpoint (scans in-progress matches for the tournament,
//! picks the lowest unused station number).

use crate::engine::error::{EngineError, EngineResult};
use crate::models::{MatchId, MatchStatus, Tournament};

/// Start `match_id`: find the lowest free station in `1..=tournament.station_count`,
/// assign it, and transition the match to `InProgress`. Fails `InvalidState`
/// if the match isn't `Scheduled`, `NoStationAvailable` if every station is
/// already in use by another `InProgress` match.
pub fn start_match(tournament: &mut Tournament, match_id: MatchId) -> EngineResult<u32> {
    let station_count = tournament.station_count;

    {
        let m = tournament
            .match_(match_id)
            .ok_or_else(|| EngineError::NotFound(format!("match {match_id} not found")))?;
        if m.status != MatchStatus::Scheduled {
            return Err(EngineError::InvalidState(format!(
                "match {match_id} is not Scheduled"
            )));
        }
    }

    let in_use: std::collections::HashSet<u32> = tournament
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::InProgress)
        .filter_map(|m| m.station_assignment)
        .collect();

    let station = (1..=station_count)
        .find(|s| !in_use.contains(s))
        .ok_or(EngineError::NoStationAvailable)?;

    let m = tournament.match_mut(match_id).expect("checked above");
    m.station_assignment = Some(station);
    m.status = MatchStatus::InProgress;
    Ok(station)
}
