//! C1 TeamFormer: random pairing of registered players into teams.
//!
//! Grounded on `examples/original_source/backend/routes/tournaments.py`'s
//! `create_tournament` pairing loop (pop-random-partner-from-the-remaining-list),
//! generalized to an injectable RNG per spec §9's testability note.

use crate::engine::error::{EngineError, EngineResult};
use crate::models::{Player, PlayerId, Team};
use rand::Rng;

/// Randomly pair `players` into teams, seeding 1..N in draw order. The last
/// player (if the count is odd) becomes a solo ghost team.
pub fn form_teams<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> EngineResult<Vec<Team>> {
    if players.len() < 2 {
        return Err(EngineError::InvalidInput(
            "at least 2 players are required to form teams".into(),
        ));
    }

    let mut pool: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    let mut teams = Vec::new();
    let mut next_id: u32 = 1;

    while pool.len() >= 2 {
        let i = rng.gen_range(0..pool.len());
        let player_one = pool.swap_remove(i);
        let j = rng.gen_range(0..pool.len());
        let player_two = pool.swap_remove(j);

        teams.push(Team::new_pair(next_id, player_one, player_two, next_id));
        next_id += 1;
    }

    if let Some(solo) = pool.pop() {
        teams.push(Team::new_ghost(next_id, solo, next_id));
    }

    Ok(teams)
}
