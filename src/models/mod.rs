//! Data structures for the putting league: players, teams, matches,
//! tournaments, and ace-pot ledger entries.

mod match_;
mod player;
mod team;
mod tournament;

pub use match_::{Match, MatchId, MatchStatus, RoundType, Stage};
pub use player::{Division, Player, PlayerId, TeamHistory};
pub use team::{Team, TeamId};
pub use tournament::{
    AcePotEntry, Registration, Tournament, TournamentId, TournamentStatus, DEFAULT_STATION_COUNT,
};
