//! Putting league web app: library with models, engine, and in-memory store.

pub mod config;
pub mod engine;
pub mod models;
pub mod store;

pub use config::Config;
pub use engine::{EngineContext, EngineError, EngineResult, ScoreOutcome};
pub use models::{
    AcePotEntry, Division, Match, MatchId, MatchStatus, Player, PlayerId, Registration, RoundType,
    Stage, Team, TeamHistory, TeamId, Tournament, TournamentId, TournamentStatus,
};
pub use store::{MatchUpdatedEvent, Store};
