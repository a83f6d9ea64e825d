//! Tournament engine: pure, synchronous business logic over the models in
//! `crate::models`. Nothing here knows about HTTP, locking, or storage —
//! see `src/store.rs` and `src/bin/web.rs` for the ambient layer that
//! drives these functions from requests.

pub mod bracket_builder;
pub mod bye_advancer;
pub mod completion_pipeline;
pub mod context;
pub mod error;
pub mod recalculation_service;
pub mod scoring_engine;
pub mod station_allocator;
pub mod team_former;

pub use context::EngineContext;
pub use error::{EngineError, EngineResult};
pub use scoring_engine::ScoreOutcome;
