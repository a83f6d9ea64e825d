//! Single binary web server: the §6 HTTP surface over `putting_league_web`'s
//! engine, as thin `actix-web` handlers (`Data<RwLock<Store>>`, `Path<...>`,
//! `Json<...>`). Run with: cargo run --bin web. Override bind address and
//! default station count with `HOST`/`PORT`/`STATION_COUNT`.
//!
//! Identity/role-check middleware, the CSV importer, and the admin UI are
//! explicit Non-goals (spec §1); the `/admin/...` routes below are reachable
//! unauthenticated, matching that the engine "assumes already-authenticated
//! calls" and leaving the gap for an external collaborator to close.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder, ResponseError,
};
use putting_league_web::engine::{bracket_builder, recalculation_service, scoring_engine, station_allocator, team_former};
use putting_league_web::{
    AcePotEntry, Config, Division, EngineError, MatchId, MatchStatus, Player, PlayerId, Registration,
    Stage, Store, TeamId, Tournament, TournamentId, TournamentStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::RwLock;
use uuid::Uuid;

type AppState = Data<RwLock<Store>>;

fn lock_err() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": "internal error: store lock poisoned" }))
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[get("/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { ok: true, service: "putting-league-web" })
}

#[derive(Deserialize)]
struct NewPlayerBody {
    name: String,
    #[serde(default)]
    nickname: Option<String>,
    division: Division,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    date: chrono::NaiveDate,
    players: Vec<NewPlayerBody>,
}

#[post("/tournaments")]
async fn create_tournament(state: AppState, config: Data<Config>, body: Json<CreateTournamentBody>) -> HttpResponse {
    if body.players.len() < 2 {
        return EngineError::InvalidInput("at least 2 players are required".into()).error_response();
    }
    let mut names = std::collections::HashSet::new();
    for p in &body.players {
        if !names.insert(p.name.to_lowercase()) {
            return EngineError::Conflict(format!("duplicate player name: {}", p.name)).error_response();
        }
    }

    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let mut tournament = Tournament::new(body.date);
    tournament.station_count = config.station_count;
    for p in &body.players {
        let player = Player::new(p.name.clone(), p.nickname.clone(), p.division);
        tournament.registrations.push(Registration { player_id: player.id, bought_ace_pot: false });
        store.players.insert(player.id, player);
    }
    let id = tournament.id;
    store.tournaments.insert(id, tournament);
    HttpResponse::Ok().json(&store.tournaments[&id])
}

#[derive(Deserialize)]
struct TournamentListQuery {
    id: Option<TournamentId>,
    date: Option<chrono::NaiveDate>,
}

#[get("/tournaments")]
async fn list_tournaments(state: AppState, query: Query<TournamentListQuery>) -> HttpResponse {
    let store = match state.read() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    if let Some(id) = query.id {
        return match store.tournaments.get(&id) {
            Some(t) => HttpResponse::Ok().json(t),
            None => EngineError::NotFound(format!("tournament {id} not found")).error_response(),
        };
    }
    let matches: Vec<&Tournament> = store
        .tournaments
        .values()
        .filter(|t| query.date.map(|d| t.date == d).unwrap_or(true))
        .collect();
    HttpResponse::Ok().json(matches)
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct RegisterPlayerBody {
    player_id: PlayerId,
    #[serde(default)]
    bought_ace_pot: bool,
}

#[derive(Deserialize)]
struct RegisterPlayersBody {
    registrations: Vec<RegisterPlayerBody>,
}

#[post("/tournaments/{id}/register-players")]
async fn register_players(state: AppState, path: Path<TournamentPath>, body: Json<RegisterPlayersBody>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    for reg in &body.registrations {
        if tournament.is_registered(reg.player_id) {
            return EngineError::Conflict(format!("player {} already registered", reg.player_id)).error_response();
        }
    }
    let buy_in_count = body.registrations.iter().filter(|r| r.bought_ace_pot).count();
    for reg in &body.registrations {
        tournament.registrations.push(Registration { player_id: reg.player_id, bought_ace_pot: reg.bought_ace_pot });
    }
    let tournament_date = tournament.date;
    if buy_in_count > 0 {
        store.ace_pot_ledger.push(AcePotEntry {
            tournament_id: Some(path.id),
            date: tournament_date,
            description: format!("Ace pot buy-in x{buy_in_count}"),
            amount: rust_decimal::Decimal::from(buy_in_count as u64),
        });
    }
    HttpResponse::Ok().json(&store.tournaments[&path.id])
}

#[post("/tournaments/{id}/generate-teams")]
async fn generate_teams(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    if tournament.status != TournamentStatus::Scheduled {
        return EngineError::InvalidState("tournament is not Scheduled".into()).error_response();
    }
    let player_ids: Vec<_> = tournament.registrations.iter().map(|r| r.player_id).collect();
    let players: Vec<Player> = player_ids
        .iter()
        .filter_map(|id| store.players.get(id).cloned())
        .collect();
    match team_former::form_teams(&players, &mut rand::thread_rng()) {
        Ok(teams) => {
            let tournament = store.tournaments.get_mut(&path.id).unwrap();
            tournament.total_teams = teams.len() as u32;
            tournament.teams = teams;
            tournament.matches.clear();
            HttpResponse::Ok().json(&store.tournaments[&path.id])
        }
        Err(e) => e.error_response(),
    }
}

#[derive(Deserialize)]
struct GenerateMatchesBody {
    stations: Option<u32>,
}

#[post("/tournaments/{id}/generate-matches")]
async fn generate_matches(state: AppState, path: Path<TournamentPath>, body: Option<Json<GenerateMatchesBody>>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    if tournament.status != TournamentStatus::Scheduled {
        return EngineError::InvalidState("tournament is not Scheduled".into()).error_response();
    }
    let stations = body.and_then(|b| b.stations).unwrap_or(tournament.station_count);
    match bracket_builder::build(&tournament.teams, 1, Stage::GroupA) {
        Ok(matches) => {
            tournament.matches = matches;
            tournament.station_count = stations;
            tournament.status = TournamentStatus::InProgress;
            HttpResponse::Ok().json(tournament)
        }
        Err(e) => e.error_response(),
    }
}

#[derive(Deserialize)]
struct MatchPath {
    id: TournamentId,
    mid: MatchId,
}

#[post("/tournaments/{id}/matches/{mid}/start")]
async fn start_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    match station_allocator::start_match(tournament, path.mid) {
        Ok(station) => HttpResponse::Ok().json(json!({ "match_id": path.mid, "station": station })),
        Err(e) => e.error_response(),
    }
}

#[derive(Deserialize)]
struct ScoreMatchBody {
    team1_score: u32,
    team2_score: u32,
}

#[post("/tournaments/{id}/matches/{mid}/score")]
async fn score_match(state: AppState, path: Path<MatchPath>, body: Json<ScoreMatchBody>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Store { tournaments, players, team_history, ace_pot_ledger, .. } = &mut *store;
    let Some(tournament) = tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    let mut ctx = putting_league_web::EngineContext { players, team_history, ace_pot_ledger };
    match scoring_engine::score_match(tournament, &mut ctx, path.mid, body.team1_score, body.team2_score) {
        Ok(outcome) => {
            drop(ctx);
            let status = tournament.match_(path.mid).map(|m| m.status).unwrap_or(MatchStatus::Completed);
            let station = tournament.match_(path.mid).and_then(|m| m.station_assignment);
            let event = putting_league_web::MatchUpdatedEvent {
                tournament_id: path.id,
                match_id: path.mid,
                status,
                station,
                team1_score: Some(body.team1_score),
                team2_score: Some(body.team2_score),
                winner_team_id: Some(outcome.winner_team_id),
                is_rescore: outcome.is_rescore,
            };
            store.publish(path.id, event);
            HttpResponse::Ok().json(json!({
                "winner_team_id": outcome.winner_team_id,
                "loser_team_id": outcome.loser_team_id,
                "is_rescore": outcome.is_rescore,
                "championship_game2_created": outcome.championship_game2_created,
                "tournament_completed": outcome.tournament_completed,
            }))
        }
        Err(e) => e.error_response(),
    }
}

#[get("/tournaments/{id}/matches")]
async fn list_matches(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let store = match state.read() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    let mut matches = tournament.matches.clone();
    matches.sort_by_key(|m| m.match_order);
    HttpResponse::Ok().json(matches)
}

#[get("/tournaments/{id}/teams")]
async fn list_teams(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let store = match state.read() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    match store.tournaments.get(&path.id) {
        Some(tournament) => HttpResponse::Ok().json(&tournament.teams),
        None => EngineError::NotFound(format!("tournament {} not found", path.id)).error_response(),
    }
}

#[derive(Deserialize)]
struct SetStatusBody {
    status: TournamentStatus,
}

#[put("/tournaments/{id}/status")]
async fn set_status(state: AppState, path: Path<TournamentPath>, body: Json<SetStatusBody>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    match store.tournaments.get_mut(&path.id) {
        Some(tournament) => {
            tournament.status = body.status;
            HttpResponse::Ok().json(tournament)
        }
        None => EngineError::NotFound(format!("tournament {} not found", path.id)).error_response(),
    }
}

#[delete("/tournaments/{id}")]
async fn delete_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    if tournament.status == TournamentStatus::Completed {
        let tournament = tournament.clone();
        let mut ctx = store.engine_context();
        recalculation_service::reverse_contributions(&tournament, &mut ctx);
    }
    store.tournaments.remove(&path.id);
    HttpResponse::Ok().json(json!({ "deleted": path.id }))
}

#[post("/admin/tournaments/{id}/recalculate")]
async fn recalculate(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Store { tournaments, players, team_history, ace_pot_ledger, .. } = &mut *store;
    let Some(tournament) = tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    let mut ctx = putting_league_web::EngineContext { players, team_history, ace_pot_ledger };
    match recalculation_service::recalculate(tournament, &mut ctx) {
        Ok(warning) => HttpResponse::Ok().json(json!({ "warning": warning })),
        Err(e) => e.error_response(),
    }
}

#[derive(Deserialize)]
struct TeamPlacePath {
    id: TournamentId,
    team_id: TeamId,
}

#[derive(Deserialize)]
struct SetPlaceBody {
    final_place: u32,
}

#[put("/admin/tournaments/{id}/teams/{team_id}/place")]
async fn update_team_place(state: AppState, path: Path<TeamPlacePath>, body: Json<SetPlaceBody>) -> HttpResponse {
    let mut store = match state.write() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let Some(tournament) = store.tournaments.get_mut(&path.id) else {
        return EngineError::NotFound(format!("tournament {} not found", path.id)).error_response();
    };
    match recalculation_service::update_team_place(tournament, path.team_id, body.final_place) {
        Ok(()) => HttpResponse::Ok().json(tournament.team(path.team_id)),
        Err(e) => e.error_response(),
    }
}

#[get("/ace-pot")]
async fn ace_pot(state: AppState) -> HttpResponse {
    let store = match state.read() {
        Ok(g) => g,
        Err(_) => return lock_err(),
    };
    let balance: rust_decimal::Decimal = store.ace_pot_ledger.iter().map(|e| e.amount).sum();
    HttpResponse::Ok().json(json!({ "entries": store.ace_pot_ledger, "balance": balance }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = putting_league_web::Config::from_env();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let state = Data::new(RwLock::new(Store::new()));
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config_data.clone())
            .service(api_health)
            .service(create_tournament)
            .service(list_tournaments)
            .service(register_players)
            .service(generate_teams)
            .service(generate_matches)
            .service(start_match)
            .service(score_match)
            .service(list_matches)
            .service(list_teams)
            .service(set_status)
            .service(delete_tournament)
            .service(recalculate)
            .service(update_team_place)
            .service(ace_pot)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
