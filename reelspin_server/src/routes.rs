//! HTTP surface over one in-memory game session.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/session` | Balance and spin state |
//! | GET | `/machine` | Grid size, frequency table and paytable |
//! | GET | `/verify` | Current seed commitment and nonce |
//! | POST | `/deposit` | Add funds |
//! | POST | `/spin` | Wager and spin |
//! | POST | `/admin/rotate-seed` | Reveal the server seed and commit to a new one |

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use reelspin_core::{EngineParams, GameSession, ProvablyFairRng, SessionError, SpinOutcome};
use reelspin_shared::{
    ApiError, DepositRequest, LineWinEntry, RotateSeedRequest, RotateSeedResponse, SessionView,
    SpinRequest, SpinResponse, VerifyResponse,
};

pub struct Table {
    pub session: GameSession,
    pub rng: ProvablyFairRng,
}

pub struct AppState {
    table: Mutex<Table>,
    api_key: String,
}

impl AppState {
    pub fn new(session: GameSession, rng: ProvablyFairRng, api_key: impl Into<String>) -> Self {
        Self {
            table: Mutex::new(Table { session, rng }),
            api_key: api_key.into(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/session", get(route_session))
        .route("/machine", get(route_machine))
        .route("/verify", get(route_verify))
        .route("/deposit", post(route_deposit))
        .route("/spin", post(route_spin))
        .route("/admin/rotate-seed", post(route_rotate_seed))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

pub struct ApiFailure(ApiError);

impl From<SessionError> for ApiFailure {
    fn from(e: SessionError) -> Self {
        let err = match e {
            SessionError::InsufficientFunds { needed, balance } => {
                ApiError::InsufficientFunds { needed, balance }
            }
            SessionError::SpinInProgress => ApiError::Busy,
            SessionError::NoPendingSpin => ApiError::Internal,
            other => ApiError::Invalid(other.to_string()),
        };
        ApiFailure(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Busy => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self.0.body())).into_response()
    }
}

fn session_view(session: &GameSession) -> SessionView {
    SessionView {
        balance: session.balance(),
        lines: session.lines() as u32,
        bet: session.bet(),
        busy: session.is_busy(),
        terminal: session.is_terminal(),
        spins: session.spins(),
    }
}

fn spin_response(rng: &ProvablyFairRng, nonce: u64, outcome: &SpinOutcome) -> SpinResponse {
    SpinResponse {
        server_seed_hash: rng.server_seed_hash_hex(),
        client_seed: rng.client_seed.clone(),
        nonce,
        reels: outcome.grid.to_indices(),
        line_wins: outcome
            .line_wins
            .iter()
            .map(|w| LineWinEntry {
                line: w.line as u32,
                symbol: w.symbol.to_index(),
                payout: w.payout,
            })
            .collect(),
        total_bet: outcome.total_bet,
        winnings: outcome.winnings,
        balance: outcome.balance,
        terminal: outcome.terminal,
    }
}

async fn route_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let table = state.table.lock().await;
    Json(session_view(&table.session))
}

async fn route_machine(State(state): State<Arc<AppState>>) -> Json<EngineParams> {
    let table = state.table.lock().await;
    Json(table.session.params().clone())
}

async fn route_verify(State(state): State<Arc<AppState>>) -> Json<VerifyResponse> {
    let table = state.table.lock().await;
    Json(VerifyResponse {
        server_seed_hash: table.rng.server_seed_hash_hex(),
        client_seed: table.rng.client_seed.clone(),
        nonce: table.rng.nonce,
    })
}

async fn route_deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<SessionView>, ApiFailure> {
    let mut table = state.table.lock().await;
    let balance = table.session.deposit(req.amount)?;
    info!(amount = req.amount, balance, "deposit accepted");
    Ok(Json(session_view(&table.session)))
}

async fn route_spin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpinRequest>,
) -> Result<Json<SpinResponse>, ApiFailure> {
    let mut table = state.table.lock().await;
    let Table { session, rng } = &mut *table;
    // seed and nonce only change for accepted wagers
    let mut candidate = rng.clone();
    if let Some(seed) = req.client_seed {
        candidate.client_seed = seed;
    }
    let (nonce, mut stream) = candidate.peek_spin();
    let outcome = session.spin(&mut stream, req.bet, req.lines as usize)?;
    candidate.nonce = nonce;
    *rng = candidate;
    info!(
        nonce,
        winnings = outcome.winnings,
        balance = outcome.balance,
        "spin"
    );
    Ok(Json(spin_response(rng, nonce, &outcome)))
}

async fn route_rotate_seed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RotateSeedRequest>,
) -> Result<Json<RotateSeedResponse>, ApiFailure> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if token != Some(state.api_key.as_str()) {
        warn!("rotate-seed rejected: bad api key");
        return Err(ApiFailure(ApiError::Unauthorized));
    }
    if req.new_seed.is_empty() {
        return Err(ApiFailure(ApiError::Invalid("new_seed must not be empty".into())));
    }
    let mut table = state.table.lock().await;
    let previous_server_seed = std::mem::replace(&mut table.rng.server_seed, req.new_seed);
    let previous_nonce = std::mem::replace(&mut table.rng.nonce, 0);
    let server_seed_hash = table.rng.server_seed_hash_hex();
    info!(%server_seed_hash, "server seed rotated");
    Ok(Json(RotateSeedResponse {
        previous_server_seed,
        previous_nonce,
        server_seed_hash,
    }))
}
