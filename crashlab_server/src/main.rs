use axum::http::StatusCode;
use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crashlab_core::{Provider, SeedPair, SeedReveal};
use crashlab_shared::{
    PlayRequest, PlayResponse, SeedInfo, SeedsRequest, SeedsResponse, VerifyRequest,
    VerifyResponse,
};

fn to_seed_info(reveal: SeedReveal) -> SeedInfo {
    SeedInfo {
        client_seed: reveal.client_seed,
        server_seed: reveal.server_seed,
        audit_seed: reveal.audit_seed,
        game_seed: reveal.game_seed,
        wager_hash: reveal.wager_hash,
        hash: reveal.hash,
    }
}

#[derive(Clone)]
struct AppState {
    /// Provider applied when a request names none. Fixed at startup; per-
    /// request selection keeps the service safe for concurrent callers.
    default_provider: Provider,
}

fn resolve_provider(state: &AppState, requested: &Option<String>) -> Result<Provider, StatusCode> {
    match requested {
        Some(name) => name.parse().map_err(|_| StatusCode::BAD_REQUEST),
        None => Ok(state.default_provider),
    }
}

fn parse_seeds(client: &str, server: &str) -> Result<SeedPair, StatusCode> {
    SeedPair::new(client, server).map_err(|_| StatusCode::BAD_REQUEST)
}

async fn route_play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<PlayResponse>, StatusCode> {
    if req.bet_amount <= 0.0 || req.target_multiplier <= 1.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let provider = resolve_provider(&state, &req.provider)?;
    let seeds = parse_seeds(&req.client_seed, &req.server_seed)?;

    let multiplier = provider
        .multiplier(&seeds, req.nonce, None)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let won = multiplier >= req.target_multiplier;
    // the settlement endpoint pays at the requested target, not the raw crash
    let profit = if won {
        req.bet_amount * (req.target_multiplier - 1.0)
    } else {
        -req.bet_amount
    };

    Ok(Json(PlayResponse {
        multiplier,
        won,
        profit,
        client_seed: seeds.client,
        server_seed: seeds.server,
        nonce: req.nonce,
    }))
}

async fn route_seeds(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeedsRequest>,
) -> Result<Json<SeedsResponse>, StatusCode> {
    let provider = resolve_provider(&state, &req.provider)?;
    let seeds = parse_seeds(&req.client_seed, &req.server_seed)?;

    let reveal = provider
        .reveal(&seeds, req.nonce)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(Json(SeedsResponse {
        seed_info: to_seed_info(reveal),
    }))
}

async fn route_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, StatusCode> {
    let provider = resolve_provider(&state, &req.provider)?;
    let seeds = parse_seeds(&req.client_seed, &req.server_seed)?;

    let calculated = provider
        .multiplier(&seeds, req.nonce, None)
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(Json(VerifyResponse {
        is_valid: (calculated - req.expected_multiplier).abs() < 0.01,
        calculated_multiplier: calculated,
        expected_multiplier: req.expected_multiplier,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let default_provider: Provider = std::env::var("CRASHLAB_PROVIDER")
        .unwrap_or_else(|_| "bch".to_string())
        .parse()?;
    info!("using crypto provider: {default_provider}");

    let state = Arc::new(AppState { default_provider });

    let app = Router::new()
        .route("/play", post(route_play))
        .route("/seeds", post(route_seeds))
        .route("/verify", post(route_verify))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = std::env::var("BIND").unwrap_or_else(|_| "127.0.0.1:3150".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
