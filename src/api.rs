//! REST API server for StakeChain
//!
//! Thin JSON layer over [`Ledger`]: every handler takes the ledger lock once,
//! calls one ledger operation and translates the outcome. Errors keep their
//! kind in the response body so callers can tell them apart.

use axum::{
    extract::{Path, Query, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::ChainError;
use crate::ledger::Ledger;
use crate::node::NodeState;
use crate::transaction::Amount;

/// Shared handle handed to every route.
#[derive(Clone)]
pub struct ApiNode {
    pub ledger: Arc<RwLock<Ledger>>,
    pub state: Option<Arc<RwLock<NodeState>>>,
    api_stats: Arc<RwLock<ApiStats>>,
}

/// API statistics and monitoring
#[derive(Debug, Default)]
struct ApiStats {
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    transactions_submitted: u64,
    blocks_processed: u64,
    start_time: Option<Instant>,
}

impl ApiStats {
    fn new() -> Self {
        ApiStats {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    fn record_request(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }
}

impl ApiNode {
    pub fn new(ledger: Ledger) -> Self {
        Self::new_shared(Arc::new(RwLock::new(ledger)), None)
    }

    /// Share a ledger owned by the node orchestrator.
    pub fn new_shared(ledger: Arc<RwLock<Ledger>>, state: Option<Arc<RwLock<NodeState>>>) -> Self {
        Self {
            ledger,
            state,
            api_stats: Arc::new(RwLock::new(ApiStats::new())),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Chain(ChainError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match self {
            ApiError::Chain(e) => {
                let status = match &e {
                    ChainError::BlockNotFound(_)
                    | ChainError::TransactionNotFound(_)
                    | ChainError::ValidatorNotFound(_) => StatusCode::NOT_FOUND,
                    ChainError::PoolFull(_) => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string(), e.kind())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, "InvalidInput"),
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                kind: kind.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::Chain(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    kind: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct CreateTransactionRequest {
    pub from: String,
    pub to: String,
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct FaucetRequest {
    pub address: String,
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct AddValidatorRequest {
    pub name: String,
    pub stake: u64,
}

#[derive(Deserialize)]
pub struct PenalizeRequest {
    pub amount: u32,
}

#[derive(Deserialize)]
pub struct EvictRequest {
    pub ids: Vec<String>,
}

#[derive(Deserialize, Default)]
pub struct CreateWalletRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: Amount,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatsResponse {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub transactions_submitted: u64,
    pub blocks_processed: u64,
    pub uptime_seconds: u64,
}

#[derive(Deserialize)]
struct PaginationQuery {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

fn default_page() -> usize {
    0
}
fn default_limit() -> usize {
    10
}

// ============================================================================
// Middleware
// ============================================================================

async fn stats_middleware(State(node): State<Arc<ApiNode>>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;

    let success = response.status().is_success();
    node.api_stats.write().await.record_request(success);

    response
}

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

pub fn build_api_router(node: Arc<ApiNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE])
        .allow_credentials(true);

    let api_routes = Router::new()
        // Blockchain endpoints
        .route("/blockchain/info", get(get_chain_info))
        .route("/blockchain/height", get(get_blockchain_height))
        .route("/blockchain/blocks", get(get_blocks))
        .route("/blockchain/block/:index", get(get_block_by_index))
        .route("/blocks/process", post(process_block))
        // Transaction endpoints
        .route("/transaction", post(submit_transaction))
        .route("/transaction/:id", get(get_transaction))
        .route("/faucet", post(fund_address))
        .route("/mempool", get(get_mempool))
        .route("/mempool/audit", get(audit_mempool))
        .route("/mempool/evict", post(evict_mempool))
        // Address endpoints
        .route("/address/:addr/balance", get(get_address_balance))
        .route("/address/:addr/transactions", get(get_address_transactions))
        // Wallet endpoints
        .route("/wallet/create", post(create_wallet))
        // Validator & consensus endpoints
        .route("/validators", get(get_validators).post(add_validator))
        .route("/validators/stats", get(get_validator_stats))
        .route("/validators/:id", axum::routing::delete(remove_validator))
        .route("/validators/:id/penalize", post(penalize_validator))
        .route("/consensus", get(get_consensus_info))
        // System endpoints
        .route("/health", get(health_check))
        .route("/stats", get(get_api_stats))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn_with_state(node.clone(), stats_middleware))
        .with_state(node);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn run_api_server(
    node: Arc<ApiNode>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    let node_state = match &node.state {
        Some(s) => s.read().await.clone(),
        None => NodeState::Ready,
    };
    let status = if node_state == NodeState::Ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let label = if status == StatusCode::OK { "healthy" } else { "unhealthy" };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "node_state": format!("{:?}", node_state),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}

async fn get_chain_info(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.ledger.read().await.chain_info())
}

async fn get_blockchain_height(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.ledger.read().await.chain().len() as u64)
}

async fn get_blocks(
    State(node): State<Arc<ApiNode>>,
    Query(params): Query<PaginationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if params.limit == 0 || params.limit > 100 {
        return Err(ApiError::InvalidInput("limit must be between 1 and 100".to_string()));
    }

    let ledger = node.ledger.read().await;
    let chain = ledger.chain();
    // Newest first
    let blocks: Vec<_> = chain
        .iter()
        .rev()
        .skip(params.page.saturating_mul(params.limit))
        .take(params.limit)
        .cloned()
        .collect();

    Ok(Json(serde_json::json!({
        "blocks": blocks,
        "total": chain.len(),
        "page": params.page,
        "limit": params.limit,
    })))
}

async fn get_block_by_index(
    State(node): State<Arc<ApiNode>>,
    Path(index): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = node.ledger.read().await;
    let block = ledger.get_block(index)?.clone();
    Ok(Json(block))
}

async fn process_block(State(node): State<Arc<ApiNode>>) -> Result<impl IntoResponse, ApiError> {
    let processed = node.ledger.write().await.process_block()?;
    node.api_stats.write().await.blocks_processed += 1;
    Ok(Json(processed))
}

async fn submit_transaction(
    State(node): State<Arc<ApiNode>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = node
        .ledger
        .write()
        .await
        .create_transaction(&req.from, &req.to, req.amount)?;
    node.api_stats.write().await.transactions_submitted += 1;
    Ok((StatusCode::CREATED, Json(tx)))
}

async fn get_transaction(
    State(node): State<Arc<ApiNode>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let lookup = node
        .ledger
        .read()
        .await
        .find_transaction(&id)
        .ok_or(ChainError::TransactionNotFound(id))?;
    Ok(Json(lookup))
}

async fn fund_address(
    State(node): State<Arc<ApiNode>>,
    Json(req): Json<FaucetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tx = node.ledger.write().await.fund(&req.address, req.amount)?;
    Ok((StatusCode::CREATED, Json(tx)))
}

async fn get_mempool(
    State(node): State<Arc<ApiNode>>,
    Query(params): Query<LimitQuery>,
) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    let transactions = ledger.pending(params.limit);
    Json(serde_json::json!({
        "count": ledger.pending_count(),
        "transactions": transactions,
    }))
}

async fn audit_mempool(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.ledger.read().await.audit_pending())
}

async fn evict_mempool(
    State(node): State<Arc<ApiNode>>,
    Json(req): Json<EvictRequest>,
) -> impl IntoResponse {
    let removed = node.ledger.write().await.evict_pending(&req.ids);
    Json(serde_json::json!({ "removed": removed }))
}

async fn get_address_balance(
    State(node): State<Arc<ApiNode>>,
    Path(addr): Path<String>,
) -> impl IntoResponse {
    let balance = node.ledger.read().await.get_balance(&addr);
    Json(BalanceResponse {
        address: addr,
        balance,
    })
}

async fn get_address_transactions(
    State(node): State<Arc<ApiNode>>,
    Path(addr): Path<String>,
) -> impl IntoResponse {
    let history = node.ledger.read().await.transaction_history(&addr);
    Json(serde_json::json!({
        "address": addr,
        "count": history.len(),
        "transactions": history,
    }))
}

async fn create_wallet(
    State(node): State<Arc<ApiNode>>,
    body: Option<Json<CreateWalletRequest>>,
) -> impl IntoResponse {
    let name = body.and_then(|Json(req)| req.name);
    Json(node.ledger.write().await.create_wallet(name))
}

async fn get_validators(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.ledger.read().await.get_all_validators().to_vec())
}

async fn add_validator(
    State(node): State<Arc<ApiNode>>,
    Json(req): Json<AddValidatorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let validator = node
        .ledger
        .write()
        .await
        .add_validator_to_network(&req.name, req.stake)?;
    Ok((StatusCode::CREATED, Json(validator)))
}

async fn penalize_validator(
    State(node): State<Arc<ApiNode>>,
    Path(id): Path<String>,
    Json(req): Json<PenalizeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let validator = node.ledger.write().await.penalize_validator(&id, req.amount)?;
    Ok(Json(validator))
}

async fn remove_validator(
    State(node): State<Arc<ApiNode>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    node.ledger.write().await.remove_validator(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_validator_stats(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    let ledger = node.ledger.read().await;
    Json(serde_json::json!({
        "network": ledger.network_stats(),
        "consensus": ledger.consensus_info(),
    }))
}

async fn get_consensus_info(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    Json(node.ledger.read().await.consensus_info())
}

async fn get_api_stats(State(node): State<Arc<ApiNode>>) -> impl IntoResponse {
    let stats = node.api_stats.read().await;
    Json(ApiStatsResponse {
        total_requests: stats.total_requests,
        successful_requests: stats.successful_requests,
        failed_requests: stats.failed_requests,
        transactions_submitted: stats.transactions_submitted,
        blocks_processed: stats.blocks_processed,
        uptime_seconds: stats.start_time.map_or(0, |t| t.elapsed().as_secs()),
    })
}
