//! In-memory stand-in for the ledger API, used to exercise the harness locally.
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use rinha_core::{ClientSeed, HarnessConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

mod ledger;

pub use ledger::{Balance, Ledger, LedgerError, StatementView};

/// Behavior knobs for the mock.
#[derive(Debug, Clone, Default)]
pub struct MockOptions {
    /// Accept debits that push a balance below its limit.
    pub ignore_limit: bool,
}

#[derive(Clone)]
struct AppState {
    ledger: Arc<Mutex<Ledger>>,
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        match self {
            LedgerError::NotFound => StatusCode::NOT_FOUND.into_response(),
            LedgerError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY.into_response(),
        }
    }
}

pub fn router(clients: &[ClientSeed], options: MockOptions) -> Router {
    let state = AppState {
        ledger: Arc::new(Mutex::new(Ledger::new(clients, options.ignore_limit))),
    };

    Router::new()
        .route("/clientes/:id/transacoes", post(transaction))
        .route("/clientes/:id/extrato", get(statement))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the default clients on `addr` until the process exits.
pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Mock ledger listening on {}", listener.local_addr()?);
    serve(listener, MockOptions::default()).await
}

pub async fn serve(listener: TcpListener, options: MockOptions) -> std::io::Result<()> {
    let app = router(&HarnessConfig::default().clients, options);
    axum::serve(listener, app).await
}

/// Bind an ephemeral local port and serve in the background.
pub async fn spawn(options: MockOptions) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = serve(listener, options).await {
            tracing::error!("Mock ledger stopped: {err}");
        }
    });
    Ok(addr)
}

#[debug_handler]
async fn transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Balance>, LedgerError> {
    counter!("mock-service.transacoes").increment(1);
    let res = state
        .ledger
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .transact(id, &body);

    if let Err(err) = &res {
        debug!("Refused transaction for {id}: {err:?}");
    }
    res.map(Json)
}

#[debug_handler]
async fn statement(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatementView>, LedgerError> {
    counter!("mock-service.extrato").increment(1);
    state
        .ledger
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .statement(id)
        .map(Json)
}
