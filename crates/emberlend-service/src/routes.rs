//! REST surface over the underwriting engine
//!
//! Thin handlers: convert between API token amounts (whole tokens as
//! floats) and the engine's smallest-unit integers, run the injected
//! service objects, and map engine errors to HTTP statuses. Denials and
//! reverts are 400, a missing profile or loan is 404, an aborted
//! pipeline is 500.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use emberlend_common::policy::TOKEN;
use emberlend_common::{Address, EmberlendError, FinancialSnapshot};
use emberlend_engine::{LoanGateway, Underwriter};

#[derive(Clone)]
pub struct AppState {
    pub underwriter: Arc<Underwriter>,
    pub gateway: Arc<LoanGateway>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/credit-data/:address", get(credit_data))
        .route("/api/process-score", post(process_score))
        .route("/api/evaluate-loan", post(evaluate_loan))
        .route("/api/disburse-loan", post(disburse_loan))
        .route("/api/loan-status/:address", get(loan_status))
        .route("/api/repayment-info/:address", get(repayment_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn error_response(err: EmberlendError) -> ApiError {
    let status = match &err {
        EmberlendError::PolicyDenial(_) | EmberlendError::LedgerRevert(_) => {
            StatusCode::BAD_REQUEST
        }
        EmberlendError::NoProfile(_) => StatusCode::NOT_FOUND,
        EmberlendError::DataUnavailable(_) | EmberlendError::Timeout(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => {
            error!(%err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() })))
}

/// Whole-token amount from the API into smallest units.
fn to_units(tokens: f64) -> std::result::Result<u128, ApiError> {
    if !tokens.is_finite() || tokens < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "amount must be a non-negative number" })),
        ));
    }
    Ok((tokens * TOKEN as f64) as u128)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Synthetic external credit data for an address, as the demo data
/// source would serve it.
async fn credit_data(Path(address): Path<String>) -> Json<Value> {
    let address = Address::new(address);
    let snapshot = FinancialSnapshot::synthesize(&address);
    Json(json!({
        "address": address,
        "snapshot": snapshot,
    }))
}

#[derive(Debug, Deserialize)]
struct ProcessScoreRequest {
    address: String,
    /// Whole tokens; omitted means "no specific amount"
    #[serde(default)]
    requested_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ProcessScoreResponse {
    address: Address,
    tradfi_score: u16,
    onchain_score: u8,
    combined_risk_score: u8,
    max_borrow_amount: f64,
    approved_amount: f64,
    apr_percent: f64,
    rng_jitter_bps: Option<i16>,
    loan_value_usd: Option<rust_decimal::Decimal>,
    max_borrow_usd: Option<rust_decimal::Decimal>,
    valid_until: i64,
    tx_hash: Option<String>,
}

async fn process_score(
    State(state): State<AppState>,
    Json(req): Json<ProcessScoreRequest>,
) -> ApiResult<ProcessScoreResponse> {
    let address = Address::new(req.address);
    let requested = match req.requested_amount {
        Some(tokens) => to_units(tokens)?,
        None => 0,
    };

    let ctx = state
        .underwriter
        .run(&address, requested)
        .await
        .map_err(error_response)?;

    Ok(Json(ProcessScoreResponse {
        address: ctx.user_address.clone(),
        tradfi_score: ctx.tradfi_score,
        onchain_score: ctx.onchain_score,
        combined_risk_score: ctx.combined_risk_score,
        max_borrow_amount: ctx.max_borrow_amount as f64 / TOKEN as f64,
        approved_amount: ctx.approved_amount as f64 / TOKEN as f64,
        apr_percent: f64::from(ctx.apr_bps) / 100.0,
        rng_jitter_bps: ctx.rng_jitter_bps,
        loan_value_usd: ctx.loan_value_usd,
        max_borrow_usd: ctx.max_borrow_usd,
        valid_until: ctx.valid_until,
        tx_hash: ctx.submission_handle,
    }))
}

#[derive(Debug, Deserialize)]
struct LoanRequest {
    address: String,
    /// Whole tokens
    amount: f64,
}

async fn evaluate_loan(
    State(state): State<AppState>,
    Json(req): Json<LoanRequest>,
) -> ApiResult<emberlend_engine::Decision> {
    let address = Address::new(req.address);
    let amount = to_units(req.amount)?;

    let decision = state
        .gateway
        .evaluate(&address, amount)
        .await
        .map_err(error_response)?;
    Ok(Json(decision))
}

async fn disburse_loan(
    State(state): State<AppState>,
    Json(req): Json<LoanRequest>,
) -> ApiResult<emberlend_engine::Disbursement> {
    let address = Address::new(req.address);
    let amount = to_units(req.amount)?;

    let disbursement = state
        .gateway
        .disburse(&address, amount)
        .await
        .map_err(error_response)?;
    Ok(Json(disbursement))
}

async fn loan_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Value> {
    let address = Address::new(address);
    let loan = state
        .gateway
        .loan_status(&address)
        .await
        .map_err(error_response)?;

    Ok(Json(match loan {
        Some(loan) => json!({
            "address": address,
            "has_loan": true,
            "active": loan.active,
            "principal": loan.principal as f64 / TOKEN as f64,
            "apr_percent": f64::from(loan.apr_bps) / 100.0,
            "started_at": loan.started_at,
        }),
        None => json!({
            "address": address,
            "has_loan": false,
        }),
    }))
}

async fn repayment_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Value> {
    let address = Address::new(address);
    let info = state
        .gateway
        .repayment_info(&address)
        .await
        .map_err(error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "no active loan for address" })),
            )
        })?;

    Ok(Json(json!({
        "address": address,
        "principal": info.loan.principal as f64 / TOKEN as f64,
        "apr_percent": f64::from(info.loan.apr_bps) / 100.0,
        "accrued_interest": info.accrued_interest as f64 / TOKEN as f64,
        "total_due": info.total_due as f64 / TOKEN as f64,
        "started_at": info.loan.started_at,
        "as_of": info.as_of,
    })))
}
