use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use ledger_api::wire::{InvokeRequest, QueryResponse, SubmitResponse};
use ledger_api::{LedgerError, TxStatus};

use super::AppState;
use crate::error::ApiError;

fn body(payload: Result<Json<InvokeRequest>, JsonRejection>) -> Result<InvokeRequest, ApiError> {
    payload
        .map(|Json(req)| req)
        .map_err(|e| ApiError(LedgerError::invalid_argument(format!("request body: {}", e.body_text()))))
}

// ═══════════════════════════════════════════════════════════════
//  REST: POST /api/v1/transactions
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_submit(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let req = body(payload)?;
    let args = req.decode_args()?;
    let submitted = state
        .transport
        .submit_transaction(&req.contract, &req.function, args)
        .await?;
    tracing::debug!(tx_id = %submitted.tx_id, contract = %req.contract, function = %req.function, "submitted");
    Ok(Json(SubmitResponse::from(&submitted)))
}

// ═══════════════════════════════════════════════════════════════
//  REST: POST /api/v1/queries
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let req = body(payload)?;
    let args = req.decode_args()?;
    let payload = state
        .transport
        .evaluate_query(&req.contract, &req.function, args)
        .await?;
    Ok(Json(QueryResponse::new(&payload)))
}

// ═══════════════════════════════════════════════════════════════
//  REST: GET /api/v1/transactions/{tx_id}
// ═══════════════════════════════════════════════════════════════

pub(crate) async fn handle_status(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> Result<Json<TxStatus>, ApiError> {
    Ok(Json(state.transport.commit_status(&tx_id).await?))
}
