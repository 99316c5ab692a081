//! Request handlers, one per host method.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chain::{BroadcastResult, VerifiedBlock};
use crate::config::FeeShape;
use crate::engine::{ChannelFeeRates, Engine, EngineResult, FeeEstimates, FeeRateTable};
use crate::http::server::AppState;

/// `getrawblockbyheight` result; both fields null when the block is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlockResponse {
    pub blockhash: Option<String>,
    pub block: Option<String>,
}

impl RawBlockResponse {
    pub fn from_result(height: u64, result: EngineResult<Option<VerifiedBlock>>) -> Self {
        match result {
            Ok(Some(block)) => Self {
                blockhash: Some(block.hash.to_string()),
                block: Some(block.raw_hex()),
            },
            Ok(None) => Self::unavailable(),
            Err(e) => {
                tracing::warn!(height, error = %e, "getrawblockbyheight failed");
                Self::unavailable()
            }
        }
    }

    fn unavailable() -> Self {
        Self {
            blockhash: None,
            block: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfoResponse {
    pub chain: String,
    pub headercount: u64,
    pub blockcount: u64,
    pub ibd: bool,
}

impl ChainInfoResponse {
    pub async fn fetch(engine: &Engine) -> EngineResult<Self> {
        let tip = engine.get_tip().await?;
        Ok(Self {
            chain: engine.network().chain_name().to_string(),
            headercount: tip,
            blockcount: tip,
            ibd: false,
        })
    }
}

/// `getutxout` result; nulls when the output is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoResponse {
    pub amount: Option<u64>,
    pub script: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendRawTransactionRequest {
    pub tx: String,
}

/// Serialize fee estimates in the configured shape, all-null on failure.
pub fn fee_response(shape: FeeShape, result: EngineResult<FeeEstimates>) -> serde_json::Value {
    let estimates = match result {
        Ok(estimates) => Some(estimates),
        Err(e) => {
            tracing::warn!(error = %e, "estimatefees failed");
            None
        }
    };
    let value = match shape {
        FeeShape::FeerateTable => serde_json::to_value(
            estimates.map_or_else(FeeRateTable::unknown, |e| e.feerate_table()),
        ),
        FeeShape::Channel => serde_json::to_value(
            estimates.map_or_else(ChannelFeeRates::unknown, |e| e.channel_rates()),
        ),
    };
    value.unwrap_or(serde_json::Value::Null)
}

pub async fn get_raw_block_by_height(State(state): State<AppState>, Path(height): Path<u64>) -> Json<RawBlockResponse> {
    let result = state.engine.get_block(height).await;
    Json(RawBlockResponse::from_result(height, result))
}

pub async fn get_chain_info(State(state): State<AppState>) -> Response {
    match ChainInfoResponse::fetch(&state.engine).await {
        Ok(info) => Json(info).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "getchaininfo failed");
            (StatusCode::BAD_GATEWAY, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
        }
    }
}

pub async fn estimate_fees(State(state): State<AppState>) -> Json<serde_json::Value> {
    let result = state.engine.get_fee_rates().await;
    Json(fee_response(state.fee_shape, result))
}

pub async fn get_utxout(
    State(state): State<AppState>,
    Path((txid, vout)): Path<(String, u32)>,
) -> Json<UtxoResponse> {
    let output = match state.engine.get_output(&txid, vout).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(txid = %txid, vout, error = %e, "getutxout failed");
            None
        }
    };
    Json(UtxoResponse {
        amount: output.as_ref().map(|o| o.value),
        script: output.map(|o| o.script_pubkey),
    })
}

pub async fn send_raw_transaction(
    State(state): State<AppState>,
    Json(request): Json<SendRawTransactionRequest>,
) -> Json<BroadcastResult> {
    Json(state.engine.send_raw_transaction(&request.tx).await)
}
