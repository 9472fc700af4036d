use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use crate::{
    AppState,
    dtos::{TickerReviewDto, TickerSubmitDto},
    error::{ErrorMessage, HttpError},
    extract::{OptionalJson, ValidJson},
    middleware::CurrentIdentity,
    moderation::{Decision, Track},
};

/// Public view: only the live text, empty when disabled or never set.
pub async fn public_ticker(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let ticker = app_state.engine.ticker().await?;
    let body = match ticker {
        Some(ticker) => json!({ "enabled": ticker.enabled, "text": ticker.live_text() }),
        None => json!({ "enabled": false, "text": "" }),
    };
    Ok(Json(body))
}

/// Full row, pending fields included.
pub async fn current_ticker(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let ticker = app_state.engine.ticker().await?;
    Ok(Json(json!({ "ticker": ticker })))
}

/// Admin writes go live; reporter writes wait for review.
#[instrument(skip_all)]
pub async fn submit_ticker(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    ValidJson(body): ValidJson<TickerSubmitDto>,
) -> Result<impl IntoResponse, HttpError> {
    let identity = current
        .get()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    let (ticker, track) = app_state.engine.submit_ticker(identity, &body.text).await?;
    let message = match track {
        Track::Live => "Breaking ticker updated and live",
        Track::Queued => "Ticker submitted for approval",
    };
    Ok(Json(json!({ "success": true, "message": message, "ticker": ticker })))
}

pub async fn pending_ticker(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let ticker = app_state.engine.ticker().await?;
    let has_pending = ticker.as_ref().is_some_and(|t| t.has_pending());
    Ok(Json(json!({ "ticker": ticker, "hasPending": has_pending })))
}

#[instrument(skip_all)]
pub async fn approve_ticker(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    OptionalJson(body): OptionalJson<TickerReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let expected = body.and_then(|b| b.expected_version);
    let ticker = app_state
        .engine
        .review_ticker(current.get(), Decision::Approve, expected)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Ticker approved and now live",
        "ticker": ticker,
    })))
}

#[instrument(skip_all)]
pub async fn reject_ticker(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    OptionalJson(body): OptionalJson<TickerReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let expected = body.and_then(|b| b.expected_version);
    let ticker = app_state
        .engine
        .review_ticker(current.get(), Decision::Reject(None), expected)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Pending ticker rejected",
        "ticker": ticker,
    })))
}

#[instrument(skip_all)]
pub async fn toggle_ticker(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
) -> Result<impl IntoResponse, HttpError> {
    let ticker = app_state.engine.toggle_ticker(current.get()).await?;
    Ok(Json(json!({ "message": "Ticker toggled", "enabled": ticker.enabled })))
}
