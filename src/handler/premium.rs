use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde_json::json;
use tracing::instrument;
use validator::Validate;

use crate::{
    AppState,
    access::Action,
    db::{PremiumAdChanges, PremiumAdExt},
    dtos::PremiumAdDto,
    error::HttpError,
    extract::ValidJson,
    middleware::gated,
};

/// Title shown before the admin has configured the slot.
const PLACEHOLDER_TITLE: &str = "Premium Advertisement Space";

pub fn premium_ad_handler() -> Router<AppState> {
    Router::new()
        .route("/ads/premium", get(public_premium_ad))
        .route(
            "/admin/ads/premium",
            gated(
                get(premium_settings).post(save_premium_settings),
                Action::Administer,
            ),
        )
}

/// Public banner. An unconfigured slot shows the placeholder; a disabled
/// one reveals nothing but the flag.
pub async fn public_premium_ad(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let body = match app_state.db_client.get_premium_ad().await? {
        None => json!({
            "enabled": true,
            "imageUrl": "",
            "linkUrl": "",
            "title": PLACEHOLDER_TITLE,
        }),
        Some(ad) if !ad.enabled => json!({ "enabled": false }),
        Some(ad) => json!({
            "enabled": true,
            "imageUrl": ad.image_url,
            "linkUrl": ad.link_url,
            "title": ad.title,
        }),
    };
    Ok(Json(body))
}

pub async fn premium_settings(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let settings = match app_state.db_client.get_premium_ad().await? {
        Some(ad) => json!(ad),
        None => json!({ "enabled": false, "imageUrl": "", "linkUrl": "", "title": "" }),
    };
    Ok(Json(json!({ "settings": settings })))
}

#[instrument(skip_all, fields(enabled = ?body.enabled))]
pub async fn save_premium_settings(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<PremiumAdDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()?;

    let changes = PremiumAdChanges {
        enabled: body.enabled,
        image_url: body.image_url.map(|url| url.trim().to_string()),
        link_url: body.link_url.map(|url| url.trim().to_string()),
        title: body.title.map(|title| title.trim().to_string()),
    };
    let ad = app_state.db_client.save_premium_ad(changes).await?;

    tracing::info!(enabled = ad.enabled, "Premium ad settings saved");
    Ok(Json(json!({ "message": "Premium Ad settings saved", "settings": ad })))
}
