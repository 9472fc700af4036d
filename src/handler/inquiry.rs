//! Reporter application and business promotion queues.
//!
//! Anyone may submit; only the super-admin reads, annotates and deletes.
//! Handlers are generic over the form type, like the content handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{MethodRouter, get, post},
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    access::Action,
    db::{DbError, InquiryExt},
    dtos::{InquiryIdQuery, InquiryUpdateDto},
    error::HttpError,
    extract::ValidJson,
    inquiry::{BusinessPromotion, Form, ReporterApplication, queue},
    middleware::gated,
    models::{Inquiry, InquiryStatus},
};

pub fn inquiry_handler() -> Router<AppState> {
    Router::new()
        .route("/reporter-applications", queue_routes::<ReporterApplication>())
        .route("/business-promotions", queue_routes::<BusinessPromotion>())
}

fn queue_routes<F: Form>() -> MethodRouter<AppState> {
    post(submit::<F>).merge(gated(
        get(list::<F>)
            .put(update_status::<F>)
            .delete(remove::<F>),
        Action::Administer,
    ))
}

#[instrument(skip_all, fields(kind = %F::KIND))]
pub async fn submit<F: Form>(
    State(app_state): State<AppState>,
    ValidJson(mut form): ValidJson<F>,
) -> Result<impl IntoResponse, HttpError> {
    form.normalize();
    form.validate()?;

    let now = Utc::now();
    let inquiry = Inquiry {
        id: Uuid::new_v4(),
        status: InquiryStatus::Pending,
        admin_note: String::new(),
        submitted_at: now,
        updated_at: now,
        form: form.wrap(),
    };

    let saved = match app_state.db_client.insert_inquiry(&inquiry).await {
        Ok(saved) => saved,
        Err(DbError::Duplicate(_)) => {
            return Err(HttpError::bad_request(
                "An application with this email already exists",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(id = %saved.id, "Inquiry submitted");
    Ok(Json(json!({
        "success": true,
        "message": queue(F::KIND).submitted,
        "id": saved.id,
    })))
}

pub async fn list<F: Form>(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let inquiries = app_state.db_client.list_inquiries(F::KIND).await?;
    let mut body = Map::new();
    body.insert(queue(F::KIND).collection.to_string(), json!(inquiries));
    Ok(Json(Value::Object(body)))
}

#[instrument(skip_all, fields(kind = %F::KIND, id = ?body.id, status = ?body.status))]
pub async fn update_status<F: Form>(
    State(app_state): State<AppState>,
    ValidJson(body): ValidJson<InquiryUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    let (Some(id), Some(status)) = (body.id, body.status.as_deref()) else {
        return Err(HttpError::bad_request("ID and status are required"));
    };
    let status = status
        .parse::<InquiryStatus>()
        .ok()
        .filter(|status| F::KIND.allows(*status))
        .ok_or_else(|| HttpError::bad_request("Invalid status"))?;

    let label = queue(F::KIND).label;
    let note = body.admin_note.as_deref().map(str::trim).unwrap_or_default();
    app_state
        .db_client
        .update_inquiry_status(F::KIND, id, status, note)
        .await?
        .ok_or_else(|| HttpError::not_found(format!("{} not found", label)))?;

    Ok(Json(json!({ "success": true, "message": format!("{} updated", label) })))
}

#[instrument(skip_all, fields(kind = %F::KIND, id = ?query.id))]
pub async fn remove<F: Form>(
    State(app_state): State<AppState>,
    Query(query): Query<InquiryIdQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let Some(raw_id) = query.id.filter(|id| !id.trim().is_empty()) else {
        return Err(HttpError::bad_request("ID is required"));
    };

    let label = queue(F::KIND).label;
    let removed = match Uuid::parse_str(raw_id.trim()) {
        Ok(id) => app_state.db_client.delete_inquiry(F::KIND, id).await?,
        Err(_) => false,
    };
    if !removed {
        return Err(HttpError::not_found(format!("{} not found", label)));
    }

    Ok(Json(json!({ "success": true, "message": format!("{} deleted", label) })))
}
