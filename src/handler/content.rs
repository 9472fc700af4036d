//! Handlers shared by every row-based content kind.
//!
//! Each handler is generic over the payload type; `routes` instantiates them
//! once per kind (`list_public::<News>`, `create::<Business>`, ...).

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value, json};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    dtos::{ListQueryDto, RejectDto, ReviewAction, ReviewDto, SubmitDto, UpdateDto},
    error::{ErrorMessage, HttpError},
    extract::{OptionalJson, ValidJson},
    middleware::CurrentIdentity,
    models::{ContentItem, ContentKind, Identity},
    moderation::{Decision, PageRequest, PublicFilter, SubmitIntent, descriptor},
    payloads::Payload,
};

fn page_or_default(query: &ListQueryDto, kind: ContentKind) -> PageRequest {
    PageRequest {
        page: query.page.unwrap_or(1),
        limit: query
            .limit
            .unwrap_or_else(|| descriptor(kind).default_page_size),
    }
}

/// Owner and admin lists are unpaged unless the caller asks for a page.
fn requested_page(query: &ListQueryDto, kind: ContentKind) -> Option<PageRequest> {
    (query.page.is_some() || query.limit.is_some()).then(|| page_or_default(query, kind))
}

/// `{<collection>: [...], total}` plus `page`/`limit` when paged.
fn list_body(
    kind: ContentKind,
    items: Vec<ContentItem>,
    total: i64,
    page: Option<PageRequest>,
) -> Result<Json<Value>, HttpError> {
    let items = serde_json::to_value(items).map_err(|e| {
        tracing::error!("Failed to encode {} list: {}", kind, e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let mut body = Map::new();
    body.insert(descriptor(kind).collection.to_string(), items);
    body.insert("total".to_string(), json!(total));
    if let Some(page) = page {
        body.insert("page".to_string(), json!(page.page));
        body.insert("limit".to_string(), json!(page.limit));
    }
    Ok(Json(Value::Object(body)))
}

fn require_identity(current: &CurrentIdentity) -> Result<&Identity, HttpError> {
    current
        .get()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))
}

/// Approved and enabled rows only, newest first.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn list_public<P: Payload>(
    State(app_state): State<AppState>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;
    let page = page_or_default(&query, P::KIND);
    let filter = PublicFilter {
        category: query.category.clone(),
        featured: query.featured,
    };

    let (items, total) = app_state.engine.list_public(P::KIND, filter, page).await?;
    list_body(P::KIND, items, total, Some(page))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn get_one<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .find_visible(P::KIND, current.get(), id)
        .await?;
    Ok(Json(item))
}

/// Create a row owned by the caller (or by nobody for anonymous classifieds).
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn create<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    ValidJson(body): ValidJson<SubmitDto<P>>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .submit(current.get(), body.payload, body.status)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Admin creation publishes unless the body explicitly asks for a draft.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn admin_create<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    ValidJson(body): ValidJson<SubmitDto<P>>,
) -> Result<impl IntoResponse, HttpError> {
    let intent = body.status.unwrap_or(SubmitIntent::Submit);
    let item = app_state
        .engine
        .submit(current.get(), body.payload, Some(intent))
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn update<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateDto<P::Patch>>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .edit::<P>(current.get(), id, body.patch, body.status)
        .await?;
    Ok(Json(item))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn remove<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.engine.remove(P::KIND, current.get(), id).await?;
    Ok(Json(json!({ "success": true })))
}

/// Everything the caller owns, in any state.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn list_mine<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;
    let identity = require_identity(&current)?;
    let page = requested_page(&query, P::KIND);

    let (items, total) = app_state.engine.list_owned(P::KIND, identity, page).await?;
    list_body(P::KIND, items, total, page)
}

/// Every row of the kind, optionally narrowed by `?status=`.
#[instrument(skip_all, fields(kind = %P::KIND))]
pub async fn list_admin<P: Payload>(
    State(app_state): State<AppState>,
    Query(query): Query<ListQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query.validate()?;
    let page = requested_page(&query, P::KIND);

    let (items, total) = app_state
        .engine
        .list_all(P::KIND, query.status, page)
        .await?;
    list_body(P::KIND, items, total, page)
}

/// `POST /admin/<kind>/approve {id, action, reason?}`
#[instrument(skip_all, fields(kind = %P::KIND, id = %body.id, action = ?body.action))]
pub async fn review<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    ValidJson(body): ValidJson<ReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    let decision = match body.action {
        ReviewAction::Approve => Decision::Approve,
        ReviewAction::Reject => Decision::Reject(body.reason),
    };
    let item = app_state
        .engine
        .review(P::KIND, current.get(), body.id, decision)
        .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn approve<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .review(P::KIND, current.get(), id, Decision::Approve)
        .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn reject<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
    OptionalJson(body): OptionalJson<RejectDto>,
) -> Result<impl IntoResponse, HttpError> {
    let reason = body.and_then(|b| b.reason);
    let item = app_state
        .engine
        .review(P::KIND, current.get(), id, Decision::Reject(reason))
        .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn toggle<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .toggle_enabled(P::KIND, current.get(), id)
        .await?;
    Ok(Json(json!({ "success": true, "enabled": item.enabled })))
}

#[instrument(skip_all, fields(kind = %P::KIND, %id))]
pub async fn feature<P: Payload>(
    State(app_state): State<AppState>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let item = app_state
        .engine
        .toggle_featured(P::KIND, current.get(), id)
        .await?;
    Ok(Json(json!({ "success": true, "featured": item.payload.featured() })))
}
