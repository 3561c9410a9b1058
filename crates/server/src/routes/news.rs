use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use service::news_service::{self, NewsInput, SortOrder};

use crate::{errors::JsonApiError, routes::ServerState};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    /// 1-based page; absent or non-numeric falls back to 1
    pub page: Option<String>,
    /// "asc" or "desc"; anything else falls back to "desc"
    pub order: Option<String>,
    /// case-insensitive title substring filter
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListNewsResponse {
    pub data: Vec<models::news::Model>,
    pub page: u32,
    pub order: &'static str,
}

/// Path ids must be positive integers; everything else is rejected before any
/// datastore access.
fn parse_news_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().filter(|id| *id > 0)
}

fn invalid_id() -> JsonApiError {
    JsonApiError::new(
        StatusCode::BAD_REQUEST,
        "Invalid Id",
        Some("id must be a positive integer".into()),
    )
}

#[utoipa::path(
    get, path = "/news", tag = "news",
    params(ListQuery),
    responses(
        (status = 200, description = "Paginated news envelope"),
        (status = 500, description = "Internal Error")
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListNewsResponse>, JsonApiError> {
    let page = q
        .page
        .as_deref()
        .and_then(|p| p.parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let order = SortOrder::parse(q.order.as_deref());
    let data = news_service::list_news(&state.db, page, order, q.title.as_deref()).await?;
    info!(count = data.len(), page, order = order.as_str(), "list news");
    Ok(Json(ListNewsResponse {
        data,
        page,
        order: order.as_str(),
    }))
}

#[utoipa::path(
    get, path = "/news/{id}", tag = "news",
    params(("id" = String, Path, description = "News ID, positive integer")),
    responses(
        (status = 200, description = "OK"),
        (status = 400, description = "Invalid Id"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<models::news::Model>, JsonApiError> {
    let id = parse_news_id(&id).ok_or_else(invalid_id)?;
    let m = news_service::get_news(&state.db, id).await?;
    Ok(Json(m))
}

#[utoipa::path(
    post, path = "/news", tag = "news",
    request_body = crate::openapi::NewsInputDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Duplicate Title"),
        (status = 422, description = "Malformed Body")
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Json(input): Json<NewsInput>,
) -> Result<(StatusCode, Json<models::news::Model>), JsonApiError> {
    let m = news_service::create_news(&state.db, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(m)))
}

#[utoipa::path(
    put, path = "/news/{id}", tag = "news",
    params(("id" = String, Path, description = "News ID, positive integer")),
    request_body = crate::openapi::NewsInputDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Invalid Id / Validation Error"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Duplicate Title")
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(input): Json<NewsInput>,
) -> Result<Json<models::news::Model>, JsonApiError> {
    let id = parse_news_id(&id).ok_or_else(invalid_id)?;
    let m = news_service::update_news(&state.db, id, input, Utc::now()).await?;
    Ok(Json(m))
}

#[utoipa::path(
    delete, path = "/news/{id}", tag = "news",
    params(("id" = String, Path, description = "News ID, positive integer")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid Id"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<StatusCode, JsonApiError> {
    let id = parse_news_id(&id).ok_or_else(invalid_id)?;
    news_service::delete_news(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
