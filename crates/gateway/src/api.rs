//! JSON API: lists, items, and suggestions.
//!
//! Endpoints (all behind the session check):
//!
//! - `GET    /api/lists`: All lists
//! - `POST   /api/lists`: Create a list
//! - `GET    /api/lists/{id}`: List view (items + suggestions)
//! - `PATCH  /api/lists/{id}`: Rename a list
//! - `DELETE /api/lists/{id}`: Delete a list (never the last one)
//! - `POST   /api/lists/{id}/items`: Add an item
//! - `POST   /api/lists/{id}/suggestions/forget`: Dismiss a suggestion by name
//! - `PATCH  /api/items/{id}`: Rename an item
//! - `POST   /api/items/{id}/toggle`: Toggle completion
//! - `DELETE /api/items/{id}`: Delete an item (remembers its name)
//! - `POST   /api/items/{id}/forget`: Dismiss the suggestion matching an item
//!
//! Item mutations answer with the refreshed view of the owning list, or
//! `204 No Content` when the item does not exist.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use shoplist_core::{
    Error, Item, ItemRepository, List, ListRepository, MemoryRepository, Store,
};

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the API router. Nest this under "/api" in the main router.
pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/lists", get(list_lists_handler).post(create_list_handler))
        .route(
            "/lists/{id}",
            get(list_view_handler)
                .patch(rename_list_handler)
                .delete(delete_list_handler),
        )
        .route("/lists/{id}/items", post(add_item_handler))
        .route(
            "/lists/{id}/suggestions/forget",
            post(forget_suggestion_handler),
        )
        .route(
            "/items/{id}",
            patch(rename_item_handler).delete(delete_item_handler),
        )
        .route("/items/{id}/toggle", post(toggle_item_handler))
        .route("/items/{id}/forget", post(forget_item_name_handler))
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: String,
}

/// Everything the frontend needs to draw one list.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListView {
    pub list: List,
    pub items: Vec<Item>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Maps domain errors onto HTTP responses.
///
/// Storage failures are logged and reported without detail.
#[derive(Debug)]
pub struct ApiError(Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            Error::Invariant(e) => (StatusCode::CONFLICT, e.to_string()),
            Error::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            Error::Store(_) => {
                error!(error = %self.0, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: format!("{what} not found"),
        }),
    )
        .into_response()
}

// ── Helpers ───────────────────────────────────────────────────────────────

async fn load_view(store: &dyn Store, list_id: i64) -> Result<Option<ListView>, ApiError> {
    let Some(list) = store.get_list(list_id).await? else {
        return Ok(None);
    };
    let items = store.items_for(list_id).await?;
    let suggestions = store.suggestions(list_id).await?;
    Ok(Some(ListView {
        list,
        items,
        suggestions,
    }))
}

async fn view_response(state: &SharedState, list_id: i64) -> Result<Response, ApiError> {
    Ok(match load_view(state.store.as_ref(), list_id).await? {
        Some(view) => Json(view).into_response(),
        None => not_found("list"),
    })
}

/// Answer an item mutation with its list's view.
async fn item_response(state: &SharedState, item: Option<Item>) -> Result<Response, ApiError> {
    match item {
        Some(item) => view_response(state, item.list_id).await,
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ── List handlers ─────────────────────────────────────────────────────────

async fn list_lists_handler(State(state): State<SharedState>) -> Result<Json<Vec<List>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

async fn create_list_handler(
    State(state): State<SharedState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<List>), ApiError> {
    let list = state.store.create_list(&req.name).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

async fn list_view_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    view_response(&state, id).await
}

async fn rename_list_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<NameRequest>,
) -> Result<StatusCode, ApiError> {
    state.store.rename_list(id, &req.name).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_list_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_list(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_item_handler(
    State(state): State<SharedState>,
    Path(list_id): Path<i64>,
    Json(req): Json<NameRequest>,
) -> Result<Response, ApiError> {
    state.store.add_item(list_id, &req.name).await?;
    view_response(&state, list_id).await
}

async fn forget_suggestion_handler(
    State(state): State<SharedState>,
    Path(list_id): Path<i64>,
    Json(req): Json<NameRequest>,
) -> Result<Response, ApiError> {
    state.store.forget(list_id, &req.name).await?;
    view_response(&state, list_id).await
}

// ── Item handlers ─────────────────────────────────────────────────────────

async fn rename_item_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<NameRequest>,
) -> Result<Response, ApiError> {
    let item = state.store.rename_item(id, &req.name).await?;
    item_response(&state, item).await
}

async fn toggle_item_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let item = state.store.toggle_completed(id).await?;
    item_response(&state, item).await
}

async fn delete_item_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let item = state.store.delete_item(id).await?;
    item_response(&state, item).await
}

async fn forget_item_name_handler(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let item = state.store.get_item(id).await?;
    state.store.forget_item_name(id).await?;
    item_response(&state, item).await
}
