use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    draft::{DraftEdit, MealDraft},
    store::DraftUpdate,
};
use crate::{
    error::{internal, AppError},
    meals::{dto::SavedMealResponse, handlers::save_and_respond},
    state::AppState,
    storage::photo_key,
};

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub id: Uuid,
    #[serde(flatten)]
    pub draft: MealDraft,
    /// Side dishes as the single line the form edits.
    pub side_dishes_text: String,
}

impl DraftView {
    fn new(id: Uuid, draft: MealDraft) -> Self {
        let side_dishes_text = draft.side_dishes_text();
        Self {
            id,
            draft,
            side_dishes_text,
        }
    }
}

pub fn draft_routes() -> Router<AppState> {
    Router::new()
        .route("/drafts", post(open_draft))
        .route(
            "/drafts/:id",
            get(get_draft).patch(edit_draft).delete(discard_draft),
        )
        .route("/drafts/:id/save", post(save_draft))
}

pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route("/drafts/:id/photo", put(upload_photo))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn open_draft(State(state): State<AppState>) -> (StatusCode, Json<DraftView>) {
    let (id, draft) = state.drafts.open().await;
    debug!(draft_id = %id, "draft opened");
    (StatusCode::CREATED, Json(DraftView::new(id, draft)))
}

#[instrument(skip(state))]
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DraftView>, (StatusCode, String)> {
    let draft = state
        .drafts
        .get(id)
        .await
        .ok_or(AppError::DraftNotFound(id))?;
    Ok(Json(DraftView::new(id, draft)))
}

/// PATCH /drafts/:id {"field": "cost", "value": "4500"}
#[instrument(skip(state))]
pub async fn edit_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(edit): Json<DraftEdit>,
) -> Result<Json<DraftView>, (StatusCode, String)> {
    let DraftUpdate {
        draft,
        released_photo,
    } = state
        .drafts
        .update(id, |d| d.apply(edit))
        .await
        .ok_or(AppError::DraftNotFound(id))?;
    if let Some(key) = released_photo {
        delete_photo(&state, &key).await;
    }
    Ok(Json(DraftView::new(id, draft)))
}

#[instrument(skip(state))]
pub async fn discard_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.drafts.discard(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::DraftNotFound(id).into())
    }
}

/// Persists the draft as it is. The draft stays open, so saving twice
/// stores two meals.
#[instrument(skip(state))]
pub async fn save_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, HeaderMap, Json<SavedMealResponse>), (StatusCode, String)> {
    let draft = state
        .drafts
        .take_for_save(id)
        .await
        .ok_or(AppError::DraftNotFound(id))?;
    debug!(draft_id = %id, ?draft, "saving draft");
    save_and_respond(&state, draft.into()).await
}

/// PUT /drafts/:id/photo with the raw image as body.
#[instrument(skip(state, headers, body), fields(size = body.len()))]
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DraftView>, (StatusCode, String)> {
    if state.drafts.get(id).await.is_none() {
        return Err(AppError::DraftNotFound(id).into());
    }
    if body.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "photo body is empty".into()));
    }
    let storage = state.storage.as_ref().ok_or(AppError::StorageUnavailable)?;

    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let key = photo_key(id, Uuid::new_v4(), &content_type);
    storage
        .put_object(&key, body, &content_type)
        .await
        .map_err(internal)?;
    info!(draft_id = %id, %key, "photo stored");

    let Some(DraftUpdate {
        draft,
        released_photo,
    }) = state
        .drafts
        .update(id, |d| d.with_image_uri(key.clone()))
        .await
    else {
        // discarded while the upload was in flight
        delete_photo(&state, &key).await;
        return Err(AppError::DraftNotFound(id).into());
    };
    if let Some(old) = released_photo {
        delete_photo(&state, &old).await;
    }
    Ok(Json(DraftView::new(id, draft)))
}

/// Best effort: a failed delete leaves an unreferenced object behind.
async fn delete_photo(state: &AppState, key: &str) {
    let Some(storage) = state.storage.as_ref() else {
        return;
    };
    match storage.delete_object(key).await {
        Ok(()) => debug!(%key, "photo deleted"),
        Err(e) => warn!(%key, error = ?e, "photo delete failed"),
    }
}
