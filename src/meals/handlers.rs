use axum::{
    extract::{Path, Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dates::YearMonth;
use super::dto::{
    DateQuery, FormOptions, MealDetails, MonthQuery, SavedMealResponse, SAVED_MESSAGE,
};
use super::repo_types::{MealRecord, NewMeal};
use super::services::{analyze_month, summarize_day, DaySummary, MonthSummary};
use crate::{
    error::{internal, AppError},
    state::AppState,
    storage::is_photo_key,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/:id", get(get_meal))
        .route("/meals/:id/photo", get(get_meal_photo))
        .route("/analysis", get(month_analysis))
        .route("/venues", get(form_options))
}

/// Persists a meal and answers 201 with its location, the way both the
/// direct endpoint and draft saves do.
pub(crate) async fn save_and_respond(
    state: &AppState,
    meal: NewMeal,
) -> Result<(StatusCode, HeaderMap, Json<SavedMealResponse>), (StatusCode, String)> {
    let meal = state.repo.save_meal(meal).await.map_err(internal)?;
    info!(meal_id = %meal.id, date = %meal.date, food = %meal.food_name, "meal saved");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/meals/{}", meal.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SavedMealResponse {
            meal,
            message: SAVED_MESSAGE,
        }),
    ))
}

/// POST /meals — saves a complete record; nothing is validated.
#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    Json(body): Json<NewMeal>,
) -> Result<(StatusCode, HeaderMap, Json<SavedMealResponse>), (StatusCode, String)> {
    save_and_respond(&state, body).await
}

/// GET /meals?date=2024-5-3
#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    Query(q): Query<DateQuery>,
) -> Result<Json<DaySummary>, (StatusCode, String)> {
    let meals = state
        .repo
        .load_meals_by_date(&q.date)
        .await
        .map_err(internal)?;
    Ok(Json(summarize_day(&q.date, meals, &state.calories)))
}

async fn find_meal(state: &AppState, id: Uuid) -> Result<MealRecord, (StatusCode, String)> {
    state
        .repo
        .get_meal(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::MealNotFound(id).into())
}

#[instrument(skip(state))]
pub async fn get_meal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MealDetails>, (StatusCode, String)> {
    let meal = find_meal(&state, id).await?;
    let photo_url = meal
        .image_uri
        .as_ref()
        .map(|_| format!("/api/v1/meals/{id}/photo"));
    Ok(Json(MealDetails {
        calories_kcal: state.calories.lookup(&meal.food_name),
        meal,
        photo_url,
    }))
}

/// Redirects to the meal photo: a presigned URL for stored uploads, the
/// reference itself for anything else.
#[instrument(skip(state))]
pub async fn get_meal_photo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let meal = find_meal(&state, id).await?;
    let Some(uri) = meal.image_uri else {
        return Err((StatusCode::NOT_FOUND, "Photo not found".into()));
    };

    if !is_photo_key(&uri) {
        return Ok(redirect_to(&uri)?);
    }

    let storage = state.storage.as_ref().ok_or(AppError::StorageUnavailable)?;
    let url = storage
        .presign_get(&uri, state.config.photo_url_ttl_secs)
        .await
        .map_err(internal)?;
    Ok(redirect_to(&url)?)
}

/// 307 to `url`. Stored references are user input, so a value that cannot
/// be a header is rejected instead of trusted.
fn redirect_to(url: &str) -> Result<Response, AppError> {
    let location = HeaderValue::from_str(url).map_err(|_| AppError::InvalidPhotoUri)?;
    Ok((StatusCode::TEMPORARY_REDIRECT, [(LOCATION, location)]).into_response())
}

/// GET /analysis?month=2024-5
#[instrument(skip(state))]
pub async fn month_analysis(
    State(state): State<AppState>,
    Query(q): Query<MonthQuery>,
) -> Result<Json<MonthSummary>, (StatusCode, String)> {
    let month = YearMonth::parse(&q.month).ok_or_else(|| AppError::InvalidMonth(q.month.clone()))?;
    let meals = state
        .repo
        .load_meals_by_month(month)
        .await
        .map_err(internal)?;
    Ok(Json(analyze_month(month, &meals, &state.calories)))
}

pub async fn form_options() -> Json<FormOptions> {
    Json(FormOptions::default())
}
