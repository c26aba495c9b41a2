use std::{fmt, str::FromStr};

use axum::{routing::get, Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

/// Screen identifiers clients navigate between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    MealInput,
    MealList,
    MealAnalysis,
    MealDetail(Uuid),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown route `{0}`")]
pub struct UnknownRoute(String);

impl Route {
    /// HTTP path serving this screen, relative to `/api/v1`.
    pub fn api_path(&self) -> String {
        match self {
            Route::Home => "/home".into(),
            Route::MealInput => "/drafts".into(),
            Route::MealList => "/meals".into(),
            Route::MealAnalysis => "/analysis".into(),
            Route::MealDetail(id) => format!("/meals/{id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("home"),
            Route::MealInput => f.write_str("meal_input"),
            Route::MealList => f.write_str("meal_list"),
            Route::MealAnalysis => f.write_str("meal_analysis"),
            Route::MealDetail(id) => write!(f, "meal_detail/{id}"),
        }
    }
}

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Route::Home),
            "meal_input" => Ok(Route::MealInput),
            "meal_list" => Ok(Route::MealList),
            "meal_analysis" => Ok(Route::MealAnalysis),
            _ => s
                .strip_prefix("meal_detail/")
                .and_then(|id| Uuid::parse_str(id).ok())
                .map(Route::MealDetail)
                .ok_or_else(|| UnknownRoute(s.to_string())),
        }
    }
}

impl Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Serialize)]
pub struct MenuEntry {
    pub label: &'static str,
    pub route: Route,
    pub path: String,
}

pub fn home_menu() -> Vec<MenuEntry> {
    [
        ("Log a meal", Route::MealInput),
        ("What did I eat that day?", Route::MealList),
        ("How much did I eat this month?", Route::MealAnalysis),
    ]
    .into_iter()
    .map(|(label, route)| MenuEntry {
        label,
        path: route.api_path(),
        route,
    })
    .collect()
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(|| async { Json(home_menu()) }))
}
