use serde::{Deserialize, Serialize};

use super::repo_types::{MealRecord, MealType, KNOWN_VENUES};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub month: String,
}

#[derive(Debug, Serialize)]
pub struct MealDetails {
    #[serde(flatten)]
    pub meal: MealRecord,
    pub calories_kcal: u32,
    /// Present when the meal has a photo.
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SavedMealResponse {
    pub meal: MealRecord,
    pub message: &'static str,
}

pub const SAVED_MESSAGE: &str = "Saved!";

#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub venues: Vec<&'static str>,
    pub meal_types: Vec<MealType>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            venues: KNOWN_VENUES.to_vec(),
            meal_types: MealType::ALL.to_vec(),
        }
    }
}
