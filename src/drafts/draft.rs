use serde::{Deserialize, Serialize};

use crate::meals::repo_types::{MealType, NewMeal};

/// Separator used both to show side dishes as one line and to split the line back.
pub const SIDE_DISH_SEPARATOR: &str = ", ";

/// An in-progress meal. Every `with_*` call returns a new draft with exactly
/// one field replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MealDraft {
    pub location: String,
    pub date: String,
    pub image_uri: Option<String>,
    pub meal_type: Option<MealType>,
    pub food_name: String,
    pub side_dishes: Vec<String>,
    pub cost: i32,
    pub review: String,
}

/// A single field edit, as sent by the input form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum DraftEdit {
    Location(String),
    Date(String),
    ImageUri(String),
    MealType(MealType),
    FoodName(String),
    SideDishes(String),
    Cost(String),
    Review(String),
}

impl MealDraft {
    pub fn with_location(self, location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..self
        }
    }

    pub fn with_date(self, date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..self
        }
    }

    pub fn with_image_uri(self, uri: impl Into<String>) -> Self {
        Self {
            image_uri: Some(uri.into()),
            ..self
        }
    }

    pub fn with_meal_type(self, meal_type: MealType) -> Self {
        Self {
            meal_type: Some(meal_type),
            ..self
        }
    }

    pub fn with_food_name(self, food_name: impl Into<String>) -> Self {
        Self {
            food_name: food_name.into(),
            ..self
        }
    }

    /// Rebuilds the list from the one-line text shown in the form.
    pub fn with_side_dishes(self, text: &str) -> Self {
        Self {
            side_dishes: split_side_dishes(text),
            ..self
        }
    }

    /// Anything that is not an `i32` resets the cost to 0.
    pub fn with_cost(self, text: &str) -> Self {
        Self {
            cost: text.parse().unwrap_or(0),
            ..self
        }
    }

    pub fn with_review(self, review: impl Into<String>) -> Self {
        Self {
            review: review.into(),
            ..self
        }
    }

    pub fn apply(self, edit: DraftEdit) -> Self {
        match edit {
            DraftEdit::Location(v) => self.with_location(v),
            DraftEdit::Date(v) => self.with_date(v),
            DraftEdit::ImageUri(v) => self.with_image_uri(v),
            DraftEdit::MealType(v) => self.with_meal_type(v),
            DraftEdit::FoodName(v) => self.with_food_name(v),
            DraftEdit::SideDishes(v) => self.with_side_dishes(&v),
            DraftEdit::Cost(v) => self.with_cost(&v),
            DraftEdit::Review(v) => self.with_review(v),
        }
    }

    pub fn side_dishes_text(&self) -> String {
        self.side_dishes.join(SIDE_DISH_SEPARATOR)
    }
}

impl From<MealDraft> for NewMeal {
    fn from(d: MealDraft) -> Self {
        Self {
            date: d.date,
            meal_type: d.meal_type,
            location: d.location,
            food_name: d.food_name,
            side_dishes: d.side_dishes,
            cost: d.cost,
            review: d.review,
            image_uri: d.image_uri,
        }
    }
}

/// Splits on the display separator only; extra whitespace stays as typed.
pub fn split_side_dishes(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(SIDE_DISH_SEPARATOR).map(str::to_string).collect()
}
