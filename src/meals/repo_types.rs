use serde::{
    de::{
        value::{self, StrDeserializer},
        IntoDeserializer,
    },
    Deserialize, Serialize,
};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Venues offered by the input form. Any other free text is accepted too.
pub const KNOWN_VENUES: [&str; 5] = [
    "상록원 2층",
    "상록원 3층",
    "기숙사 식당",
    "혜화관 카페",
    "그루터기",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    #[serde(alias = "조식")]
    Breakfast,
    #[serde(alias = "중식")]
    Lunch,
    #[serde(alias = "석식")]
    Dinner,
    #[serde(alias = "간식/음료")]
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    /// Parses a stored label with the same rules as the JSON form,
    /// Korean labels included.
    pub fn parse(s: &str) -> Option<Self> {
        let de: StrDeserializer<'_, value::Error> = s.into_deserializer();
        Self::deserialize(de).ok()
    }
}

/// One eating event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealRecord {
    pub id: Uuid,
    pub date: String,
    pub meal_type: Option<MealType>,
    pub location: String,
    pub food_name: String,
    pub side_dishes: Vec<String>,
    pub cost: i32,
    pub review: String,
    pub image_uri: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Everything a caller supplies when saving; id and timestamp are assigned on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMeal {
    pub date: String,
    pub meal_type: Option<MealType>,
    pub location: String,
    pub food_name: String,
    pub side_dishes: Vec<String>,
    pub cost: i32,
    pub review: String,
    pub image_uri: Option<String>,
}

impl NewMeal {
    pub fn into_record(self, id: Uuid, created_at: OffsetDateTime) -> MealRecord {
        MealRecord {
            id,
            date: self.date,
            meal_type: self.meal_type,
            location: self.location,
            food_name: self.food_name,
            side_dishes: self.side_dishes,
            cost: self.cost,
            review: self.review,
            image_uri: self.image_uri,
            created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub date: String,
    pub meal_type: Option<String>,
    pub location: String,
    pub food_name: String,
    pub side_dishes: Vec<String>,
    pub cost: i32,
    pub review: String,
    pub image_uri: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<MealRow> for MealRecord {
    fn from(r: MealRow) -> Self {
        Self {
            id: r.id,
            date: r.date,
            // unknown labels in the table read back as "not selected"
            meal_type: r.meal_type.as_deref().and_then(MealType::parse),
            location: r.location,
            food_name: r.food_name,
            side_dishes: r.side_dishes,
            cost: r.cost,
            review: r.review,
            image_uri: r.image_uri,
            created_at: r.created_at,
        }
    }
}
