use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::dates::YearMonth;
use super::repo_types::{MealRecord, MealRow, NewMeal};

/// Persistence and queries for meal records.
#[async_trait]
pub trait MealRepository: Send + Sync {
    async fn save_meal(&self, meal: NewMeal) -> anyhow::Result<MealRecord>;
    /// Meals whose date string equals `date`, oldest first.
    async fn load_meals_by_date(&self, date: &str) -> anyhow::Result<Vec<MealRecord>>;
    async fn get_meal(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>>;
    async fn load_meals_by_month(&self, month: YearMonth) -> anyhow::Result<Vec<MealRecord>>;
}

const MEAL_COLUMNS: &str =
    "id, date, meal_type, location, food_name, side_dishes, cost, review, image_uri, created_at";

pub struct PgMealRepository {
    db: PgPool,
}

impl PgMealRepository {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Ok(Self { db })
    }
}

#[async_trait]
impl MealRepository for PgMealRepository {
    async fn save_meal(&self, meal: NewMeal) -> anyhow::Result<MealRecord> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            INSERT INTO meals (id, date, meal_type, location, food_name, side_dishes, cost, review, image_uri)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MEAL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&meal.date)
        .bind(meal.meal_type.map(|t| t.as_str()))
        .bind(&meal.location)
        .bind(&meal.food_name)
        .bind(&meal.side_dishes)
        .bind(meal.cost)
        .bind(&meal.review)
        .bind(&meal.image_uri)
        .fetch_one(&self.db)
        .await
        .context("insert meal")?;
        Ok(row.into())
    }

    async fn load_meals_by_date(&self, date: &str) -> anyhow::Result<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
              FROM meals
             WHERE date = $1
             ORDER BY created_at ASC
            "#
        ))
        .bind(date)
        .fetch_all(&self.db)
        .await
        .context("list meals by date")?;
        Ok(rows.into_iter().map(MealRecord::from).collect())
    }

    async fn get_meal(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>> {
        let row = sqlx::query_as::<_, MealRow>(&format!(
            "SELECT {MEAL_COLUMNS} FROM meals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("get meal")?;
        Ok(row.map(MealRecord::from))
    }

    async fn load_meals_by_month(&self, month: YearMonth) -> anyhow::Result<Vec<MealRecord>> {
        let rows = sqlx::query_as::<_, MealRow>(&format!(
            r#"
            SELECT {MEAL_COLUMNS}
              FROM meals
             WHERE date ~ $1
             ORDER BY created_at ASC
            "#
        ))
        .bind(month.date_pattern())
        .fetch_all(&self.db)
        .await
        .context("list meals by month")?;
        Ok(rows.into_iter().map(MealRecord::from).collect())
    }
}

/// Keeps meals in process memory, in insertion order.
#[derive(Default)]
pub struct InMemoryMealRepository {
    meals: RwLock<Vec<MealRecord>>,
}

#[async_trait]
impl MealRepository for InMemoryMealRepository {
    async fn save_meal(&self, meal: NewMeal) -> anyhow::Result<MealRecord> {
        let record = meal.into_record(Uuid::new_v4(), OffsetDateTime::now_utc());
        self.meals.write().await.push(record.clone());
        Ok(record)
    }

    async fn load_meals_by_date(&self, date: &str) -> anyhow::Result<Vec<MealRecord>> {
        let meals = self.meals.read().await;
        Ok(meals.iter().filter(|m| m.date == date).cloned().collect())
    }

    async fn get_meal(&self, id: Uuid) -> anyhow::Result<Option<MealRecord>> {
        let meals = self.meals.read().await;
        Ok(meals.iter().find(|m| m.id == id).cloned())
    }

    async fn load_meals_by_month(&self, month: YearMonth) -> anyhow::Result<Vec<MealRecord>> {
        let meals = self.meals.read().await;
        Ok(meals
            .iter()
            .filter(|m| month.contains(&m.date))
            .cloned()
            .collect())
    }
}
