use std::collections::BTreeMap;

use serde::Serialize;

use super::dates::{parse_date, YearMonth};
use super::repo_types::MealRecord;
use crate::calories::CalorieTable;

#[derive(Debug, Serialize)]
pub struct MealWithCalories {
    #[serde(flatten)]
    pub meal: MealRecord,
    pub calories_kcal: u32,
}

#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub meals: Vec<MealWithCalories>,
    pub total_calories_kcal: u64,
}

/// Estimates each meal and totals the day. Recomputed from scratch on every call.
pub fn summarize_day(date: &str, meals: Vec<MealRecord>, table: &CalorieTable) -> DaySummary {
    let mut total = 0u64;
    let meals = meals
        .into_iter()
        .map(|meal| {
            let calories_kcal = table.lookup(&meal.food_name);
            total += u64::from(calories_kcal);
            MealWithCalories {
                meal,
                calories_kcal,
            }
        })
        .collect();

    DaySummary {
        date: date.to_string(),
        meals,
        total_calories_kcal: total,
    }
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DayTotals {
    pub date: String,
    pub meal_count: usize,
    pub calories_kcal: u64,
    pub cost: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub meal_count: usize,
    pub total_calories_kcal: u64,
    pub total_cost: i64,
    /// Keyed by meal type; meals without a type are counted under `unselected`.
    pub meals_by_type: BTreeMap<String, usize>,
    pub days: Vec<DayTotals>,
}

pub fn analyze_month(month: YearMonth, meals: &[MealRecord], table: &CalorieTable) -> MonthSummary {
    let mut by_day: BTreeMap<(u8, String), DayTotals> = BTreeMap::new();
    let mut meals_by_type = BTreeMap::new();
    let mut summary = MonthSummary {
        month: month.to_string(),
        meal_count: 0,
        total_calories_kcal: 0,
        total_cost: 0,
        meals_by_type: BTreeMap::new(),
        days: Vec::new(),
    };

    for meal in meals {
        let Some((_, _, day)) = parse_date(&meal.date).filter(|_| month.contains(&meal.date))
        else {
            continue;
        };
        let kcal = u64::from(table.lookup(&meal.food_name));
        let cost = i64::from(meal.cost);

        summary.meal_count += 1;
        summary.total_calories_kcal += kcal;
        summary.total_cost += cost;

        let kind = meal.meal_type.map_or("unselected", |t| t.as_str());
        *meals_by_type.entry(kind.to_string()).or_insert(0) += 1;

        let totals = by_day
            .entry((day, meal.date.clone()))
            .or_insert_with(|| DayTotals {
                date: meal.date.clone(),
                ..Default::default()
            });
        totals.meal_count += 1;
        totals.calories_kcal += kcal;
        totals.cost += cost;
    }

    summary.meals_by_type = meals_by_type;
    summary.days = by_day.into_values().collect();
    summary
}
