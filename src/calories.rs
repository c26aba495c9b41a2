use std::{collections::HashMap, path::Path};

use anyhow::Context;
use lazy_static::lazy_static;
use tracing::info;

lazy_static! {
    static ref DEFAULT_CALORIES: HashMap<String, u32> = [
        ("rice", 300),
        ("kimchi", 50),
        ("bibimbap", 560),
        ("bulgogi", 480),
        ("kimchi stew", 380),
        ("soybean paste stew", 320),
        ("tteokbokki", 480),
        ("ramen", 500),
        ("jjajangmyeon", 790),
        ("jjamppong", 690),
        ("pork cutlet", 760),
        ("curry rice", 650),
        ("gimbap", 420),
        ("fried rice", 620),
        ("cold noodles", 520),
        ("sandwich", 430),
        ("salad", 180),
        ("egg", 80),
        ("americano", 10),
        ("cafe latte", 190),
    ]
    .into_iter()
    .map(|(name, kcal)| (name.to_string(), kcal))
    .collect();
}

/// Read-only mapping from lowercase food name to kcal.
#[derive(Debug, Clone)]
pub struct CalorieTable {
    entries: HashMap<String, u32>,
}

impl Default for CalorieTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_CALORIES.clone(),
        }
    }
}

impl CalorieTable {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, kcal)| (name.as_ref().to_lowercase(), kcal))
                .collect(),
        }
    }

    /// Loads a JSON object of `{"food name": kcal}` pairs.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read calorie table {}", path.display()))?;
        let parsed: HashMap<String, u32> = serde_json::from_str(&raw)
            .with_context(|| format!("parse calorie table {}", path.display()))?;
        info!(path = %path.display(), entries = parsed.len(), "calorie table loaded");
        Ok(Self::from_entries(parsed))
    }

    /// Case-insensitive lookup. Unknown foods count as 0 kcal; the name is
    /// not trimmed or otherwise normalized.
    pub fn lookup(&self, food_name: &str) -> u32 {
        self.entries
            .get(&food_name.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let table = CalorieTable::default();
        assert_eq!(table.lookup("Rice"), table.lookup("rice"));
        assert_eq!(table.lookup("RICE"), 300);
    }

    #[test]
    fn missing_and_untrimmed_names_are_zero() {
        let table = CalorieTable::from_entries([("rice", 300)]);
        assert_eq!(table.lookup("pizza"), 0);
        assert_eq!(table.lookup("rice "), 0);
        assert_eq!(table.lookup(""), 0);
    }

    #[test]
    fn custom_entries_are_lowercased() {
        let table = CalorieTable::from_entries([("Kimchi", 50)]);
        assert_eq!(table.lookup("kimchi"), 50);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn loads_json_file() {
        let path = std::env::temp_dir().join(format!("calories-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"Noodles": 450, "tea": 5}"#).unwrap();
        let table = CalorieTable::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(table.lookup("noodles"), 450);
        assert_eq!(table.lookup("TEA"), 5);
    }

    #[test]
    fn rejects_malformed_json_file() {
        let path = std::env::temp_dir().join(format!("calories-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let err = CalorieTable::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("parse calorie table"));
    }
}
