//! Serving-side food catalog: records built from the crawled list, loaded
//! once at startup and queried read-only.

pub mod category;

use std::collections::BTreeMap;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::scraper::{truncate, CrawledFood};
use category::{calorie_level, categorize, Category};

const DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub calories: i64,
    pub calorie_level: u8,
    pub portion: String,
    pub emoji: String,
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub summary: String,
}

impl FoodRecord {
    fn from_crawled(id: usize, food: &CrawledFood) -> Self {
        let category = categorize(&food.name);
        FoodRecord {
            id: id.to_string(),
            name: food.name.clone(),
            category,
            calories: food.calories,
            calorie_level: calorie_level(food.calories),
            portion: food.portion.clone(),
            emoji: category.emoji().to_string(),
            description: truncate(&food.summary, DESCRIPTION_CHARS),
            source: food.source.clone(),
            summary: food.summary.clone(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("搜索关键词不能为空")]
    EmptyQuery,
    #[error("类别 '{0}' 不存在")]
    UnknownCategory(String),
    #[error("未找到ID为 '{0}' 的食物")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub id: Category,
    pub name: &'static str,
    pub emoji: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryListing {
    pub categories: Vec<CategorySummary>,
    pub total: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CalorieStats {
    pub average: f64,
    pub max: i64,
    pub min: i64,
}

#[derive(Debug, Serialize)]
pub struct CatalogStats {
    pub total_foods: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_stats: Option<CalorieStats>,
    pub calorie_level_distribution: BTreeMap<u8, usize>,
    pub category_distribution: BTreeMap<Category, usize>,
}

/// Immutable record list; ids are 1-based positions in the crawled list.
#[derive(Debug, Default)]
pub struct Catalog {
    foods: Vec<FoodRecord>,
}

impl Catalog {
    pub fn new(foods: Vec<FoodRecord>) -> Self {
        Catalog { foods }
    }

    pub fn build(crawled: &[CrawledFood]) -> Self {
        let foods = crawled
            .iter()
            .enumerate()
            .map(|(i, food)| FoodRecord::from_crawled(i + 1, food))
            .collect();
        Catalog { foods }
    }

    /// Missing or unreadable data yields an empty catalog.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Catalog {:?} not readable ({}), serving an empty catalog", path, e);
                return Catalog::default();
            }
        };
        match serde_json::from_str::<Vec<FoodRecord>>(&text) {
            Ok(foods) => {
                info!("Loaded {} foods from {:?}", foods.len(), path);
                Catalog::new(foods)
            }
            Err(e) => {
                warn!("Catalog {:?} is malformed ({}), serving an empty catalog", path, e);
                Catalog::default()
            }
        }
    }

    pub fn foods(&self) -> &[FoodRecord] {
        &self.foods
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn list(&self, offset: usize, limit: Option<usize>) -> Vec<&FoodRecord> {
        page(self.foods.iter(), offset, limit)
    }

    /// Case-insensitive name substring search. An unrecognised category
    /// filter matches nothing.
    pub fn search(
        &self,
        query: &str,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<&FoodRecord>, CatalogError> {
        if query.trim().is_empty() {
            return Err(CatalogError::EmptyQuery);
        }
        let category = match category.map(str::parse::<Category>) {
            Some(Ok(c)) => Some(c),
            Some(Err(_)) => return Ok(Vec::new()),
            None => None,
        };
        let needle = query.to_lowercase();
        let hits = self.foods.iter().filter(|f| {
            f.name.to_lowercase().contains(&needle) && category.map_or(true, |c| f.category == c)
        });
        Ok(page(hits, 0, limit))
    }

    pub fn by_category(
        &self,
        category: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<&FoodRecord>, CatalogError> {
        let category: Category = category
            .parse()
            .map_err(|_| CatalogError::UnknownCategory(category.to_string()))?;
        Ok(page(self.foods.iter().filter(|f| f.category == category), offset, limit))
    }

    pub fn get(&self, id: &str) -> Result<&FoodRecord, CatalogError> {
        self.foods
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn categories(&self) -> CategoryListing {
        let counts = self.foods.iter().map(|f| f.category).counts();
        let categories = Category::ALL
            .into_iter()
            .map(|c| CategorySummary {
                id: c,
                name: c.display_name(),
                emoji: c.emoji(),
                count: counts.get(&c).copied().unwrap_or(0),
            })
            .collect();
        CategoryListing { categories, total: self.foods.len() }
    }

    pub fn stats(&self) -> CatalogStats {
        let calories_stats = self
            .foods
            .iter()
            .map(|f| f.calories)
            .minmax()
            .into_option()
            .map(|(min, max)| {
                let sum: i64 = self.foods.iter().map(|f| f.calories).sum();
                let average = sum as f64 / self.foods.len() as f64;
                CalorieStats { average: (average * 100.0).round() / 100.0, max, min }
            });
        CatalogStats {
            total_foods: self.foods.len(),
            calories_stats,
            calorie_level_distribution: self.foods.iter().map(|f| f.calorie_level).counts().into_iter().collect(),
            category_distribution: self.foods.iter().map(|f| f.category).counts().into_iter().collect(),
        }
    }
}

fn page<'a>(
    records: impl Iterator<Item = &'a FoodRecord>,
    offset: usize,
    limit: Option<usize>,
) -> Vec<&'a FoodRecord> {
    records.skip(offset).take(limit.unwrap_or(usize::MAX)).collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn crawled(name: &str, calories: i64, portion: &str) -> CrawledFood {
        CrawledFood {
            name: name.into(),
            calories,
            portion: portion.into(),
            original_data: format!("{}卡/{}", calories, portion),
            source: format!("https://zh.wikipedia.org/wiki/{}", name),
            summary: format!("{}是一种常见食物。", name),
        }
    }

    pub(crate) fn sample() -> Catalog {
        Catalog::build(&[
            crawled("牛奶", 150, "250ml"),
            crawled("可乐", 139, "330ml"),
            crawled("巧克力", 270, "50g"),
            crawled("牛肉面", 520, "300g"),
            crawled("酸奶", 180, "200ml"),
        ])
    }

    #[test]
    fn build_assigns_positional_ids_and_levels() {
        let catalog = sample();
        let ids: Vec<&str> = catalog.foods().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

        let milk = catalog.get("1").unwrap();
        assert_eq!(milk.category, Category::Dairy);
        assert_eq!(milk.emoji, "🥛");
        assert_eq!(milk.calorie_level, 2);
        assert_eq!(milk.portion, "250ml");
        assert_eq!(catalog.get("4").unwrap().calorie_level, 5);
    }

    #[test]
    fn description_truncated_to_hundred_chars() {
        let mut food = crawled("苹果", 52, "100g");
        food.summary = "苹".repeat(150);
        let record = FoodRecord::from_crawled(1, &food);
        assert_eq!(record.description.chars().count(), 103);
        assert!(record.description.ends_with("..."));
        assert_eq!(record.summary.chars().count(), 150);
    }

    #[test]
    fn search_filters_and_rejects_blank() {
        let catalog = sample();
        assert_eq!(catalog.search("  ", None, Some(20)), Err(CatalogError::EmptyQuery));

        let names = |hits: Vec<&FoodRecord>| hits.into_iter().map(|f| f.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(catalog.search("奶", None, Some(20)).unwrap()), vec!["牛奶", "酸奶"]);
        assert_eq!(names(catalog.search("奶", Some("dairy"), Some(1)).unwrap()), vec!["牛奶"]);
        assert_eq!(names(catalog.search("牛", Some("meat"), None).unwrap()), vec!["牛肉面"]);
        assert!(catalog.search("奶", Some("pizza"), None).unwrap().is_empty());
    }

    #[test]
    fn category_and_id_lookups() {
        let catalog = sample();
        assert_eq!(catalog.by_category("dairy", 1, None).unwrap()[0].name, "酸奶");
        assert_eq!(
            catalog.by_category("pizza", 0, None),
            Err(CatalogError::UnknownCategory("pizza".into()))
        );
        assert_eq!(catalog.get("99"), Err(CatalogError::NotFound("99".into())));
        assert_eq!(catalog.list(3, None).len(), 2);
        assert!(catalog.list(10, Some(5)).is_empty());
    }

    #[test]
    fn categories_cover_every_category() {
        let listing = sample().categories();
        assert_eq!(listing.categories.len(), Category::ALL.len());
        assert_eq!(listing.total, 5);
        let dairy = listing.categories.iter().find(|c| c.id == Category::Dairy).unwrap();
        assert_eq!((dairy.name, dairy.count), ("乳制品", 2));
        let fruits = listing.categories.iter().find(|c| c.id == Category::Fruits).unwrap();
        assert_eq!(fruits.count, 0);
    }

    #[test]
    fn stats_aggregate() {
        let stats = sample().stats();
        assert_eq!(stats.total_foods, 5);
        assert_eq!(
            stats.calories_stats,
            Some(CalorieStats { average: 251.8, max: 520, min: 139 })
        );
        assert_eq!(stats.calorie_level_distribution[&2], 3);
        assert_eq!(stats.category_distribution[&Category::Dairy], 2);

        let empty = Catalog::default().stats();
        assert_eq!(empty.calories_stats, None);
        let json = serde_json::to_value(&empty).unwrap();
        assert!(json.get("calories_stats").is_none());
    }

    #[test]
    fn load_degrades_to_empty() {
        let dir = std::env::temp_dir().join(format!("calorie_catalog_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(Catalog::load(&dir.join("absent.json")).is_empty());

        let bad = dir.join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(Catalog::load(&bad).is_empty());

        let good = dir.join("data.json");
        std::fs::write(&good, serde_json::to_string(sample().foods()).unwrap()).unwrap();
        assert_eq!(Catalog::load(&good).len(), 5);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
