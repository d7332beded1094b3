use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "calorie_scraper";

/// Runtime settings: built-in defaults, then an optional TOML file, then `CALORIE_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub variant: String,
    pub user_agent: String,
    /// Search results examined per query.
    pub max_results: usize,
    /// Foods looked up at once.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    /// Wall-clock budget for one food, all queries included.
    pub food_budget_secs: u64,
    pub cache_max_age_days: i64,
    pub db_path: PathBuf,
    pub crawled_path: PathBuf,
    pub catalog_path: PathBuf,
    pub bind: String,
    #[serde(default)]
    pub search_overrides: HashMap<String, Vec<String>>,
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .set_default("api_url", "https://zh.wikipedia.org/w/api.php")?
            .set_default("variant", "zh-cn")?
            .set_default("user_agent", "CalorieChecker/1.0 (Educational Purpose)")?
            .set_default("max_results", 5_i64)?
            .set_default("concurrency", 4_i64)?
            .set_default("request_timeout_secs", 15_i64)?
            .set_default("food_budget_secs", 120_i64)?
            .set_default("cache_max_age_days", 30_i64)?
            .set_default("db_path", "data/pages.sqlite")?
            .set_default("crawled_path", "crawled_foods.json")?
            .set_default("catalog_path", "data.json")?
            .set_default("bind", "127.0.0.1:8000")?
            .add_source(file_source)
            .add_source(Environment::with_prefix("CALORIE"))
            .build()?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn food_budget(&self) -> Duration {
        Duration::from_secs(self.food_budget_secs)
    }

    pub fn cache_max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.cache_max_age_days)
    }
}
