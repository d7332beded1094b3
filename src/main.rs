mod catalog;
mod db;
mod keywords;
mod nutrition;
mod portion;
mod scraper;
mod search;
mod server;
mod settings;
mod wiki;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::db::{CachedCorpus, Store};
use crate::portion::PortionTable;
use crate::scraper::{truncate, CrawledFood, FoodScraper};
use crate::search::strategy::SearchStrategies;
use crate::settings::Settings;
use crate::wiki::WikiClient;

#[derive(Parser)]
#[command(name = "calorie_scraper", about = "Food calorie scraper for Chinese Wikipedia")]
struct Cli {
    /// Settings file (default: ./calorie_scraper.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up calories for a batch of foods and write the crawled list
    Scrape {
        /// Foods to look up (default: every food in the standard portion table)
        foods: Vec<String>,
        /// Newline-separated file of food names
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output JSON (default: crawled_path setting)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Look up a single food and print the result
    Lookup { food: String },
    /// Convert the crawled list into the serving catalog
    Build {
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the catalog over HTTP
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Re-extract recorded lookups from cached pages and report drift
    Audit,
    /// Show cache and lookup statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Scrape { foods, file, output } => {
            let foods = match (foods.is_empty(), file) {
                (_, Some(path)) => {
                    let mut listed = read_food_list(&path)?;
                    listed.extend(foods);
                    listed
                }
                (false, None) => foods,
                (true, None) => PortionTable::default().food_names().map(String::from).collect(),
            };
            if foods.is_empty() {
                println!("No foods to look up.");
                return Ok(());
            }

            let store = Arc::new(Store::open(&settings.db_path)?);
            let scraper = build_scraper(&settings, &store)?;
            println!("Looking up {} foods ({} at a time)...", foods.len(), settings.concurrency);
            let report = scraper::scrape_batch(
                Arc::new(scraper),
                foods,
                settings.concurrency,
                settings.food_budget(),
                Some(&*store),
            )
            .await?;

            let output = output.unwrap_or_else(|| settings.crawled_path.clone());
            write_json(&output, &report.found)?;
            println!("Found {} foods, wrote {:?}.", report.found.len(), output);
            if !report.missing.is_empty() {
                println!("No data for: {}", report.missing.join(", "));
            }
            Ok(())
        }
        Commands::Lookup { food } => {
            let store = Arc::new(Store::open(&settings.db_path)?);
            let scraper = build_scraper(&settings, &store)?;
            let lookup = scraper.lookup(&food).await;
            if let Err(e) = store.record_lookup(&food, lookup.as_ref()) {
                tracing::warn!("Lookup log write failed for '{}': {:#}", food, e);
            }
            match lookup {
                Some(l) => {
                    println!("{}", serde_json::to_string_pretty(&l.food)?);
                    println!("\npage: {} | pattern: {}", l.page_title, l.pattern);
                }
                None => println!("No calorie data found for '{}'.", food),
            }
            Ok(())
        }
        Commands::Build { input, output } => {
            let input = input.unwrap_or_else(|| settings.crawled_path.clone());
            let output = output.unwrap_or_else(|| settings.catalog_path.clone());
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {:?}", input))?;
            let crawled: Vec<CrawledFood> =
                serde_json::from_str(&text).with_context(|| format!("Malformed crawled list {:?}", input))?;
            let catalog = Catalog::build(&crawled);
            write_json(&output, catalog.foods())?;
            println!("Built {} catalog records into {:?}.", catalog.len(), output);
            Ok(())
        }
        Commands::Serve { bind } => {
            let catalog = Catalog::load(&settings.catalog_path);
            let bind = bind.unwrap_or_else(|| settings.bind.clone());
            server::serve(catalog, &bind).await
        }
        Commands::Audit => {
            let store = Store::open(&settings.db_path)?;
            audit(&store, &PortionTable::default())
        }
        Commands::Stats => {
            let store = Store::open(&settings.db_path)?;
            let s = store.stats()?;
            println!("Cached pages:    {}", s.pages);
            println!("Cached searches: {}", s.searches);
            println!("Lookups logged:  {}", s.lookups);
            println!("Foods found:     {}", s.foods_found);
            println!("Foods missing:   {}", s.foods_missing);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn build_scraper(settings: &Settings, store: &Arc<Store>) -> anyhow::Result<FoodScraper<CachedCorpus<WikiClient>>> {
    let corpus = CachedCorpus::new(WikiClient::new(settings)?, Arc::clone(store), settings.cache_max_age());
    Ok(FoodScraper::new(
        corpus,
        SearchStrategies::with_overrides(&settings.search_overrides),
        PortionTable::default(),
        settings.max_results,
    ))
}

fn read_food_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

enum AuditOutcome {
    Same,
    Changed { recorded: Option<i64>, now: i64 },
    Lost { recorded: Option<i64> },
    NoPage,
}

fn audit(store: &Store, portions: &PortionTable) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let rows = store.resolved_lookups()?;
    if rows.is_empty() {
        println!("No recorded lookups. Run 'scrape' first.");
        return Ok(());
    }

    let mut pages = Vec::with_capacity(rows.len());
    for row in rows {
        let text = match &row.page_title {
            Some(title) => store.page_text(title)?,
            None => None,
        };
        pages.push((row, text));
    }

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let outcomes: Vec<_> = pages
        .par_iter()
        .map(|(row, text)| {
            let outcome = match text {
                None => AuditOutcome::NoPage,
                Some(text) => match nutrition::extract_calories(text, &row.food, portions) {
                    Some(r) if Some(r.calories) == row.calories => AuditOutcome::Same,
                    Some(r) => AuditOutcome::Changed { recorded: row.calories, now: r.calories },
                    None => AuditOutcome::Lost { recorded: row.calories },
                },
            };
            pb.inc(1);
            (row, outcome)
        })
        .collect();
    pb.finish_and_clear();

    let show = |v: Option<i64>| v.map(|c| c.to_string()).unwrap_or_else(|| "-".into());
    let mut same = 0;
    let mut uncached = 0;
    println!(
        "{:<16} | {:<24} | {:<16} | {:>8} | {:>8}",
        "Food", "Page", "Pattern", "Recorded", "Now"
    );
    println!("{}", "-".repeat(85));
    for (row, outcome) in &outcomes {
        let (recorded, now) = match outcome {
            AuditOutcome::Same => {
                same += 1;
                continue;
            }
            AuditOutcome::NoPage => {
                uncached += 1;
                continue;
            }
            AuditOutcome::Changed { recorded, now } => (recorded, now.to_string()),
            AuditOutcome::Lost { recorded } => (recorded, "none".to_string()),
        };
        println!(
            "{:<16} | {:<24} | {:<16} | {:>8} | {:>8}",
            truncate(&row.food, 16),
            truncate(row.page_title.as_deref().unwrap_or("-"), 24),
            row.pattern.map(|p| p.as_str()).unwrap_or("-"),
            show(*recorded),
            now
        );
    }
    let drifted = outcomes.len() - same - uncached;
    println!(
        "\n{} foods audited: {} unchanged, {} drifted, {} without cached page.",
        outcomes.len(),
        same,
        drifted,
        uncached
    );
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
