use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::nutrition::patterns::PatternKind;
use crate::nutrition::{extract_calories, CalorieReading};
use crate::portion::PortionTable;
use crate::search::strategy::SearchStrategies;
use crate::search::{disambiguation, relevance};
use crate::wiki::{CandidatePage, Corpus, PageOutcome};

const SUMMARY_CHARS: usize = 200;

/// One food's normalised calories, as written to the crawled list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledFood {
    pub name: String,
    pub calories: i64,
    pub portion: String,
    pub original_data: String,
    pub source: String,
    pub summary: String,
}

/// A resolved lookup and where it came from.
#[derive(Debug, Clone)]
pub struct Lookup {
    pub food: CrawledFood,
    pub page_title: String,
    pub pattern: PatternKind,
}

pub struct FoodScraper<C> {
    corpus: C,
    strategies: SearchStrategies,
    portions: PortionTable,
    max_results: usize,
}

impl<C: Corpus> FoodScraper<C> {
    pub fn new(corpus: C, strategies: SearchStrategies, portions: PortionTable, max_results: usize) -> Self {
        FoodScraper { corpus, strategies, portions, max_results }
    }

    /// Walk search variants in order and their result pages in rank order;
    /// the first page that passes relevance and yields a reading wins.
    /// `None` once every variant is exhausted.
    pub async fn lookup(&self, food_name: &str) -> Option<Lookup> {
        // a blank name is a substring of every title and table key
        if food_name.trim().is_empty() {
            warn!("Skipping blank food name");
            return None;
        }
        for query in self.strategies.variants(food_name) {
            debug!(food = food_name, query = %query, "searching");
            let titles = match self.corpus.search(&query, self.max_results).await {
                Ok(titles) => titles,
                Err(e) => {
                    warn!("Search failed for '{}': {}", query, e);
                    continue;
                }
            };

            for title in titles.iter().take(self.max_results) {
                if let Some(found) = self.try_candidate(food_name, title).await {
                    return Some(found);
                }
            }
        }
        debug!(food = food_name, "all search variants exhausted");
        None
    }

    async fn try_candidate(&self, food_name: &str, title: &str) -> Option<Lookup> {
        let outcome = match self.corpus.fetch_page(title).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Fetch failed for '{}': {}", title, e);
                return None;
            }
        };

        match outcome {
            PageOutcome::Found(page) => {
                if let Err(reason) = relevance::check(&page.title, &page.full_text, food_name) {
                    debug!(food = food_name, page = %page.title, ?reason, "page rejected");
                    return None;
                }
                self.extract(food_name, &page)
            }
            PageOutcome::Ambiguous(options) => {
                let best = disambiguation::best_option(&options, food_name)?;
                debug!(food = food_name, ambiguous = title, chosen = best, "disambiguated");
                // one attempt only; a second ambiguity ends this candidate
                match self.corpus.fetch_page(best).await {
                    Ok(PageOutcome::Found(page)) => self.extract(food_name, &page),
                    Ok(_) => None,
                    Err(e) => {
                        warn!("Fetch failed for '{}': {}", best, e);
                        None
                    }
                }
            }
            PageOutcome::NotFound => None,
        }
    }

    fn extract(&self, food_name: &str, page: &CandidatePage) -> Option<Lookup> {
        let reading = extract_calories(&page.full_text, food_name, &self.portions)?;
        Some(normalized(food_name, page, reading))
    }
}

fn normalized(food_name: &str, page: &CandidatePage, reading: CalorieReading) -> Lookup {
    Lookup {
        food: CrawledFood {
            name: food_name.to_string(),
            calories: reading.calories,
            portion: reading.portion,
            original_data: reading.original_data,
            source: page.url.clone(),
            summary: truncate(&page.excerpt, SUMMARY_CHARS),
        },
        page_title: page.title.clone(),
        pattern: reading.kind,
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

// ── Batch ──

pub struct BatchReport {
    /// Found foods, in input order.
    pub found: Vec<CrawledFood>,
    pub missing: Vec<String>,
}

/// Look up every food with at most `concurrency` in flight. Each food keeps
/// its own sequential search order; a food that overruns `budget` counts as
/// missing. Outcomes are logged to `store` as they arrive.
pub async fn scrape_batch<C: Corpus + 'static>(
    scraper: Arc<FoodScraper<C>>,
    foods: Vec<String>,
    concurrency: usize,
    budget: Duration,
    store: Option<&Store>,
) -> Result<BatchReport> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let total = foods.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<(usize, String, Option<Lookup>)>(concurrency.max(1) * 2);

    for (index, food) in foods.into_iter().enumerate() {
        let scraper = Arc::clone(&scraper);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return;
            };
            let lookup = match tokio::time::timeout(budget, scraper.lookup(&food)).await {
                Ok(lookup) => lookup,
                Err(_) => {
                    warn!("Lookup for '{}' exceeded {:.0}s budget", food, budget.as_secs_f64());
                    None
                }
            };
            let _ = tx.send((index, food, lookup)).await;
        });
    }

    // rx closes once every task has dropped its sender
    drop(tx);

    let mut outcomes: Vec<(usize, String, Option<Lookup>)> = Vec::with_capacity(total);
    while let Some((index, food, lookup)) = rx.recv().await {
        match &lookup {
            Some(l) => info!("{}: {}卡/{} ({})", food, l.food.calories, l.food.portion, l.pattern),
            None => info!("{}: no data found", food),
        }
        if let Some(store) = store {
            if let Err(e) = store.record_lookup(&food, lookup.as_ref()) {
                warn!("Lookup log write failed for '{}': {:#}", food, e);
            }
        }
        pb.set_message(food.clone());
        pb.inc(1);
        outcomes.push((index, food, lookup));
    }
    pb.finish_and_clear();

    outcomes.sort_by_key(|(index, _, _)| *index);
    let mut report = BatchReport { found: Vec::new(), missing: Vec::new() };
    for (_, food, lookup) in outcomes {
        match lookup {
            Some(l) => report.found.push(l.food),
            None => report.missing.push(food),
        }
    }
    info!("Looked up {} foods ({} found, {} missing)", total, report.found.len(), report.missing.len());
    Ok(report)
}

// ── Tests ──
