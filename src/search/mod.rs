pub mod disambiguation;
pub mod relevance;
pub mod strategy;
