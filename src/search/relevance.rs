//! Admission gates for candidate pages.

use crate::keywords::{contains_any, count_present, NUTRITION_TOPIC, OFF_TOPIC_TITLE};

const MIN_TOPIC_WORDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OffTopicTitle,
    UnrelatedTitle,
    NotAboutFood,
}

/// Both gates must pass: the title gate, then the body topicality gate.
pub fn check(title: &str, body: &str, food_name: &str) -> Result<(), Rejection> {
    check_title(title, food_name)?;
    if is_food_topic(body, food_name) {
        Ok(())
    } else {
        Err(Rejection::NotAboutFood)
    }
}

fn check_title(title: &str, food_name: &str) -> Result<(), Rejection> {
    if contains_any(title, OFF_TOPIC_TITLE) {
        return Err(Rejection::OffTopicTitle);
    }
    if !title.contains(food_name) && !food_name.chars().any(|c| title.contains(c)) {
        return Err(Rejection::UnrelatedTitle);
    }
    Ok(())
}

fn is_food_topic(body: &str, food_name: &str) -> bool {
    let body = body.to_lowercase();
    count_present(&body, NUTRITION_TOPIC) >= MIN_TOPIC_WORDS || body.contains(&food_name.to_lowercase())
}
