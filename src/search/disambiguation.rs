use crate::keywords::{contains_any, FOOD_SENSE};

/// Pick the food sense among disambiguation options.
///
/// The first option naming a food-domain term wins; failing that, the first
/// option containing the food name; failing that, the first option.
pub fn best_option<'a>(options: &'a [String], food_name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|o| contains_any(o, FOOD_SENSE))
        .or_else(|| options.iter().find(|o| o.contains(food_name)))
        .or_else(|| options.first())
        .map(String::as_str)
}
