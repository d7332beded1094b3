pub mod convert;
pub mod patterns;
pub mod validate;

use tracing::debug;

use crate::portion::PortionTable;
use patterns::{PatternKind, CALORIE_PATTERNS};

/// Calories normalised to a food's standard portion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalorieReading {
    pub calories: i64,
    /// Standard portion the calories refer to, e.g. "250ml".
    pub portion: String,
    /// Raw value and its assumed unit context, kept for auditing.
    pub original_data: String,
    pub kind: PatternKind,
}

/// Run the pattern battery over a page body.
///
/// The first pattern with any match decides the outcome: its leftmost match is
/// validated and converted, and if that fails the page yields nothing. Later
/// patterns are never consulted.
pub fn extract_calories(content: &str, food_name: &str, portions: &PortionTable) -> Option<CalorieReading> {
    let (pattern, caps) = CALORIE_PATTERNS
        .iter()
        .find_map(|p| p.regex.captures(content).map(|caps| (p, caps)))?;
    let kind = pattern.kind;
    debug!(food = food_name, pattern = %kind, matched = &caps[0], "pattern matched");

    let standard = portions.resolve(food_name);
    let reading = if kind.is_two_number() {
        let portion = caps[1].parse::<i64>().ok()?;
        let calories = caps[2].parse::<i64>().ok()?;
        if !validate::plausible_pair(kind, portion, calories, food_name) {
            debug!(food = food_name, portion, calories, "implausible reading, page rejected");
            return None;
        }
        convert::convert_pair(kind, portion, calories, standard)?
    } else {
        let calories = caps[1].parse::<i64>().ok()?;
        if !validate::plausible_single(kind, calories, food_name) {
            debug!(food = food_name, calories, "implausible reading, page rejected");
            return None;
        }
        convert::convert_single(kind, calories, standard)
    };
    Some(reading)
}

// ── Tests ──
