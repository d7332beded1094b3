//! Plausibility bounds for raw calorie readings.

use std::ops::RangeInclusive;

use super::patterns::PatternKind;
use crate::keywords::{contains_any, FoodClass, COLA_LIKE, MILK_LIKE};

const HARD_CEILING: i64 = 10_000;

/// Two-number track: a portion amount and the calories quoted for it.
pub fn plausible_pair(kind: PatternKind, portion: i64, calories: i64, food_name: &str) -> bool {
    match kind {
        PatternKind::SpecificPortion if portion >= 200 => {
            large_portion_bounds(food_name).contains(&calories)
        }
        PatternKind::SpecificPortion if portion >= 50 => (20..=600).contains(&calories),
        PatternKind::Per100Energy => portion == 100 && (20..=800).contains(&calories),
        _ => false,
    }
}

fn large_portion_bounds(food_name: &str) -> RangeInclusive<i64> {
    if contains_any(food_name, MILK_LIKE) {
        200..=400
    } else if contains_any(food_name, COLA_LIKE) {
        100..=250
    } else {
        50..=800
    }
}

/// Single-number track: one calorie value whose unit is implied by `kind`.
pub fn plausible_single(kind: PatternKind, calories: i64, food_name: &str) -> bool {
    if kind == PatternKind::PerGram && calories < 2 {
        return false;
    }
    if calories > HARD_CEILING {
        return false;
    }
    single_bounds(kind, food_name).contains(&calories)
}

fn single_bounds(kind: PatternKind, food_name: &str) -> RangeInclusive<i64> {
    match kind {
        PatternKind::Per100 => match FoodClass::infer(food_name) {
            Some(FoodClass::Beverage) => 10..=200,
            Some(FoodClass::Meat) => 80..=600,
            Some(FoodClass::Snack) => 300..=800,
            Some(FoodClass::Fruit) => 20..=150,
            Some(FoodClass::Staple) | None => 5..=5000,
        },
        PatternKind::CalorieSection | PatternKind::CalorieLabel | PatternKind::EnergyLabel => {
            10..=2000
        }
        PatternKind::NutritionTable => 10..=1000,
        PatternKind::GenericCalorie | PatternKind::GenericEnergy => 5..=3000,
        PatternKind::Kcal => 10..=2000,
        // no food supplies more than 9 kcal per gram
        PatternKind::PerGram => 2..=9,
        PatternKind::SpecificPortion | PatternKind::Per100Energy => 5..=5000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milk_large_portion() {
        assert!(plausible_pair(PatternKind::SpecificPortion, 500, 300, "牛奶"));
        assert!(!plausible_pair(PatternKind::SpecificPortion, 500, 450, "牛奶"));
        assert!(!plausible_pair(PatternKind::SpecificPortion, 500, 150, "牛奶"));
    }

    #[test]
    fn cola_and_general_large_portion() {
        assert!(plausible_pair(PatternKind::SpecificPortion, 330, 140, "可乐"));
        assert!(!plausible_pair(PatternKind::SpecificPortion, 330, 300, "可乐"));
        assert!(plausible_pair(PatternKind::SpecificPortion, 300, 700, "汉堡"));
    }

    #[test]
    fn medium_and_small_portions() {
        assert!(plausible_pair(PatternKind::SpecificPortion, 100, 52, "苹果"));
        assert!(!plausible_pair(PatternKind::SpecificPortion, 100, 700, "苹果"));
        assert!(!plausible_pair(PatternKind::SpecificPortion, 30, 100, "苹果"));
    }

    #[test]
    fn per_100_energy_requires_exactly_100() {
        assert!(plausible_pair(PatternKind::Per100Energy, 100, 540, "巧克力"));
        assert!(!plausible_pair(PatternKind::Per100Energy, 50, 270, "巧克力"));
        assert!(!plausible_pair(PatternKind::Per100Energy, 100, 900, "巧克力"));
    }

    #[test]
    fn per_gram_floor_and_hard_ceiling() {
        for food in ["阿斯巴甜", "可乐", "牛排"] {
            assert!(!plausible_single(PatternKind::PerGram, 1, food));
            assert!(!plausible_single(PatternKind::GenericCalorie, 10_001, food));
            assert!(!plausible_single(PatternKind::Per100, 20_000, food));
        }
        assert!(plausible_single(PatternKind::PerGram, 4, "阿斯巴甜"));
    }

    #[test]
    fn per_100_bounds_follow_food_class() {
        assert!(plausible_single(PatternKind::Per100, 42, "可乐"));
        assert!(!plausible_single(PatternKind::Per100, 250, "可乐"));
        assert!(!plausible_single(PatternKind::Per100, 60, "鸡腿"));
        assert!(!plausible_single(PatternKind::Per100, 200, "薯片"));
        assert!(plausible_single(PatternKind::Per100, 52, "苹果"));
        assert!(plausible_single(PatternKind::Per100, 4000, "豆腐"));
    }

    #[test]
    fn labelled_and_generic_bounds() {
        assert!(!plausible_single(PatternKind::CalorieLabel, 9, "豆腐"));
        assert!(plausible_single(PatternKind::EnergyLabel, 2000, "豆腐"));
        assert!(!plausible_single(PatternKind::NutritionTable, 1001, "豆腐"));
        assert!(plausible_single(PatternKind::GenericEnergy, 5, "豆腐"));
        assert!(!plausible_single(PatternKind::Kcal, 2500, "豆腐"));
    }
}
