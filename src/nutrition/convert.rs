use super::patterns::PatternKind;
use super::CalorieReading;
use crate::portion::StandardPortion;

/// Below this a generic mention is taken as a per-serving total, above it as per-100.
const GENERIC_PER_100_THRESHOLD: i64 = 200;

/// Rescale a two-number reading (`calories` quoted for `portion` units).
pub fn convert_pair(
    kind: PatternKind,
    portion: i64,
    calories: i64,
    standard: StandardPortion,
) -> Option<CalorieReading> {
    let amount = f64::from(standard.amount);
    let (scaled, original_data) = match kind {
        PatternKind::SpecificPortion if portion > 0 => (
            calories as f64 / portion as f64 * amount,
            format!("{}卡/{}{}", calories, portion, standard.unit.base()),
        ),
        PatternKind::Per100Energy => (per_100(calories, amount), format!("{}卡/100g", calories)),
        _ => return None,
    };
    Some(reading(kind, scaled, standard, original_data))
}

/// Rescale a single-number reading according to what `kind` implies about its unit.
pub fn convert_single(kind: PatternKind, calories: i64, standard: StandardPortion) -> CalorieReading {
    let amount = f64::from(standard.amount);
    let base = standard.unit.base();
    let (scaled, original_data) = match kind {
        PatternKind::Per100 => (per_100(calories, amount), format!("{}卡/100{}", calories, base)),
        PatternKind::CalorieSection => (per_100(calories, amount), format!("{}卡(热量章节)", calories)),
        PatternKind::CalorieLabel => (per_100(calories, amount), format!("{}卡(热量字段)", calories)),
        PatternKind::EnergyLabel => (per_100(calories, amount), format!("{}卡(能量字段)", calories)),
        PatternKind::NutritionTable => (per_100(calories, amount), format!("{}卡(营养表格)", calories)),
        PatternKind::GenericCalorie | PatternKind::GenericEnergy => {
            if calories > GENERIC_PER_100_THRESHOLD {
                (per_100(calories, amount), format!("{}卡(推测100{})", calories, base))
            } else {
                (calories as f64, format!("{}卡(总量)", calories))
            }
        }
        PatternKind::Kcal => (per_100(calories, amount), format!("{}kcal/100g", calories)),
        // value is already per gram, so scale by the amount directly
        PatternKind::PerGram => (calories as f64 * amount, format!("{}卡/克", calories)),
        PatternKind::SpecificPortion | PatternKind::Per100Energy => {
            (per_100(calories, amount), format!("{}卡/100{}", calories, base))
        }
    };
    reading(kind, scaled, standard, original_data)
}

fn per_100(calories: i64, amount: f64) -> f64 {
    calories as f64 * amount / 100.0
}

fn reading(
    kind: PatternKind,
    scaled: f64,
    standard: StandardPortion,
    original_data: String,
) -> CalorieReading {
    CalorieReading {
        calories: scaled.round() as i64,
        portion: standard.to_string(),
        original_data,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_100_energy_scales_to_standard_portion() {
        let r = convert_pair(PatternKind::Per100Energy, 100, 540, StandardPortion::g(50)).unwrap();
        assert_eq!(r.calories, 270);
        assert_eq!(r.portion, "50g");
        assert_eq!(r.original_data, "540卡/100g");

        let r = convert_pair(PatternKind::Per100Energy, 100, 540, StandardPortion::ml(330)).unwrap();
        assert_eq!(r.calories, 1782);
        assert_eq!(r.portion, "330ml");
    }

    #[test]
    fn specific_portion_goes_through_per_unit() {
        let r = convert_pair(PatternKind::SpecificPortion, 500, 300, StandardPortion::ml(250)).unwrap();
        assert_eq!(r.calories, 150);
        assert_eq!(r.original_data, "300卡/500ml");
    }

    #[test]
    fn zero_portion_is_refused() {
        assert!(convert_pair(PatternKind::SpecificPortion, 0, 300, StandardPortion::g(100)).is_none());
    }

    #[test]
    fn generic_threshold() {
        let total = convert_single(PatternKind::GenericCalorie, 150, StandardPortion::ml(330));
        assert_eq!(total.calories, 150);
        assert_eq!(total.original_data, "150卡(总量)");

        let scaled = convert_single(PatternKind::GenericEnergy, 400, StandardPortion::g(50));
        assert_eq!(scaled.calories, 200);
        assert_eq!(scaled.original_data, "400卡(推测100g)");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 45 * 330 / 100 = 148.5
        let r = convert_single(PatternKind::Per100, 45, StandardPortion::ml(330));
        assert_eq!(r.calories, 149);
        assert_eq!(r.original_data, "45卡/100ml");
    }

    #[test]
    fn per_gram_multiplies() {
        let r = convert_single(PatternKind::PerGram, 4, StandardPortion::g(50));
        assert_eq!(r.calories, 200);
    }
}
