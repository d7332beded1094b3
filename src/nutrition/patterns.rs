use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Which template produced a raw reading. Selects validation bounds and the
/// conversion formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// "一杯500毫升…热量300大卡": portion amount plus calories.
    SpecificPortion,
    /// "100克…提供540卡路里": per-100 energy statement with explicit amount.
    Per100Energy,
    /// Number under a "== 热量 ==" heading.
    CalorieSection,
    CalorieLabel,
    EnergyLabel,
    NutritionTable,
    Per100,
    PerGram,
    GenericCalorie,
    GenericEnergy,
    Kcal,
}

impl PatternKind {
    pub fn is_two_number(&self) -> bool {
        matches!(self, PatternKind::SpecificPortion | PatternKind::Per100Energy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::SpecificPortion => "specific_portion",
            PatternKind::Per100Energy => "100g_energy",
            PatternKind::CalorieSection => "calorie_section",
            PatternKind::CalorieLabel => "calorie_label",
            PatternKind::EnergyLabel => "energy_label",
            PatternKind::NutritionTable => "nutrition_table",
            PatternKind::Per100 => "100g",
            PatternKind::PerGram => "per_gram",
            PatternKind::GenericCalorie => "general_calorie",
            PatternKind::GenericEnergy => "general_energy",
            PatternKind::Kcal => "kcal",
        }
    }

    pub fn parse(s: &str) -> Option<PatternKind> {
        CALORIE_PATTERNS
            .iter()
            .map(|p| p.kind)
            .find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CaloriePattern {
    pub kind: PatternKind,
    pub regex: Regex,
}

fn pattern(kind: PatternKind, re: &str) -> CaloriePattern {
    CaloriePattern { kind, regex: Regex::new(re).unwrap() }
}

/// Ordered battery: most reliable templates first, generic catch-alls last.
/// Two-number gaps stay inside one sentence; single-number gaps inside one clause.
pub static CALORIE_PATTERNS: LazyLock<Vec<CaloriePattern>> = LazyLock::new(|| {
    use PatternKind::*;
    vec![
        pattern(
            SpecificPortion,
            r"(?i)一[杯瓶罐份块个碗]\s*(\d+)\s*(?:毫升|ml|克|g)?[^。！？\n]*?热量[在约为是]*\s*(\d+)\s*[千大]?卡",
        ),
        pattern(
            SpecificPortion,
            r"(?i)(\d+)\s*(?:毫升|ml|克|g)[^。！？\n]*?热量[在约为是]*\s*(\d+)\s*[千大]?卡",
        ),
        pattern(Per100Energy, r"(\d+)\s*克[^，。]*?提供\s*(\d+)\s*卡路里"),
        pattern(Per100Energy, r"(\d+)\s*克[^，。]*?含有\s*(\d+)\s*[千大]?卡"),
        pattern(Per100Energy, r"(\d+)\s*克[^，。]*?能量\s*(\d+)\s*[千大]?卡"),
        pattern(CalorieSection, r"==\s*热量\s*==[^=]*?(\d+)\s*[千大]?卡"),
        pattern(CalorieLabel, r"热量\s*[:：]\s*(\d+)"),
        pattern(EnergyLabel, r"能量\s*[:：]\s*(\d+)"),
        pattern(NutritionTable, r"营养成分[^。]*?热量[^。]*?(\d+)"),
        pattern(Per100, r"(?i)每100\s*(?:克|毫升|g|ml)[^。]*?(\d+)\s*[千大]?卡"),
        pattern(Per100, r"(?i)(\d+)\s*[千大]?卡[^。]*?每100\s*(?:克|毫升|g|ml)"),
        pattern(PerGram, r"每克[^，。]*?(\d+)\s*[千大]?卡"),
        pattern(GenericCalorie, r"热量[约大概为是在]*\s*(\d+)\s*[千大]?卡"),
        pattern(GenericEnergy, r"能量[约大概为是在]*\s*(\d+)\s*[千大]?卡"),
        pattern(Kcal, r"(?i)(\d+)\s*kcal"),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(CALORIE_PATTERNS.len(), 15);
    }

    #[test]
    fn capture_arity_matches_kind() {
        for p in CALORIE_PATTERNS.iter() {
            let expected = if p.kind.is_two_number() { 3 } else { 2 };
            assert_eq!(p.regex.captures_len(), expected, "{}", p.regex.as_str());
        }
    }

    #[test]
    fn kind_names_round_trip() {
        assert_eq!(PatternKind::parse("100g_energy"), Some(PatternKind::Per100Energy));
        assert_eq!(PatternKind::parse("kcal"), Some(PatternKind::Kcal));
        assert_eq!(PatternKind::parse("bogus"), None);
    }
}
