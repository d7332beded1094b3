use std::collections::HashMap;

/// Query templates for foods without a curated list. The bare name sits in
/// the middle: first it tends to land on disambiguation pages, and later
/// refinements can still help after it.
const TEMPLATES: &[&str] = &[
    "{} 营养成分",
    "{} 营养价值",
    "{} 热量",
    "{} 卡路里",
    "{}",
    "{} 食品营养",
    "{} 营养信息",
];

/// Foods whose generic queries collide with unrelated topics.
const CURATED: &[(&str, &[&str])] = &[
    ("鸡腿", &["鸡肉 营养", "鸡腿肉", "鸡肉 热量", "禽肉 营养"]),
    ("鸡翅", &["鸡肉 营养", "鸡翅肉", "鸡肉 热量", "禽肉 营养"]),
    ("可乐", &["可口可乐 营养", "碳酸饮料 热量", "软饮料 营养", "可乐 卡路里"]),
    ("米饭", &["大米 营养", "稻米 热量", "白米 营养成分", "米饭 卡路里"]),
    ("面包", &["小麦面包 营养", "面包 热量", "谷物面包 营养成分"]),
];

#[derive(Debug, Clone)]
pub struct SearchStrategies {
    overrides: HashMap<String, Vec<String>>,
}

impl Default for SearchStrategies {
    fn default() -> Self {
        let overrides = CURATED
            .iter()
            .map(|(food, queries)| {
                (food.to_string(), queries.iter().map(|q| q.to_string()).collect())
            })
            .collect();
        SearchStrategies { overrides }
    }
}

impl SearchStrategies {
    /// Curated lists plus `extra`, which replaces curated entries for the same food.
    pub fn with_overrides(extra: &HashMap<String, Vec<String>>) -> Self {
        let mut strategies = SearchStrategies::default();
        for (food, queries) in extra {
            if !queries.is_empty() {
                strategies.overrides.insert(food.clone(), queries.clone());
            }
        }
        strategies
    }

    /// Ordered search queries for `food_name`, most specific first. Never empty.
    pub fn variants(&self, food_name: &str) -> Vec<String> {
        if let Some(curated) = self.overrides.get(food_name) {
            return curated.clone();
        }
        TEMPLATES
            .iter()
            .map(|t| t.replace("{}", food_name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curated_list_returned_verbatim() {
        let s = SearchStrategies::default();
        for (food, queries) in CURATED {
            assert_eq!(s.variants(food), queries.to_vec());
        }
    }

    #[test]
    fn generic_list_has_bare_name_fifth() {
        let v = SearchStrategies::default().variants("薯片");
        assert_eq!(v.len(), 7);
        assert_eq!(v[0], "薯片 营养成分");
        assert_eq!(v[4], "薯片");
        assert_ne!(v[6], "薯片");
    }

    #[test]
    fn configured_override_replaces_curated() {
        let extra = HashMap::from([("可乐".to_string(), vec!["可乐 (饮料)".to_string()])]);
        let s = SearchStrategies::with_overrides(&extra);
        assert_eq!(s.variants("可乐"), vec!["可乐 (饮料)".to_string()]);
        assert_eq!(s.variants("米饭").len(), 4);
    }
}
