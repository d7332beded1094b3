use std::fmt;

use crate::keywords::FoodClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortionUnit {
    Milliliter,
    Gram,
    /// Counted item with its measure word (个, 根, 块...).
    Count(&'static str),
}

impl PortionUnit {
    /// Unit a per-100 baseline is quoted in: millilitres for liquids, grams otherwise.
    pub fn base(&self) -> &'static str {
        match self {
            PortionUnit::Milliliter => "ml",
            PortionUnit::Gram | PortionUnit::Count(_) => "g",
        }
    }
}

impl fmt::Display for PortionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortionUnit::Milliliter => f.write_str("ml"),
            PortionUnit::Gram => f.write_str("g"),
            PortionUnit::Count(word) => f.write_str(word),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardPortion {
    pub amount: u32,
    pub unit: PortionUnit,
}

impl StandardPortion {
    pub const fn ml(amount: u32) -> Self {
        StandardPortion { amount, unit: PortionUnit::Milliliter }
    }

    pub const fn g(amount: u32) -> Self {
        StandardPortion { amount, unit: PortionUnit::Gram }
    }

    pub const fn count(amount: u32, word: &'static str) -> Self {
        StandardPortion { amount, unit: PortionUnit::Count(word) }
    }
}

impl fmt::Display for StandardPortion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit)
    }
}

const DEFAULT_PORTION: StandardPortion = StandardPortion::g(100);

const STANDARD_PORTIONS: &[(&str, StandardPortion)] = &[
    ("可乐", StandardPortion::ml(330)),
    ("雪碧", StandardPortion::ml(330)),
    ("果汁", StandardPortion::ml(250)),
    ("奶茶", StandardPortion::ml(500)),
    ("咖啡", StandardPortion::ml(240)),
    ("牛奶", StandardPortion::ml(250)),
    ("酸奶", StandardPortion::g(150)),
    ("鸡腿", StandardPortion::g(100)),
    ("鸡翅", StandardPortion::g(100)),
    ("牛排", StandardPortion::g(150)),
    ("排骨", StandardPortion::g(100)),
    ("热狗", StandardPortion::count(1, "根")),
    ("香肠", StandardPortion::g(100)),
    ("汉堡", StandardPortion::count(1, "个")),
    ("三明治", StandardPortion::count(1, "个")),
    ("薯片", StandardPortion::g(50)),
    ("饼干", StandardPortion::g(100)),
    ("巧克力", StandardPortion::g(50)),
    ("蛋糕", StandardPortion::count(1, "块")),
    ("甜甜圈", StandardPortion::count(1, "个")),
    ("面条", StandardPortion::g(100)),
    ("米饭", StandardPortion::g(150)),
    ("面包", StandardPortion::g(100)),
    ("苹果", StandardPortion::count(1, "个")),
    ("香蕉", StandardPortion::count(1, "根")),
    ("橙子", StandardPortion::count(1, "个")),
    ("土豆", StandardPortion::g(150)),
    ("玉米", StandardPortion::g(150)),
    ("沙拉", StandardPortion::g(200)),
];

/// Canonical serving sizes, keyed by food name. Order matters for substring lookup.
#[derive(Debug, Clone)]
pub struct PortionTable {
    entries: Vec<(String, StandardPortion)>,
}

impl Default for PortionTable {
    fn default() -> Self {
        PortionTable::new(
            STANDARD_PORTIONS
                .iter()
                .map(|(name, portion)| (name.to_string(), *portion)),
        )
    }
}

impl PortionTable {
    pub fn new(entries: impl IntoIterator<Item = (String, StandardPortion)>) -> Self {
        PortionTable { entries: entries.into_iter().collect() }
    }

    pub fn food_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Exact key, then substring either way, then food-class inference, then 100 g.
    pub fn resolve(&self, food_name: &str) -> StandardPortion {
        if let Some((_, portion)) = self.entries.iter().find(|(key, _)| key == food_name) {
            return *portion;
        }
        if let Some((_, portion)) = self
            .entries
            .iter()
            .find(|(key, _)| food_name.contains(key.as_str()) || key.contains(food_name))
        {
            return *portion;
        }
        match FoodClass::infer(food_name) {
            Some(FoodClass::Beverage) => StandardPortion::ml(330),
            Some(FoodClass::Meat) => StandardPortion::g(100),
            Some(FoodClass::Snack) => StandardPortion::g(50),
            Some(FoodClass::Staple) => StandardPortion::g(150),
            Some(FoodClass::Fruit) | None => DEFAULT_PORTION,
        }
    }
}
