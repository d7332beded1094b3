use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keywords::contains_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Staples,
    Drinks,
    Fruits,
    Vegetables,
    Meat,
    Snacks,
    Dairy,
    Desserts,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Staples,
        Category::Drinks,
        Category::Fruits,
        Category::Vegetables,
        Category::Meat,
        Category::Snacks,
        Category::Dairy,
        Category::Desserts,
        Category::Other,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::Staples => "staples",
            Category::Drinks => "drinks",
            Category::Fruits => "fruits",
            Category::Vegetables => "vegetables",
            Category::Meat => "meat",
            Category::Snacks => "snacks",
            Category::Dairy => "dairy",
            Category::Desserts => "desserts",
            Category::Other => "other",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Staples => "主食",
            Category::Drinks => "饮料",
            Category::Fruits => "水果",
            Category::Vegetables => "蔬菜",
            Category::Meat => "肉类",
            Category::Snacks => "零食",
            Category::Dairy => "乳制品",
            Category::Desserts => "甜品",
            Category::Other => "其他",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Staples => "🍚",
            Category::Drinks => "🥤",
            Category::Fruits => "🍎",
            Category::Vegetables => "🥬",
            Category::Meat => "🥩",
            Category::Snacks => "🍿",
            Category::Dairy => "🥛",
            Category::Desserts => "🍰",
            Category::Other => "🍽️",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Name keywords per category, tried top to bottom. Dairy sits above drinks
/// so milk and yoghurt land in dairy.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Dairy, &["牛奶", "牛乳", "酸奶", "奶酪", "芝士", "黄油"]),
    (
        Category::Drinks,
        &["可乐", "奶茶", "咖啡", "果汁", "豆浆", "烧仙草", "饮料", "汽水", "茶"],
    ),
    (
        Category::Snacks,
        &["薯片", "饼干", "爆米花", "坚果", "炸春卷", "油条", "甜甜圈"],
    ),
    (
        Category::Meat,
        &["鸡腿", "鸡翅", "牛排", "排骨", "猪蹄", "鳗鱼", "牛肉", "猪肉", "鸡肉", "虾仁", "香肠", "热狗"],
    ),
    (Category::Desserts, &["蛋糕", "巧克力", "布丁", "冰淇淋", "月饼"]),
    (Category::Fruits, &["苹果", "香蕉", "西瓜", "橙子", "葡萄", "草莓", "水果"]),
    (
        Category::Vegetables,
        &["菠菜", "苦瓜", "茄子", "玉米", "土豆", "西兰花", "黄瓜", "白菜", "蔬菜"],
    ),
    (
        Category::Staples,
        &["面", "饭", "粥", "汉堡", "三明治", "咖喱", "沙拉", "饺子", "馒头", "包子"],
    ),
];

pub fn categorize(food_name: &str) -> Category {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, words)| contains_any(food_name, words))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// 1 to 5 bucket over absolute calories.
pub fn calorie_level(calories: i64) -> u8 {
    match calories {
        ..=100 => 1,
        101..=200 => 2,
        201..=300 => 3,
        301..=450 => 4,
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_boundaries() {
        let levels: Vec<u8> = [100, 101, 300, 301, 450, 451].into_iter().map(calorie_level).collect();
        assert_eq!(levels, vec![1, 2, 3, 4, 4, 5]);
        assert_eq!(calorie_level(0), 1);
        assert_eq!(calorie_level(200), 2);
    }

    #[test]
    fn keyword_order_decides() {
        assert_eq!(categorize("牛奶"), Category::Dairy);
        assert_eq!(categorize("奶茶"), Category::Drinks);
        assert_eq!(categorize("可乐"), Category::Drinks);
        assert_eq!(categorize("牛肉面"), Category::Meat);
        assert_eq!(categorize("甜甜圈"), Category::Snacks);
        assert_eq!(categorize("巧克力"), Category::Desserts);
        assert_eq!(categorize("土豆"), Category::Vegetables);
        assert_eq!(categorize("米饭"), Category::Staples);
        assert_eq!(categorize("豆腐"), Category::Other);
    }

    #[test]
    fn ids_round_trip_through_from_str() {
        for c in Category::ALL {
            assert_eq!(c.id().parse::<Category>(), Ok(c));
            assert_eq!(serde_json::to_string(&c).unwrap(), format!("\"{}\"", c.id()));
        }
        assert_eq!("pizza".parse::<Category>(), Err(UnknownCategory("pizza".into())));
    }
}
