//! Keyword tables behind every substring heuristic in the pipeline.
//!
//! All matching is plain substring containment against the food name, the
//! page title or the page body. Keeping the tables here lets each heuristic
//! be tested and extended without touching control flow.

/// Food-class indicator words, checked in the order of [`FOOD_CLASSES`].
pub const BEVERAGE: &[&str] = &["饮料", "可乐", "汽水", "果汁", "牛奶", "奶茶", "咖啡", "豆浆"];
pub const MEAT: &[&str] = &["肉", "排骨", "鸡", "牛", "猪", "鱼"];
pub const SNACK: &[&str] = &["薯片", "饼干", "巧克力"];
pub const STAPLE: &[&str] = &["面", "饭", "粥"];
pub const FRUIT: &[&str] = &["水果", "苹果", "香蕉", "橙子", "西瓜"];

/// Narrower classes used only by the specific-portion bounds.
pub const MILK_LIKE: &[&str] = &["牛奶", "牛乳"];
pub const COLA_LIKE: &[&str] = &["可乐"];

/// Title words marking a page as off-topic (companies, culture, media, medicine...).
pub const OFF_TOPIC_TITLE: &[&str] = &[
    "公司", "集团", "企业", "品牌", "商标", "历史", "文化", "节日", "传说", "故事", "电影", "小说",
    "歌曲", "游戏", "地名", "人名", "化学", "医学", "药物", "疾病",
];

/// Body words signalling a food or nutrition topic.
pub const NUTRITION_TOPIC: &[&str] = &[
    "营养", "热量", "卡路里", "蛋白质", "脂肪", "碳水化合物", "维生素", "矿物质", "食用", "食品",
    "饮食", "烹饪", "每100克", "每100毫升", "能量", "膳食", "营养成分", "食谱", "制作", "原料",
    "配料", "口感", "味道",
];

/// Words that mark a disambiguation option as the food sense of a title.
pub const FOOD_SENSE: &[&str] = &["食品", "食物", "菜", "饮料", "饮品", "小吃", "点心", "料理"];

pub fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}

/// Number of distinct `words` present in `haystack`.
pub fn count_present(haystack: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| haystack.contains(*w)).count()
}

/// Coarse food class inferred from a food name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodClass {
    Beverage,
    Meat,
    Snack,
    Staple,
    Fruit,
}

const FOOD_CLASSES: &[(FoodClass, &[&str])] = &[
    (FoodClass::Beverage, BEVERAGE),
    (FoodClass::Meat, MEAT),
    (FoodClass::Snack, SNACK),
    (FoodClass::Staple, STAPLE),
    (FoodClass::Fruit, FRUIT),
];

impl FoodClass {
    pub fn infer(food_name: &str) -> Option<FoodClass> {
        FOOD_CLASSES
            .iter()
            .find(|(_, words)| contains_any(food_name, words))
            .map(|(class, _)| *class)
    }
}
