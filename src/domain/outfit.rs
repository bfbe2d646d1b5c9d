// ==========================================
// 衣橱周计划系统 - 穿搭领域模型
// ==========================================
// 职责: Outfit 实体、穿搭条目、候选穿搭
// 红线: 同一套穿搭内每个角色最多一件
// ==========================================

use crate::domain::types::{LayerPosition, Role};
use crate::domain::wardrobe::ClothingItem;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 穿搭来源 (Outfit Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutfitSource {
    User, // 用户创建
    Ai,   // 引擎生成
}

impl OutfitSource {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ai" => OutfitSource::Ai,
            _ => OutfitSource::User,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            OutfitSource::User => "user",
            OutfitSource::Ai => "ai",
        }
    }
}

impl fmt::Display for OutfitSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// OutfitItem - 穿搭条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitItem {
    pub item_id: String,
    pub role: Role,
    pub layer: LayerPosition,
    pub position: i32, // 穿搭内顺序
}

// ==========================================
// Outfit - 穿搭
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outfit {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub items: Vec<OutfitItem>,
    pub min_temperature: Option<f64>,  // 适用最低温度 (°C)
    pub max_temperature: Option<f64>,  // 适用最高温度 (°C)
    pub suitable_weather: Vec<String>, // 适用天气标签
    pub style_tags: Vec<String>,       // 风格标签
    pub occasion: Option<String>,      // 场合
    pub season: Option<String>,        // 季节
    pub favorite: bool,
    pub rating: Option<i32>,           // 评分 1-5
    pub times_worn: i32,
    pub last_worn: Option<NaiveDate>,
    pub source: OutfitSource,
    pub created_at: NaiveDateTime,
}

impl Outfit {
    /// 排序后的衣物ID集合（去重键）
    pub fn sorted_item_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|i| i.item_id.clone()).collect();
        ids.sort();
        ids
    }

    /// 去重键字符串
    pub fn item_key(&self) -> String {
        self.sorted_item_ids().join(",")
    }

    /// 是否声明了温度区间
    pub fn has_temperature_bounds(&self) -> bool {
        self.min_temperature.is_some() && self.max_temperature.is_some()
    }
}

// ==========================================
// CandidateOutfit - 候选穿搭（已解析衣物）
// ==========================================
// 评分/选择的输入单元; is_new=true 表示由生成器合成, 尚未持久化
#[derive(Debug, Clone)]
pub struct CandidateOutfit {
    pub outfit: Outfit,
    pub items: Vec<ClothingItem>,
    pub is_new: bool,
}

impl CandidateOutfit {
    pub fn id(&self) -> &str {
        &self.outfit.id
    }

    /// 穿搭内各衣物颜色（小写, 去空）
    pub fn colors(&self) -> Vec<String> {
        self.items.iter().filter_map(|i| i.normalized_color()).collect()
    }
}

// ==========================================
// NewOutfit - 新建穿搭请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOutfit {
    pub name: String,
    pub item_ids: Vec<String>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub suitable_weather: Vec<String>,
    pub style_tags: Vec<String>,
    pub occasion: Option<String>,
    pub season: Option<String>,
    pub favorite: bool,
    pub rating: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_item_key_is_order_independent() {
        let make = |ids: &[&str]| Outfit {
            id: "o".to_string(),
            user_id: "u".to_string(),
            name: "n".to_string(),
            items: ids
                .iter()
                .enumerate()
                .map(|(idx, id)| OutfitItem {
                    item_id: id.to_string(),
                    role: Role::Top,
                    layer: LayerPosition::Base,
                    position: idx as i32,
                })
                .collect(),
            min_temperature: None,
            max_temperature: None,
            suitable_weather: vec![],
            style_tags: vec![],
            occasion: None,
            season: None,
            favorite: false,
            rating: None,
            times_worn: 0,
            last_worn: None,
            source: OutfitSource::User,
            created_at: Utc::now().naive_utc(),
        };

        assert_eq!(make(&["b", "a", "c"]).item_key(), make(&["c", "b", "a"]).item_key());
        assert_eq!(make(&["b", "a"]).item_key(), "a,b");
    }

    #[test]
    fn test_outfit_source_parse() {
        assert_eq!(OutfitSource::from_str("AI"), OutfitSource::Ai);
        assert_eq!(OutfitSource::from_str("anything"), OutfitSource::User);
    }
}
