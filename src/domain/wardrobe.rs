// ==========================================
// 衣橱周计划系统 - 衣物领域模型
// ==========================================
// 职责: ClothingItem 实体与洗护周期判定
// 红线: wears_since_wash ≥ max_wears_before_wash 的衣物不得进入候选
// ==========================================

use crate::domain::types::ItemStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// ClothingItem - 衣物
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingItem {
    pub id: String,                    // 衣物ID
    pub user_id: String,               // 所属用户
    pub name: String,                  // 名称
    pub category: String,              // 类别（自由文本, 用于角色识别与洗涤阈值）
    pub color: Option<String>,         // 颜色
    pub seasons: Vec<String>,          // 适用季节
    pub occasions: Vec<String>,        // 适用场合
    pub tags: Vec<String>,             // 标签（warm/light 等关键字）
    pub favorite: bool,                // 收藏

    // ===== 洗护周期 =====
    pub times_worn: i32,               // 累计穿着次数
    pub wears_since_wash: i32,         // 上次洗涤后穿着次数
    pub max_wears_before_wash: i32,    // 洗涤前最大穿着次数
    pub status: ItemStatus,            // 状态
    pub last_worn: Option<NaiveDate>,  // 最近穿着日期
    pub last_washed: Option<NaiveDateTime>, // 最近洗涤时间

    pub created_at: NaiveDateTime,
}

impl ClothingItem {
    /// 已达到洗涤阈值
    pub fn is_wash_due(&self) -> bool {
        self.wears_since_wash >= self.max_wears_before_wash
    }

    /// 可进入候选生成（可穿状态且未达洗涤阈值）
    pub fn is_eligible(&self) -> bool {
        self.status == ItemStatus::Available && !self.is_wash_due()
    }

    /// 洗涤进度比例（已穿次数 / 阈值）
    pub fn wash_ratio(&self) -> f64 {
        let max = self.max_wears_before_wash.max(1);
        self.wears_since_wash as f64 / max as f64
    }

    /// 用于关键字匹配的文本（类别 + 名称 + 标签, 小写）
    pub fn keyword_text(&self) -> String {
        let mut text = format!("{} {}", self.category, self.name);
        for tag in &self.tags {
            text.push(' ');
            text.push_str(tag);
        }
        text.to_lowercase()
    }

    /// 颜色（小写, 空白视为无颜色）
    pub fn normalized_color(&self) -> Option<String> {
        self.color
            .as_deref()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
    }
}

// ==========================================
// NewClothingItem - 新建衣物请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClothingItem {
    pub name: String,
    pub category: String,
    pub color: Option<String>,
    pub seasons: Vec<String>,
    pub occasions: Vec<String>,
    pub tags: Vec<String>,
    pub favorite: bool,
    /// 为空时按类别阈值表自动设置
    pub max_wears_before_wash: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(wears: i32, max: i32, status: ItemStatus) -> ClothingItem {
        ClothingItem {
            id: "i1".to_string(),
            user_id: "u1".to_string(),
            name: "Blue Jeans".to_string(),
            category: "Jeans".to_string(),
            color: Some(" Blue ".to_string()),
            seasons: vec![],
            occasions: vec![],
            tags: vec!["denim".to_string()],
            favorite: false,
            times_worn: wears,
            wears_since_wash: wears,
            max_wears_before_wash: max,
            status,
            last_worn: None,
            last_washed: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_item_at_threshold_is_not_eligible() {
        let it = item(3, 3, ItemStatus::Available);
        assert!(it.is_wash_due());
        assert!(!it.is_eligible());

        let it = item(2, 3, ItemStatus::Available);
        assert!(it.is_eligible());
    }

    #[test]
    fn test_unavailable_status_is_not_eligible() {
        assert!(!item(0, 3, ItemStatus::Washing).is_eligible());
        assert!(!item(0, 3, ItemStatus::Loaned).is_eligible());
    }

    #[test]
    fn test_keyword_text_and_color() {
        let it = item(0, 6, ItemStatus::Available);
        assert_eq!(it.keyword_text(), "jeans blue jeans denim");
        assert_eq!(it.normalized_color().as_deref(), Some("blue"));
    }
}
