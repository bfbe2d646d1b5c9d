// ==========================================
// 衣橱周计划系统 - Laundry Core 纯函数库
// ==========================================
// 职责: 洗涤阈值推荐、洗护紧急等级、提醒截止时间、穿搭洗护分类
// 红线: 无状态、无副作用、无 I/O 操作
// 红线: 紧急等级是"等级制",不是评分制
// ==========================================

use crate::domain::laundry::{ItemUrgency, OutfitLaundryStatus};
use crate::domain::types::{AlertPriority, UrgencyLevel};
use crate::domain::wardrobe::ClothingItem;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// 未匹配类别时的缺省洗涤阈值
pub const DEFAULT_WASH_THRESHOLD: i32 = 3;

/// 提醒截止时刻（计划日前一天 20:00）
const ALERT_DEADLINE_HOUR: u32 = 20;

/// 类别关键字 → 洗涤前最大穿着次数
///
/// 按顺序匹配, 首个命中者生效（"t-shirt" 必须先于 "shirt"）
pub const WASH_THRESHOLDS: &[(&str, i32)] = &[
    // 贴身衣物: 每次洗
    ("underwear", 1),
    ("socks", 1),
    ("briefs", 1),
    ("boxers", 1),
    ("bra", 2),
    ("lingerie", 1),
    // 上衣
    ("t-shirt", 2),
    ("tee", 2),
    ("shirt", 2),
    ("blouse", 2),
    ("tank top", 1),
    ("polo", 2),
    // 运动
    ("sportswear", 1),
    ("gym", 1),
    ("workout", 1),
    ("activewear", 1),
    // 下装
    ("pants", 4),
    ("trousers", 4),
    ("jeans", 6),
    ("shorts", 3),
    ("skirt", 3),
    ("dress", 2),
    ("gown", 1),
    // 外套
    ("jacket", 10),
    ("blazer", 8),
    ("coat", 15),
    ("cardigan", 5),
    ("sweater", 4),
    ("hoodie", 3),
    ("sweatshirt", 3),
    // 正装
    ("suit", 5),
    ("vest", 5),
    ("waistcoat", 5),
    // 配饰
    ("scarf", 10),
    ("hat", 15),
    ("gloves", 10),
];

// ==========================================
// LaundryCore - 纯函数工具类
// ==========================================
pub struct LaundryCore;

impl LaundryCore {
    /// 按类别/名称推荐洗涤阈值
    ///
    /// # 规则
    /// - 类别或名称（小写）包含关键字即命中, 按表顺序首个命中
    /// - 均未命中 → 3
    pub fn recommended_threshold(category: &str, name: &str) -> i32 {
        let category = category.to_lowercase();
        let name = name.to_lowercase();
        WASH_THRESHOLDS
            .iter()
            .find(|(key, _)| category.contains(key) || name.contains(key))
            .map(|(_, threshold)| *threshold)
            .unwrap_or(DEFAULT_WASH_THRESHOLD)
    }

    /// 衣物的有效洗涤阈值
    ///
    /// # 规则
    /// - max_wears_before_wash ≠ 3 视为用户自定义, 直接采用
    /// - 否则取类别推荐值
    pub fn wash_threshold(item: &ClothingItem) -> i32 {
        if item.max_wears_before_wash != DEFAULT_WASH_THRESHOLD {
            return item.max_wears_before_wash;
        }
        Self::recommended_threshold(&item.category, &item.name)
    }

    /// 洗护紧急等级
    ///
    /// # 规则
    /// - wears_since_wash = 0 → L0
    /// - ratio = wears_since_wash / max(阈值, 1)
    /// - ratio ≥ 1.5 → L3 超期; ≥ 1.0 → L2 需洗; ≥ 0.7 → L1 临近; 否则 L0
    pub fn urgency_level(item: &ClothingItem) -> UrgencyLevel {
        if item.wears_since_wash <= 0 {
            return UrgencyLevel::L0;
        }
        let ratio = item.wash_ratio();
        if ratio >= 1.5 {
            UrgencyLevel::L3
        } else if ratio >= 1.0 {
            UrgencyLevel::L2
        } else if ratio >= 0.7 {
            UrgencyLevel::L1
        } else {
            UrgencyLevel::L0
        }
    }

    /// 提醒截止时间: 计划日前一天 20:00（本地时间）
    pub fn alert_deadline(planned_date: NaiveDate) -> NaiveDateTime {
        let time = NaiveTime::from_hms_opt(ALERT_DEADLINE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);
        (planned_date - Duration::days(1)).and_time(time)
    }

    /// 需洗提醒优先级: 超期 → high, 否则 medium
    pub fn needs_wash_priority(urgency: UrgencyLevel) -> AlertPriority {
        if urgency >= UrgencyLevel::L3 {
            AlertPriority::High
        } else {
            AlertPriority::Medium
        }
    }

    /// 穿搭洗护状态分类
    ///
    /// # 规则
    /// - 洗涤/晾干/干洗中 → unavailable
    /// - 等级 ≥ L2 → needs_wash
    /// - 等级 = L1 → approaching（不影响 is_clear）
    pub fn classify_outfit(items: &[ClothingItem]) -> OutfitLaundryStatus {
        let mut status = OutfitLaundryStatus {
            is_clear: true,
            ..Default::default()
        };
        for item in items {
            let urgency = Self::urgency_level(item);
            if item.status.is_at_laundry() {
                status.unavailable.push(item.clone());
                status.is_clear = false;
            } else if urgency >= UrgencyLevel::L2 {
                status.needs_wash.push(ItemUrgency {
                    item: item.clone(),
                    urgency,
                });
                status.is_clear = false;
            } else if urgency == UrgencyLevel::L1 {
                status.approaching.push(ItemUrgency {
                    item: item.clone(),
                    urgency,
                });
            }
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ItemStatus;
    use chrono::Utc;

    fn item(category: &str, name: &str, wears: i32, max: i32) -> ClothingItem {
        ClothingItem {
            id: format!("{}-{}", category, name),
            user_id: "u1".to_string(),
            name: name.to_string(),
            category: category.to_string(),
            color: None,
            seasons: vec![],
            occasions: vec![],
            tags: vec![],
            favorite: false,
            times_worn: wears,
            wears_since_wash: wears,
            max_wears_before_wash: max,
            status: ItemStatus::Available,
            last_worn: None,
            last_washed: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_recommended_threshold_table() {
        assert_eq!(LaundryCore::recommended_threshold("Underwear", ""), 1);
        assert_eq!(LaundryCore::recommended_threshold("T-Shirt", ""), 2);
        assert_eq!(LaundryCore::recommended_threshold("Jeans", ""), 6);
        assert_eq!(LaundryCore::recommended_threshold("Outerwear", "Wool Coat"), 15);
        assert_eq!(LaundryCore::recommended_threshold("Misc", "Thing"), 3);
    }

    #[test]
    fn test_custom_threshold_is_respected() {
        assert_eq!(LaundryCore::wash_threshold(&item("Jeans", "Blue", 0, 5)), 5);
        assert_eq!(LaundryCore::wash_threshold(&item("Jeans", "Blue", 0, 3)), 6);
    }

    #[test]
    fn test_wash_threshold_is_idempotent() {
        let it = item("Sweater", "Knit", 1, 3);
        let first = LaundryCore::wash_threshold(&it);
        let second = LaundryCore::wash_threshold(&it);
        assert_eq!(first, second);
        assert_eq!(first, 4);
    }

    #[test]
    fn test_urgency_levels() {
        assert_eq!(LaundryCore::urgency_level(&item("x", "y", 0, 3)), UrgencyLevel::L0);
        assert_eq!(LaundryCore::urgency_level(&item("x", "y", 1, 3)), UrgencyLevel::L0);
        assert_eq!(LaundryCore::urgency_level(&item("x", "y", 7, 10)), UrgencyLevel::L1);
        assert_eq!(LaundryCore::urgency_level(&item("x", "y", 3, 3)), UrgencyLevel::L2);
        assert_eq!(LaundryCore::urgency_level(&item("x", "y", 3, 2)), UrgencyLevel::L3);
    }

    #[test]
    fn test_alert_deadline_is_previous_evening() {
        let planned = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        let deadline = LaundryCore::alert_deadline(planned);
        assert_eq!(
            deadline,
            NaiveDate::from_ymd_opt(2024, 6, 4).unwrap().and_hms_opt(20, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_classify_outfit() {
        let mut washing = item("Shirt", "White", 0, 2);
        washing.status = ItemStatus::Washing;
        let items = vec![
            washing,
            item("Jeans", "Blue", 6, 6),
            item("Jacket", "Denim", 7, 10),
            item("Socks", "Black", 0, 1),
        ];
        let status = LaundryCore::classify_outfit(&items);
        assert!(!status.is_clear);
        assert_eq!(status.unavailable.len(), 1);
        assert_eq!(status.needs_wash.len(), 1);
        assert_eq!(status.approaching.len(), 1);

        let clear = LaundryCore::classify_outfit(&[item("Jacket", "Denim", 7, 10)]);
        assert!(clear.is_clear);
    }
}
