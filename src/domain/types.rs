// ==========================================
// 衣橱周计划系统 - 领域类型定义
// ==========================================
// 职责: 状态、角色、等级等枚举类型
// 序列化格式: snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 衣物状态 (Item Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,   // 可穿
    Washing,     // 洗涤中
    Drying,      // 晾干中
    DryCleaning, // 干洗店
    Loaned,      // 借出
    Repair,      // 修补中
}

impl ItemStatus {
    /// 从字符串解析衣物状态
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(ItemStatus::Available),
            "washing" => Some(ItemStatus::Washing),
            "drying" => Some(ItemStatus::Drying),
            "dry_cleaning" => Some(ItemStatus::DryCleaning),
            "loaned" => Some(ItemStatus::Loaned),
            "repair" => Some(ItemStatus::Repair),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Washing => "washing",
            ItemStatus::Drying => "drying",
            ItemStatus::DryCleaning => "dry_cleaning",
            ItemStatus::Loaned => "loaned",
            ItemStatus::Repair => "repair",
        }
    }

    /// 是否处于洗护流程（洗涤/晾干/干洗）
    pub fn is_at_laundry(&self) -> bool {
        matches!(
            self,
            ItemStatus::Washing | ItemStatus::Drying | ItemStatus::DryCleaning
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 穿搭角色 (Role)
// ==========================================
// 一套穿搭内每个角色最多出现一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Top,
    Bottom,
    Outerwear,
    Shoes,
    Accessory,
    Dress,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "top" => Some(Role::Top),
            "bottom" => Some(Role::Bottom),
            "outerwear" => Some(Role::Outerwear),
            "shoes" => Some(Role::Shoes),
            "accessory" => Some(Role::Accessory),
            "dress" => Some(Role::Dress),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Role::Top => "top",
            Role::Bottom => "bottom",
            Role::Outerwear => "outerwear",
            Role::Shoes => "shoes",
            Role::Accessory => "accessory",
            Role::Dress => "dress",
        }
    }

    /// 角色对应的默认图层
    pub fn default_layer(&self) -> LayerPosition {
        match self {
            Role::Top | Role::Bottom | Role::Dress => LayerPosition::Base,
            Role::Outerwear => LayerPosition::Outer,
            Role::Shoes => LayerPosition::Shoes,
            Role::Accessory => LayerPosition::Accessory,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 图层位置 (Layer Position)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPosition {
    Base,
    Mid,
    Outer,
    Accessory,
    Shoes,
}

impl LayerPosition {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "base" => Some(LayerPosition::Base),
            "mid" => Some(LayerPosition::Mid),
            "outer" => Some(LayerPosition::Outer),
            "accessory" => Some(LayerPosition::Accessory),
            "shoes" => Some(LayerPosition::Shoes),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LayerPosition::Base => "base",
            LayerPosition::Mid => "mid",
            LayerPosition::Outer => "outer",
            LayerPosition::Accessory => "accessory",
            LayerPosition::Shoes => "shoes",
        }
    }
}

// ==========================================
// 日计划状态 (Slot Status)
// ==========================================
// 状态机: suggested → {accepted, modified, skipped, worn}
// worn 为终态, 其余状态仍可变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Suggested, // 系统建议
    Accepted,  // 用户接受
    Modified,  // 用户替换
    Skipped,   // 跳过
    Worn,      // 已穿（终态）
}

impl SlotStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "suggested" => Some(SlotStatus::Suggested),
            "accepted" => Some(SlotStatus::Accepted),
            "modified" => Some(SlotStatus::Modified),
            "skipped" => Some(SlotStatus::Skipped),
            "worn" => Some(SlotStatus::Worn),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SlotStatus::Suggested => "suggested",
            SlotStatus::Accepted => "accepted",
            SlotStatus::Modified => "modified",
            SlotStatus::Skipped => "skipped",
            SlotStatus::Worn => "worn",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        *self == SlotStatus::Worn
    }

    /// 判断状态转换是否合法
    pub fn can_transition_to(&self, _next: SlotStatus) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 周计划状态 (Plan Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Archived,
}

impl PlanStatus {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "archived" => PlanStatus::Archived,
            _ => PlanStatus::Active, // 默认值
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanStatus::Active => "active",
            PlanStatus::Archived => "archived",
        }
    }
}

// ==========================================
// 偏好信号类型 (Signal Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Accepted,    // 接受建议
    Rejected,    // 拒绝/换掉
    Worn,        // 实际穿着
    Regenerated, // 重新生成
    Rated,       // 评分
}

impl SignalType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "accepted" => Some(SignalType::Accepted),
            "rejected" => Some(SignalType::Rejected),
            "worn" => Some(SignalType::Worn),
            "regenerated" => Some(SignalType::Regenerated),
            "rated" => Some(SignalType::Rated),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            SignalType::Accepted => "accepted",
            SignalType::Rejected => "rejected",
            SignalType::Worn => "worn",
            SignalType::Regenerated => "regenerated",
            SignalType::Rated => "rated",
        }
    }

    /// 是否为正向采纳信号（用于温度段接受率）
    pub fn is_adoption(&self) -> bool {
        matches!(self, SignalType::Accepted | SignalType::Worn)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 洗护紧急等级 (Urgency Level)
// ==========================================
// 红线: 等级制, 0 正常 / 1 临近 / 2 需洗 / 3 超期
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    L0,
    L1,
    L2,
    L3,
}

impl UrgencyLevel {
    pub fn as_u8(&self) -> u8 {
        match self {
            UrgencyLevel::L0 => 0,
            UrgencyLevel::L1 => 1,
            UrgencyLevel::L2 => 2,
            UrgencyLevel::L3 => 3,
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.as_u8())
    }
}

// ==========================================
// 洗护提醒类型 / 优先级
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    NeedsWashing, // 需洗涤
    DryingTime,   // 需晾干
    AtCleaners,   // 仍在干洗店
    Approaching,  // 临近洗涤阈值
}

impl AlertType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "needs_washing" => Some(AlertType::NeedsWashing),
            "drying_time" => Some(AlertType::DryingTime),
            "at_cleaners" => Some(AlertType::AtCleaners),
            "approaching" => Some(AlertType::Approaching),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertType::NeedsWashing => "needs_washing",
            AlertType::DryingTime => "drying_time",
            AlertType::AtCleaners => "at_cleaners",
            AlertType::Approaching => "approaching",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl AlertPriority {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(AlertPriority::Low),
            "medium" => Some(AlertPriority::Medium),
            "high" => Some(AlertPriority::High),
            "urgent" => Some(AlertPriority::Urgent),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertPriority::Low => "low",
            AlertPriority::Medium => "medium",
            AlertPriority::High => "high",
            AlertPriority::Urgent => "urgent",
        }
    }
}

// ==========================================
// 温度段 (Temperature Band)
// ==========================================
// cold <10 / cool 10–18 / warm 18–25 / hot >25 (°C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TempBand {
    Cold,
    Cool,
    Warm,
    Hot,
}

impl TempBand {
    pub fn from_celsius(temp: f64) -> Self {
        if temp < 10.0 {
            TempBand::Cold
        } else if temp < 18.0 {
            TempBand::Cool
        } else if temp < 25.0 {
            TempBand::Warm
        } else {
            TempBand::Hot
        }
    }
}

// ==========================================
// 偏好评分来源 (Preference Outcome)
// ==========================================
// 区分"学习引擎未注入"与"学习引擎出错"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceOutcome {
    Learned,     // 有学习数据
    NoData,      // 数据不足, 取中性
    Unavailable, // 未注入学习引擎
    Failed,      // 学习引擎出错, 取中性
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_round_trip_db_str() {
        for status in [
            ItemStatus::Available,
            ItemStatus::Washing,
            ItemStatus::Drying,
            ItemStatus::DryCleaning,
            ItemStatus::Loaned,
            ItemStatus::Repair,
        ] {
            assert_eq!(ItemStatus::from_str(status.to_db_str()), Some(status));
        }
        assert_eq!(ItemStatus::from_str("lost"), None);
    }

    #[test]
    fn test_slot_status_worn_is_terminal() {
        assert!(SlotStatus::Suggested.can_transition_to(SlotStatus::Accepted));
        assert!(SlotStatus::Accepted.can_transition_to(SlotStatus::Modified));
        assert!(SlotStatus::Skipped.can_transition_to(SlotStatus::Worn));
        assert!(!SlotStatus::Worn.can_transition_to(SlotStatus::Suggested));
        assert!(!SlotStatus::Worn.can_transition_to(SlotStatus::Accepted));
    }

    #[test]
    fn test_temp_band_boundaries() {
        assert_eq!(TempBand::from_celsius(9.9), TempBand::Cold);
        assert_eq!(TempBand::from_celsius(10.0), TempBand::Cool);
        assert_eq!(TempBand::from_celsius(18.0), TempBand::Warm);
        assert_eq!(TempBand::from_celsius(25.0), TempBand::Hot);
    }

    #[test]
    fn test_urgency_level_ordering() {
        assert!(UrgencyLevel::L3 > UrgencyLevel::L2);
        assert_eq!(UrgencyLevel::L1.as_u8(), 1);
        assert_eq!(UrgencyLevel::L2.to_string(), "L2");
    }
}
