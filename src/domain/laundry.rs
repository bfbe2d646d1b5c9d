// ==========================================
// 衣橱周计划系统 - 洗护领域模型
// ==========================================
// 职责: LaundryAlert 与洗护状态读模型
// 红线: 未处理提醒按 (user, item, planned_date) 去重
// ==========================================

use crate::domain::types::{AlertPriority, AlertType, UrgencyLevel};
use crate::domain::wardrobe::ClothingItem;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// LaundryAlert - 洗护提醒
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaundryAlert {
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub planned_date: NaiveDate,   // 计划穿着日期
    pub deadline: NaiveDateTime,   // 截止时间: 前一天 20:00
    pub alert_type: AlertType,
    pub priority: AlertPriority,
    pub message: String,
    pub is_resolved: bool,
    pub created_at: NaiveDateTime,
    pub resolved_at: Option<NaiveDateTime>,
}

// ==========================================
// ItemUrgency - 衣物洗护紧急度
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ItemUrgency {
    pub item: ClothingItem,
    pub urgency: UrgencyLevel,
}

// ==========================================
// OutfitLaundryStatus - 穿搭洗护状态
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutfitLaundryStatus {
    pub needs_wash: Vec<ItemUrgency>,
    pub approaching: Vec<ItemUrgency>,
    pub unavailable: Vec<ClothingItem>,
    pub is_clear: bool,
}

// ==========================================
// DayConflict - 周计划单日洗护冲突
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct DayConflict {
    pub date: NaiveDate,
    pub slot_id: String,
    pub outfit_id: String,
    pub status: OutfitLaundryStatus,
}

// ==========================================
// ItemsAtLaundry - 洗护中的衣物（分组）
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemsAtLaundry {
    pub washing: Vec<ClothingItem>,
    pub drying: Vec<ClothingItem>,
    pub dry_cleaning: Vec<ClothingItem>,
}

impl ItemsAtLaundry {
    pub fn total(&self) -> usize {
        self.washing.len() + self.drying.len() + self.dry_cleaning.len()
    }
}

// ==========================================
// LaundrySummary - 洗护概览
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct LaundrySummary {
    pub needs_washing_count: usize,
    pub approaching_count: usize,
    pub at_laundry_count: usize,
    pub active_alert_count: usize,
    pub urgent_alerts: Vec<LaundryAlert>, // 截止时间在 24 小时内
}
