// ==========================================
// 衣橱周计划系统 - 日程/穿着记录/风格档案
// ==========================================
// 外部协作方 CalendarStore / WearHistoryStore 的数据形状
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// CalendarEvent - 日程事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub date: NaiveDate,
    pub occasion: Option<String>, // work/casual/formal/party/date/sports/travel
}

// ==========================================
// WearRecord - 穿着记录
// ==========================================
// 作为近期穿着评分的数据来源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WearRecord {
    pub id: String,
    pub user_id: String,
    pub outfit_id: String,
    pub worn_on: NaiveDate,
    pub slot_id: Option<String>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// StyleProfile - 风格档案
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleProfile {
    pub user_id: String,
    pub preferred_styles: Vec<String>,
}

impl StyleProfile {
    /// 小写化的偏好风格列表
    pub fn normalized_styles(&self) -> Vec<String> {
        self.preferred_styles
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
