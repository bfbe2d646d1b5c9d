// ==========================================
// 衣橱周计划系统 - 周计划领域模型
// ==========================================
// 职责: WeeklyPlan / DailyPlanSlot / ScoreBreakdown
// 红线: 每用户每周(周一)唯一; 每个周计划恰好 7 个日计划
// ==========================================

use crate::domain::calendar::CalendarEvent;
use crate::domain::types::{PlanStatus, PreferenceOutcome, SlotStatus};
use crate::domain::weather::DailyForecast;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 每个日计划最多保留的备选数
pub const MAX_ALTERNATIVES: usize = 3;

/// 周计划天数
pub const DAYS_PER_WEEK: i64 = 7;

/// 归一化为所在周的周一
pub fn normalize_week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

// ==========================================
// ScoreBreakdown - 评分明细
// ==========================================
// base 为确定性加权和, jitter 为随机扰动, total = clamp(base + jitter)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub weather: f64,
    pub occasion: f64,
    pub recency: f64,
    pub preference: f64,
    pub style: f64,
    pub color: f64,
    pub base: f64,
    pub jitter: f64,
    pub total: f64,
    pub preference_outcome: PreferenceOutcome,
}

// ==========================================
// DailyPlanSlot - 日计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlanSlot {
    pub id: String,
    pub weekly_plan_id: String,
    pub date: NaiveDate,
    pub day_of_week: u8,                     // 0=周一 .. 6=周日
    pub primary_outfit_id: Option<String>,   // 主推荐（可空: 衣橱为空时）
    pub alternative_outfit_ids: Vec<String>, // 备选（≤3, 互不相同）
    pub scores: Option<ScoreBreakdown>,      // 主推荐评分明细
    pub selection_reason: String,            // 推荐理由（非空）
    pub status: SlotStatus,
    pub updated_at: NaiveDateTime,
}

impl DailyPlanSlot {
    /// 是否可被修改（worn 为终态）
    pub fn is_mutable(&self) -> bool {
        !self.status.is_terminal()
    }
}

// ==========================================
// WeeklyPlan - 周计划
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub id: String,
    pub user_id: String,
    pub week_start: NaiveDate,               // 周一
    pub location: String,
    pub weather_snapshot: Vec<DailyForecast>, // 7 日天气
    pub events_snapshot: Vec<CalendarEvent>,  // 本周事件
    pub generation_reasoning: String,
    pub weather_degraded: bool,              // 天气是否使用了缺省值
    pub config_snapshot_json: Option<String>,
    pub status: PlanStatus,
    pub created_at: NaiveDateTime,
    pub slots: Vec<DailyPlanSlot>,
}

impl WeeklyPlan {
    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Duration::days(DAYS_PER_WEEK - 1)
    }

    /// 某日天气
    pub fn weather_for(&self, date: NaiveDate) -> Option<&DailyForecast> {
        self.weather_snapshot.iter().find(|w| w.date == date)
    }

    /// 某日事件
    pub fn events_for(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        self.events_snapshot
            .iter()
            .filter(|e| e.date == date)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_week_start_to_monday() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let thursday = NaiveDate::from_ymd_opt(2024, 6, 6).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(normalize_week_start(monday), monday);
        assert_eq!(normalize_week_start(thursday), monday);
        assert_eq!(normalize_week_start(sunday), monday);
    }
}
