// ==========================================
// 衣橱周计划系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合周计划编排器所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    CalendarEventRepository, ClothingItemRepository, LaundryAlertRepository, OutfitRepository,
    PreferenceSignalRepository, StyleProfileRepository, WearHistoryRepository,
    WeeklyPlanRepository,
};

/// 周计划仓储集合
///
/// # 包含的仓储
/// - `item_repo`: 衣物
/// - `outfit_repo`: 穿搭
/// - `plan_repo`: 周计划 / 日计划
/// - `signal_repo`: 偏好信号
/// - `calendar_repo`: 日程事件
/// - `style_repo`: 风格档案
/// - `wear_repo`: 穿着记录
/// - `alert_repo`: 洗护提醒
#[derive(Clone)]
pub struct PlannerRepositories {
    pub item_repo: Arc<ClothingItemRepository>,
    pub outfit_repo: Arc<OutfitRepository>,
    pub plan_repo: Arc<WeeklyPlanRepository>,
    pub signal_repo: Arc<PreferenceSignalRepository>,
    pub calendar_repo: Arc<CalendarEventRepository>,
    pub style_repo: Arc<StyleProfileRepository>,
    pub wear_repo: Arc<WearHistoryRepository>,
    pub alert_repo: Arc<LaundryAlertRepository>,
}

impl PlannerRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            item_repo: Arc::new(ClothingItemRepository::new(conn.clone())),
            outfit_repo: Arc::new(OutfitRepository::new(conn.clone())),
            plan_repo: Arc::new(WeeklyPlanRepository::new(conn.clone())),
            signal_repo: Arc::new(PreferenceSignalRepository::new(conn.clone())),
            calendar_repo: Arc::new(CalendarEventRepository::new(conn.clone())),
            style_repo: Arc::new(StyleProfileRepository::new(conn.clone())),
            wear_repo: Arc::new(WearHistoryRepository::new(conn.clone())),
            alert_repo: Arc::new(LaundryAlertRepository::new(conn)),
        }
    }
}
