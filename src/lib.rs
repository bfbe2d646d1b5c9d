// ==========================================
// 衣橱周计划系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 穿搭推荐与周计划引擎 (用户最终选择)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 天气服务
pub mod weather;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertPriority, AlertType, ItemStatus, PlanStatus, PreferenceOutcome, Role, SignalType,
    SlotStatus,
};

// 领域实体
pub use domain::{
    CalendarEvent, ClothingItem, DailyForecast, DailyPlanSlot, LaundryAlert, Outfit,
    PreferenceSignal, ScoreBreakdown, StyleProfile, WearRecord, WeeklyPlan,
};

// 引擎
pub use engine::{
    DailyRecommendationEngine, PreferenceLearningEngine, ScoringEngine, SelectionEngine,
    WardrobeAvailabilityTracker, WeeklyPlanOrchestrator,
};

// API
pub use api::{ApiError, PlannerApi, WardrobeApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "衣橱周计划系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
