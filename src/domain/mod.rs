// ==========================================
// 衣橱周计划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod calendar;
pub mod laundry;
pub mod outfit;
pub mod plan;
pub mod signal;
pub mod types;
pub mod wardrobe;
pub mod weather;

// 重导出核心类型
pub use calendar::{CalendarEvent, StyleProfile, WearRecord};
pub use laundry::{
    DayConflict, ItemUrgency, ItemsAtLaundry, LaundryAlert, LaundrySummary, OutfitLaundryStatus,
};
pub use outfit::{CandidateOutfit, NewOutfit, Outfit, OutfitItem, OutfitSource};
pub use plan::{normalize_week_start, DailyPlanSlot, ScoreBreakdown, WeeklyPlan};
pub use signal::{PreferenceSignal, SignalContext, SignalObservation};
pub use types::{
    AlertPriority, AlertType, ItemStatus, LayerPosition, PlanStatus, PreferenceOutcome, Role,
    SignalType, SlotStatus, TempBand, UrgencyLevel,
};
pub use wardrobe::{ClothingItem, NewClothingItem};
pub use weather::DailyForecast;
