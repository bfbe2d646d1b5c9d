// ==========================================
// 衣橱周计划系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎, 不拼 SQL
// 红线: Engine 不拼 SQL, 所有推荐必须输出 reason
// ==========================================

pub mod availability;
pub mod error;
pub mod events;
pub mod generator;
pub mod laundry_core;
pub mod orchestrator;
pub mod preference;
pub mod recommendation;
pub mod repositories;
pub mod role;
pub mod scoring;
pub mod selection;

// 重导出核心引擎
pub use availability::WardrobeAvailabilityTracker;
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, PlanEvent, PlanEventPublisher, PlanEventType,
};
pub use generator::{GeneratedCombination, OutfitCombinationGenerator};
pub use laundry_core::LaundryCore;
pub use orchestrator::WeeklyPlanOrchestrator;
pub use preference::{
    ItemAffinity, PersonalizedWeights, PreferenceLearningEngine, PreferenceModel,
    ProfileInsights, UserType,
};
pub use recommendation::{DailyRecommendation, DailyRecommendationEngine};
pub use repositories::PlannerRepositories;
pub use role::{classify_item, classify_role, validate_outfit_roles};
pub use scoring::{ScoringEngine, ScoringWeights};
pub use selection::SelectionEngine;
