// ==========================================
// 衣橱周计划系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供展示层调用
// ==========================================

pub mod error;
pub mod planner_api;
pub mod wardrobe_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use planner_api::PlannerApi;
pub use wardrobe_api::WardrobeApi;
