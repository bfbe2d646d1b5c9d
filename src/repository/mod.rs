// ==========================================
// 衣橱周计划系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod calendar_repo;
pub mod error;
pub mod laundry_repo;
pub mod outfit_repo;
pub mod plan_repo;
mod row_codec;
pub mod signal_repo;
pub mod wardrobe_repo;
pub mod wear_repo;

// 重导出核心仓储
pub use calendar_repo::{CalendarEventRepository, StyleProfileRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use laundry_repo::LaundryAlertRepository;
pub use outfit_repo::OutfitRepository;
pub use plan_repo::WeeklyPlanRepository;
pub use signal_repo::{ItemAffinityRow, PreferenceSignalRepository};
pub use wardrobe_repo::ClothingItemRepository;
pub use wear_repo::WearHistoryRepository;
