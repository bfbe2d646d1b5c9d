// ==========================================
// 衣橱周计划系统 - 应用层
// ==========================================
// 职责: 装配仓储、引擎与 API, 提供共享状态
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
