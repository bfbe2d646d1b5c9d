// ==========================================
// 衣橱周计划系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 将仓储/引擎错误转换为调用方可理解的错误
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::StateConflict { actual, expected, .. } => {
                ApiError::InvalidStateTransition {
                    from: actual,
                    to: expected,
                }
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Repository(e) => ApiError::from(e),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            EngineError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            EngineError::Config(msg) => ApiError::ConfigError(msg),
            EngineError::Preference(msg) | EngineError::Weather(msg) => {
                ApiError::InternalError(msg)
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 用户ID非空校验
pub(crate) fn require_user(user_id: &str) -> ApiResult<()> {
    if user_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("用户ID不能为空".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Outfit".to_string(),
            id: "o1".to_string(),
        }
        .into();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("o1")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_engine_state_transition_conversion() {
        let err: ApiError = EngineError::InvalidStateTransition {
            from: "worn".to_string(),
            to: "accepted".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_repository_state_conflict_conversion() {
        let err: ApiError = RepositoryError::StateConflict {
            entity: "DailyPlanSlot".to_string(),
            id: "s1".to_string(),
            expected: "suggested".to_string(),
            actual: "worn".to_string(),
        }
        .into();
        match err {
            ApiError::InvalidStateTransition { from, .. } => assert_eq!(from, "worn"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_engine_repository_error_unwraps() {
        let err: ApiError =
            EngineError::Repository(RepositoryError::LockError("poisoned".to_string())).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_require_user() {
        assert!(require_user("u1").is_ok());
        assert!(matches!(require_user("  "), Err(ApiError::InvalidInput(_))));
    }
}
