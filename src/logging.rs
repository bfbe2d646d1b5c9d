// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// RUST_LOG 控制级别, WARDROBE_LOG_FORMAT 控制输出格式
// ==========================================

use std::error::Error;
use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式的环境变量（text / json）
pub const LOG_FORMAT_ENV: &str = "WARDROBE_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 人读文本（默认）
    #[default]
    Text,
    /// 每行一条 JSON（日志采集）
    Json,
}

impl LogFormat {
    /// 解析格式名; 未知取 Text
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// 初始化全局日志
///
/// # 环境变量
/// - RUST_LOG: 级别过滤（默认 info）, 例如 RUST_LOG=wardrobe_planner::engine=debug
///
/// # 返回
/// - Err: 全局 subscriber 已被设置（由宿主程序决定是否忽略）
///
/// # 示例
/// ```no_run
/// use wardrobe_planner::logging::{self, LogFormat};
/// logging::init(LogFormat::from_env()).ok();
/// ```
pub fn init(format: LogFormat) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_line_number(true)
            .try_init(),
    }
}

/// 测试日志: debug 级别, 输出到测试捕获; 重复调用忽略
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
