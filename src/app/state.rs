// ==========================================
// 衣橱周计划系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{PlannerApi, WardrobeApi};
use crate::config::{ConfigManager, FALLBACK_LOCATION};
use crate::db::{apply_schema, open_sqlite_connection};
use crate::i18n;
use crate::engine::{
    DailyRecommendationEngine, PlanEventPublisher, PlannerRepositories, PreferenceLearningEngine,
    WardrobeAvailabilityTracker, WeeklyPlanOrchestrator,
};
use crate::weather::{OpenWeatherProvider, WeatherProvider};

/// OpenWeatherMap API key 的环境变量
pub const WEATHER_API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
/// 数据库路径的环境变量
pub const DB_PATH_ENV: &str = "WARDROBE_PLANNER_DB_PATH";

/// 单次天气 HTTP 请求超时
const WEATHER_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 周计划API
    pub planner_api: Arc<PlannerApi>,

    /// 衣橱API
    pub wardrobe_api: Arc<WardrobeApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（共享同一连接）
    pub repositories: PlannerRepositories,
}

impl AppState {
    /// 创建新的AppState实例（默认天气提供者, 无事件发布者）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表（幂等）
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        let api_key = std::env::var(WEATHER_API_KEY_ENV).ok();
        let weather = OpenWeatherProvider::new(api_key, FALLBACK_LOCATION, WEATHER_REQUEST_TIMEOUT)
            .map_err(|e| format!("无法创建天气服务: {}", e))?;
        Self::with_components(db_path, Arc::new(weather), None)
    }

    /// 使用指定天气提供者与事件发布者创建（测试 / 离线运行）
    pub fn with_components(
        db_path: String,
        weather: Arc<dyn WeatherProvider>,
        event_publisher: Option<Arc<dyn PlanEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        apply_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repositories = PlannerRepositories::from_connection(conn.clone());

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let half_life_days = config_manager
            .decay_half_life_days()
            .map_err(|e| format!("无法读取半衰期配置: {}", e))?;
        if let Some(locale) = config_manager
            .locale()
            .map_err(|e| format!("无法读取语言配置: {}", e))?
        {
            let applied = i18n::set_locale(&locale);
            tracing::info!(locale = applied, "文案语言已设置");
        }

        let availability = Arc::new(WardrobeAvailabilityTracker::new(
            repositories.item_repo.clone(),
            repositories.outfit_repo.clone(),
            repositories.alert_repo.clone(),
        ));
        let learning = Arc::new(PreferenceLearningEngine::new(
            repositories.signal_repo.clone(),
            half_life_days,
        ));
        let orchestrator = Arc::new(WeeklyPlanOrchestrator::new(
            repositories.clone(),
            availability.clone(),
            Some(learning.clone()),
            weather,
            config_manager.clone(),
            event_publisher,
        ));
        let recommendations = Arc::new(DailyRecommendationEngine::new(
            repositories.clone(),
            availability.clone(),
        ));

        // ==========================================
        // 创建API层
        // ==========================================
        let planner_api = Arc::new(PlannerApi::new(
            orchestrator,
            learning.clone(),
            recommendations,
            config_manager.clone(),
        ));
        let wardrobe_api = Arc::new(WardrobeApi::new(
            repositories.clone(),
            availability,
            learning,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            planner_api,
            wardrobe_api,
            config_manager,
            repositories,
        })
    }
}

/// 获取默认数据库路径
///
/// # 规则
/// - 环境变量 WARDROBE_PLANNER_DB_PATH 优先
/// - 否则使用用户数据目录下的 wardrobe-planner/wardrobe_planner.db
/// - 无法获取数据目录时回退到当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./wardrobe_planner.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("wardrobe-planner");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("wardrobe_planner.db");
        }
    }
    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::StaticWeatherProvider;
    use tempfile::TempDir;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_creates_schema() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();
        let state = AppState::with_components(
            db_path.clone(),
            Arc::new(StaticWeatherProvider::new(vec![])),
            None,
        )
        .unwrap();

        assert_eq!(state.db_path, db_path);
        assert!(state.wardrobe_api.list_items("u1").unwrap().is_empty());
    }
}
