// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use wardrobe_planner::config::{ConfigError, PlannerConfigReader, PlannerSettings};

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub settings: PlannerSettings,
    /// 为 true 时所有读取返回错误
    pub broken: bool,
}

impl MockConfig {
    /// 创建默认配置（固定种子, 便于复现）
    pub fn default() -> Self {
        let mut settings = PlannerSettings::default();
        settings.random_seed = Some(42);
        Self {
            settings,
            broken: false,
        }
    }

    /// 启用个性化权重
    pub fn personalized() -> Self {
        let mut config = Self::default();
        config.settings.use_personalized_weights = true;
        config
    }

    /// 天气超时很短的配置
    pub fn with_weather_timeout(timeout_ms: u64) -> Self {
        let mut config = Self::default();
        config.settings.weather_timeout_ms = timeout_ms;
        config
    }

    /// 读取必定失败的配置
    pub fn broken() -> Self {
        let mut config = Self::default();
        config.broken = true;
        config
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.broken {
            return Err("mock config unavailable".into());
        }
        Ok(())
    }
}

#[async_trait]
impl PlannerConfigReader for MockConfig {
    async fn get_weather_timeout_ms(&self) -> Result<u64, ConfigError> {
        self.check()?;
        Ok(self.settings.weather_timeout_ms)
    }

    async fn get_outfit_pool_cap(&self) -> Result<usize, ConfigError> {
        self.check()?;
        Ok(self.settings.outfit_pool_cap)
    }

    async fn get_weekly_top_k(&self) -> Result<usize, ConfigError> {
        self.check()?;
        Ok(self.settings.weekly_top_k)
    }

    async fn get_regenerate_top_k(&self) -> Result<usize, ConfigError> {
        self.check()?;
        Ok(self.settings.regenerate_top_k)
    }

    async fn get_score_jitter(&self) -> Result<f64, ConfigError> {
        self.check()?;
        Ok(self.settings.score_jitter)
    }

    async fn get_decay_half_life_days(&self) -> Result<f64, ConfigError> {
        self.check()?;
        Ok(self.settings.decay_half_life_days)
    }

    async fn get_wear_history_lookback_days(&self) -> Result<i64, ConfigError> {
        self.check()?;
        Ok(self.settings.wear_history_lookback_days)
    }

    async fn get_default_location(&self) -> Result<String, ConfigError> {
        self.check()?;
        Ok(self.settings.default_location.clone())
    }

    async fn get_use_personalized_weights(&self) -> Result<bool, ConfigError> {
        self.check()?;
        Ok(self.settings.use_personalized_weights)
    }

    async fn get_min_pool_before_generation(&self) -> Result<usize, ConfigError> {
        self.check()?;
        Ok(self.settings.min_pool_before_generation)
    }

    async fn get_random_seed(&self) -> Result<Option<u64>, ConfigError> {
        self.check()?;
        Ok(self.settings.random_seed)
    }

    async fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        self.check()?;
        Ok(serde_json::to_string(&self.settings)?)
    }
}
