// ==========================================
// 衣橱周计划系统 - 计划配置读取 Trait
// ==========================================
// 职责: 定义周计划引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

/// 配置读取错误
pub type ConfigError = Box<dyn Error + Send + Sync>;

// ==========================================
// PlannerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）, 测试中的 MockConfig
#[async_trait]
pub trait PlannerConfigReader: Send + Sync {
    /// 天气获取超时（毫秒）
    ///
    /// # 默认值
    /// - 5000
    async fn get_weather_timeout_ms(&self) -> Result<u64, ConfigError>;

    /// 候选穿搭池上限
    ///
    /// # 默认值
    /// - 50
    async fn get_outfit_pool_cap(&self) -> Result<usize, ConfigError>;

    /// 周计划选择 top-K
    ///
    /// # 默认值
    /// - 7
    async fn get_weekly_top_k(&self) -> Result<usize, ConfigError>;

    /// 单日重新生成 top-K
    ///
    /// # 默认值
    /// - 5
    async fn get_regenerate_top_k(&self) -> Result<usize, ConfigError>;

    /// 评分随机扰动幅度（±）
    ///
    /// # 默认值
    /// - 0.15
    async fn get_score_jitter(&self) -> Result<f64, ConfigError>;

    /// 信号衰减半衰期（天）
    ///
    /// # 默认值
    /// - 30
    async fn get_decay_half_life_days(&self) -> Result<f64, ConfigError>;

    /// 近期穿着回看天数
    ///
    /// # 默认值
    /// - 21
    async fn get_wear_history_lookback_days(&self) -> Result<i64, ConfigError>;

    /// 缺省城市（天气回退）
    ///
    /// # 默认值
    /// - "Tunis"
    async fn get_default_location(&self) -> Result<String, ConfigError>;

    /// 是否启用个性化权重
    ///
    /// # 默认值
    /// - false（使用固定周计划权重）
    async fn get_use_personalized_weights(&self) -> Result<bool, ConfigError>;

    /// 已有穿搭少于该数量时补充生成
    ///
    /// # 默认值
    /// - 7
    async fn get_min_pool_before_generation(&self) -> Result<usize, ConfigError>;

    /// 随机种子（为空则使用系统熵）
    async fn get_random_seed(&self) -> Result<Option<u64>, ConfigError>;

    /// 配置快照（JSON）
    async fn get_config_snapshot(&self) -> Result<String, ConfigError>;
}

// ==========================================
// PlannerSettings - 单次请求的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerSettings {
    pub weather_timeout_ms: u64,
    pub outfit_pool_cap: usize,
    pub weekly_top_k: usize,
    pub regenerate_top_k: usize,
    pub score_jitter: f64,
    pub decay_half_life_days: f64,
    pub wear_history_lookback_days: i64,
    pub default_location: String,
    pub use_personalized_weights: bool,
    pub min_pool_before_generation: usize,
    pub random_seed: Option<u64>,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            weather_timeout_ms: 5_000,
            outfit_pool_cap: 50,
            weekly_top_k: 7,
            regenerate_top_k: 5,
            score_jitter: 0.15,
            decay_half_life_days: 30.0,
            wear_history_lookback_days: 21,
            default_location: "Tunis".to_string(),
            use_personalized_weights: false,
            min_pool_before_generation: 7,
            random_seed: None,
        }
    }
}

impl PlannerSettings {
    /// 一次性读取全部配置
    pub async fn load<C: PlannerConfigReader + ?Sized>(config: &C) -> Result<Self, ConfigError> {
        Ok(Self {
            weather_timeout_ms: config.get_weather_timeout_ms().await?,
            outfit_pool_cap: config.get_outfit_pool_cap().await?,
            weekly_top_k: config.get_weekly_top_k().await?.max(1),
            regenerate_top_k: config.get_regenerate_top_k().await?.max(1),
            score_jitter: config.get_score_jitter().await?.clamp(0.0, 1.0),
            decay_half_life_days: config.get_decay_half_life_days().await?,
            wear_history_lookback_days: config.get_wear_history_lookback_days().await?,
            default_location: config.get_default_location().await?,
            use_personalized_weights: config.get_use_personalized_weights().await?,
            min_pool_before_generation: config.get_min_pool_before_generation().await?,
            random_seed: config.get_random_seed().await?,
        })
    }
}
