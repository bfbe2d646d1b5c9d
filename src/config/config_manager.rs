// ==========================================
// 衣橱周计划系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planner_config_trait::{ConfigError, PlannerConfigReader};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 未配置 default_location 时的城市
pub const FALLBACK_LOCATION: &str = "Tunis";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取并解析配置值; 不存在取默认值, 格式错误告警后取默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key, value = %raw, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 偏好衰减半衰期（天）; 非正数告警后取默认值
    ///
    /// 说明: 同步读取, 供启动装配偏好学习引擎使用
    pub fn decay_half_life_days(&self) -> Result<f64, ConfigError> {
        let value = self.get_parsed_or_default(config_keys::DECAY_HALF_LIFE_DAYS, 30.0)?;
        if value <= 0.0 {
            warn!(value, "半衰期必须为正数，使用默认值 30");
            return Ok(30.0);
        }
        Ok(value)
    }

    /// 文案语言（未配置时为 None）
    pub fn locale(&self) -> Result<Option<String>, ConfigError> {
        Ok(self
            .get_config_value(config_keys::LOCALE)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 在生成周计划时记录配置快照
    pub fn snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 天气
    pub const WEATHER_TIMEOUT_MS: &str = "weather_timeout_ms";
    pub const DEFAULT_LOCATION: &str = "default_location";

    // 候选池
    pub const OUTFIT_POOL_CAP: &str = "outfit_pool_cap";
    pub const MIN_POOL_BEFORE_GENERATION: &str = "min_pool_before_generation";

    // 选择
    pub const WEEKLY_TOP_K: &str = "weekly_top_k";
    pub const REGENERATE_TOP_K: &str = "regenerate_top_k";
    pub const SCORE_JITTER: &str = "score_jitter";
    pub const RANDOM_SEED: &str = "random_seed";

    // 偏好学习
    pub const DECAY_HALF_LIFE_DAYS: &str = "decay_half_life_days";
    pub const USE_PERSONALIZED_WEIGHTS: &str = "use_personalized_weights";

    // 近期穿着
    pub const WEAR_HISTORY_LOOKBACK_DAYS: &str = "wear_history_lookback_days";

    // 文案
    pub const LOCALE: &str = "locale";
}

#[async_trait]
impl PlannerConfigReader for ConfigManager {
    async fn get_weather_timeout_ms(&self) -> Result<u64, ConfigError> {
        self.get_parsed_or_default(config_keys::WEATHER_TIMEOUT_MS, 5_000)
    }

    async fn get_outfit_pool_cap(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::OUTFIT_POOL_CAP, 50)
    }

    async fn get_weekly_top_k(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::WEEKLY_TOP_K, 7)
    }

    async fn get_regenerate_top_k(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::REGENERATE_TOP_K, 5)
    }

    async fn get_score_jitter(&self) -> Result<f64, ConfigError> {
        self.get_parsed_or_default(config_keys::SCORE_JITTER, 0.15)
    }

    async fn get_decay_half_life_days(&self) -> Result<f64, ConfigError> {
        self.decay_half_life_days()
    }

    async fn get_wear_history_lookback_days(&self) -> Result<i64, ConfigError> {
        self.get_parsed_or_default(config_keys::WEAR_HISTORY_LOOKBACK_DAYS, 21)
    }

    async fn get_default_location(&self) -> Result<String, ConfigError> {
        Ok(self
            .get_config_value(config_keys::DEFAULT_LOCATION)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| FALLBACK_LOCATION.to_string()))
    }

    async fn get_use_personalized_weights(&self) -> Result<bool, ConfigError> {
        let value = self.get_config_value(config_keys::USE_PERSONALIZED_WEIGHTS)?;
        Ok(matches!(
            value.as_deref().map(|v| v.trim().to_lowercase()).as_deref(),
            Some("true") | Some("1") | Some("yes")
        ))
    }

    async fn get_min_pool_before_generation(&self) -> Result<usize, ConfigError> {
        self.get_parsed_or_default(config_keys::MIN_POOL_BEFORE_GENERATION, 7)
    }

    async fn get_random_seed(&self) -> Result<Option<u64>, ConfigError> {
        match self.get_config_value(config_keys::RANDOM_SEED)? {
            None => Ok(None),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seed) => Ok(Some(seed)),
                Err(_) => {
                    warn!(value = %raw, "random_seed 格式错误，忽略");
                    Ok(None)
                }
            },
        }
    }

    async fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::planner_config_trait::PlannerSettings;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::apply_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_config_empty() {
        let cfg = manager();
        let settings = PlannerSettings::load(&cfg).await.unwrap();
        assert_eq!(settings, PlannerSettings::default());
    }

    #[tokio::test]
    async fn test_overrides_and_malformed_values() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::WEEKLY_TOP_K, "3").unwrap();
        cfg.set_global_config_value(config_keys::SCORE_JITTER, "abc").unwrap();
        cfg.set_global_config_value(config_keys::RANDOM_SEED, "42").unwrap();
        cfg.set_global_config_value(config_keys::USE_PERSONALIZED_WEIGHTS, "TRUE").unwrap();

        assert_eq!(cfg.get_weekly_top_k().await.unwrap(), 3);
        assert!((cfg.get_score_jitter().await.unwrap() - 0.15).abs() < 1e-9);
        assert_eq!(cfg.get_random_seed().await.unwrap(), Some(42));
        assert!(cfg.get_use_personalized_weights().await.unwrap());
    }

    #[tokio::test]
    async fn test_snapshot_contains_overrides() {
        let cfg = manager();
        cfg.set_global_config_value(config_keys::DEFAULT_LOCATION, "Paris").unwrap();
        let snapshot = cfg.get_config_snapshot().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(parsed["default_location"], "Paris");
    }
}
