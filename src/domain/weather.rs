// ==========================================
// 衣橱周计划系统 - 天气领域模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 缺省天气: 20°C 晴
pub const DEFAULT_TEMPERATURE: f64 = 20.0;
pub const DEFAULT_CONDITION: &str = "Clear";
pub const DEFAULT_HUMIDITY: i32 = 50;
pub const DEFAULT_ICON: &str = "01d";

// ==========================================
// DailyForecast - 日天气摘要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub temp_avg: f64,
    pub condition: String,
    pub humidity: i32,
    pub icon: String,
}

impl DailyForecast {
    /// 中性缺省天气（天气获取失败或缺天时使用）
    pub fn neutral(date: NaiveDate) -> Self {
        Self {
            date,
            temp_min: DEFAULT_TEMPERATURE,
            temp_max: DEFAULT_TEMPERATURE,
            temp_avg: DEFAULT_TEMPERATURE,
            condition: DEFAULT_CONDITION.to_string(),
            humidity: DEFAULT_HUMIDITY,
            icon: DEFAULT_ICON.to_string(),
        }
    }

    /// 是否为降雨天气
    pub fn is_rainy(&self) -> bool {
        let c = self.condition.to_lowercase();
        c.contains("rain") || c.contains("drizzle") || c.contains("thunderstorm")
    }
}
