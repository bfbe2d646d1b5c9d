// ==========================================
// 衣橱周计划系统 - 天气服务
// ==========================================
// 职责: 天气提供者接口、整周天气获取（超时 + 缺省回退）、穿搭天气适配判定
// 红线: 天气获取必须有超时, 失败不向调用方抛错, 回退为中性缺省天气
// ==========================================

pub mod openweather;

use crate::domain::outfit::Outfit;
use crate::domain::plan::DAYS_PER_WEEK;
use crate::domain::weather::DailyForecast;
use crate::i18n::t_with_args;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub use openweather::OpenWeatherProvider;

// ==========================================
// WeatherError - 天气错误
// ==========================================
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("天气请求失败: {0}")]
    Request(String),

    #[error("天气响应解析失败: {0}")]
    Parse(String),

    #[error("天气请求超时: {0}ms")]
    Timeout(u64),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WeatherError::Parse(err.to_string())
        } else {
            WeatherError::Request(err.to_string())
        }
    }
}

// ==========================================
// WeatherProvider Trait
// ==========================================
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// 获取天气预报
    ///
    /// # 参数
    /// - `location`: 城市名
    /// - `days`: 天数
    ///
    /// # 返回
    /// - 按日期升序的日摘要; 无数据时返回空列表（软失败）
    async fn get_forecast(
        &self,
        location: &str,
        days: usize,
    ) -> Result<Vec<DailyForecast>, WeatherError>;
}

// ==========================================
// StaticWeatherProvider - 固定天气（离线/测试）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct StaticWeatherProvider {
    forecasts: Vec<DailyForecast>,
}

impl StaticWeatherProvider {
    pub fn new(forecasts: Vec<DailyForecast>) -> Self {
        Self { forecasts }
    }
}

#[async_trait]
impl WeatherProvider for StaticWeatherProvider {
    async fn get_forecast(
        &self,
        _location: &str,
        days: usize,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        Ok(self.forecasts.iter().take(days).cloned().collect())
    }
}

// ==========================================
// WeekWeather - 整周天气
// ==========================================
#[derive(Debug, Clone)]
pub struct WeekWeather {
    pub days: Vec<DailyForecast>, // 恰好 7 天, 按日期升序
    pub degraded: bool,           // 存在缺省回退的天
}

/// 获取整周天气
///
/// # 参数
/// - `provider`: 天气提供者
/// - `location`: 城市名
/// - `week_start`: 周一
/// - `timeout_ms`: 超时（毫秒）
///
/// # 说明
/// - 超时/失败: 7 天全部使用缺省天气, degraded = true
/// - 部分缺天: 缺失的天使用缺省天气, degraded = true
pub async fn fetch_week_weather(
    provider: &dyn WeatherProvider,
    location: &str,
    week_start: NaiveDate,
    timeout_ms: u64,
) -> WeekWeather {
    let fetched = tokio::time::timeout(
        std::time::Duration::from_millis(timeout_ms),
        provider.get_forecast(location, DAYS_PER_WEEK as usize),
    )
    .await;

    let forecasts = match fetched {
        Ok(Ok(list)) => list,
        Ok(Err(e)) => {
            warn!(location, error = %e, "天气获取失败，使用缺省天气");
            Vec::new()
        }
        Err(_) => {
            warn!(location, timeout_ms, "天气获取超时，使用缺省天气");
            Vec::new()
        }
    };

    let by_date: HashMap<NaiveDate, DailyForecast> =
        forecasts.into_iter().map(|f| (f.date, f)).collect();

    let mut degraded = false;
    let days = (0..DAYS_PER_WEEK)
        .map(|offset| {
            let date = week_start + Duration::days(offset);
            match by_date.get(&date) {
                Some(f) => f.clone(),
                None => {
                    degraded = true;
                    DailyForecast::neutral(date)
                }
            }
        })
        .collect();

    debug!(location, %week_start, degraded, "整周天气获取完成");
    WeekWeather { days, degraded }
}

/// 天气状况映射到穿搭天气标签
pub fn map_condition(condition: &str) -> String {
    let c = condition.trim().to_lowercase();
    match c.as_str() {
        "clear" => "sunny".to_string(),
        "clouds" => "cloudy".to_string(),
        "rain" | "drizzle" => "rainy".to_string(),
        "thunderstorm" => "stormy".to_string(),
        "snow" => "snowy".to_string(),
        "mist" | "fog" => "foggy".to_string(),
        _ => c,
    }
}

/// 判定穿搭是否适合天气
///
/// # 返回
/// - (是否适合, 原因)
pub fn is_outfit_suitable(outfit: &Outfit, weather: Option<&DailyForecast>) -> (bool, String) {
    let weather = match weather {
        Some(w) => w,
        None => return (true, t_with_args("weather.unavailable", &[])),
    };

    let temp = weather.temp_avg.round();
    let temp_s = format!("{}", temp);

    if let Some(min) = outfit.min_temperature {
        if temp < min {
            return (
                false,
                t_with_args("weather.too_cold", &[("temp", &temp_s), ("min", &min.to_string())]),
            );
        }
    }
    if let Some(max) = outfit.max_temperature {
        if temp > max {
            return (
                false,
                t_with_args("weather.too_hot", &[("temp", &temp_s), ("max", &max.to_string())]),
            );
        }
    }

    if !outfit.suitable_weather.is_empty() {
        let mapped = map_condition(&weather.condition);
        let tags: Vec<String> = outfit
            .suitable_weather
            .iter()
            .map(|t| t.trim().to_lowercase())
            .collect();
        if !tags.contains(&mapped) {
            return (
                false,
                t_with_args(
                    "weather.not_suitable",
                    &[("condition", &weather.condition.to_lowercase())],
                ),
            );
        }
    }

    (true, t_with_args("weather.suitable", &[]))
}
