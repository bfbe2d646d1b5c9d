// ==========================================
// 衣橱周计划系统 - OpenWeatherMap 天气提供者
// ==========================================
// 接口: /data/2.5/forecast (5 天 / 3 小时粒度), units=metric
// 规则: 按日期聚合为日摘要; 未配置 API key 时返回空（软失败）
// 规则: 请求城市无数据且不是缺省城市时, 用缺省城市重试一次
// ==========================================

use crate::domain::weather::DailyForecast;
use crate::weather::{WeatherError, WeatherProvider};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// 每天的 3 小时数据点数
const POINTS_PER_DAY: usize = 8;
/// 接口允许的最大数据点数
const MAX_POINTS: usize = 40;

// ===== 响应结构 =====

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
    pub city: Option<ForecastCity>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCity {
    /// UTC 偏移（秒）
    #[serde(default)]
    pub timezone: i64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: ForecastMain,
    #[serde(default)]
    pub weather: Vec<ForecastCondition>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
    #[serde(default)]
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct ForecastCondition {
    pub main: String,
    #[serde(default)]
    pub icon: String,
}

/// 将 3 小时粒度数据聚合为日摘要（按城市当地日期）
///
/// - temp_min/max/avg 四舍五入
/// - condition 取出现次数最多者（小写, 并列取先出现者）
/// - icon 取当天第一个数据点
/// - humidity 取均值
pub fn summarize_forecast(resp: &ForecastResponse, days: usize) -> Vec<DailyForecast> {
    let offset = resp.city.as_ref().map(|c| c.timezone).unwrap_or(0);

    let mut grouped: BTreeMap<NaiveDate, Vec<&ForecastEntry>> = BTreeMap::new();
    for entry in &resp.list {
        let date = match DateTime::from_timestamp(entry.dt + offset, 0) {
            Some(dt) => dt.date_naive(),
            None => continue,
        };
        grouped.entry(date).or_default().push(entry);
    }

    grouped
        .into_iter()
        .take(days)
        .map(|(date, entries)| summarize_day(date, &entries))
        .collect()
}

fn summarize_day(date: NaiveDate, entries: &[&ForecastEntry]) -> DailyForecast {
    let temps: Vec<f64> = entries.iter().map(|e| e.main.temp).collect();
    let count = temps.len().max(1) as f64;
    let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = temps.iter().sum::<f64>() / count;
    let humidity = entries.iter().map(|e| e.main.humidity).sum::<f64>() / count;

    // 众数天气（并列取先出现者）
    let mut counts: Vec<(String, usize)> = Vec::new();
    for e in entries {
        if let Some(c) = e.weather.first() {
            let key = c.main.to_lowercase();
            match counts.iter_mut().find(|(k, _)| *k == key) {
                Some((_, n)) => *n += 1,
                None => counts.push((key, 1)),
            }
        }
    }
    let mut condition = String::from("clear");
    let mut best = 0;
    for (k, n) in counts {
        if n > best {
            best = n;
            condition = k;
        }
    }

    let icon = entries
        .first()
        .and_then(|e| e.weather.first())
        .map(|c| c.icon.clone())
        .unwrap_or_else(|| "01d".to_string());

    DailyForecast {
        date,
        temp_min: min.round(),
        temp_max: max.round(),
        temp_avg: avg.round(),
        condition,
        humidity: humidity.round() as i32,
        icon,
    }
}

// ==========================================
// OpenWeatherProvider
// ==========================================
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    default_location: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenWeatherProvider {
    /// 创建天气提供者
    ///
    /// # 参数
    /// - `api_key`: API key（为空则所有请求返回空）
    /// - `default_location`: 回退城市
    /// - `request_timeout`: 单次 HTTP 请求超时
    pub fn new(
        api_key: Option<String>,
        default_location: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("未配置 OpenWeatherMap API key，天气将使用缺省值");
        }
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            api_key,
            default_location: default_location.into(),
            base_url: BASE_URL.to_string(),
            client,
        })
    }

    /// 覆盖接口地址（测试或代理）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch(&self, api_key: &str, location: &str, days: usize) -> Result<Vec<DailyForecast>, WeatherError> {
        let cnt = (days * POINTS_PER_DAY).min(MAX_POINTS).to_string();
        let resp = self
            .client
            .get(format!("{}/forecast", self.base_url))
            .query(&[
                ("q", location),
                ("cnt", cnt.as_str()),
                ("units", "metric"),
                ("appid", api_key),
            ])
            .send()
            .await?
            .error_for_status()?;
        let body: ForecastResponse = resp.json().await?;
        Ok(summarize_forecast(&body, days))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn get_forecast(
        &self,
        location: &str,
        days: usize,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        let api_key = match &self.api_key {
            Some(k) => k.as_str(),
            None => return Ok(Vec::new()),
        };

        let primary = match self.fetch(api_key, location, days).await {
            Ok(list) => list,
            Err(e) => {
                warn!(location, error = %e, "天气请求失败");
                Vec::new()
            }
        };
        if !primary.is_empty() || location.eq_ignore_ascii_case(&self.default_location) {
            return Ok(primary);
        }

        info!(location, fallback = %self.default_location, "请求城市无天气数据，回退缺省城市");
        self.fetch(api_key, &self.default_location, days).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dt: i64, temp: f64, humidity: f64, main: &str, icon: &str) -> ForecastEntry {
        ForecastEntry {
            dt,
            main: ForecastMain { temp, humidity },
            weather: vec![ForecastCondition {
                main: main.to_string(),
                icon: icon.to_string(),
            }],
        }
    }

    #[test]
    fn test_summarize_groups_by_date() {
        // 2024-06-03 00:00 UTC = 1717372800
        let day1 = 1_717_372_800;
        let day2 = day1 + 86_400;
        let resp = ForecastResponse {
            list: vec![
                entry(day1, 14.4, 60.0, "Rain", "10d"),
                entry(day1 + 10_800, 18.6, 70.0, "Rain", "10d"),
                entry(day1 + 21_600, 16.0, 80.0, "Clouds", "03d"),
                entry(day2, 25.0, 40.0, "Clear", "01d"),
            ],
            city: Some(ForecastCity { timezone: 0 }),
        };

        let days = summarize_forecast(&resp, 7);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(days[0].temp_min, 14.0);
        assert_eq!(days[0].temp_max, 19.0);
        assert_eq!(days[0].temp_avg, 16.0);
        assert_eq!(days[0].condition, "rain");
        assert_eq!(days[0].icon, "10d");
        assert_eq!(days[0].humidity, 70);
        assert_eq!(days[1].condition, "clear");
    }

    #[test]
    fn test_summarize_respects_day_limit_and_timezone() {
        let day1 = 1_717_372_800;
        let resp = ForecastResponse {
            list: vec![
                entry(day1 - 3_600, 10.0, 50.0, "Clear", "01n"), // UTC 前一天 23:00, +2h 后为当天
                entry(day1 + 86_400, 12.0, 50.0, "Clear", "01d"),
            ],
            city: Some(ForecastCity { timezone: 7_200 }),
        };
        let days = summarize_forecast(&resp, 1);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    }

    #[tokio::test]
    async fn test_missing_api_key_returns_empty() {
        let provider = OpenWeatherProvider::new(None, "Tunis", Duration::from_secs(1)).unwrap();
        let list = provider.get_forecast("Paris", 7).await.unwrap();
        assert!(list.is_empty());
    }
}
