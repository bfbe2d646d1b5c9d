// ==========================================
// 衣橱周计划系统 - 行编解码工具
// ==========================================
// 日期: %Y-%m-%d, 时间: %Y-%m-%d %H:%M:%S, 列表: JSON 数组
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

pub(crate) fn parse_date(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| conversion_error(idx, format!("日期格式错误 '{}': {}", s, e)))
}

pub(crate) fn parse_opt_date(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|v| parse_date(idx, &v)).transpose()
}

pub(crate) fn parse_datetime(idx: usize, s: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| conversion_error(idx, format!("时间格式错误 '{}': {}", s, e)))
}

pub(crate) fn parse_opt_datetime(
    idx: usize,
    s: Option<String>,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    s.map(|v| parse_datetime(idx, &v)).transpose()
}

pub(crate) fn parse_json<T: DeserializeOwned>(idx: usize, s: &str) -> rusqlite::Result<T> {
    serde_json::from_str(s).map_err(|e| conversion_error(idx, format!("JSON 解析失败: {}", e)))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

pub(crate) fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub(crate) fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// 枚举列解析失败
pub(crate) fn invalid_enum(idx: usize, value: &str) -> rusqlite::Error {
    conversion_error(idx, format!("未知枚举值: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_and_datetime_codec() {
        let d = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(parse_date(0, &fmt_date(d)).unwrap(), d);

        let dt = d.and_hms_opt(20, 0, 0).unwrap();
        assert_eq!(fmt_datetime(dt), "2024-06-03 20:00:00");
        assert_eq!(parse_datetime(0, "2024-06-03 20:00:00").unwrap(), dt);

        assert!(parse_date(3, "06/03/2024").is_err());
    }

    #[test]
    fn test_json_list_codec() {
        let v: Vec<String> = parse_json(0, r#"["a","b"]"#).unwrap();
        assert_eq!(v, vec!["a".to_string(), "b".to_string()]);
        assert!(parse_json::<Vec<String>>(0, "not json").is_err());
    }
}
