// ==========================================
// 推荐理由 / 周计划说明
// ==========================================
// 说明: 文本由 locales 模板拼装, 结果必须非空
// ==========================================

use crate::domain::calendar::CalendarEvent;
use crate::domain::outfit::Outfit;
use crate::domain::plan::ScoreBreakdown;
use crate::domain::weather::DailyForecast;
use crate::engine::scoring::{COLD_BELOW, HOT_ABOVE};
use crate::i18n::{t, t_with_args};

const WEATHER_REASON_MIN: f64 = 0.8;
const OCCASION_REASON_MIN: f64 = 0.7;
const STYLE_REASON_MIN: f64 = 0.7;
const RECENCY_REASON_MIN: f64 = 0.9;
/// 理由中列出的事件标题数
const MAX_EVENT_TITLES: usize = 2;

/// 单日推荐理由
///
/// # 规则
/// - 天气 ≥0.8: 按气温给出 凉爽/温暖/适宜
/// - 有事件且场合 ≥0.7: 列出至多 2 个事件标题; 无事件: 休闲日
/// - 风格 ≥0.7 / 收藏 / 新近度 ≥0.9 各追加一条
/// - 无任何命中时使用通用理由
pub fn selection_reason(
    outfit: &Outfit,
    scores: &ScoreBreakdown,
    weather: &DailyForecast,
    events: &[CalendarEvent],
) -> String {
    let mut reasons = Vec::new();

    if scores.weather >= WEATHER_REASON_MIN {
        let key = if weather.temp_avg < COLD_BELOW {
            "reason.cool_weather"
        } else if weather.temp_avg > HOT_ABOVE {
            "reason.warm_weather"
        } else {
            "reason.ideal_temperature"
        };
        reasons.push(t(key));
    }

    if !events.is_empty() && scores.occasion >= OCCASION_REASON_MIN {
        let titles: Vec<&str> = events
            .iter()
            .take(MAX_EVENT_TITLES)
            .map(|e| e.title.as_str())
            .collect();
        reasons.push(t_with_args(
            "reason.matches_events",
            &[("events", &titles.join(", "))],
        ));
    } else if events.is_empty() {
        reasons.push(t("reason.casual_day"));
    }

    if scores.style >= STYLE_REASON_MIN {
        reasons.push(t("reason.style_fit"));
    }
    if outfit.favorite {
        reasons.push(t("reason.favorite"));
    }
    if scores.recency >= RECENCY_REASON_MIN {
        reasons.push(t("reason.not_worn_recently"));
    }
    if reasons.is_empty() {
        reasons.push(t("reason.generic"));
    }

    t_with_args("reason.template", &[("reasons", &reasons.join(", "))])
}

/// 周计划整体说明
///
/// # 规则
/// - 平均气温 <15 凉爽, >28 温暖, 否则温和
/// - 事件数 0 / 1（带标题）/ 多个
/// - 天气使用了缺省值时追加低置信度提示
pub fn plan_reasoning(
    weather: &[DailyForecast],
    events: &[CalendarEvent],
    weather_degraded: bool,
) -> String {
    let avg_temp = if weather.is_empty() {
        crate::domain::weather::DEFAULT_TEMPERATURE
    } else {
        weather.iter().map(|w| w.temp_avg).sum::<f64>() / weather.len() as f64
    };

    let weather_summary = if avg_temp < COLD_BELOW {
        t("plan.weather_cool")
    } else if avg_temp > HOT_ABOVE {
        t("plan.weather_warm")
    } else {
        t("plan.weather_moderate")
    };

    let event_summary = match events {
        [] => t("plan.events_none"),
        [only] => t_with_args("plan.events_one", &[("title", &only.title)]),
        many => t_with_args("plan.events_many", &[("count", &many.len().to_string())]),
    };

    let mut text = t_with_args(
        "plan.reasoning",
        &[("weather", &weather_summary), ("events", &event_summary)],
    );
    if weather_degraded {
        text.push(' ');
        text.push_str(&t("plan.weather_degraded"));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outfit::OutfitSource;
    use crate::domain::types::PreferenceOutcome;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn outfit(favorite: bool) -> Outfit {
        Outfit {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            name: "o1".to_string(),
            items: vec![],
            min_temperature: None,
            max_temperature: None,
            suitable_weather: vec![],
            style_tags: vec![],
            occasion: None,
            season: None,
            favorite,
            rating: None,
            times_worn: 0,
            last_worn: None,
            source: OutfitSource::User,
            created_at: date().and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn scores(v: f64) -> ScoreBreakdown {
        ScoreBreakdown {
            weather: v,
            occasion: v,
            recency: v,
            preference: 0.5,
            style: v,
            color: v,
            base: v,
            jitter: 0.0,
            total: v,
            preference_outcome: PreferenceOutcome::NoData,
        }
    }

    fn event(title: &str) -> CalendarEvent {
        CalendarEvent {
            id: title.to_string(),
            user_id: "u1".to_string(),
            title: title.to_string(),
            date: date(),
            occasion: Some("work".to_string()),
        }
    }

    #[test]
    fn test_selection_reason_never_empty() {
        let w = DailyForecast::neutral(date());
        let low = selection_reason(&outfit(false), &scores(0.1), &w, &[event("Standup")]);
        assert!(!low.is_empty());

        let high = selection_reason(
            &outfit(true),
            &scores(1.0),
            &w,
            &[event("Standup"), event("Review"), event("Dinner")],
        );
        assert!(!high.is_empty());
        assert!(high.contains("Standup"));
        assert!(high.contains("Review"));
        assert!(!high.contains("Dinner"));
    }

    #[test]
    fn test_plan_reasoning_lists_single_event_title() {
        let week: Vec<DailyForecast> = (0..7)
            .map(|d| DailyForecast::neutral(date() + chrono::Duration::days(d)))
            .collect();
        let text = plan_reasoning(&week, &[event("Board meeting")], false);
        assert!(text.contains("Board meeting"));

        let degraded = plan_reasoning(&week, &[], true);
        assert!(degraded.len() > plan_reasoning(&week, &[], false).len());
    }
}
