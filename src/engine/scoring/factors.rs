use crate::domain::calendar::{CalendarEvent, StyleProfile};
use crate::domain::outfit::{CandidateOutfit, Outfit};
use crate::domain::weather::DailyForecast;
use chrono::NaiveDate;

/// 低于该温度按寒冷处理（°C）
pub const COLD_BELOW: f64 = 15.0;
/// 高于该温度按炎热处理（°C）
pub const HOT_ABOVE: f64 = 28.0;
/// 温度区间外的容差（°C）
const BOUND_TOLERANCE: f64 = 5.0;

const WARM_KEYWORDS: &[&str] = &["jacket", "coat", "sweater", "hoodie", "cardigan", "wool", "warm"];
const LIGHT_KEYWORDS: &[&str] = &["t-shirt", "shorts", "tank", "sandal", "linen", "light"];
const RAIN_TAGS: &[&str] = &["rain", "rainy"];

/// 与任何颜色都搭配的中性色
pub const NEUTRAL_COLORS: &[&str] = &[
    "black", "white", "gray", "grey", "beige", "cream", "navy", "tan", "brown",
];

/// 事件场合 → 兼容的穿搭场合
const OCCASION_MAP: &[(&str, &[&str])] = &[
    ("work", &["work"]),
    ("casual", &["casual"]),
    ("formal", &["formal", "evening"]),
    ("party", &["evening", "date"]),
    ("date", &["date", "evening"]),
    ("sports", &["sport"]),
    ("travel", &["travel", "casual"]),
];

pub fn is_neutral(color: &str) -> bool {
    NEUTRAL_COLORS.contains(&color)
}

fn lower(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// 天气得分
///
/// # 规则
/// - 声明温度区间: 区间内 1.0, 距边界 5° 内 0.7, 否则 0.3
/// - 未声明: 按衣物关键字, <15° 看保暖件, >28° 看轻薄件, 其余 0.7
/// - 下雨: 声明 rain/rainy 标签 +0.2, 否则 −0.2（下限 0.2）
pub fn weather_score(candidate: &CandidateOutfit, weather: &DailyForecast) -> f64 {
    let outfit = &candidate.outfit;
    let temp = weather.temp_avg;

    let mut score = match (outfit.min_temperature, outfit.max_temperature) {
        (Some(min), Some(max)) => {
            if min <= temp && temp <= max {
                1.0
            } else if (temp - min).abs() <= BOUND_TOLERANCE || (temp - max).abs() <= BOUND_TOLERANCE {
                0.7
            } else {
                0.3
            }
        }
        _ => {
            let count = |keywords: &[&str]| {
                candidate
                    .items
                    .iter()
                    .filter(|i| {
                        let text = i.keyword_text();
                        keywords.iter().any(|k| text.contains(k))
                    })
                    .count() as f64
            };
            if temp < COLD_BELOW {
                (0.5 + count(WARM_KEYWORDS) * 0.2).min(1.0)
            } else if temp > HOT_ABOVE {
                (0.5 + count(LIGHT_KEYWORDS) * 0.2).min(1.0)
            } else {
                0.7
            }
        }
    };

    if weather.condition.to_lowercase().contains("rain") {
        let rain_ready = outfit
            .suitable_weather
            .iter()
            .any(|w| RAIN_TAGS.contains(&w.trim().to_lowercase().as_str()));
        score = if rain_ready {
            (score + 0.2).min(1.0)
        } else {
            (score - 0.2).max(0.2)
        };
    }
    score
}

/// 场合得分
///
/// # 规则
/// - 无事件: casual/weekend 0.9, work 0.7, 其余 0.5
/// - 有事件: 完全匹配 1.0, 映射表兼容 0.8, casual/work 兜底 0.5, 否则 0.4
pub fn occasion_score(outfit: &Outfit, events: &[CalendarEvent]) -> f64 {
    let outfit_occasion = lower(outfit.occasion.as_deref());
    let occ = outfit_occasion.as_deref();

    if events.is_empty() {
        return match occ {
            Some("casual") | Some("weekend") => 0.9,
            Some("work") => 0.7,
            _ => 0.5,
        };
    }

    let mut best: f64 = 0.0;
    for event in events {
        let event_occasion = lower(event.occasion.as_deref());
        let compatible = event_occasion
            .as_deref()
            .and_then(|e| OCCASION_MAP.iter().find(|(k, _)| *k == e))
            .map(|(_, v)| *v)
            .unwrap_or(&[]);

        if occ.is_some() && event_occasion.as_deref() == occ {
            best = best.max(1.0);
        } else if occ.map(|o| compatible.contains(&o)).unwrap_or(false) {
            best = best.max(0.8);
        } else if matches!(occ, Some("casual") | Some("work")) {
            best = best.max(0.5);
        }
    }

    if best > 0.0 {
        best
    } else {
        0.4
    }
}

/// 新近度得分（距上次穿着天数的阶梯函数, 单调不减）
pub fn recency_score(last_worn: Option<NaiveDate>, target: NaiveDate) -> f64 {
    let last = match last_worn {
        Some(d) => d,
        None => return 1.0,
    };
    let days = (target - last).num_days();
    if days <= 3 {
        0.2
    } else if days <= 7 {
        0.5
    } else if days <= 14 {
        0.8
    } else {
        1.0
    }
}

/// 风格得分
///
/// # 规则
/// - 无风格档案 → 0.6
/// - 0.5 + min(0.4, 0.15 × 匹配风格数) + 收藏 0.2 + (评分 − 3) × 0.1, 截断到 [0, 1]
pub fn style_score(outfit: &Outfit, profile: Option<&StyleProfile>) -> f64 {
    let profile = match profile {
        Some(p) => p,
        None => return 0.6,
    };

    let mut score = 0.5;
    let tags: Vec<String> = outfit.style_tags.iter().map(|t| t.trim().to_lowercase()).collect();
    let matching = profile
        .normalized_styles()
        .iter()
        .filter(|s| tags.contains(s))
        .count();
    if matching > 0 {
        score += (matching as f64 * 0.15).min(0.4);
    }
    if outfit.favorite {
        score += 0.2;
    }
    if let Some(rating) = outfit.rating {
        score += (rating - 3) as f64 * 0.1;
    }
    score.clamp(0.0, 1.0)
}

/// 配色得分（周计划）
///
/// # 规则
/// - 少于 2 个颜色 → 0.7
/// - 非中性色 ≤ 2 且至少 1 个中性色 → 0.9
/// - 非中性色 ≤ 3 → 0.7
/// - 否则 0.5
pub fn color_score(colors: &[String]) -> f64 {
    if colors.len() < 2 {
        return 0.7;
    }
    let neutral = colors.iter().filter(|c| is_neutral(c)).count();
    let accent = colors.len() - neutral;
    if accent <= 2 && neutral >= 1 {
        0.9
    } else if accent <= 3 {
        0.7
    } else {
        0.5
    }
}
