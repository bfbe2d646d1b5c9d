use super::factors::is_neutral;
use crate::domain::calendar::StyleProfile;
use crate::domain::outfit::Outfit;
use crate::domain::wardrobe::ClothingItem;
use crate::i18n::t_with_args;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

const BASE: f64 = 0.35;
const COLOR_WEIGHT: f64 = 0.25;
const PREFERENCE_WEIGHT: f64 = 0.30;
const STYLE_WEIGHT: f64 = 0.25;
const SEASON_WEIGHT: f64 = 0.20;

const FAVORITE_COLOR_WEIGHT: f64 = 2.0;
const FAVORITE_CATEGORY_WEIGHT: f64 = 1.5;
const WORN_WEIGHT_PER_WEAR: f64 = 0.5;
const WORN_WEIGHT_CAP: f64 = 3.0;

// ==========================================
// DailyPreferences - 即时推荐的个人偏好
// ==========================================
// 来自收藏衣物与穿过的穿搭
#[derive(Debug, Clone, Default)]
pub struct DailyPreferences {
    pub color_weights: HashMap<String, f64>,
    pub category_weights: HashMap<String, f64>,
}

impl DailyPreferences {
    /// 构建个人偏好
    ///
    /// # 参数
    /// - `items`: 用户可穿衣物
    /// - `worn_outfits`: 穿过的穿搭及其衣物
    pub fn build(items: &[ClothingItem], worn_outfits: &[(Outfit, Vec<ClothingItem>)]) -> Self {
        let mut prefs = DailyPreferences::default();

        for item in items.iter().filter(|i| i.favorite) {
            if let Some(color) = item.normalized_color() {
                *prefs.color_weights.entry(color).or_insert(0.0) += FAVORITE_COLOR_WEIGHT;
            }
            *prefs
                .category_weights
                .entry(item.category.clone())
                .or_insert(0.0) += FAVORITE_CATEGORY_WEIGHT;
        }

        for (outfit, outfit_items) in worn_outfits.iter().filter(|(o, _)| o.times_worn > 0) {
            let weight = (outfit.times_worn as f64 * WORN_WEIGHT_PER_WEAR).min(WORN_WEIGHT_CAP);
            for item in outfit_items {
                if let Some(color) = item.normalized_color() {
                    *prefs.color_weights.entry(color).or_insert(0.0) += weight;
                }
                *prefs
                    .category_weights
                    .entry(item.category.clone())
                    .or_insert(0.0) += weight * 0.5;
            }
        }
        prefs
    }
}

// ==========================================
// DailyScore - 即时推荐评分
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct DailyScore {
    pub color_harmony: f64,
    pub personal_preference: f64,
    pub style: f64,
    pub season_match: f64,
    pub total: f64,
    pub reason: String,
}

/// 日期所属季节（北半球）
pub fn season_of(date: NaiveDate) -> &'static str {
    match date.month() {
        12 | 1 | 2 => "winter",
        3..=5 => "spring",
        6..=8 => "summer",
        _ => "fall",
    }
}

/// 两两配色和谐度均值
///
/// # 规则
/// - 任一为中性色 0.9, 相同颜色 0.8, 其余 0.5
/// - 少于 2 个颜色 → 0.5
pub fn color_harmony(colors: &[String]) -> f64 {
    if colors.len() < 2 {
        return 0.5;
    }
    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..colors.len() {
        for j in (i + 1)..colors.len() {
            let (a, b) = (&colors[i], &colors[j]);
            total += if is_neutral(a) || is_neutral(b) {
                0.9
            } else if a == b {
                0.8
            } else {
                0.5
            };
            pairs += 1;
        }
    }
    total / pairs as f64
}

/// 即时推荐评分
///
/// total = min(1, 0.35 + 配色×0.25 + 个人偏好×0.30 + 风格×0.25 + 季节×0.20)
pub fn daily_score(
    items: &[ClothingItem],
    prefs: &DailyPreferences,
    profile: Option<&StyleProfile>,
    date: NaiveDate,
) -> DailyScore {
    let count = items.len().max(1) as f64;
    let colors: Vec<String> = items.iter().filter_map(|i| i.normalized_color()).collect();
    let color = color_harmony(&colors);

    let mut pref_raw = 0.0;
    for item in items {
        if item.favorite {
            pref_raw += 0.5;
        }
        if let Some(c) = item.normalized_color() {
            if let Some(w) = prefs.color_weights.get(&c) {
                pref_raw += w * 0.1;
            }
        }
        if let Some(w) = prefs.category_weights.get(&item.category) {
            pref_raw += w * 0.1;
        }
    }
    let preference = (pref_raw / count).min(1.0);

    let style = match profile {
        Some(p) => {
            let styles = p.normalized_styles();
            if styles.is_empty() {
                0.0
            } else {
                let matching = items
                    .iter()
                    .filter(|i| {
                        i.tags
                            .iter()
                            .any(|t| styles.contains(&t.trim().to_lowercase()))
                    })
                    .count();
                matching as f64 / count
            }
        }
        None => 0.0,
    };

    let season = season_of(date);
    let season_match = items
        .iter()
        .filter(|i| i.seasons.iter().any(|s| s.eq_ignore_ascii_case(season)))
        .count() as f64
        / count;

    let total = (BASE
        + color * COLOR_WEIGHT
        + preference * PREFERENCE_WEIGHT
        + style * STYLE_WEIGHT
        + season_match * SEASON_WEIGHT)
        .min(1.0);

    DailyScore {
        color_harmony: color,
        personal_preference: preference,
        style,
        season_match,
        total,
        reason: daily_reason(color, preference, season_match, season),
    }
}

fn daily_reason(color: f64, preference: f64, season_match: f64, season: &str) -> String {
    let mut reasons = Vec::new();
    if color > 0.7 {
        reasons.push(t_with_args("recommendation.harmonious_colors", &[]));
    }
    if preference > 0.6 {
        reasons.push(t_with_args("recommendation.matches_style", &[]));
    }
    if season_match > 0.5 {
        reasons.push(t_with_args("recommendation.season", &[("season", season)]));
    }
    if reasons.is_empty() {
        return t_with_args("recommendation.fresh", &[]);
    }
    t_with_args("recommendation.because", &[("reasons", &reasons.join(", "))])
}
