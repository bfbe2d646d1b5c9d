use super::signals::time_decay;
use crate::domain::outfit::CandidateOutfit;
use crate::domain::signal::SignalObservation;
use crate::domain::types::TempBand;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// 颜色分析窗口: 最近 500 条衣物级信号
pub const COLOR_WINDOW: usize = 500;
/// 场合分析窗口: 最近 300 条穿搭级信号
pub const OCCASION_WINDOW: usize = 300;
/// 天气分析窗口: 最近 200 条 accepted/worn 信号
pub const WEATHER_WINDOW: usize = 200;
/// 聚合可信所需的最少出现次数
pub const MIN_OCCURRENCES: usize = 2;

/// 学习不足时的固定权重阈值（信号总数）
pub const MIN_SIGNALS_FOR_PERSONALIZATION: i64 = 10;

const OCCASION_TERM_WEIGHT: f64 = 0.4;
const COLOR_TERM_WEIGHT: f64 = 0.2;
const HISTORY_TERM_WEIGHT: f64 = 0.4;

// ==========================================
// 聚合结果
// ==========================================

/// 单个取值（颜色/场合）的平均衰减分
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PreferenceStat {
    pub score: f64, // 衰减后加权和 / 出现次数
    pub count: usize,
}

/// 温度段接受率
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeatherPreference {
    pub acceptance_rate: f64,
    pub sample_size: usize,
}

/// 个性化权重（五项, 和为 1）
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonalizedWeights {
    pub weather: f64,
    pub occasion: f64,
    pub recency: f64,
    pub style: f64,
    pub preference: f64,
}

impl PersonalizedWeights {
    /// 信号不足时的缺省权重
    pub const DEFAULT: PersonalizedWeights = PersonalizedWeights {
        weather: 0.30,
        occasion: 0.25,
        recency: 0.20,
        style: 0.15,
        preference: 0.10,
    };
    /// 高接受率: 加大 recency 以增加多样性
    pub const VARIETY: PersonalizedWeights = PersonalizedWeights {
        weather: 0.30,
        occasion: 0.25,
        recency: 0.25,
        style: 0.10,
        preference: 0.10,
    };
    /// 低接受率: 加大 preference 以贴合已知喜好
    pub const EXPLOIT: PersonalizedWeights = PersonalizedWeights {
        weather: 0.25,
        occasion: 0.20,
        recency: 0.15,
        style: 0.15,
        preference: 0.25,
    };
    pub const BALANCED: PersonalizedWeights = PersonalizedWeights {
        weather: 0.28,
        occasion: 0.23,
        recency: 0.18,
        style: 0.13,
        preference: 0.18,
    };

    /// 按信号总数与接受率选择预设
    pub fn select(total_signals: i64, acceptance_rate: f64) -> Self {
        if total_signals < MIN_SIGNALS_FOR_PERSONALIZATION {
            Self::DEFAULT
        } else if acceptance_rate > 0.7 {
            Self::VARIETY
        } else if acceptance_rate < 0.4 {
            Self::EXPLOIT
        } else {
            Self::BALANCED
        }
    }

    pub fn sum(&self) -> f64 {
        self.weather + self.occasion + self.recency + self.style + self.preference
    }
}

/// 接受率 = accepted / (accepted + rejected), 无数据时 0.5
pub fn acceptance_rate(accepted: i64, rejected: i64) -> f64 {
    let total = accepted + rejected;
    if total <= 0 {
        return 0.5;
    }
    accepted as f64 / total as f64
}

/// 用户类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Adventurous,
    Balanced,
    Selective,
}

impl UserType {
    pub fn from_acceptance_rate(rate: f64) -> Self {
        if rate > 0.75 {
            UserType::Adventurous
        } else if rate > 0.5 {
            UserType::Balanced
        } else {
            UserType::Selective
        }
    }

    pub fn i18n_key(&self) -> &'static str {
        match self {
            UserType::Adventurous => "insights.user_type.adventurous",
            UserType::Balanced => "insights.user_type.balanced",
            UserType::Selective => "insights.user_type.selective",
        }
    }
}

// ==========================================
// PreferenceModel - 单次请求内的偏好快照
// ==========================================
// 由信号观测一次性构建, 评分阶段只读
#[derive(Debug, Clone, Default)]
pub struct PreferenceModel {
    pub colors: BTreeMap<String, PreferenceStat>,
    pub occasions: BTreeMap<String, PreferenceStat>,
    pub weather: BTreeMap<TempBand, WeatherPreference>,
    outfit_history: HashMap<String, (f64, usize)>,
    pub observation_count: usize,
}

impl PreferenceModel {
    /// 从信号观测构建
    ///
    /// # 参数
    /// - `observations`: 按时间倒序的信号观测
    /// - `now`: 衰减基准时间
    /// - `half_life_days`: 半衰期
    pub fn from_observations(
        observations: &[SignalObservation],
        now: NaiveDateTime,
        half_life_days: f64,
    ) -> Self {
        let decay = |o: &SignalObservation| time_decay(o.signal.created_at, now, half_life_days);

        // 颜色: 衣物级信号
        let mut color_acc: HashMap<String, (f64, usize)> = HashMap::new();
        for obs in observations
            .iter()
            .filter(|o| o.signal.item_id.is_some())
            .take(COLOR_WINDOW)
        {
            let color = match normalize(obs.item_color.as_deref()) {
                Some(c) => c,
                None => continue,
            };
            let entry = color_acc.entry(color).or_insert((0.0, 0));
            entry.0 += obs.signal.value * decay(obs);
            entry.1 += 1;
        }

        // 场合: 最近的穿搭级信号
        let mut occasion_acc: HashMap<String, (f64, usize)> = HashMap::new();
        for obs in observations
            .iter()
            .filter(|o| o.signal.is_outfit_level())
            .take(OCCASION_WINDOW)
        {
            if let Some(occasion) = normalize(obs.outfit_occasion.as_deref()) {
                let entry = occasion_acc.entry(occasion).or_insert((0.0, 0));
                entry.0 += obs.signal.value * decay(obs);
                entry.1 += 1;
            }
        }

        // 单穿搭历史: 快照内该穿搭的全部穿搭级信号
        let mut outfit_history: HashMap<String, (f64, usize)> = HashMap::new();
        for obs in observations.iter().filter(|o| o.signal.is_outfit_level()) {
            if let Some(outfit_id) = &obs.signal.outfit_id {
                let entry = outfit_history.entry(outfit_id.clone()).or_insert((0.0, 0));
                entry.0 += obs.signal.value * decay(obs);
                entry.1 += 1;
            }
        }

        // 天气: accepted / worn 信号的温度段接受率
        let mut weather_acc: BTreeMap<TempBand, (usize, usize)> = BTreeMap::new();
        for obs in observations
            .iter()
            .filter(|o| o.signal.signal_type.is_adoption())
            .take(WEATHER_WINDOW)
        {
            if let Some(temp) = obs.signal.context.temperature {
                let entry = weather_acc.entry(TempBand::from_celsius(temp)).or_insert((0, 0));
                entry.1 += 1;
                if obs.signal.value > 0.0 {
                    entry.0 += 1;
                }
            }
        }

        Self {
            colors: reliable_stats(color_acc),
            occasions: reliable_stats(occasion_acc),
            weather: weather_acc
                .into_iter()
                .map(|(band, (accepts, total))| {
                    let rate = if total > 0 {
                        accepts as f64 / total as f64
                    } else {
                        0.0
                    };
                    (
                        band,
                        WeatherPreference {
                            acceptance_rate: rate,
                            sample_size: total,
                        },
                    )
                })
                .collect(),
            outfit_history,
            observation_count: observations.len(),
        }
    }

    /// 偏好加成 ∈ [-1, 1]
    ///
    /// # 规则
    /// - 场合项: 场合平均分 × 0.4
    /// - 颜色项: 穿搭内有记录颜色的平均分均值 × 0.2
    /// - 历史项: 该穿搭自身信号的平均衰减值 × 0.4
    /// - 仅纳入有数据的项, 取平均后截断
    ///
    /// # 返回
    /// - None: 三项均无数据
    pub fn preference_boost(&self, candidate: &CandidateOutfit) -> Option<f64> {
        let mut terms: Vec<f64> = Vec::with_capacity(3);

        if let Some(occasion) = normalize(candidate.outfit.occasion.as_deref()) {
            if let Some(stat) = self.occasions.get(&occasion) {
                terms.push(stat.score * OCCASION_TERM_WEIGHT);
            }
        }

        let color_scores: Vec<f64> = candidate
            .colors()
            .iter()
            .filter_map(|c| self.colors.get(c).map(|s| s.score))
            .collect();
        if !color_scores.is_empty() {
            let mean = color_scores.iter().sum::<f64>() / color_scores.len() as f64;
            terms.push(mean * COLOR_TERM_WEIGHT);
        }

        if !candidate.is_new {
            if let Some((sum, count)) = self.outfit_history.get(candidate.id()) {
                if *count > 0 {
                    terms.push(sum / *count as f64 * HISTORY_TERM_WEIGHT);
                }
            }
        }

        if terms.is_empty() {
            return None;
        }
        let boost = terms.iter().sum::<f64>() / terms.len() as f64;
        Some(boost.clamp(-1.0, 1.0))
    }

    /// 得分为正的前 n 个颜色
    pub fn top_positive_colors(&self, n: usize) -> Vec<String> {
        top_positive(&self.colors, n)
    }

    /// 得分为正的前 n 个场合
    pub fn top_positive_occasions(&self, n: usize) -> Vec<String> {
        top_positive(&self.occasions, n)
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn reliable_stats(acc: HashMap<String, (f64, usize)>) -> BTreeMap<String, PreferenceStat> {
    acc.into_iter()
        .filter(|(_, (_, count))| *count >= MIN_OCCURRENCES)
        .map(|(key, (sum, count))| {
            (
                key,
                PreferenceStat {
                    score: sum / count as f64,
                    count,
                },
            )
        })
        .collect()
}

/// 按得分降序排列（并列按键升序）
pub fn ranked(stats: &BTreeMap<String, PreferenceStat>) -> Vec<(String, PreferenceStat)> {
    let mut list: Vec<(String, PreferenceStat)> =
        stats.iter().map(|(k, v)| (k.clone(), *v)).collect();
    list.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    list
}

fn top_positive(stats: &BTreeMap<String, PreferenceStat>, n: usize) -> Vec<String> {
    ranked(stats)
        .into_iter()
        .take(n)
        .filter(|(_, s)| s.score > 0.0)
        .map(|(k, _)| k)
        .collect()
}

