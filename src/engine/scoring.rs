// ==========================================
// 衣橱周计划系统 - 评分引擎
// ==========================================
// 职责: 天气/场合/新近度/偏好/风格/配色 六项加权评分
// 输入: 候选穿搭 + 单日上下文（天气、事件、穿着历史、风格档案）
// 输出: ScoreBreakdown（确定性基础分与随机扰动分离）
// 红线: 每项子分 ∈ [0, 1]; 周计划权重和为 1
// 红线: 偏好学习失败不阻断评分, 按中性 0.5 计并标注来源
// ==========================================

mod daily;
mod factors;

#[cfg(test)]
mod tests;

pub use daily::{color_harmony, daily_score, season_of, DailyPreferences, DailyScore};
pub use factors::{
    color_score, is_neutral, occasion_score, recency_score, style_score, weather_score,
    COLD_BELOW, HOT_ABOVE, NEUTRAL_COLORS,
};

use crate::domain::calendar::{CalendarEvent, StyleProfile};
use crate::domain::outfit::CandidateOutfit;
use crate::domain::plan::ScoreBreakdown;
use crate::domain::types::PreferenceOutcome;
use crate::domain::weather::DailyForecast;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::preference::{PersonalizedWeights, PreferenceModel};
use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// 偏好缺失/失败时的中性分
pub const NEUTRAL_PREFERENCE: f64 = 0.5;
/// 缺省随机扰动幅度
pub const DEFAULT_JITTER: f64 = 0.15;
/// 个性化权重折算到六项时配色的固定权重
const PERSONALIZED_COLOR_WEIGHT: f64 = 0.06;

// ==========================================
// ScoringWeights - 周计划评分权重
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringWeights {
    pub weather: f64,
    pub occasion: f64,
    pub recency: f64,
    pub preference: f64,
    pub style: f64,
    pub color: f64,
}

impl ScoringWeights {
    /// 周计划固定权重
    pub const WEEKLY: ScoringWeights = ScoringWeights {
        weather: 0.28,
        occasion: 0.23,
        recency: 0.18,
        preference: 0.15,
        style: 0.10,
        color: 0.06,
    };

    /// 由五项个性化权重折算（整体 ×0.94, 配色固定 0.06）
    pub fn from_personalized(p: &PersonalizedWeights) -> Self {
        let scale = 1.0 - PERSONALIZED_COLOR_WEIGHT;
        Self {
            weather: p.weather * scale,
            occasion: p.occasion * scale,
            recency: p.recency * scale,
            preference: p.preference * scale,
            style: p.style * scale,
            color: PERSONALIZED_COLOR_WEIGHT,
        }
    }

    pub fn sum(&self) -> f64 {
        self.weather + self.occasion + self.recency + self.preference + self.style + self.color
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::WEEKLY
    }
}

// ==========================================
// PreferenceSource - 偏好加成来源
// ==========================================
pub trait PreferenceSource: Send + Sync {
    /// 偏好加成 ∈ [-1, 1]
    ///
    /// # 返回
    /// - Ok(Some): 有学习数据
    /// - Ok(None): 数据不足
    /// - Err: 该穿搭计算失败
    fn preference_boost(&self, candidate: &CandidateOutfit) -> EngineResult<Option<f64>>;
}

impl PreferenceSource for PreferenceModel {
    fn preference_boost(&self, candidate: &CandidateOutfit) -> EngineResult<Option<f64>> {
        match PreferenceModel::preference_boost(self, candidate) {
            Some(b) if !b.is_finite() => Err(EngineError::Preference(format!(
                "非有限偏好加成: outfit_id={}",
                candidate.id()
            ))),
            other => Ok(other),
        }
    }
}

/// 评分引擎可用的偏好状态
pub enum PreferenceState<'a> {
    /// 未注入学习引擎
    Unavailable,
    /// 学习引擎加载失败
    LoadFailed,
    Ready(&'a dyn PreferenceSource),
}

// ==========================================
// DayContext - 单日评分上下文
// ==========================================
pub struct DayContext<'a> {
    pub date: NaiveDate,
    pub weather: &'a DailyForecast,
    pub events: &'a [CalendarEvent],
    pub wear_history: &'a HashMap<String, NaiveDate>,
    pub style_profile: Option<&'a StyleProfile>,
}

// ==========================================
// ScoringEngine
// ==========================================
pub struct ScoringEngine<'a> {
    weights: ScoringWeights,
    jitter: f64,
    preference: PreferenceState<'a>,
}

impl<'a> ScoringEngine<'a> {
    /// 创建评分引擎
    ///
    /// # 参数
    /// - `weights`: 六项权重
    /// - `jitter`: 随机扰动幅度（截断到 [0, 1]）
    /// - `preference`: 偏好来源
    pub fn new(weights: ScoringWeights, jitter: f64, preference: PreferenceState<'a>) -> Self {
        Self {
            weights,
            jitter: jitter.clamp(0.0, 1.0),
            preference,
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// 偏好子分（[-1, 1] 映射到 [0, 1]）
    pub fn preference_score(&self, candidate: &CandidateOutfit) -> (f64, PreferenceOutcome) {
        match &self.preference {
            PreferenceState::Unavailable => (NEUTRAL_PREFERENCE, PreferenceOutcome::Unavailable),
            PreferenceState::LoadFailed => (NEUTRAL_PREFERENCE, PreferenceOutcome::Failed),
            PreferenceState::Ready(source) => match source.preference_boost(candidate) {
                Ok(Some(boost)) => ((boost + 1.0) / 2.0, PreferenceOutcome::Learned),
                Ok(None) => (NEUTRAL_PREFERENCE, PreferenceOutcome::NoData),
                Err(e) => {
                    warn!(outfit_id = candidate.id(), error = %e, "偏好评分失败，按中性处理");
                    (NEUTRAL_PREFERENCE, PreferenceOutcome::Failed)
                }
            },
        }
    }

    /// 确定性评分（不含随机扰动）
    pub fn score_base(&self, candidate: &CandidateOutfit, ctx: &DayContext<'_>) -> ScoreBreakdown {
        let outfit = &candidate.outfit;
        let weather = weather_score(candidate, ctx.weather);
        let occasion = occasion_score(outfit, ctx.events);
        let recency = recency_score(ctx.wear_history.get(candidate.id()).copied(), ctx.date);
        let (preference, preference_outcome) = self.preference_score(candidate);
        let style = style_score(outfit, ctx.style_profile);
        let color = color_score(&candidate.colors());

        let w = &self.weights;
        let base = weather * w.weather
            + occasion * w.occasion
            + recency * w.recency
            + preference * w.preference
            + style * w.style
            + color * w.color;
        let base = base.clamp(0.0, 1.0);

        ScoreBreakdown {
            weather,
            occasion,
            recency,
            preference,
            style,
            color,
            base,
            jitter: 0.0,
            total: base,
            preference_outcome,
        }
    }

    /// 完整评分: 基础分 + [−jitter, +jitter] 均匀扰动, 截断到 [0, 1]
    pub fn score<R: Rng + ?Sized>(
        &self,
        candidate: &CandidateOutfit,
        ctx: &DayContext<'_>,
        rng: &mut R,
    ) -> ScoreBreakdown {
        let mut breakdown = self.score_base(candidate, ctx);
        let jitter = if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        breakdown.jitter = jitter;
        breakdown.total = (breakdown.base + jitter).clamp(0.0, 1.0);
        breakdown
    }

    /// 批量评分并按总分降序
    pub fn score_all<R: Rng + ?Sized>(
        &self,
        candidates: &[&'a CandidateOutfit],
        ctx: &DayContext<'_>,
        rng: &mut R,
    ) -> Vec<ScoredCandidate<'a>> {
        let mut scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .map(|c| ScoredCandidate {
                candidate: c,
                scores: self.score(c, ctx, rng),
            })
            .collect();
        sort_by_total(&mut scored);
        scored
    }
}

/// 已评分候选
#[derive(Debug, Clone, Copy)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a CandidateOutfit,
    pub scores: ScoreBreakdown,
}

/// 按总分降序（稳定排序, 并列保持输入顺序）
pub fn sort_by_total(scored: &mut [ScoredCandidate<'_>]) {
    scored.sort_by(|a, b| {
        b.scores
            .total
            .partial_cmp(&a.scores.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}
