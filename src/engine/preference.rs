// ==========================================
// 衣橱周计划系统 - 偏好学习引擎
// ==========================================
// 职责: 记录反馈信号; 按时间衰减聚合颜色/场合/天气偏好; 个性化权重
// 输入: preference_signal（只追加）
// 输出: PreferenceModel（单次请求快照）、个性化权重、用户画像
// 红线: 信号只追加, 衰减在读取时计算
// 红线: 学习层失败不得阻断评分（由评分引擎降级为中性）
// ==========================================

mod analysis;
mod signals;


pub use analysis::{
    acceptance_rate, ranked, PersonalizedWeights, PreferenceModel, PreferenceStat, UserType,
    WeatherPreference, MIN_SIGNALS_FOR_PERSONALIZATION,
};
pub use signals::{
    build_signal_batch, fan_out_factor, rated_value, signal_weight, time_decay,
    DEFAULT_HALF_LIFE_DAYS,
};

use crate::domain::outfit::{CandidateOutfit, Outfit};
use crate::domain::signal::SignalContext;
use crate::domain::types::SignalType;
use crate::engine::error::{EngineError, EngineResult};
use crate::i18n::t;
use crate::repository::PreferenceSignalRepository;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 构建偏好快照时读取的最近信号数
const OBSERVATION_WINDOW: usize = 2000;
/// 画像展示所需最少信号数
const MIN_SIGNALS_FOR_INSIGHTS: i64 = 5;
/// 画像展示的颜色/场合数量
const INSIGHT_TOP_N: usize = 3;

// ==========================================
// 衣物亲和度 / 用户画像
// ==========================================

/// 衣物亲和度（未衰减的信号和）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAffinity {
    pub item_id: String,
    pub score: f64,
    pub interactions: i64,
}

/// 用户风格画像
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInsights {
    pub has_data: bool,
    pub message: Option<String>,
    pub total_interactions: i64,
    pub acceptance_rate_pct: u32,
    pub favorite_colors: Vec<String>,
    pub favorite_occasions: Vec<String>,
    pub user_type: Option<UserType>,
    pub user_type_label: Option<String>,
    pub personalized_weights: Option<PersonalizedWeights>,
}

// ==========================================
// PreferenceLearningEngine
// ==========================================
pub struct PreferenceLearningEngine {
    signal_repo: Arc<PreferenceSignalRepository>,
    half_life_days: f64,
}

impl PreferenceLearningEngine {
    /// 创建偏好学习引擎
    ///
    /// # 参数
    /// - `signal_repo`: 信号仓储
    /// - `half_life_days`: 衰减半衰期（非正值回退为 30）
    pub fn new(signal_repo: Arc<PreferenceSignalRepository>, half_life_days: f64) -> Self {
        let half_life_days = if half_life_days > 0.0 {
            half_life_days
        } else {
            DEFAULT_HALF_LIFE_DAYS
        };
        Self {
            signal_repo,
            half_life_days,
        }
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }

    // ==========================================
    // 信号记录
    // ==========================================

    fn record(
        &self,
        user_id: &str,
        signal_type: SignalType,
        value: f64,
        outfit: Option<&Outfit>,
        context: SignalContext,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        let batch = build_signal_batch(user_id, signal_type, value, outfit, context, now);
        let written = self.signal_repo.append_batch(&batch)?;
        debug!(
            user_id,
            signal_type = %signal_type,
            outfit_id = outfit.map(|o| o.id.as_str()).unwrap_or(""),
            written,
            "记录偏好信号"
        );
        Ok(written)
    }

    /// 用户接受推荐穿搭（+1.0, 衣物 ×0.5）
    pub fn record_outfit_accepted(
        &self,
        outfit: &Outfit,
        context: SignalContext,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        let value = signal_weight(SignalType::Accepted);
        self.record(&outfit.user_id, SignalType::Accepted, value, Some(outfit), context, now)
    }

    /// 用户拒绝/换掉穿搭（−0.5, 衣物 ×0.3）
    pub fn record_outfit_rejected(
        &self,
        outfit: &Outfit,
        mut context: SignalContext,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        if context.reason.is_none() {
            context.reason = Some("swapped".to_string());
        }
        let value = signal_weight(SignalType::Rejected);
        self.record(&outfit.user_id, SignalType::Rejected, value, Some(outfit), context, now)
    }

    /// 用户穿着穿搭（+1.5, 衣物 ×0.7）
    pub fn record_outfit_worn(
        &self,
        outfit: &Outfit,
        context: SignalContext,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        let value = signal_weight(SignalType::Worn);
        self.record(&outfit.user_id, SignalType::Worn, value, Some(outfit), context, now)
    }

    /// 用户重新生成某天（−0.3, 不扇出）
    pub fn record_regeneration(
        &self,
        user_id: &str,
        previous: Option<&Outfit>,
        context: SignalContext,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        let value = signal_weight(SignalType::Regenerated);
        self.record(user_id, SignalType::Regenerated, value, previous, context, now)
    }

    /// 用户评分（0.5 × (rating − 3), 不扇出）
    pub fn record_outfit_rated(
        &self,
        outfit: &Outfit,
        rating: i32,
        now: NaiveDateTime,
    ) -> EngineResult<usize> {
        if !(1..=5).contains(&rating) {
            return Err(EngineError::InvalidInput(format!("评分超出范围 1-5: {}", rating)));
        }
        let context = SignalContext {
            rating: Some(rating),
            ..Default::default()
        };
        self.record(
            &outfit.user_id,
            SignalType::Rated,
            rated_value(rating),
            Some(outfit),
            context,
            now,
        )
    }

    // ==========================================
    // 模式分析
    // ==========================================

    /// 构建偏好快照
    #[instrument(skip(self))]
    pub fn load_model(&self, user_id: &str, now: NaiveDateTime) -> EngineResult<PreferenceModel> {
        let observations = self
            .signal_repo
            .list_observations(user_id, OBSERVATION_WINDOW)
            .map_err(|e| EngineError::Preference(e.to_string()))?;
        let model = PreferenceModel::from_observations(&observations, now, self.half_life_days);
        debug!(
            user_id,
            observations = model.observation_count,
            colors = model.colors.len(),
            occasions = model.occasions.len(),
            "偏好快照构建完成"
        );
        Ok(model)
    }

    /// 单个穿搭的偏好加成
    ///
    /// # 返回
    /// - [-1, 1]; 数据不足时为 0
    pub fn calculate_preference_boost(
        &self,
        user_id: &str,
        candidate: &CandidateOutfit,
        now: NaiveDateTime,
    ) -> EngineResult<f64> {
        let model = self.load_model(user_id, now)?;
        Ok(model.preference_boost(candidate).unwrap_or(0.0))
    }

    /// 颜色偏好（得分降序）
    pub fn analyze_color_preferences(
        &self,
        user_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<(String, PreferenceStat)>> {
        Ok(ranked(&self.load_model(user_id, now)?.colors))
    }

    /// 场合偏好（得分降序）
    pub fn analyze_style_preferences(
        &self,
        user_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<(String, PreferenceStat)>> {
        Ok(ranked(&self.load_model(user_id, now)?.occasions))
    }

    /// 接受率（穿搭级 accepted / (accepted + rejected)）
    pub fn acceptance_rate(&self, user_id: &str) -> EngineResult<f64> {
        let accepted = self.signal_repo.count_outfit_level(user_id, SignalType::Accepted)?;
        let rejected = self.signal_repo.count_outfit_level(user_id, SignalType::Rejected)?;
        Ok(acceptance_rate(accepted, rejected))
    }

    /// 个性化权重
    ///
    /// # 规则
    /// - 信号总数 < 10 → 固定缺省
    /// - 接受率 > 0.7 → 偏重 recency; < 0.4 → 偏重 preference; 否则均衡
    pub fn get_personalized_weights(&self, user_id: &str) -> EngineResult<PersonalizedWeights> {
        let total = self.signal_repo.count_by_user(user_id)?;
        if total < MIN_SIGNALS_FOR_PERSONALIZATION {
            return Ok(PersonalizedWeights::DEFAULT);
        }
        let rate = self.acceptance_rate(user_id)?;
        Ok(PersonalizedWeights::select(total, rate))
    }

    /// 衣物亲和度（信号和 / 次数, 总分降序）
    pub fn get_item_affinity_scores(&self, user_id: &str) -> EngineResult<Vec<ItemAffinity>> {
        let rows = self.signal_repo.item_affinity(user_id)?;
        Ok(rows
            .into_iter()
            .map(|r| ItemAffinity {
                item_id: r.item_id,
                score: (r.total_score * 100.0).round() / 100.0,
                interactions: r.signal_count,
            })
            .collect())
    }

    /// 用户风格画像
    pub fn get_user_profile_insights(
        &self,
        user_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<ProfileInsights> {
        let total = self.signal_repo.count_by_user(user_id)?;
        if total < MIN_SIGNALS_FOR_INSIGHTS {
            return Ok(ProfileInsights {
                has_data: false,
                message: Some(t("insights.no_data")),
                total_interactions: total,
                acceptance_rate_pct: 0,
                favorite_colors: Vec::new(),
                favorite_occasions: Vec::new(),
                user_type: None,
                user_type_label: None,
                personalized_weights: None,
            });
        }

        let model = self.load_model(user_id, now)?;
        let rate = self.acceptance_rate(user_id)?;
        let user_type = UserType::from_acceptance_rate(rate);

        Ok(ProfileInsights {
            has_data: true,
            message: None,
            total_interactions: total,
            acceptance_rate_pct: (rate * 100.0).round() as u32,
            favorite_colors: model.top_positive_colors(INSIGHT_TOP_N),
            favorite_occasions: model.top_positive_occasions(INSIGHT_TOP_N),
            user_type: Some(user_type),
            user_type_label: Some(t(user_type.i18n_key())),
            personalized_weights: Some(PersonalizedWeights::select(total, rate)),
        })
    }
}
