// ==========================================
// 衣橱周计划系统 - 周计划编排器
// ==========================================
// 职责: 驱动 天气/事件/候选池 → 评分 → 选择 → 持久化 的整周流程
// 职责: 日计划状态机（重新生成/接受/替换/已穿/跳过）
// 红线: 整周生成 = 整周替换, 单事务; 失败时旧计划保持原样
// 红线: 同一周内主推荐不重复（候选池不足 7 时例外）
// 红线: worn 为终态
// ==========================================

mod generate;
mod pool;
mod reason;
mod slot_ops;

pub use reason::{plan_reasoning, selection_reason};

use crate::config::{PlannerConfigReader, PlannerSettings};
use crate::domain::plan::{DailyPlanSlot, WeeklyPlan};
use crate::domain::signal::SignalContext;
use crate::domain::weather::DailyForecast;
use crate::engine::availability::WardrobeAvailabilityTracker;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{OptionalEventPublisher, PlanEventPublisher};
use crate::engine::preference::{PreferenceLearningEngine, PreferenceModel};
use crate::engine::repositories::PlannerRepositories;
use crate::engine::scoring::{PreferenceState, ScoringWeights};
use crate::repository::RepositoryError;
use crate::weather::WeatherProvider;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::warn;

// ==========================================
// LoadedPreference - 单次请求的偏好快照
// ==========================================
pub(crate) enum LoadedPreference {
    Unavailable,
    Failed,
    Model(PreferenceModel),
}

impl LoadedPreference {
    pub(crate) fn state(&self) -> PreferenceState<'_> {
        match self {
            LoadedPreference::Unavailable => PreferenceState::Unavailable,
            LoadedPreference::Failed => PreferenceState::LoadFailed,
            LoadedPreference::Model(model) => PreferenceState::Ready(model),
        }
    }
}

// ==========================================
// WeeklyPlanOrchestrator - 周计划编排器
// ==========================================
pub struct WeeklyPlanOrchestrator<C>
where
    C: PlannerConfigReader,
{
    repos: PlannerRepositories,
    availability: Arc<WardrobeAvailabilityTracker>,
    learning: Option<Arc<PreferenceLearningEngine>>,
    weather: Arc<dyn WeatherProvider>,
    config: Arc<C>,
    event_publisher: OptionalEventPublisher,
}

impl<C> WeeklyPlanOrchestrator<C>
where
    C: PlannerConfigReader,
{
    /// 创建编排器
    ///
    /// # 参数
    /// - `repos`: 仓储集合
    /// - `availability`: 衣物可用性跟踪
    /// - `learning`: 偏好学习引擎（None 时偏好分取中性）
    /// - `weather`: 天气提供者
    /// - `config`: 配置读取器
    /// - `event_publisher`: 计划事件发布者（可选）
    pub fn new(
        repos: PlannerRepositories,
        availability: Arc<WardrobeAvailabilityTracker>,
        learning: Option<Arc<PreferenceLearningEngine>>,
        weather: Arc<dyn WeatherProvider>,
        config: Arc<C>,
        event_publisher: Option<Arc<dyn PlanEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };
        Self {
            repos,
            availability,
            learning,
            weather,
            config,
            event_publisher,
        }
    }

    pub fn repositories(&self) -> &PlannerRepositories {
        &self.repos
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn load_settings(&self) -> EngineResult<PlannerSettings> {
        PlannerSettings::load(self.config.as_ref())
            .await
            .map_err(|e| EngineError::Config(e.to_string()))
    }

    /// 构建偏好快照; 失败降级为 Failed 并告警
    fn load_preference(&self, user_id: &str, now: NaiveDateTime) -> LoadedPreference {
        let Some(learning) = &self.learning else {
            return LoadedPreference::Unavailable;
        };
        match learning.load_model(user_id, now) {
            Ok(model) => LoadedPreference::Model(model),
            Err(e) => {
                warn!(user_id, error = %e, "偏好快照构建失败，偏好分按中性处理");
                LoadedPreference::Failed
            }
        }
    }

    /// 本次评分使用的权重
    fn scoring_weights(&self, user_id: &str, settings: &PlannerSettings) -> ScoringWeights {
        if !settings.use_personalized_weights {
            return ScoringWeights::WEEKLY;
        }
        let Some(learning) = &self.learning else {
            return ScoringWeights::WEEKLY;
        };
        match learning.get_personalized_weights(user_id) {
            Ok(p) => ScoringWeights::from_personalized(&p),
            Err(e) => {
                warn!(user_id, error = %e, "个性化权重读取失败，使用固定权重");
                ScoringWeights::WEEKLY
            }
        }
    }

    /// 读取日计划及其所属周计划, 并校验归属
    fn load_slot_for_user(
        &self,
        user_id: &str,
        slot_id: &str,
    ) -> EngineResult<(DailyPlanSlot, WeeklyPlan)> {
        let slot = self
            .repos
            .plan_repo
            .find_slot(slot_id)?
            .ok_or_else(|| EngineError::not_found("DailyPlanSlot", slot_id))?;
        let plan = self.repos.plan_repo.get_by_id(&slot.weekly_plan_id)?;
        if plan.user_id != user_id {
            return Err(EngineError::not_found("DailyPlanSlot", slot_id));
        }
        Ok((slot, plan))
    }

    /// 终态检查
    fn ensure_mutable(slot: &DailyPlanSlot, target: &str) -> EngineResult<()> {
        if slot.is_mutable() {
            Ok(())
        } else {
            Err(EngineError::InvalidStateTransition {
                from: slot.status.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// 写入时状态已被并发修改 → 按状态转换失败处理
    fn slot_write_error(err: RepositoryError, target: &str) -> EngineError {
        match err {
            RepositoryError::StateConflict { actual, .. } => EngineError::InvalidStateTransition {
                from: actual,
                to: target.to_string(),
            },
            other => EngineError::Repository(other),
        }
    }

    /// 信号上下文（日期 + 当日天气）
    fn signal_context(slot: &DailyPlanSlot, weather: Option<&DailyForecast>) -> SignalContext {
        SignalContext {
            slot_id: Some(slot.id.clone()),
            slot_date: Some(slot.date.to_string()),
            temperature: weather.map(|w| w.temp_avg),
            weather_condition: weather.map(|w| w.condition.clone()),
            ..Default::default()
        }
    }

    /// 记录偏好信号; 学习层失败不阻断用户操作
    fn record_signal<F>(&self, action: &str, record: F)
    where
        F: FnOnce(&PreferenceLearningEngine) -> EngineResult<usize>,
    {
        let Some(learning) = &self.learning else {
            return;
        };
        if let Err(e) = record(learning) {
            warn!(action, error = %e, "偏好信号记录失败");
        }
    }
}
