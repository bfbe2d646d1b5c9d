// ==========================================
// 衣橱周计划系统 - 周计划 API
// ==========================================
// 职责: 周计划生成与日计划操作、即时推荐、偏好画像
// 说明: 每个请求创建独立随机源（配置了 random_seed 时可复现）
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::api::error::{require_user, ApiError, ApiResult};
use crate::config::{ConfigManager, PlannerConfigReader};
use crate::domain::calendar::WearRecord;
use crate::domain::plan::{DailyPlanSlot, WeeklyPlan};
use crate::engine::preference::{ItemAffinity, PersonalizedWeights, ProfileInsights};
use crate::engine::recommendation::{DailyRecommendation, DEFAULT_RECOMMENDATION_COUNT};
use crate::engine::{DailyRecommendationEngine, PreferenceLearningEngine, WeeklyPlanOrchestrator};

// ==========================================
// PlannerApi - 周计划 API
// ==========================================

/// 周计划API
///
/// 职责：
/// 1. 周计划生成 / 查询
/// 2. 日计划状态机（重新生成、接受、替换、已穿、跳过）
/// 3. 即时推荐
/// 4. 偏好画像查询
pub struct PlannerApi<C = ConfigManager>
where
    C: PlannerConfigReader,
{
    orchestrator: Arc<WeeklyPlanOrchestrator<C>>,
    learning: Arc<PreferenceLearningEngine>,
    recommendations: Arc<DailyRecommendationEngine>,
    config: Arc<C>,
}

impl<C> PlannerApi<C>
where
    C: PlannerConfigReader,
{
    /// 创建新的PlannerApi实例
    pub fn new(
        orchestrator: Arc<WeeklyPlanOrchestrator<C>>,
        learning: Arc<PreferenceLearningEngine>,
        recommendations: Arc<DailyRecommendationEngine>,
        config: Arc<C>,
    ) -> Self {
        Self {
            orchestrator,
            learning,
            recommendations,
            config,
        }
    }

    /// 请求级随机源
    async fn request_rng(&self) -> StdRng {
        match self.config.get_random_seed().await {
            Ok(Some(seed)) => {
                debug!(seed, "使用固定随机种子");
                StdRng::seed_from_u64(seed)
            }
            Ok(None) => StdRng::from_entropy(),
            Err(e) => {
                warn!(error = %e, "随机种子读取失败，使用系统熵");
                StdRng::from_entropy()
            }
        }
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn require_slot(slot_id: &str) -> ApiResult<()> {
        if slot_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("日计划ID不能为空".to_string()));
        }
        Ok(())
    }

    // ==========================================
    // 周计划
    // ==========================================

    /// 生成周计划（同一周已有计划时整周替换）
    ///
    /// # 参数
    /// - user_id: 用户ID
    /// - week_start: 周内任意日期
    /// - location: 城市（None 使用缺省城市）
    pub async fn generate_weekly_plan(
        &self,
        user_id: &str,
        week_start: NaiveDate,
        location: Option<&str>,
    ) -> ApiResult<WeeklyPlan> {
        require_user(user_id)?;
        let mut rng = self.request_rng().await;
        Ok(self
            .orchestrator
            .generate_weekly_plan(user_id, week_start, location, Self::now(), &mut rng)
            .await?)
    }

    /// 查询周计划
    pub fn get_plan(&self, user_id: &str, week_start: NaiveDate) -> ApiResult<Option<WeeklyPlan>> {
        require_user(user_id)?;
        Ok(self.orchestrator.get_plan(user_id, week_start)?)
    }

    // ==========================================
    // 日计划
    // ==========================================

    /// 重新生成某天
    pub async fn regenerate_day(&self, user_id: &str, slot_id: &str) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        let mut rng = self.request_rng().await;
        Ok(self
            .orchestrator
            .regenerate_day(user_id, slot_id, Self::now(), &mut rng)
            .await?)
    }

    /// 接受主推荐
    pub fn accept_outfit(&self, user_id: &str, slot_id: &str) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        Ok(self.orchestrator.accept_outfit(user_id, slot_id, Self::now())?)
    }

    /// 替换为备选
    pub fn swap_to_alternative(
        &self,
        user_id: &str,
        slot_id: &str,
        alternative_outfit_id: &str,
    ) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        if alternative_outfit_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("备选穿搭ID不能为空".to_string()));
        }
        Ok(self.orchestrator.swap_to_alternative(
            user_id,
            slot_id,
            alternative_outfit_id,
            Self::now(),
        )?)
    }

    /// 标记已穿
    pub fn mark_as_worn(&self, user_id: &str, slot_id: &str) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        Ok(self.orchestrator.mark_as_worn(user_id, slot_id, Self::now())?)
    }

    /// 跳过某天
    pub fn skip_day(&self, user_id: &str, slot_id: &str) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        Ok(self.orchestrator.skip_day(user_id, slot_id, Self::now())?)
    }

    /// 记录计划外穿着
    pub fn record_outfit_used(
        &self,
        user_id: &str,
        outfit_id: &str,
        worn_on: NaiveDate,
    ) -> ApiResult<WearRecord> {
        require_user(user_id)?;
        if outfit_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("穿搭ID不能为空".to_string()));
        }
        Ok(self
            .orchestrator
            .record_outfit_used(user_id, outfit_id, worn_on, None, Self::now())?)
    }

    pub fn get_slot(&self, user_id: &str, slot_id: &str) -> ApiResult<DailyPlanSlot> {
        require_user(user_id)?;
        Self::require_slot(slot_id)?;
        Ok(self.orchestrator.get_slot(user_id, slot_id)?)
    }

    pub fn get_today_slot(&self, user_id: &str, today: NaiveDate) -> ApiResult<Option<DailyPlanSlot>> {
        require_user(user_id)?;
        Ok(self.orchestrator.get_today_slot(user_id, today)?)
    }

    pub fn get_tomorrow_slot(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ApiResult<Option<DailyPlanSlot>> {
        require_user(user_id)?;
        Ok(self.orchestrator.get_tomorrow_slot(user_id, today)?)
    }

    // ==========================================
    // 即时推荐
    // ==========================================

    /// 生成即时推荐
    ///
    /// # 参数
    /// - count: 条数（None 时为 3, 上限 10）
    pub async fn generate_daily_recommendations(
        &self,
        user_id: &str,
        date: NaiveDate,
        count: Option<usize>,
    ) -> ApiResult<Vec<DailyRecommendation>> {
        require_user(user_id)?;
        let count = count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT);
        if count == 0 {
            return Err(ApiError::InvalidInput("推荐条数必须大于0".to_string()));
        }
        let mut rng = self.request_rng().await;
        Ok(self
            .recommendations
            .generate_daily_recommendations(user_id, date, count, Self::now(), &mut rng)?)
    }

    // ==========================================
    // 偏好画像
    // ==========================================

    pub fn get_user_profile_insights(&self, user_id: &str) -> ApiResult<ProfileInsights> {
        require_user(user_id)?;
        Ok(self.learning.get_user_profile_insights(user_id, Self::now())?)
    }

    pub fn get_item_affinity_scores(&self, user_id: &str) -> ApiResult<Vec<ItemAffinity>> {
        require_user(user_id)?;
        Ok(self.learning.get_item_affinity_scores(user_id)?)
    }

    pub fn get_personalized_weights(&self, user_id: &str) -> ApiResult<PersonalizedWeights> {
        require_user(user_id)?;
        Ok(self.learning.get_personalized_weights(user_id)?)
    }
}
