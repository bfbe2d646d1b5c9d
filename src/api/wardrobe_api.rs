// ==========================================
// 衣橱周计划系统 - 衣橱 API
// ==========================================
// 职责: 衣物/穿搭登记、洗护管理、日程事件、风格档案
// 红线: 新建穿搭必须通过角色槽位校验
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{require_user, ApiError, ApiResult};
use crate::domain::calendar::{CalendarEvent, StyleProfile};
use crate::domain::laundry::{
    DayConflict, ItemsAtLaundry, LaundryAlert, LaundrySummary, OutfitLaundryStatus,
};
use crate::domain::outfit::{NewOutfit, Outfit, OutfitItem, OutfitSource};
use crate::domain::plan::normalize_week_start;
use crate::domain::types::ItemStatus;
use crate::domain::wardrobe::{ClothingItem, NewClothingItem};
use crate::engine::laundry_core::LaundryCore;
use crate::engine::{
    validate_outfit_roles, PlannerRepositories, PreferenceLearningEngine,
    WardrobeAvailabilityTracker,
};

// ==========================================
// WardrobeApi - 衣橱 API
// ==========================================

/// 衣橱API
///
/// 职责：
/// 1. 衣物登记与状态维护
/// 2. 穿搭登记（角色校验）与评分
/// 3. 洗护查询、提醒、洗涤完成
/// 4. 日程事件与风格档案
pub struct WardrobeApi {
    repos: PlannerRepositories,
    availability: Arc<WardrobeAvailabilityTracker>,
    learning: Arc<PreferenceLearningEngine>,
}

impl WardrobeApi {
    pub fn new(
        repos: PlannerRepositories,
        availability: Arc<WardrobeAvailabilityTracker>,
        learning: Arc<PreferenceLearningEngine>,
    ) -> Self {
        Self {
            repos,
            availability,
            learning,
        }
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    /// 读取衣物并校验归属
    fn owned_item(&self, user_id: &str, item_id: &str) -> ApiResult<ClothingItem> {
        let item = self
            .repos
            .item_repo
            .find_by_id(item_id)?
            .filter(|i| i.user_id == user_id)
            .ok_or_else(|| ApiError::NotFound(format!("衣物{}不存在", item_id)))?;
        Ok(item)
    }

    /// 读取穿搭并校验归属
    fn owned_outfit(&self, user_id: &str, outfit_id: &str) -> ApiResult<Outfit> {
        let outfit = self
            .repos
            .outfit_repo
            .find_by_id(outfit_id)?
            .filter(|o| o.user_id == user_id)
            .ok_or_else(|| ApiError::NotFound(format!("穿搭{}不存在", outfit_id)))?;
        Ok(outfit)
    }

    // ==========================================
    // 衣物
    // ==========================================

    /// 登记衣物
    ///
    /// # 说明
    /// - 未指定洗涤阈值时按类别阈值表设置
    pub fn add_item(&self, user_id: &str, request: NewClothingItem) -> ApiResult<ClothingItem> {
        require_user(user_id)?;
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("衣物名称不能为空".to_string()));
        }
        if request.category.trim().is_empty() {
            return Err(ApiError::InvalidInput("衣物类别不能为空".to_string()));
        }
        let threshold = match request.max_wears_before_wash {
            Some(n) if n < 1 => {
                return Err(ApiError::InvalidInput(format!("洗涤阈值必须≥1: {}", n)));
            }
            Some(n) => n,
            None => LaundryCore::recommended_threshold(&request.category, &request.name),
        };

        let item = ClothingItem {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: request.name,
            category: request.category,
            color: request.color,
            seasons: request.seasons,
            occasions: request.occasions,
            tags: request.tags,
            favorite: request.favorite,
            times_worn: 0,
            wears_since_wash: 0,
            max_wears_before_wash: threshold,
            status: ItemStatus::Available,
            last_worn: None,
            last_washed: None,
            created_at: Self::now(),
        };
        self.repos.item_repo.insert(&item)?;
        info!(user_id, item_id = %item.id, threshold, "登记衣物");
        Ok(item)
    }

    pub fn get_item(&self, user_id: &str, item_id: &str) -> ApiResult<ClothingItem> {
        require_user(user_id)?;
        self.owned_item(user_id, item_id)
    }

    pub fn list_items(&self, user_id: &str) -> ApiResult<Vec<ClothingItem>> {
        require_user(user_id)?;
        Ok(self.repos.item_repo.list_by_user(user_id)?)
    }

    /// 变更衣物状态（送洗/晾干/干洗/借出/修补/可穿）
    pub fn set_item_status(&self, user_id: &str, item_id: &str, status: ItemStatus) -> ApiResult<()> {
        require_user(user_id)?;
        self.owned_item(user_id, item_id)?;
        self.repos.item_repo.update_status(item_id, status)?;
        info!(user_id, item_id, status = status.to_db_str(), "衣物状态变更");
        Ok(())
    }

    // ==========================================
    // 穿搭
    // ==========================================

    /// 登记穿搭
    ///
    /// # 规则
    /// - 衣物必须全部存在且属于该用户
    /// - 同一角色至多一件; 必须包含 dress 或 top + bottom
    /// - 评分（若给出）在 1-5
    pub fn create_outfit(&self, user_id: &str, request: NewOutfit) -> ApiResult<Outfit> {
        require_user(user_id)?;
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("穿搭名称不能为空".to_string()));
        }
        if let Some(rating) = request.rating {
            if !(1..=5).contains(&rating) {
                return Err(ApiError::InvalidInput(format!("评分超出范围 1-5: {}", rating)));
            }
        }
        if let (Some(min), Some(max)) = (request.min_temperature, request.max_temperature) {
            if min > max {
                return Err(ApiError::InvalidInput(format!(
                    "温度区间无效: {} > {}",
                    min, max
                )));
            }
        }

        let found = self.repos.item_repo.find_by_ids(&request.item_ids)?;
        let by_id: HashMap<&str, &ClothingItem> = found
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| (i.id.as_str(), i))
            .collect();
        let items = request
            .item_ids
            .iter()
            .map(|id| {
                by_id
                    .get(id.as_str())
                    .map(|i| (*i).clone())
                    .ok_or_else(|| ApiError::NotFound(format!("衣物{}不存在", id)))
            })
            .collect::<ApiResult<Vec<_>>>()?;
        let roles = validate_outfit_roles(&items)?;

        let outfit = Outfit {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: request.name,
            items: items
                .iter()
                .zip(roles)
                .enumerate()
                .map(|(position, (item, role))| OutfitItem {
                    item_id: item.id.clone(),
                    role,
                    layer: role.default_layer(),
                    position: position as i32,
                })
                .collect(),
            min_temperature: request.min_temperature,
            max_temperature: request.max_temperature,
            suitable_weather: request.suitable_weather,
            style_tags: request.style_tags,
            occasion: request.occasion,
            season: request.season,
            favorite: request.favorite,
            rating: request.rating,
            times_worn: 0,
            last_worn: None,
            source: OutfitSource::User,
            created_at: Self::now(),
        };
        self.repos.outfit_repo.insert(&outfit)?;
        info!(user_id, outfit_id = %outfit.id, items = outfit.items.len(), "登记穿搭");
        Ok(outfit)
    }

    pub fn get_outfit(&self, user_id: &str, outfit_id: &str) -> ApiResult<Outfit> {
        require_user(user_id)?;
        self.owned_outfit(user_id, outfit_id)
    }

    pub fn list_outfits(&self, user_id: &str) -> ApiResult<Vec<Outfit>> {
        require_user(user_id)?;
        Ok(self.repos.outfit_repo.list_by_user(user_id)?)
    }

    /// 穿搭评分（同时记录 rated 偏好信号）
    pub fn rate_outfit(&self, user_id: &str, outfit_id: &str, rating: i32) -> ApiResult<Outfit> {
        require_user(user_id)?;
        if !(1..=5).contains(&rating) {
            return Err(ApiError::InvalidInput(format!("评分超出范围 1-5: {}", rating)));
        }
        let mut outfit = self.owned_outfit(user_id, outfit_id)?;
        self.repos.outfit_repo.update_rating(outfit_id, rating)?;
        outfit.rating = Some(rating);

        if let Err(e) = self.learning.record_outfit_rated(&outfit, rating, Self::now()) {
            warn!(user_id, outfit_id, error = %e, "评分信号记录失败");
        }
        Ok(outfit)
    }

    // ==========================================
    // 洗护
    // ==========================================

    pub fn get_items_needing_wash(&self, user_id: &str) -> ApiResult<Vec<ClothingItem>> {
        require_user(user_id)?;
        Ok(self.availability.get_items_needing_wash(user_id)?)
    }

    pub fn get_items_approaching_wash(&self, user_id: &str) -> ApiResult<Vec<ClothingItem>> {
        require_user(user_id)?;
        Ok(self.availability.get_items_approaching_wash(user_id)?)
    }

    pub fn get_items_at_laundry(&self, user_id: &str) -> ApiResult<ItemsAtLaundry> {
        require_user(user_id)?;
        Ok(self.availability.get_items_at_laundry(user_id)?)
    }

    pub fn check_outfit_laundry_status(
        &self,
        user_id: &str,
        outfit_id: &str,
    ) -> ApiResult<OutfitLaundryStatus> {
        require_user(user_id)?;
        let outfit = self.owned_outfit(user_id, outfit_id)?;
        Ok(self.availability.check_outfit_laundry_status(&outfit)?)
    }

    /// 周计划洗护冲突（该周无计划时返回空）
    pub fn check_weekly_plan_conflicts(
        &self,
        user_id: &str,
        week_start: NaiveDate,
    ) -> ApiResult<Vec<DayConflict>> {
        require_user(user_id)?;
        match self
            .repos
            .plan_repo
            .find_by_week(user_id, normalize_week_start(week_start))?
        {
            Some(plan) => Ok(self.availability.check_weekly_plan_conflicts(&plan)?),
            None => Ok(Vec::new()),
        }
    }

    /// 为周计划生成洗护提醒（去重）
    pub fn create_laundry_alerts(
        &self,
        user_id: &str,
        week_start: NaiveDate,
    ) -> ApiResult<Vec<LaundryAlert>> {
        require_user(user_id)?;
        let week_start = normalize_week_start(week_start);
        let plan = self
            .repos
            .plan_repo
            .find_by_week(user_id, week_start)?
            .ok_or_else(|| ApiError::NotFound(format!("周计划{}不存在", week_start)))?;
        Ok(self.availability.create_laundry_alerts(&plan, Self::now())?)
    }

    pub fn get_active_alerts(&self, user_id: &str) -> ApiResult<Vec<LaundryAlert>> {
        require_user(user_id)?;
        Ok(self.availability.get_active_alerts(user_id)?)
    }

    pub fn get_laundry_summary(&self, user_id: &str) -> ApiResult<LaundrySummary> {
        require_user(user_id)?;
        Ok(self.availability.get_laundry_summary(user_id, Self::now())?)
    }

    /// 洗涤完成
    ///
    /// # 返回
    /// - 被关闭的提醒数量
    pub fn mark_item_washed(&self, user_id: &str, item_id: &str) -> ApiResult<usize> {
        require_user(user_id)?;
        self.owned_item(user_id, item_id)?;
        Ok(self.availability.mark_item_washed(item_id, Self::now())?)
    }

    pub fn auto_set_wash_threshold(&self, user_id: &str, item_id: &str) -> ApiResult<i32> {
        require_user(user_id)?;
        self.owned_item(user_id, item_id)?;
        Ok(self.availability.auto_set_wash_threshold(item_id)?)
    }

    // ==========================================
    // 日程 / 风格档案
    // ==========================================

    pub fn add_event(
        &self,
        user_id: &str,
        title: &str,
        date: NaiveDate,
        occasion: Option<&str>,
    ) -> ApiResult<CalendarEvent> {
        require_user(user_id)?;
        if title.trim().is_empty() {
            return Err(ApiError::InvalidInput("事件标题不能为空".to_string()));
        }
        let event = CalendarEvent {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.trim().to_string(),
            date,
            occasion: occasion
                .map(|o| o.trim().to_lowercase())
                .filter(|o| !o.is_empty()),
        };
        self.repos.calendar_repo.insert(&event)?;
        Ok(event)
    }

    pub fn list_events(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<Vec<CalendarEvent>> {
        require_user(user_id)?;
        if from > to {
            return Err(ApiError::InvalidInput(format!("日期区间无效: {} > {}", from, to)));
        }
        Ok(self.repos.calendar_repo.list_between(user_id, from, to)?)
    }

    pub fn set_style_profile(&self, user_id: &str, styles: Vec<String>) -> ApiResult<StyleProfile> {
        require_user(user_id)?;
        let profile = StyleProfile {
            user_id: user_id.to_string(),
            preferred_styles: styles,
        };
        self.repos.style_repo.upsert(&profile)?;
        Ok(profile)
    }

    pub fn get_style_profile(&self, user_id: &str) -> ApiResult<Option<StyleProfile>> {
        require_user(user_id)?;
        Ok(self.repos.style_repo.find(user_id)?)
    }
}
