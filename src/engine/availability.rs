// ==========================================
// 衣橱周计划系统 - 衣物可用性跟踪器
// ==========================================
// 职责: 洗护周期跟踪、可穿判定、周计划洗护冲突与提醒
// 输入: clothing_item / outfit / laundry_alert
// 输出: 可穿衣物列表、洗护状态读模型、去重后的 laundry_alert
// 红线: 计数器的递增/归零在 SQL 侧原子完成
// ==========================================

use crate::domain::laundry::{
    DayConflict, ItemsAtLaundry, LaundryAlert, LaundrySummary, OutfitLaundryStatus,
};
use crate::domain::outfit::Outfit;
use crate::domain::plan::WeeklyPlan;
use crate::domain::types::{AlertPriority, AlertType, ItemStatus, UrgencyLevel};
use crate::domain::wardrobe::ClothingItem;
use crate::engine::error::EngineResult;
use crate::engine::laundry_core::{LaundryCore, DEFAULT_WASH_THRESHOLD};
use crate::i18n::t_with_args;
use crate::repository::{ClothingItemRepository, LaundryAlertRepository, OutfitRepository};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 紧急提醒窗口（小时）
const URGENT_WINDOW_HOURS: i64 = 24;

// ==========================================
// WardrobeAvailabilityTracker
// ==========================================
pub struct WardrobeAvailabilityTracker {
    item_repo: Arc<ClothingItemRepository>,
    outfit_repo: Arc<OutfitRepository>,
    alert_repo: Arc<LaundryAlertRepository>,
}

impl WardrobeAvailabilityTracker {
    pub fn new(
        item_repo: Arc<ClothingItemRepository>,
        outfit_repo: Arc<OutfitRepository>,
        alert_repo: Arc<LaundryAlertRepository>,
    ) -> Self {
        Self {
            item_repo,
            outfit_repo,
            alert_repo,
        }
    }

    // ==========================================
    // 洗涤阈值
    // ==========================================

    /// 衣物的有效洗涤阈值（自定义优先, 否则按类别推荐）
    pub fn get_wash_threshold(&self, item: &ClothingItem) -> i32 {
        LaundryCore::wash_threshold(item)
    }

    /// 按类别自动设置洗涤阈值
    ///
    /// # 说明
    /// - 仅当衣物仍为缺省阈值 3 时写入推荐值
    ///
    /// # 返回
    /// - 生效后的阈值
    pub fn auto_set_wash_threshold(&self, item_id: &str) -> EngineResult<i32> {
        let item = self.item_repo.get_by_id(item_id)?;
        if item.max_wears_before_wash != DEFAULT_WASH_THRESHOLD {
            return Ok(item.max_wears_before_wash);
        }
        let threshold = LaundryCore::recommended_threshold(&item.category, &item.name);
        if threshold != item.max_wears_before_wash {
            self.item_repo.update_max_wears(item_id, threshold)?;
            debug!(item_id, threshold, "自动设置洗涤阈值");
        }
        Ok(threshold)
    }

    // ==========================================
    // 衣物查询
    // ==========================================

    /// 可进入候选生成的衣物
    pub fn get_eligible_items(&self, user_id: &str) -> EngineResult<Vec<ClothingItem>> {
        Ok(self.item_repo.list_eligible(user_id)?)
    }

    /// 需洗涤的衣物（可穿状态, 已达阈值）
    pub fn get_items_needing_wash(&self, user_id: &str) -> EngineResult<Vec<ClothingItem>> {
        let items = self.item_repo.list_by_status(user_id, ItemStatus::Available)?;
        Ok(items.into_iter().filter(|i| i.is_wash_due()).collect())
    }

    /// 临近洗涤阈值的衣物（紧急等级 L1）
    pub fn get_items_approaching_wash(&self, user_id: &str) -> EngineResult<Vec<ClothingItem>> {
        let items = self.item_repo.list_by_status(user_id, ItemStatus::Available)?;
        Ok(items
            .into_iter()
            .filter(|i| LaundryCore::urgency_level(i) == UrgencyLevel::L1)
            .collect())
    }

    /// 洗护中的衣物（按状态分组）
    pub fn get_items_at_laundry(&self, user_id: &str) -> EngineResult<ItemsAtLaundry> {
        Ok(ItemsAtLaundry {
            washing: self.item_repo.list_by_status(user_id, ItemStatus::Washing)?,
            drying: self.item_repo.list_by_status(user_id, ItemStatus::Drying)?,
            dry_cleaning: self.item_repo.list_by_status(user_id, ItemStatus::DryCleaning)?,
        })
    }

    // ==========================================
    // 穿搭 / 周计划洗护检查
    // ==========================================

    /// 穿搭洗护状态
    pub fn check_outfit_laundry_status(&self, outfit: &Outfit) -> EngineResult<OutfitLaundryStatus> {
        let ids: Vec<String> = outfit.items.iter().map(|i| i.item_id.clone()).collect();
        let items = self.item_repo.find_by_ids(&ids)?;
        Ok(LaundryCore::classify_outfit(&items))
    }

    /// 周计划逐日洗护冲突（仅有主推穿搭且存在问题的日）
    pub fn check_weekly_plan_conflicts(&self, plan: &WeeklyPlan) -> EngineResult<Vec<DayConflict>> {
        let mut conflicts = Vec::new();
        for slot in &plan.slots {
            let outfit_id = match &slot.primary_outfit_id {
                Some(id) => id,
                None => continue,
            };
            let outfit = match self.outfit_repo.find_by_id(outfit_id)? {
                Some(o) => o,
                None => continue,
            };
            let status = self.check_outfit_laundry_status(&outfit)?;
            if !status.is_clear {
                conflicts.push(DayConflict {
                    date: slot.date,
                    slot_id: slot.id.clone(),
                    outfit_id: outfit_id.clone(),
                    status,
                });
            }
        }
        Ok(conflicts)
    }

    /// 为周计划冲突创建洗护提醒
    ///
    /// # 规则
    /// - 截止时间: 计划日前一天 20:00
    /// - 需洗衣物 → needs_washing（L3 为 high, 否则 medium）
    /// - 干洗中 → at_cleaners; 洗涤/晾干中 → drying_time（均为 high）
    /// - 临近阈值（L1）→ approaching（low, 不计入冲突）
    /// - 未处理提醒按 (user, item, planned_date) 去重
    ///
    /// # 返回
    /// - 本次新建的提醒
    #[instrument(skip(self, plan), fields(plan_id = %plan.id, user_id = %plan.user_id))]
    pub fn create_laundry_alerts(
        &self,
        plan: &WeeklyPlan,
        now: NaiveDateTime,
    ) -> EngineResult<Vec<LaundryAlert>> {
        let mut created = Vec::new();

        for slot in &plan.slots {
            let outfit = match &slot.primary_outfit_id {
                Some(id) => match self.outfit_repo.find_by_id(id)? {
                    Some(o) => o,
                    None => continue,
                },
                None => continue,
            };
            let status = self.check_outfit_laundry_status(&outfit)?;
            let deadline = LaundryCore::alert_deadline(slot.date);
            let day = day_name(slot.date);

            for entry in &status.needs_wash {
                let item = &entry.item;
                let message = t_with_args(
                    "laundry.needs_washing",
                    &[
                        ("name", &item.name),
                        ("day", &day),
                        ("worn", &item.wears_since_wash.to_string()),
                        ("max", &item.max_wears_before_wash.to_string()),
                    ],
                );
                let alert = new_alert(
                    plan,
                    item,
                    slot.date,
                    deadline,
                    AlertType::NeedsWashing,
                    LaundryCore::needs_wash_priority(entry.urgency),
                    message,
                    now,
                );
                if self.alert_repo.insert_if_absent(&alert)? {
                    created.push(alert);
                }
            }

            for item in &status.unavailable {
                let (alert_type, message) = if item.status == ItemStatus::DryCleaning {
                    (
                        AlertType::AtCleaners,
                        t_with_args("laundry.at_cleaners", &[("name", &item.name), ("day", &day)]),
                    )
                } else {
                    let status = item.status.to_db_str().replace('_', " ");
                    (
                        AlertType::DryingTime,
                        t_with_args(
                            "laundry.drying_time",
                            &[("name", &item.name), ("status", &status), ("day", &day)],
                        ),
                    )
                };
                let alert = new_alert(
                    plan,
                    item,
                    slot.date,
                    deadline,
                    alert_type,
                    AlertPriority::High,
                    message,
                    now,
                );
                if self.alert_repo.insert_if_absent(&alert)? {
                    created.push(alert);
                }
            }

            for entry in &status.approaching {
                let item = &entry.item;
                let remaining = (item.max_wears_before_wash - item.wears_since_wash).max(0);
                let message = t_with_args(
                    "laundry.approaching",
                    &[
                        ("name", &item.name),
                        ("day", &day),
                        ("remaining", &remaining.to_string()),
                    ],
                );
                let alert = new_alert(
                    plan,
                    item,
                    slot.date,
                    deadline,
                    AlertType::Approaching,
                    AlertPriority::Low,
                    message,
                    now,
                );
                if self.alert_repo.insert_if_absent(&alert)? {
                    created.push(alert);
                }
            }
        }

        info!(created = created.len(), "洗护提醒生成完成");
        Ok(created)
    }

    /// 未处理提醒
    pub fn get_active_alerts(&self, user_id: &str) -> EngineResult<Vec<LaundryAlert>> {
        Ok(self.alert_repo.list_active(user_id)?)
    }

    /// 洗护概览（紧急提醒: 截止时间在 24 小时内）
    pub fn get_laundry_summary(
        &self,
        user_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<LaundrySummary> {
        let needs_wash = self.get_items_needing_wash(user_id)?;
        let approaching = self.get_items_approaching_wash(user_id)?;
        let at_laundry = self.get_items_at_laundry(user_id)?;
        let active = self.get_active_alerts(user_id)?;

        let horizon = now + Duration::hours(URGENT_WINDOW_HOURS);
        let active_alert_count = active.len();
        let urgent_alerts = active.into_iter().filter(|a| a.deadline <= horizon).collect();

        Ok(LaundrySummary {
            needs_washing_count: needs_wash.len(),
            approaching_count: approaching.len(),
            at_laundry_count: at_laundry.total(),
            active_alert_count,
            urgent_alerts,
        })
    }

    // ==========================================
    // 洗涤 / 穿着
    // ==========================================

    /// 洗涤完成: 计数归零并关闭该衣物所有未处理提醒
    ///
    /// # 返回
    /// - 被关闭的提醒数量
    pub fn mark_item_washed(&self, item_id: &str, washed_at: NaiveDateTime) -> EngineResult<usize> {
        let resolved = self.item_repo.mark_washed(item_id, washed_at)?;
        info!(item_id, resolved, "衣物已洗涤");
        Ok(resolved)
    }

    /// 穿着一次: 计数原子 +1
    pub fn mark_item_worn(&self, item_id: &str, worn_on: NaiveDate) -> EngineResult<()> {
        self.item_repo.increment_wear(item_id, worn_on)?;
        debug!(item_id, %worn_on, "衣物穿着计数 +1");
        Ok(())
    }
}

fn day_name(date: NaiveDate) -> String {
    date.format("%A").to_string()
}

#[allow(clippy::too_many_arguments)]
fn new_alert(
    plan: &WeeklyPlan,
    item: &ClothingItem,
    planned_date: NaiveDate,
    deadline: NaiveDateTime,
    alert_type: AlertType,
    priority: AlertPriority,
    message: String,
    now: NaiveDateTime,
) -> LaundryAlert {
    LaundryAlert {
        id: Uuid::new_v4().to_string(),
        user_id: plan.user_id.clone(),
        item_id: item.id.clone(),
        planned_date,
        deadline,
        alert_type,
        priority,
        message,
        is_resolved: false,
        created_at: now,
        resolved_at: None,
    }
}
