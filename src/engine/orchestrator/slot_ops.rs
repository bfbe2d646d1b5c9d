use super::generate::pick_for_day;
use super::WeeklyPlanOrchestrator;
use crate::config::PlannerConfigReader;
use crate::domain::calendar::WearRecord;
use crate::domain::outfit::{CandidateOutfit, Outfit};
use crate::domain::plan::{normalize_week_start, DailyPlanSlot, WeeklyPlan, MAX_ALTERNATIVES};
use crate::domain::types::SlotStatus;
use crate::domain::weather::DailyForecast;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{PlanEvent, PlanEventType};
use crate::engine::scoring::{DayContext, ScoringEngine};
use crate::engine::selection::SelectionEngine;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

impl<C> WeeklyPlanOrchestrator<C>
where
    C: PlannerConfigReader,
{
    // ==========================================
    // 状态变更
    // ==========================================

    /// 重新生成某天
    ///
    /// # 规则
    /// - 排除当前主推荐及本周其他日期的主推荐; 排除后为空则仅排除当前主推荐; 仍为空则使用全部候选
    /// - 使用 regenerate_top_k 的选择范围
    /// - 状态重置为 suggested; worn 拒绝
    #[instrument(skip(self, rng))]
    pub async fn regenerate_day<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        slot_id: &str,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> EngineResult<DailyPlanSlot> {
        let (slot, plan) = self.load_slot_for_user(user_id, slot_id)?;
        Self::ensure_mutable(&slot, SlotStatus::Suggested.to_db_str())?;

        let settings = self.load_settings().await?;
        let previous_outfit = match &slot.primary_outfit_id {
            Some(id) => self.repos.outfit_repo.find_by_id(id)?,
            None => None,
        };

        let weather = plan
            .weather_for(slot.date)
            .cloned()
            .unwrap_or_else(|| DailyForecast::neutral(slot.date));
        let day_events = plan.events_for(slot.date);
        let style_profile = self.repos.style_repo.find(user_id)?;
        let wear_history = self.repos.wear_repo.last_worn_since(
            user_id,
            now.date() - Duration::days(settings.wear_history_lookback_days),
        )?;

        let preference = self.load_preference(user_id, now);
        let weights = self.scoring_weights(user_id, &settings);
        let scoring = ScoringEngine::new(weights, settings.score_jitter, preference.state());
        let selection = SelectionEngine::new(settings.regenerate_top_k);
        let pool = self.build_pool(user_id, &settings, now, rng)?;

        let other_primaries: HashSet<&str> = plan
            .slots
            .iter()
            .filter(|s| s.id != slot.id)
            .filter_map(|s| s.primary_outfit_id.as_deref())
            .collect();
        let available = exclude_for_regeneration(
            &pool,
            slot.primary_outfit_id.as_deref(),
            &other_primaries,
        );

        let ctx = DayContext {
            date: slot.date,
            weather: &weather,
            events: &day_events,
            wear_history: &wear_history,
            style_profile: style_profile.as_ref(),
        };
        let pick = pick_for_day(&scoring, &selection, &available, &ctx, rng);
        let new_outfits: Vec<Outfit> = pick
            .referenced()
            .filter(|c| c.is_new)
            .map(|c| c.outfit.clone())
            .collect();
        let updated = pick.into_slot(
            slot.id.clone(),
            &plan.id,
            slot.date,
            &weather,
            &day_events,
            now,
        );

        self.repos
            .plan_repo
            .update_slot_with_outfits(&updated, &new_outfits, slot.status)
            .map_err(|e| Self::slot_write_error(e, SlotStatus::Suggested.to_db_str()))?;

        let context = Self::signal_context(&slot, Some(&weather));
        self.record_signal("regenerate", |learning| {
            learning.record_regeneration(user_id, previous_outfit.as_ref(), context, now)
        });

        info!(
            user_id,
            slot_id,
            date = %slot.date,
            previous = ?slot.primary_outfit_id,
            primary = ?updated.primary_outfit_id,
            "日计划已重新生成"
        );
        self.event_publisher.publish(PlanEvent::day(
            PlanEventType::DayRegenerated,
            user_id,
            &plan.id,
            &slot.id,
            slot.date,
            updated.primary_outfit_id.clone(),
        ));
        Ok(updated)
    }

    /// 接受主推荐（→ accepted）
    #[instrument(skip(self))]
    pub fn accept_outfit(
        &self,
        user_id: &str,
        slot_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<DailyPlanSlot> {
        let (mut slot, plan) = self.load_slot_for_user(user_id, slot_id)?;
        Self::ensure_mutable(&slot, SlotStatus::Accepted.to_db_str())?;
        let primary_id = slot
            .primary_outfit_id
            .clone()
            .ok_or_else(|| EngineError::InvalidInput(format!("日计划无主推荐: {}", slot_id)))?;

        self.repos
            .plan_repo
            .update_slot_status(&slot.id, SlotStatus::Accepted, slot.status, now)
            .map_err(|e| Self::slot_write_error(e, SlotStatus::Accepted.to_db_str()))?;
        slot.status = SlotStatus::Accepted;
        slot.updated_at = now;

        if let Some(outfit) = self.repos.outfit_repo.find_by_id(&primary_id)? {
            let context = Self::signal_context(&slot, plan.weather_for(slot.date));
            self.record_signal("accept", |learning| {
                learning.record_outfit_accepted(&outfit, context, now)
            });
        }

        info!(user_id, slot_id, outfit_id = %primary_id, "接受推荐");
        self.event_publisher.publish(PlanEvent::day(
            PlanEventType::OutfitAccepted,
            user_id,
            &plan.id,
            &slot.id,
            slot.date,
            Some(primary_id),
        ));
        Ok(slot)
    }

    /// 替换为备选（→ modified）
    ///
    /// # 规则
    /// - 目标必须在备选列表中
    /// - 原主推荐降为备选（不在列表中时追加）, 新主推荐移出备选, 备选截断到 3 个
    /// - 原主推荐记录一次 rejected 信号
    #[instrument(skip(self))]
    pub fn swap_to_alternative(
        &self,
        user_id: &str,
        slot_id: &str,
        alternative_outfit_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<DailyPlanSlot> {
        let (mut slot, plan) = self.load_slot_for_user(user_id, slot_id)?;
        Self::ensure_mutable(&slot, SlotStatus::Modified.to_db_str())?;
        if !slot
            .alternative_outfit_ids
            .iter()
            .any(|id| id == alternative_outfit_id)
        {
            return Err(EngineError::InvalidInput(format!(
                "穿搭不在备选列表中: {}",
                alternative_outfit_id
            )));
        }

        let read_status = slot.status;
        let previous = slot.primary_outfit_id.take();
        demote_primary(&mut slot, previous.clone(), alternative_outfit_id);
        slot.status = SlotStatus::Modified;
        slot.updated_at = now;
        self.repos
            .plan_repo
            .update_slot(&slot, read_status)
            .map_err(|e| Self::slot_write_error(e, SlotStatus::Modified.to_db_str()))?;

        if let Some(previous_id) = &previous {
            if let Some(outfit) = self.repos.outfit_repo.find_by_id(previous_id)? {
                let mut context = Self::signal_context(&slot, plan.weather_for(slot.date));
                context.reason = Some("swapped".to_string());
                self.record_signal("swap", |learning| {
                    learning.record_outfit_rejected(&outfit, context, now)
                });
            }
        }

        info!(
            user_id,
            slot_id,
            previous = ?previous,
            primary = alternative_outfit_id,
            "替换为备选"
        );
        self.event_publisher.publish(PlanEvent::day(
            PlanEventType::OutfitSwapped,
            user_id,
            &plan.id,
            &slot.id,
            slot.date,
            Some(alternative_outfit_id.to_string()),
        ));
        Ok(slot)
    }

    /// 标记已穿（→ worn, 终态）
    ///
    /// # 说明
    /// - 有主推荐时写入穿着记录并递增衣物计数（与状态变更同一事务）
    /// - 无主推荐时只变更状态
    #[instrument(skip(self))]
    pub fn mark_as_worn(
        &self,
        user_id: &str,
        slot_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<DailyPlanSlot> {
        let (mut slot, plan) = self.load_slot_for_user(user_id, slot_id)?;
        Self::ensure_mutable(&slot, SlotStatus::Worn.to_db_str())?;

        match slot.primary_outfit_id.clone() {
            Some(outfit_id) => {
                self.record_outfit_used(user_id, &outfit_id, slot.date, Some(&slot.id), now)?;
                if let Some(outfit) = self.repos.outfit_repo.find_by_id(&outfit_id)? {
                    let context = Self::signal_context(&slot, plan.weather_for(slot.date));
                    self.record_signal("worn", |learning| {
                        learning.record_outfit_worn(&outfit, context, now)
                    });
                }
            }
            None => {
                self.repos
                    .plan_repo
                    .update_slot_status(&slot.id, SlotStatus::Worn, slot.status, now)
                    .map_err(|e| Self::slot_write_error(e, SlotStatus::Worn.to_db_str()))?;
            }
        }
        slot.status = SlotStatus::Worn;
        slot.updated_at = now;

        info!(user_id, slot_id, outfit_id = ?slot.primary_outfit_id, "标记已穿");
        self.event_publisher.publish(PlanEvent::day(
            PlanEventType::OutfitWorn,
            user_id,
            &plan.id,
            &slot.id,
            slot.date,
            slot.primary_outfit_id.clone(),
        ));
        Ok(slot)
    }

    /// 跳过某天（→ skipped）
    #[instrument(skip(self))]
    pub fn skip_day(
        &self,
        user_id: &str,
        slot_id: &str,
        now: NaiveDateTime,
    ) -> EngineResult<DailyPlanSlot> {
        let (mut slot, plan) = self.load_slot_for_user(user_id, slot_id)?;
        Self::ensure_mutable(&slot, SlotStatus::Skipped.to_db_str())?;
        self.repos
            .plan_repo
            .update_slot_status(&slot.id, SlotStatus::Skipped, slot.status, now)
            .map_err(|e| Self::slot_write_error(e, SlotStatus::Skipped.to_db_str()))?;
        slot.status = SlotStatus::Skipped;
        slot.updated_at = now;

        info!(user_id, slot_id, "跳过日计划");
        self.event_publisher.publish(PlanEvent::day(
            PlanEventType::DaySkipped,
            user_id,
            &plan.id,
            &slot.id,
            slot.date,
            None,
        ));
        Ok(slot)
    }

    /// 记录一次穿着（计划外穿着也可调用）
    ///
    /// # 参数
    /// - `outfit_id`: 穿搭（须属于该用户）
    /// - `worn_on`: 穿着日期
    /// - `slot_id`: 对应日计划; Some 时同事务将其置为 worn
    ///
    /// # 说明
    /// 衣物计数原子递增; 穿搭与衣物 last_worn 同步更新
    pub fn record_outfit_used(
        &self,
        user_id: &str,
        outfit_id: &str,
        worn_on: NaiveDate,
        slot_id: Option<&str>,
        now: NaiveDateTime,
    ) -> EngineResult<WearRecord> {
        let outfit = self.repos.outfit_repo.get_by_id(outfit_id)?;
        if outfit.user_id != user_id {
            return Err(EngineError::not_found("Outfit", outfit_id));
        }
        let item_ids: Vec<String> = outfit.items.iter().map(|i| i.item_id.clone()).collect();
        let record = WearRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            outfit_id: outfit_id.to_string(),
            worn_on,
            slot_id: slot_id.map(str::to_string),
            created_at: now,
        };
        self.repos
            .wear_repo
            .record_wear(&record, &item_ids, now)
            .map_err(|e| Self::slot_write_error(e, SlotStatus::Worn.to_db_str()))?;

        if item_ids.is_empty() {
            warn!(user_id, outfit_id, "穿搭不含衣物，仅记录穿着");
        }
        info!(user_id, outfit_id, %worn_on, items = item_ids.len(), "记录穿着");
        Ok(record)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询周计划（周内任意日期）
    pub fn get_plan(&self, user_id: &str, week_start: NaiveDate) -> EngineResult<Option<WeeklyPlan>> {
        Ok(self
            .repos
            .plan_repo
            .find_by_week(user_id, normalize_week_start(week_start))?)
    }

    /// 查询日计划（校验归属）
    pub fn get_slot(&self, user_id: &str, slot_id: &str) -> EngineResult<DailyPlanSlot> {
        self.load_slot_for_user(user_id, slot_id)
            .map(|(slot, _)| slot)
    }

    /// 今日计划
    pub fn get_today_slot(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> EngineResult<Option<DailyPlanSlot>> {
        Ok(self.repos.plan_repo.find_slot_by_date(user_id, today)?)
    }

    /// 明日计划（通知服务读取）
    pub fn get_tomorrow_slot(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> EngineResult<Option<DailyPlanSlot>> {
        Ok(self
            .repos
            .plan_repo
            .find_slot_by_date(user_id, today + Duration::days(1))?)
    }
}

/// 重新生成的候选范围（逐级放宽）
fn exclude_for_regeneration<'a>(
    pool: &'a [CandidateOutfit],
    current: Option<&str>,
    other_primaries: &HashSet<&str>,
) -> Vec<&'a CandidateOutfit> {
    let strict: Vec<&CandidateOutfit> = pool
        .iter()
        .filter(|c| Some(c.id()) != current && !other_primaries.contains(c.id()))
        .collect();
    if !strict.is_empty() {
        return strict;
    }
    let relaxed: Vec<&CandidateOutfit> = pool.iter().filter(|c| Some(c.id()) != current).collect();
    if !relaxed.is_empty() {
        return relaxed;
    }
    pool.iter().collect()
}

/// 原主推荐降为备选, 新主推荐移出备选
fn demote_primary(slot: &mut DailyPlanSlot, previous: Option<String>, new_primary: &str) {
    slot.alternative_outfit_ids.retain(|id| id != new_primary);
    if let Some(previous) = previous {
        if !slot.alternative_outfit_ids.contains(&previous) {
            slot.alternative_outfit_ids.insert(0, previous);
        }
    }
    slot.alternative_outfit_ids.truncate(MAX_ALTERNATIVES);
    slot.primary_outfit_id = Some(new_primary.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(primary: Option<&str>, alternatives: &[&str]) -> DailyPlanSlot {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        DailyPlanSlot {
            id: "s1".to_string(),
            weekly_plan_id: "p1".to_string(),
            date,
            day_of_week: 0,
            primary_outfit_id: primary.map(str::to_string),
            alternative_outfit_ids: alternatives.iter().map(|s| s.to_string()).collect(),
            scores: None,
            selection_reason: "r".to_string(),
            status: SlotStatus::Suggested,
            updated_at: date.and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_demote_primary_keeps_at_most_three() {
        let mut s = slot(Some("a"), &["b", "c", "d"]);
        let previous = s.primary_outfit_id.take();
        demote_primary(&mut s, previous, "c");
        assert_eq!(s.primary_outfit_id.as_deref(), Some("c"));
        assert_eq!(s.alternative_outfit_ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_demote_primary_without_previous() {
        let mut s = slot(None, &["b", "c"]);
        demote_primary(&mut s, None, "b");
        assert_eq!(s.primary_outfit_id.as_deref(), Some("b"));
        assert_eq!(s.alternative_outfit_ids, vec!["c"]);
    }

    #[test]
    fn test_demote_primary_no_duplicate_when_already_alternative() {
        let mut s = slot(Some("a"), &["a", "b"]);
        let previous = s.primary_outfit_id.take();
        demote_primary(&mut s, previous, "b");
        assert_eq!(s.alternative_outfit_ids, vec!["a"]);
    }
}
