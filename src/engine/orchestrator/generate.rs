use super::reason::{plan_reasoning, selection_reason};
use super::WeeklyPlanOrchestrator;
use crate::config::PlannerConfigReader;
use crate::domain::calendar::CalendarEvent;
use crate::domain::outfit::{CandidateOutfit, Outfit};
use crate::domain::plan::{
    normalize_week_start, DailyPlanSlot, WeeklyPlan, DAYS_PER_WEEK, MAX_ALTERNATIVES,
};
use crate::domain::types::{PlanStatus, SlotStatus};
use crate::domain::weather::DailyForecast;
use crate::engine::error::EngineResult;
use crate::engine::events::{PlanEvent, PlanEventType};
use crate::engine::scoring::{sort_by_total, DayContext, ScoredCandidate, ScoringEngine};
use crate::engine::selection::SelectionEngine;
use crate::i18n::t;
use crate::weather::fetch_week_weather;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rand::Rng;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// 单日选择结果
pub(super) struct DayPick<'a> {
    pub primary: Option<ScoredCandidate<'a>>,
    pub alternatives: Vec<&'a CandidateOutfit>,
}

impl<'a> DayPick<'a> {
    /// 转为日计划（未选出主推荐时写入"未找到"理由）
    pub(super) fn into_slot(
        self,
        slot_id: String,
        plan_id: &str,
        date: NaiveDate,
        weather: &DailyForecast,
        events: &[CalendarEvent],
        now: NaiveDateTime,
    ) -> DailyPlanSlot {
        let (primary_outfit_id, scores, selection_reason) = match self.primary {
            Some(p) => (
                Some(p.candidate.id().to_string()),
                Some(p.scores),
                selection_reason(&p.candidate.outfit, &p.scores, weather, events),
            ),
            None => (None, None, t("reason.no_outfit")),
        };
        DailyPlanSlot {
            id: slot_id,
            weekly_plan_id: plan_id.to_string(),
            date,
            day_of_week: date.weekday().num_days_from_monday() as u8,
            primary_outfit_id,
            alternative_outfit_ids: self
                .alternatives
                .iter()
                .map(|c| c.id().to_string())
                .collect(),
            scores,
            selection_reason,
            status: SlotStatus::Suggested,
            updated_at: now,
        }
    }

    /// 本日引用到的候选
    pub(super) fn referenced(&self) -> impl Iterator<Item = &'a CandidateOutfit> + '_ {
        self.primary
            .iter()
            .map(|p| p.candidate)
            .chain(self.alternatives.iter().copied())
    }
}

/// 对可选候选评分并选出主推荐与备选
pub(super) fn pick_for_day<'a, R: Rng + ?Sized>(
    scoring: &ScoringEngine<'_>,
    selection: &SelectionEngine,
    available: &[&'a CandidateOutfit],
    ctx: &DayContext<'_>,
    rng: &mut R,
) -> DayPick<'a> {
    let mut scored: Vec<ScoredCandidate<'a>> = available
        .iter()
        .map(|c| ScoredCandidate {
            candidate: *c,
            scores: scoring.score(c, ctx, rng),
        })
        .collect();
    sort_by_total(&mut scored);

    let primary_idx = selection.select_primary(&scored, rng);
    let alternatives = selection
        .select_alternatives(&scored, primary_idx, MAX_ALTERNATIVES)
        .into_iter()
        .map(|idx| scored[idx].candidate)
        .collect();
    DayPick {
        primary: primary_idx.map(|idx| scored[idx]),
        alternatives,
    }
}

impl<C> WeeklyPlanOrchestrator<C>
where
    C: PlannerConfigReader,
{
    /// 生成周计划（整周替换）
    ///
    /// # 参数
    /// - `user_id`: 用户
    /// - `week_start`: 周内任意日期（归一化为周一）
    /// - `location`: 城市（None 时使用缺省城市）
    /// - `now`: 当前时间
    /// - `rng`: 请求级随机源
    ///
    /// # 返回
    /// 持久化后的周计划（恰好 7 个日计划）
    ///
    /// # 说明
    /// - 天气失败/超时: 缺省天气, 计划说明中注明
    /// - 衣橱为空: 日计划主推荐为空, 理由为"未找到合适穿搭"
    /// - 已被用作主推荐的穿搭不再参与本周后续日期; 候选耗尽后允许重复
    #[instrument(skip(self, rng))]
    pub async fn generate_weekly_plan<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        week_start: NaiveDate,
        location: Option<&str>,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> EngineResult<WeeklyPlan> {
        let week_start = normalize_week_start(week_start);
        let week_end = week_start + Duration::days(DAYS_PER_WEEK - 1);
        let settings = self.load_settings().await?;
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(settings.default_location.as_str())
            .to_string();

        info!(user_id, %week_start, %location, "开始生成周计划");

        // ===== 外部数据 =====
        let week_weather = fetch_week_weather(
            self.weather.as_ref(),
            &location,
            week_start,
            settings.weather_timeout_ms,
        )
        .await;
        let config_snapshot = match self.config.get_config_snapshot().await {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "配置快照读取失败");
                None
            }
        };
        let events = self
            .repos
            .calendar_repo
            .list_between(user_id, week_start, week_end)?;
        let style_profile = self.repos.style_repo.find(user_id)?;
        let wear_history = self.repos.wear_repo.last_worn_since(
            user_id,
            now.date() - Duration::days(settings.wear_history_lookback_days),
        )?;

        // ===== 评分准备 =====
        let preference = self.load_preference(user_id, now);
        let weights = self.scoring_weights(user_id, &settings);
        let scoring = ScoringEngine::new(weights, settings.score_jitter, preference.state());
        let selection = SelectionEngine::new(settings.weekly_top_k);
        let pool = self.build_pool(user_id, &settings, now, rng)?;

        // ===== 逐日选择 =====
        let plan_id = Uuid::new_v4().to_string();
        let mut used: HashSet<&str> = HashSet::new();
        let mut referenced: HashSet<&str> = HashSet::new();
        let mut slots = Vec::with_capacity(DAYS_PER_WEEK as usize);

        for (offset, weather) in week_weather.days.iter().enumerate() {
            let date = week_start + Duration::days(offset as i64);
            let day_events: Vec<_> = events.iter().filter(|e| e.date == date).cloned().collect();

            let mut available: Vec<&CandidateOutfit> =
                pool.iter().filter(|c| !used.contains(c.id())).collect();
            if available.is_empty() && !pool.is_empty() {
                warn!(user_id, %date, pool_size = pool.len(), "候选已用尽，允许主推荐重复");
                available = pool.iter().collect();
            }

            let ctx = DayContext {
                date,
                weather,
                events: &day_events,
                wear_history: &wear_history,
                style_profile: style_profile.as_ref(),
            };
            let pick = pick_for_day(&scoring, &selection, &available, &ctx, rng);
            if let Some(p) = &pick.primary {
                used.insert(p.candidate.id());
            }
            referenced.extend(pick.referenced().map(|c| c.id()));
            slots.push(pick.into_slot(
                Uuid::new_v4().to_string(),
                &plan_id,
                date,
                weather,
                &day_events,
                now,
            ));
        }

        // 仅持久化被日计划引用的新穿搭
        let new_outfits: Vec<Outfit> = pool
            .iter()
            .filter(|c| c.is_new && referenced.contains(c.id()))
            .map(|c| c.outfit.clone())
            .collect();

        let plan = WeeklyPlan {
            id: plan_id,
            user_id: user_id.to_string(),
            week_start,
            location,
            generation_reasoning: plan_reasoning(&week_weather.days, &events, week_weather.degraded),
            weather_snapshot: week_weather.days,
            events_snapshot: events,
            weather_degraded: week_weather.degraded,
            config_snapshot_json: config_snapshot,
            status: PlanStatus::Active,
            created_at: now,
            slots,
        };

        self.repos.plan_repo.replace_week(&plan, &new_outfits)?;

        info!(
            user_id,
            plan_id = %plan.id,
            pool_size = pool.len(),
            new_outfits = new_outfits.len(),
            weather_degraded = plan.weather_degraded,
            "周计划生成完成"
        );
        self.event_publisher.publish(PlanEvent::week(
            PlanEventType::PlanGenerated,
            user_id,
            &plan.id,
            plan.week_start,
            plan.week_end(),
        ));
        Ok(plan)
    }
}
