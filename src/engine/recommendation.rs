// ==========================================
// 衣橱周计划系统 - 即时穿搭推荐
// ==========================================
// 职责: 为单日生成若干条即时推荐（不进入周计划）
// 流程: 生成 count×3 组合 → 即时评分 → 排序 → 多样性过滤 → 持久化
// 红线: 衣物集合相同的组合复用已有穿搭, 不重复写入
// ==========================================

use crate::domain::outfit::Outfit;
use crate::domain::wardrobe::ClothingItem;
use crate::engine::availability::WardrobeAvailabilityTracker;
use crate::engine::error::EngineResult;
use crate::engine::generator::{GeneratedCombination, OutfitCombinationGenerator};
use crate::engine::repositories::PlannerRepositories;
use crate::engine::scoring::{daily_score, DailyPreferences, DailyScore};
use crate::engine::selection::diversify;
use crate::i18n::t_with_args;
use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 缺省推荐条数
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 3;
/// 单次推荐条数上限
pub const MAX_RECOMMENDATION_COUNT: usize = 10;
/// 候选组合倍数
const CANDIDATE_MULTIPLIER: usize = 3;

/// 单条即时推荐
#[derive(Debug, Clone, Serialize)]
pub struct DailyRecommendation {
    pub outfit: Outfit,
    pub items: Vec<ClothingItem>,
    pub score: DailyScore,
}

// ==========================================
// DailyRecommendationEngine
// ==========================================
pub struct DailyRecommendationEngine {
    repos: PlannerRepositories,
    availability: Arc<WardrobeAvailabilityTracker>,
}

impl DailyRecommendationEngine {
    pub fn new(repos: PlannerRepositories, availability: Arc<WardrobeAvailabilityTracker>) -> Self {
        Self {
            repos,
            availability,
        }
    }

    /// 生成某日的即时推荐
    ///
    /// # 参数
    /// - `user_id`: 用户
    /// - `date`: 推荐日期（决定季节）
    /// - `count`: 期望条数（超过 10 按 10 处理）
    /// - `now`: 新穿搭的创建时间
    /// - `rng`: 请求级随机源
    ///
    /// # 返回
    /// 按得分降序的推荐（可用衣物不足时可能少于 count）
    #[instrument(skip(self, rng))]
    pub fn generate_daily_recommendations<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        date: NaiveDate,
        count: usize,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> EngineResult<Vec<DailyRecommendation>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_RECOMMENDATION_COUNT {
            debug!(user_id, requested = count, "推荐条数超过上限，按上限处理");
        }
        let count = count.min(MAX_RECOMMENDATION_COUNT);
        let eligible = self.availability.get_eligible_items(user_id)?;
        let generator = OutfitCombinationGenerator::new(&eligible);
        if !generator.can_build() {
            warn!(user_id, eligible_items = eligible.len(), "可穿衣物不足，无法推荐");
            return Ok(Vec::new());
        }

        let prefs = DailyPreferences::build(&eligible, &self.worn_outfits(user_id)?);
        let profile = self.repos.style_repo.find(user_id)?;

        let mut ranked: Vec<(GeneratedCombination, DailyScore)> = generator
            .generate(count * CANDIDATE_MULTIPLIER, rng)
            .into_iter()
            .map(|combo| {
                let items: Vec<ClothingItem> = combo.items.iter().map(|(i, _)| i.clone()).collect();
                let score = daily_score(&items, &prefs, profile.as_ref(), date);
                (combo, score)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total.total_cmp(&a.1.total));

        let keys: Vec<Vec<String>> = ranked.iter().map(|(c, _)| c.key()).collect();
        let chosen = diversify(&keys, count);

        let mut slots: Vec<Option<(GeneratedCombination, DailyScore)>> =
            ranked.into_iter().map(Some).collect();
        let mut results = Vec::with_capacity(chosen.len());
        for (n, idx) in chosen.into_iter().enumerate() {
            let Some((combo, score)) = slots.get_mut(idx).and_then(Option::take) else {
                continue;
            };
            results.push(self.persist(user_id, combo, score, n + 1, now)?);
        }

        info!(user_id, %date, requested = count, returned = results.len(), "即时推荐完成");
        Ok(results)
    }

    /// 穿过的穿搭及其衣物
    fn worn_outfits(&self, user_id: &str) -> EngineResult<Vec<(Outfit, Vec<ClothingItem>)>> {
        let items = self.repos.item_repo.list_by_user(user_id)?;
        let by_id: HashMap<&str, &ClothingItem> = items.iter().map(|i| (i.id.as_str(), i)).collect();
        let worn = self
            .repos
            .outfit_repo
            .list_by_user(user_id)?
            .into_iter()
            .filter(|o| o.times_worn > 0)
            .map(|o| {
                let outfit_items = o
                    .items
                    .iter()
                    .filter_map(|oi| by_id.get(oi.item_id.as_str()).map(|i| (*i).clone()))
                    .collect();
                (o, outfit_items)
            })
            .collect();
        Ok(worn)
    }

    /// 持久化为 AI 穿搭; 衣物集合相同时复用已有穿搭
    fn persist(
        &self,
        user_id: &str,
        combo: GeneratedCombination,
        score: DailyScore,
        index: usize,
        now: NaiveDateTime,
    ) -> EngineResult<DailyRecommendation> {
        let key = combo.key().join(",");
        let items: Vec<ClothingItem> = combo.items.iter().map(|(i, _)| i.clone()).collect();

        let outfit = match self.repos.outfit_repo.find_by_item_key(user_id, &key)? {
            Some(existing) => existing,
            None => {
                let name = t_with_args("outfit.generated_name", &[("index", &index.to_string())]);
                let outfit = combo.into_candidate(user_id, &name, now).outfit;
                self.repos.outfit_repo.insert(&outfit)?;
                outfit
            }
        };
        Ok(DailyRecommendation {
            outfit,
            items,
            score,
        })
    }
}
