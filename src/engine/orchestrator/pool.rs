use super::WeeklyPlanOrchestrator;
use crate::config::{PlannerConfigReader, PlannerSettings};
use crate::domain::outfit::{CandidateOutfit, Outfit};
use crate::domain::wardrobe::ClothingItem;
use crate::engine::error::EngineResult;
use crate::engine::generator::OutfitCombinationGenerator;
use crate::i18n::t_with_args;
use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// 周计划天数对应的最小候选数（低于此值允许重复）
const FULL_WEEK_POOL: usize = 7;

impl<C> WeeklyPlanOrchestrator<C>
where
    C: PlannerConfigReader,
{
    /// 构建候选池
    ///
    /// # 流程
    /// 1. 最近创建的已有穿搭（≤ pool_cap）, 仅保留所有衣物都可穿的
    /// 2. 少于 min_pool_before_generation 时由生成器补充（同一衣物集合复用已有穿搭）
    /// 3. 打乱顺序并截断到 pool_cap
    ///
    /// # 返回
    /// 候选列表; is_new=true 的候选尚未持久化
    pub(super) fn build_pool<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        settings: &PlannerSettings,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> EngineResult<Vec<CandidateOutfit>> {
        let eligible = self.availability.get_eligible_items(user_id)?;
        let by_id: HashMap<&str, &ClothingItem> =
            eligible.iter().map(|i| (i.id.as_str(), i)).collect();

        let stored = self
            .repos
            .outfit_repo
            .list_recent(user_id, settings.outfit_pool_cap)?;
        let mut pool: Vec<CandidateOutfit> = stored
            .into_iter()
            .filter_map(|outfit| resolve_candidate(outfit, &by_id))
            .collect();
        let mut keys: HashSet<String> = pool.iter().map(|c| c.outfit.item_key()).collect();
        let stored_count = pool.len();

        if pool.len() < settings.min_pool_before_generation {
            let needed = settings.min_pool_before_generation - pool.len();
            let generator = OutfitCombinationGenerator::new(&eligible);
            if generator.can_build() {
                let mut next_index = 1;
                for combo in generator.generate(needed, rng) {
                    let key = combo.key().join(",");
                    if !keys.insert(key.clone()) {
                        continue;
                    }
                    let existing = self.repos.outfit_repo.find_by_item_key(user_id, &key)?;
                    let candidate = match existing.and_then(|o| resolve_candidate(o, &by_id)) {
                        Some(c) => c,
                        None => {
                            let name = t_with_args(
                                "outfit.generated_name",
                                &[("index", &next_index.to_string())],
                            );
                            next_index += 1;
                            combo.into_candidate(user_id, &name, now)
                        }
                    };
                    pool.push(candidate);
                }
            }
        }

        pool.shuffle(rng);
        pool.truncate(settings.outfit_pool_cap.max(1));

        if pool.is_empty() {
            warn!(user_id, eligible_items = eligible.len(), "候选池为空");
        } else if pool.len() < FULL_WEEK_POOL {
            warn!(user_id, pool_size = pool.len(), "候选池不足一周，主推荐可能重复");
        }
        debug!(
            user_id,
            stored = stored_count,
            generated = pool.iter().filter(|c| c.is_new).count(),
            pool_size = pool.len(),
            "候选池构建完成"
        );
        Ok(pool)
    }
}

/// 解析穿搭衣物; 任一衣物不可穿（或穿搭为空）时返回 None
fn resolve_candidate(outfit: Outfit, by_id: &HashMap<&str, &ClothingItem>) -> Option<CandidateOutfit> {
    if outfit.items.is_empty() {
        return None;
    }
    let items = outfit
        .items
        .iter()
        .map(|oi| by_id.get(oi.item_id.as_str()).map(|i| (*i).clone()))
        .collect::<Option<Vec<_>>>()?;
    Some(CandidateOutfit {
        outfit,
        items,
        is_new: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::outfit::{OutfitItem, OutfitSource};
    use crate::domain::types::{ItemStatus, LayerPosition, Role};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn item(id: &str) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: id.to_string(),
            category: "Tops".to_string(),
            color: None,
            seasons: vec![],
            occasions: vec![],
            tags: vec![],
            favorite: false,
            times_worn: 0,
            wears_since_wash: 0,
            max_wears_before_wash: 3,
            status: ItemStatus::Available,
            last_worn: None,
            last_washed: None,
            created_at: now(),
        }
    }

    fn outfit(item_ids: &[&str]) -> Outfit {
        Outfit {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            name: "o1".to_string(),
            items: item_ids
                .iter()
                .enumerate()
                .map(|(idx, id)| OutfitItem {
                    item_id: id.to_string(),
                    role: Role::Top,
                    layer: LayerPosition::Base,
                    position: idx as i32,
                })
                .collect(),
            min_temperature: None,
            max_temperature: None,
            suitable_weather: vec![],
            style_tags: vec![],
            occasion: None,
            season: None,
            favorite: false,
            rating: None,
            times_worn: 0,
            last_worn: None,
            source: OutfitSource::User,
            created_at: now(),
        }
    }

    #[test]
    fn test_resolve_requires_every_item_eligible() {
        let a = item("a");
        let b = item("b");
        let by_id: HashMap<&str, &ClothingItem> = [("a", &a), ("b", &b)].into_iter().collect();

        let resolved = resolve_candidate(outfit(&["a", "b"]), &by_id).unwrap();
        assert_eq!(resolved.items.len(), 2);
        assert!(!resolved.is_new);

        assert!(resolve_candidate(outfit(&["a", "z"]), &by_id).is_none());
        assert!(resolve_candidate(outfit(&[]), &by_id).is_none());
    }
}
