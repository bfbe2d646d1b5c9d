// ==========================================
// 衣橱周计划系统 - 穿搭组合生成器
// ==========================================
// 职责: 从可穿衣物中合成结构合法（角色均衡）的候选穿搭
// 规则: dress 分支概率 0.3（存在 dress 时）, 否则 top + bottom 各一件
// 规则: 外套 0.4 / 鞋 0.6 / 配饰 0.3 独立追加
// 红线: 按排序后的衣物ID去重; 尝试次数上限 = 请求数 × 10
// 红线: 找到的组合少于请求数属于降级, 不是错误
// ==========================================

use crate::domain::outfit::{CandidateOutfit, Outfit, OutfitItem, OutfitSource};
use crate::domain::types::Role;
use crate::domain::wardrobe::ClothingItem;
use crate::engine::role::classify_item;
use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// dress 分支概率
pub const DRESS_PROBABILITY: f64 = 0.3;
/// 外套追加概率
pub const OUTERWEAR_PROBABILITY: f64 = 0.4;
/// 鞋追加概率
pub const SHOES_PROBABILITY: f64 = 0.6;
/// 配饰追加概率
pub const ACCESSORY_PROBABILITY: f64 = 0.3;
/// 每个请求组合的最大尝试次数
pub const ATTEMPTS_PER_REQUEST: usize = 10;

// ==========================================
// GeneratedCombination - 生成的衣物组合
// ==========================================
#[derive(Debug, Clone)]
pub struct GeneratedCombination {
    pub items: Vec<(ClothingItem, Role)>,
}

impl GeneratedCombination {
    /// 去重键: 排序后的衣物ID
    pub fn key(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.items.iter().map(|(i, _)| i.id.clone()).collect();
        ids.sort();
        ids
    }

    /// 转为候选穿搭（未持久化, is_new = true）
    ///
    /// # 参数
    /// - `user_id`: 所属用户
    /// - `name`: 穿搭名称
    /// - `now`: 创建时间
    pub fn into_candidate(self, user_id: &str, name: &str, now: NaiveDateTime) -> CandidateOutfit {
        let outfit_items = self
            .items
            .iter()
            .enumerate()
            .map(|(position, (item, role))| OutfitItem {
                item_id: item.id.clone(),
                role: *role,
                layer: role.default_layer(),
                position: position as i32,
            })
            .collect();

        let outfit = Outfit {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            items: outfit_items,
            min_temperature: None,
            max_temperature: None,
            suitable_weather: Vec::new(),
            style_tags: Vec::new(),
            occasion: None,
            season: None,
            favorite: false,
            rating: None,
            times_worn: 0,
            last_worn: None,
            source: OutfitSource::Ai,
            created_at: now,
        };

        CandidateOutfit {
            outfit,
            items: self.items.into_iter().map(|(item, _)| item).collect(),
            is_new: true,
        }
    }
}

// ==========================================
// OutfitCombinationGenerator
// ==========================================
pub struct OutfitCombinationGenerator {
    pools: HashMap<Role, Vec<ClothingItem>>,
}

impl OutfitCombinationGenerator {
    /// 按角色分组衣物
    ///
    /// # 参数
    /// - `items`: 可穿衣物（调用方负责资格过滤）
    pub fn new(items: &[ClothingItem]) -> Self {
        let mut pools: HashMap<Role, Vec<ClothingItem>> = HashMap::new();
        for item in items {
            pools.entry(classify_item(item)).or_default().push(item.clone());
        }
        Self { pools }
    }

    fn pool(&self, role: Role) -> &[ClothingItem] {
        self.pools.get(&role).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// 当前衣物是否能组成任何穿搭
    pub fn can_build(&self) -> bool {
        !self.pool(Role::Dress).is_empty()
            || (!self.pool(Role::Top).is_empty() && !self.pool(Role::Bottom).is_empty())
    }

    /// 生成不重复的组合
    ///
    /// # 参数
    /// - `count`: 期望数量
    /// - `rng`: 请求级随机源
    ///
    /// # 返回
    /// - 至多 count 个组合（可能更少）
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<GeneratedCombination> {
        let mut results = Vec::new();
        if count == 0 {
            return results;
        }
        if !self.can_build() {
            warn!("可穿衣物无法组成任何穿搭");
            return results;
        }

        let max_attempts = count * ATTEMPTS_PER_REQUEST;
        let mut seen: HashSet<Vec<String>> = HashSet::new();
        let mut attempts = 0;

        while results.len() < count && attempts < max_attempts {
            attempts += 1;
            let combo = match self.try_build(rng) {
                Some(c) => c,
                None => continue,
            };
            if seen.insert(combo.key()) {
                results.push(combo);
            }
        }

        if results.len() < count {
            debug!(
                requested = count,
                found = results.len(),
                attempts,
                "生成组合数少于请求数"
            );
        }
        results
    }

    fn try_build<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<GeneratedCombination> {
        let mut items = Vec::new();

        let dresses = self.pool(Role::Dress);
        if !dresses.is_empty() && rng.gen_bool(DRESS_PROBABILITY) {
            items.push((dresses.choose(rng)?.clone(), Role::Dress));
        } else {
            let top = self.pool(Role::Top).choose(rng)?;
            let bottom = self.pool(Role::Bottom).choose(rng)?;
            items.push((top.clone(), Role::Top));
            items.push((bottom.clone(), Role::Bottom));
        }

        for (role, probability) in [
            (Role::Outerwear, OUTERWEAR_PROBABILITY),
            (Role::Shoes, SHOES_PROBABILITY),
            (Role::Accessory, ACCESSORY_PROBABILITY),
        ] {
            let pool = self.pool(role);
            if pool.is_empty() {
                continue;
            }
            if rng.gen_bool(probability) {
                if let Some(item) = pool.choose(rng) {
                    items.push((item.clone(), role));
                }
            }
        }

        Some(GeneratedCombination { items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ItemStatus;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, category: &str) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            user_id: "u1".to_string(),
            name: id.to_string(),
            category: category.to_string(),
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
            created_at: Utc::now().naive_utc(),
        }
    }

    fn wardrobe() -> Vec<ClothingItem> {
        vec![
            item("t1", "Tops"),
            item("t2", "Tops"),
            item("t3", "Tops"),
            item("b1", "Jeans"),
            item("b2", "Trousers"),
            item("s1", "Shoes"),
            item("o1", "Jacket"),
            item("a1", "Scarf"),
        ]
    }

    #[test]
    fn test_generates_unique_role_balanced_combinations() {
        let generator = OutfitCombinationGenerator::new(&wardrobe());
        let mut rng = StdRng::seed_from_u64(7);
        let combos = generator.generate(5, &mut rng);

        assert!(!combos.is_empty());
        let keys: HashSet<Vec<String>> = combos.iter().map(|c| c.key()).collect();
        assert_eq!(keys.len(), combos.len());

        for combo in &combos {
            let roles: Vec<Role> = combo.items.iter().map(|(_, r)| *r).collect();
            assert!(roles.contains(&Role::Top));
            assert!(roles.contains(&Role::Bottom));
            let unique: HashSet<Role> = roles.iter().cloned().collect();
            assert_eq!(unique.len(), roles.len());
        }
    }

    #[test]
    fn test_missing_bottom_yields_nothing() {
        let generator = OutfitCombinationGenerator::new(&[item("t1", "Tops"), item("s1", "Shoes")]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!generator.can_build());
        assert!(generator.generate(3, &mut rng).is_empty());
    }

    #[test]
    fn test_dress_only_wardrobe() {
        let generator = OutfitCombinationGenerator::new(&[item("d1", "Dresses"), item("d2", "Dresses")]);
        let mut rng = StdRng::seed_from_u64(3);
        let combos = generator.generate(2, &mut rng);
        assert!(combos
            .iter()
            .all(|c| c.items.len() == 1 && c.items[0].1 == Role::Dress));
    }

    #[test]
    fn test_small_wardrobe_returns_fewer_than_requested() {
        let generator = OutfitCombinationGenerator::new(&[item("t1", "Tops"), item("b1", "Jeans")]);
        let mut rng = StdRng::seed_from_u64(11);
        let combos = generator.generate(10, &mut rng);
        assert_eq!(combos.len(), 1);
    }

    #[test]
    fn test_into_candidate_assigns_layers() {
        let generator = OutfitCombinationGenerator::new(&wardrobe());
        let mut rng = StdRng::seed_from_u64(5);
        let combo = generator.generate(1, &mut rng).remove(0);
        let size = combo.items.len();
        let candidate = combo.into_candidate("u1", "Generated", Utc::now().naive_utc());
        assert!(candidate.is_new);
        assert_eq!(candidate.outfit.source, OutfitSource::Ai);
        assert_eq!(candidate.outfit.items.len(), size);
        assert_eq!(candidate.items.len(), size);
    }
}
