// ==========================================
// 衣橱周计划系统 - 选择引擎
// ==========================================
// 职责: 从已评分候选中加权随机选出主推荐与备选
// 输入: 按总分降序的 ScoredCandidate 列表
// 输出: 主推荐下标 / 备选下标
// 红线: 每个候选的选择权重 ≥ 0.1², 均有被选中的机会
// 红线: 即时推荐批次内重叠度 > 50% 的候选被过滤（不足时回填）
// ==========================================

use crate::engine::scoring::ScoredCandidate;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// 周计划生成时的候选截断数
pub const WEEKLY_TOP_K: usize = 7;
/// 单日重新生成时的候选截断数
pub const REGENERATE_TOP_K: usize = 5;
/// 选择权重下限（平方前）
const MIN_SELECTION_SCORE: f64 = 0.1;
/// 多样性过滤的重叠度阈值
pub const DIVERSITY_OVERLAP_THRESHOLD: f64 = 0.5;

/// 选择权重 = max(0.1, score)²
pub fn selection_weight(score: f64) -> f64 {
    let s = if score.is_finite() { score } else { 0.0 };
    s.max(MIN_SELECTION_SCORE).powi(2)
}

/// 两组衣物ID的重叠度 = |A∩B| / min(|A|, |B|)
pub fn item_overlap(a: &[String], b: &[String]) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    let set_a: HashSet<&String> = a.iter().collect();
    let shared = b.iter().filter(|id| set_a.contains(id)).collect::<HashSet<_>>().len();
    shared as f64 / smaller as f64
}

/// 多样性过滤
///
/// # 参数
/// - `ranked`: 按得分降序的衣物ID集合
/// - `count`: 需要的数量
///
/// # 返回
/// 选中的下标（保持得分顺序）; 过滤后不足 `count` 时按得分回填, 忽略过滤规则
pub fn diversify(ranked: &[Vec<String>], count: usize) -> Vec<usize> {
    let mut chosen: Vec<usize> = Vec::with_capacity(count);
    for (idx, ids) in ranked.iter().enumerate() {
        if chosen.len() >= count {
            break;
        }
        let too_similar = chosen
            .iter()
            .any(|&c| item_overlap(&ranked[c], ids) > DIVERSITY_OVERLAP_THRESHOLD);
        if !too_similar {
            chosen.push(idx);
        }
    }

    if chosen.len() < count {
        debug!(
            survived = chosen.len(),
            wanted = count,
            "多样性过滤后不足，按得分回填"
        );
        for idx in 0..ranked.len() {
            if chosen.len() >= count {
                break;
            }
            if !chosen.contains(&idx) {
                chosen.push(idx);
            }
        }
        chosen.sort_unstable();
    }
    chosen
}

// ==========================================
// SelectionEngine
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SelectionEngine {
    top_k: usize,
}

impl SelectionEngine {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k: top_k.max(1),
        }
    }

    pub fn weekly() -> Self {
        Self::new(WEEKLY_TOP_K)
    }

    pub fn regenerate() -> Self {
        Self::new(REGENERATE_TOP_K)
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// 加权随机选择主推荐
    ///
    /// # 参数
    /// - `scored`: 按总分降序的候选
    /// - `rng`: 请求级随机源
    ///
    /// # 返回
    /// 被选中候选在 `scored` 中的下标; 空列表返回 None
    pub fn select_primary<R: Rng + ?Sized>(
        &self,
        scored: &[ScoredCandidate<'_>],
        rng: &mut R,
    ) -> Option<usize> {
        if scored.is_empty() {
            return None;
        }
        let pool = &scored[..scored.len().min(self.top_k)];
        let weights: Vec<f64> = pool.iter().map(|c| selection_weight(c.scores.total)).collect();
        let total: f64 = weights.iter().sum();

        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (idx, w) in weights.iter().enumerate() {
            cumulative += w;
            if draw < cumulative {
                return Some(idx);
            }
        }
        // 浮点累计误差落在末尾
        Some(pool.len() - 1)
    }

    /// 备选: 主推荐之外得分最高的若干个（去重）
    ///
    /// # 参数
    /// - `scored`: 按总分降序的候选
    /// - `primary`: 主推荐下标
    /// - `max`: 备选上限
    pub fn select_alternatives(
        &self,
        scored: &[ScoredCandidate<'_>],
        primary: Option<usize>,
        max: usize,
    ) -> Vec<usize> {
        let primary_id = primary.and_then(|p| scored.get(p)).map(|c| c.candidate.id());
        let mut seen: HashSet<&str> = HashSet::new();
        let mut picked = Vec::with_capacity(max);
        for (idx, c) in scored.iter().enumerate() {
            if picked.len() >= max {
                break;
            }
            let id = c.candidate.id();
            if Some(id) == primary_id || !seen.insert(id) {
                continue;
            }
            picked.push(idx);
        }
        picked
    }
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::weekly()
    }
}
