use crate::domain::outfit::Outfit;
use crate::domain::signal::{PreferenceSignal, SignalContext};
use crate::domain::types::SignalType;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// 缺省衰减半衰期（天）
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// 信号基础权重
pub fn signal_weight(signal_type: SignalType) -> f64 {
    match signal_type {
        SignalType::Accepted => 1.0,
        SignalType::Rejected => -0.5,
        SignalType::Worn => 1.5,
        SignalType::Regenerated => -0.3,
        SignalType::Rated => 0.5,
    }
}

/// 穿搭级信号扇出到衣物时的折减系数（None 表示不扇出）
pub fn fan_out_factor(signal_type: SignalType) -> Option<f64> {
    match signal_type {
        SignalType::Accepted => Some(0.5),
        SignalType::Rejected => Some(0.3),
        SignalType::Worn => Some(0.7),
        SignalType::Regenerated | SignalType::Rated => None,
    }
}

/// 评分信号值: 0.5 × (rating − 3)
pub fn rated_value(rating: i32) -> f64 {
    signal_weight(SignalType::Rated) * (rating - 3) as f64
}

/// 时间衰减系数: 0.5^(整天数 / 半衰期)
///
/// # 说明
/// - 未来时间的信号按 0 天处理
/// - 半衰期非正时不衰减
pub fn time_decay(created_at: NaiveDateTime, now: NaiveDateTime, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let days = (now - created_at).num_days().max(0) as f64;
    0.5_f64.powf(days / half_life_days)
}

/// 构造一次反馈产生的信号批次
///
/// # 参数
/// - `user_id`: 用户
/// - `signal_type`: 信号类型
/// - `value`: 穿搭级信号值
/// - `outfit`: 关联穿搭（None 时只写一条无关联信号）
/// - `context`: 上下文
/// - `now`: 记录时间
///
/// # 返回
/// - 穿搭级信号 + 按扇出系数折减的衣物级信号
pub fn build_signal_batch(
    user_id: &str,
    signal_type: SignalType,
    value: f64,
    outfit: Option<&Outfit>,
    context: SignalContext,
    now: NaiveDateTime,
) -> Vec<PreferenceSignal> {
    let mut batch = vec![PreferenceSignal {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        signal_type,
        value,
        outfit_id: outfit.map(|o| o.id.clone()),
        item_id: None,
        context: context.clone(),
        created_at: now,
    }];

    if let (Some(outfit), Some(factor)) = (outfit, fan_out_factor(signal_type)) {
        for entry in &outfit.items {
            batch.push(PreferenceSignal {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                signal_type,
                value: value * factor,
                outfit_id: None,
                item_id: Some(entry.item_id.clone()),
                context: context.clone(),
                created_at: now,
            });
        }
    }
    batch
}
