// ==========================================
// 衣橱周计划系统 - 偏好信号领域模型
// ==========================================
// 红线: 信号只追加, 不修改; 衰减在读取时计算
// ==========================================

use crate::domain::types::SignalType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SignalContext - 信号上下文
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

// ==========================================
// PreferenceSignal - 偏好信号
// ==========================================
// outfit_id 与 item_id 至多其一: 穿搭级信号或衣物级（扇出）信号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSignal {
    pub id: String,
    pub user_id: String,
    pub signal_type: SignalType,
    pub value: f64,
    pub outfit_id: Option<String>,
    pub item_id: Option<String>,
    pub context: SignalContext,
    pub created_at: NaiveDateTime,
}

impl PreferenceSignal {
    pub fn is_outfit_level(&self) -> bool {
        self.outfit_id.is_some() && self.item_id.is_none()
    }
}

// ==========================================
// SignalObservation - 带关联属性的信号
// ==========================================
// 仓储读取时关联衣物颜色与穿搭场合
#[derive(Debug, Clone)]
pub struct SignalObservation {
    pub signal: PreferenceSignal,
    pub item_color: Option<String>,
    pub outfit_occasion: Option<String>,
}
