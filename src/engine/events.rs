// ==========================================
// 衣橱周计划系统 - 计划事件发布
// ==========================================
// 职责: 定义计划事件与发布 trait（通知服务的接入点）
// 说明: Engine 层只定义 trait, 通知投递由外部实现
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

// ==========================================
// 计划事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanEventType {
    /// 周计划生成（含替换）
    PlanGenerated,
    /// 单日重新生成
    DayRegenerated,
    /// 接受主推荐
    OutfitAccepted,
    /// 换成备选
    OutfitSwapped,
    /// 已穿
    OutfitWorn,
    /// 跳过
    DaySkipped,
}

impl PlanEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanEventType::PlanGenerated => "plan_generated",
            PlanEventType::DayRegenerated => "day_regenerated",
            PlanEventType::OutfitAccepted => "outfit_accepted",
            PlanEventType::OutfitSwapped => "outfit_swapped",
            PlanEventType::OutfitWorn => "outfit_worn",
            PlanEventType::DaySkipped => "day_skipped",
        }
    }
}

impl fmt::Display for PlanEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 计划事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEvent {
    pub event_type: PlanEventType,
    pub user_id: String,
    pub plan_id: String,
    /// 单日事件的日计划ID（周级事件为 None）
    pub slot_id: Option<String>,
    /// 受影响日期（周级事件为整周）
    pub affected_dates: (NaiveDate, NaiveDate),
    /// 事件后的主推荐
    pub outfit_id: Option<String>,
}

impl PlanEvent {
    /// 周级事件
    pub fn week(
        event_type: PlanEventType,
        user_id: &str,
        plan_id: &str,
        week_start: NaiveDate,
        week_end: NaiveDate,
    ) -> Self {
        Self {
            event_type,
            user_id: user_id.to_string(),
            plan_id: plan_id.to_string(),
            slot_id: None,
            affected_dates: (week_start, week_end),
            outfit_id: None,
        }
    }

    /// 单日事件
    pub fn day(
        event_type: PlanEventType,
        user_id: &str,
        plan_id: &str,
        slot_id: &str,
        date: NaiveDate,
        outfit_id: Option<String>,
    ) -> Self {
        Self {
            event_type,
            user_id: user_id.to_string(),
            plan_id: plan_id.to_string(),
            slot_id: Some(slot_id.to_string()),
            affected_dates: (date, date),
            outfit_id,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 计划事件发布者
///
/// # 实现说明
/// - 通知服务实现此 trait, 将事件转换为提醒任务
/// - 发布失败不回滚计划变更, 由调用方记录告警
pub trait PlanEventPublisher: Send + Sync {
    /// 发布计划事件
    ///
    /// # 返回
    /// - `Ok(task_id)`: 下游任务ID（不支持时为空字符串）
    /// - `Err`: 发布失败
    fn publish(&self, event: PlanEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl PlanEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: PlanEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - plan_id={}, event_type={}",
            event.plan_id,
            event.event_type
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn PlanEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn PlanEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（失败仅记录告警）
    pub fn publish(&self, event: PlanEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - plan_id={}, event_type={}",
                event.plan_id,
                event.event_type
            );
            return;
        };
        let event_type = event.event_type;
        let plan_id = event.plan_id.clone();
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(plan_id = %plan_id, event_type = %event_type, error = %e, "计划事件发布失败");
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        events: Mutex<Vec<PlanEventType>>,
    }

    impl PlanEventPublisher for RecordingPublisher {
        fn publish(&self, event: PlanEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            self.events.lock().unwrap().push(event.event_type);
            Ok("task-1".to_string())
        }
    }

    struct FailingPublisher;

    impl PlanEventPublisher for FailingPublisher {
        fn publish(&self, _event: PlanEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            Err("队列不可用".into())
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    #[test]
    fn test_week_event_covers_whole_week() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        let event = PlanEvent::week(PlanEventType::PlanGenerated, "u1", "p1", monday(), sunday);
        assert!(event.slot_id.is_none());
        assert_eq!(event.affected_dates, (monday(), sunday));
        assert_eq!(event.event_type.to_string(), "plan_generated");
    }

    #[test]
    fn test_optional_publisher_forwards() {
        let recorder = Arc::new(RecordingPublisher::default());
        let publisher = OptionalEventPublisher::with_publisher(recorder.clone());
        assert!(publisher.is_configured());

        publisher.publish(PlanEvent::day(
            PlanEventType::OutfitWorn,
            "u1",
            "p1",
            "s1",
            monday(),
            Some("o1".to_string()),
        ));
        assert_eq!(*recorder.events.lock().unwrap(), vec![PlanEventType::OutfitWorn]);
    }

    #[test]
    fn test_publish_failure_is_swallowed() {
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(FailingPublisher));
        publisher.publish(PlanEvent::day(
            PlanEventType::DaySkipped,
            "u1",
            "p1",
            "s1",
            monday(),
            None,
        ));
        assert!(!OptionalEventPublisher::none().is_configured());
        assert!(NoOpEventPublisher
            .publish(PlanEvent::week(
                PlanEventType::PlanGenerated,
                "u1",
                "p1",
                monday(),
                monday()
            ))
            .unwrap()
            .is_empty());
    }
}
