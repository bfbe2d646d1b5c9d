// ==========================================
// 周计划生成集成测试
// ==========================================
// 测试目标: 整周生成、整周替换、天气降级、空衣橱
// ==========================================

mod helpers;

use async_trait::async_trait;
use chrono::{Datelike, Duration};
use helpers::mock_config::MockConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use test_helpers::*;
use wardrobe_planner::domain::calendar::CalendarEvent;
use wardrobe_planner::domain::types::SlotStatus;
use wardrobe_planner::domain::weather::DailyForecast;
use wardrobe_planner::engine::{EngineError, PlanEvent, PlanEventPublisher, PlanEventType};
use wardrobe_planner::weather::{WeatherError, WeatherProvider};

// ==========================================
// 测试用天气提供者 / 事件发布者
// ==========================================

struct FailingWeather;

#[async_trait]
impl WeatherProvider for FailingWeather {
    async fn get_forecast(
        &self,
        _location: &str,
        _days: usize,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        Err(WeatherError::Request("connection refused".to_string()))
    }
}

struct SlowWeather;

#[async_trait]
impl WeatherProvider for SlowWeather {
    async fn get_forecast(
        &self,
        _location: &str,
        days: usize,
    ) -> Result<Vec<DailyForecast>, WeatherError> {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        Ok(week_weather(monday(), 20.0, "Clear").into_iter().take(days).collect())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<PlanEvent>>,
}

impl PlanEventPublisher for RecordingPublisher {
    fn publish(
        &self,
        event: PlanEvent,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let id = event.plan_id.clone();
        self.events.lock().unwrap().push(event);
        Ok(id)
    }
}

// ==========================================
// 测试用例
// ==========================================

#[tokio::test]
async fn test_generate_week_has_seven_ordered_slots() {
    let f = fixture(MockConfig::default());
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(7);

    // 周三也归一化到周一
    let wednesday = monday() + Duration::days(2);
    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, wednesday, None, now(), &mut rng)
        .await
        .unwrap();

    assert_eq!(plan.week_start, monday());
    assert_eq!(plan.week_start.weekday(), chrono::Weekday::Mon);
    assert_eq!(plan.slots.len(), 7);
    for (offset, slot) in plan.slots.iter().enumerate() {
        assert_eq!(slot.date, monday() + Duration::days(offset as i64));
        assert_eq!(slot.day_of_week as usize, offset);
        assert_eq!(slot.status, SlotStatus::Suggested);
        assert!(slot.primary_outfit_id.is_some());
        assert!(!slot.selection_reason.is_empty());
        assert!(slot.alternative_outfit_ids.len() <= 3);
        if let Some(primary) = &slot.primary_outfit_id {
            assert!(!slot.alternative_outfit_ids.contains(primary));
        }
        let scores = slot.scores.unwrap();
        assert!((0.0..=1.0).contains(&scores.total));
    }
    assert!(!plan.weather_degraded);
    assert_eq!(plan.location, "Tunis");
    assert!(plan.config_snapshot_json.is_some());
}

#[tokio::test]
async fn test_primaries_distinct_when_pool_covers_week() {
    let f = fixture(MockConfig::default());
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(11);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), Some("Paris"), now(), &mut rng)
        .await
        .unwrap();

    let primaries: Vec<&String> = plan
        .slots
        .iter()
        .filter_map(|s| s.primary_outfit_id.as_ref())
        .collect();
    let unique: HashSet<&String> = primaries.iter().copied().collect();
    assert_eq!(primaries.len(), 7);
    assert_eq!(unique.len(), 7);
    assert_eq!(plan.location, "Paris");

    // 被引用的生成穿搭已持久化
    for slot in &plan.slots {
        for id in slot.primary_outfit_id.iter().chain(&slot.alternative_outfit_ids) {
            assert!(f.repos.outfit_repo.find_by_id(id).unwrap().is_some());
        }
    }
}

#[tokio::test]
async fn test_regenerating_week_replaces_previous_plan() {
    let f = fixture(MockConfig::default());
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(3);

    let first = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();
    let second = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(f.repos.plan_repo.count_for_week(USER, monday()).unwrap(), 1);

    let stored = f.orchestrator.get_plan(USER, monday()).unwrap().unwrap();
    assert_eq!(stored.id, second.id);
    assert_eq!(stored.slots.len(), 7);

    // 旧计划的日计划已不存在
    let old_slot = &first.slots[0].id;
    assert!(matches!(
        f.orchestrator.get_slot(USER, old_slot),
        Err(EngineError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_empty_wardrobe_yields_empty_primaries_with_reason() {
    let f = fixture(MockConfig::default());
    let mut rng = StdRng::seed_from_u64(1);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    assert_eq!(plan.slots.len(), 7);
    for slot in &plan.slots {
        assert!(slot.primary_outfit_id.is_none());
        assert!(slot.alternative_outfit_ids.is_empty());
        assert!(slot.scores.is_none());
        assert!(!slot.selection_reason.is_empty());
    }
}

#[tokio::test]
async fn test_items_at_wash_threshold_are_never_planned() {
    let f = fixture(MockConfig::default());
    let items = seed_wardrobe(&f.repos);
    let dirty = &items[0];
    for _ in 0..3 {
        f.repos.item_repo.increment_wear(&dirty.id, now().date()).unwrap();
    }
    let mut rng = StdRng::seed_from_u64(5);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    for slot in &plan.slots {
        for id in slot.primary_outfit_id.iter().chain(&slot.alternative_outfit_ids) {
            let outfit = f.repos.outfit_repo.get_by_id(id).unwrap();
            assert!(outfit.items.iter().all(|i| i.item_id != dirty.id));
        }
    }
}

#[tokio::test]
async fn test_weather_failure_degrades_to_neutral() {
    let f = fixture_with(MockConfig::default(), Arc::new(FailingWeather), None);
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(9);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    assert!(plan.weather_degraded);
    assert_eq!(plan.weather_snapshot.len(), 7);
    assert!(plan
        .weather_snapshot
        .iter()
        .all(|w| (w.temp_avg - 20.0).abs() < f64::EPSILON));
    assert!(!plan.generation_reasoning.is_empty());
    assert!(plan.slots.iter().all(|s| s.primary_outfit_id.is_some()));
}

#[tokio::test]
async fn test_weather_timeout_degrades_to_neutral() {
    let f = fixture_with(MockConfig::with_weather_timeout(20), Arc::new(SlowWeather), None);
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(9);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    assert!(plan.weather_degraded);
    assert_eq!(plan.slots.len(), 7);
}

#[tokio::test]
async fn test_broken_config_fails_without_touching_existing_plan() {
    let good = fixture(MockConfig::default());
    seed_wardrobe(&good.repos);
    let mut rng = StdRng::seed_from_u64(2);
    let result = good
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await;
    assert!(result.is_ok());

    let broken = fixture(MockConfig::broken());
    seed_wardrobe(&broken.repos);
    let result = broken
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await;
    assert!(matches!(result, Err(EngineError::Config(_))));
    assert_eq!(broken.repos.plan_repo.count_for_week(USER, monday()).unwrap(), 0);
}

#[tokio::test]
async fn test_events_shape_reasoning_and_publish_plan_event() {
    let publisher = Arc::new(RecordingPublisher::default());
    let weather = Arc::new(wardrobe_planner::weather::StaticWeatherProvider::new(
        week_weather(monday(), 8.0, "Rain"),
    ));
    let f = fixture_with(MockConfig::default(), weather, Some(publisher.clone()));
    seed_wardrobe(&f.repos);
    f.repos
        .calendar_repo
        .insert(&CalendarEvent {
            id: "evt-1".to_string(),
            user_id: USER.to_string(),
            date: monday() + Duration::days(1),
            title: "Board meeting".to_string(),
            occasion: Some("formal".to_string()),
        })
        .unwrap();
    let mut rng = StdRng::seed_from_u64(4);

    let plan = f
        .orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap();

    assert_eq!(plan.events_snapshot.len(), 1);
    assert_eq!(plan.events_for(monday() + Duration::days(1)).len(), 1);
    assert!(plan.events_for(monday()).is_empty());

    let events = publisher.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, PlanEventType::PlanGenerated);
    assert_eq!(events[0].plan_id, plan.id);
    assert_eq!(events[0].affected_dates, (monday(), monday() + Duration::days(6)));
}
