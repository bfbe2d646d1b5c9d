// ==========================================
// 日计划状态机集成测试
// ==========================================
// 测试目标: 接受/替换/重新生成/已穿/跳过, worn 终态
// ==========================================

mod helpers;

use chrono::Duration;
use helpers::mock_config::MockConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use test_helpers::*;
use wardrobe_planner::config::PlannerConfigReader;
use wardrobe_planner::domain::calendar::WearRecord;
use wardrobe_planner::domain::plan::WeeklyPlan;
use wardrobe_planner::domain::types::SlotStatus;
use wardrobe_planner::engine::EngineError;
use wardrobe_planner::repository::RepositoryError;

async fn planned<C: PlannerConfigReader>(f: &Fixture<C>, seed: u64) -> WeeklyPlan {
    seed_wardrobe(&f.repos);
    let mut rng = StdRng::seed_from_u64(seed);
    f.orchestrator
        .generate_weekly_plan(USER, monday(), None, now(), &mut rng)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_accept_sets_status_and_records_signal() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 21).await;
    let slot = &plan.slots[0];

    let accepted = f.orchestrator.accept_outfit(USER, &slot.id, now()).unwrap();
    assert_eq!(accepted.status, SlotStatus::Accepted);
    assert_eq!(accepted.primary_outfit_id, slot.primary_outfit_id);

    let stored = f.orchestrator.get_slot(USER, &slot.id).unwrap();
    assert_eq!(stored.status, SlotStatus::Accepted);
    assert!(f.repos.signal_repo.count_by_user(USER).unwrap() > 0);
}

#[tokio::test]
async fn test_swap_demotes_previous_primary() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 22).await;
    let slot = plan
        .slots
        .iter()
        .find(|s| !s.alternative_outfit_ids.is_empty())
        .expect("至少一天有备选");
    let previous = slot.primary_outfit_id.clone().unwrap();
    let target = slot.alternative_outfit_ids[0].clone();

    let swapped = f
        .orchestrator
        .swap_to_alternative(USER, &slot.id, &target, now())
        .unwrap();

    assert_eq!(swapped.status, SlotStatus::Modified);
    assert_eq!(swapped.primary_outfit_id.as_deref(), Some(target.as_str()));
    assert_eq!(swapped.alternative_outfit_ids[0], previous);
    assert!(!swapped.alternative_outfit_ids.contains(&target));
    assert!(swapped.alternative_outfit_ids.len() <= 3);

    let stored = f.orchestrator.get_slot(USER, &slot.id).unwrap();
    assert_eq!(stored.primary_outfit_id, swapped.primary_outfit_id);
    assert_eq!(stored.alternative_outfit_ids, swapped.alternative_outfit_ids);
}

#[tokio::test]
async fn test_swap_rejects_outfit_outside_alternatives() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 23).await;
    let slot = &plan.slots[0];

    let result = f
        .orchestrator
        .swap_to_alternative(USER, &slot.id, "not-an-alternative", now());
    assert!(matches!(result, Err(EngineError::InvalidInput(_))));

    let stored = f.orchestrator.get_slot(USER, &slot.id).unwrap();
    assert_eq!(stored.status, SlotStatus::Suggested);
}

#[tokio::test]
async fn test_worn_is_terminal_and_increments_item_counters() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 24).await;
    let slot = &plan.slots[0];
    let outfit = f
        .repos
        .outfit_repo
        .get_by_id(slot.primary_outfit_id.as_ref().unwrap())
        .unwrap();

    let worn = f.orchestrator.mark_as_worn(USER, &slot.id, now()).unwrap();
    assert_eq!(worn.status, SlotStatus::Worn);
    assert_eq!(
        f.orchestrator.get_slot(USER, &slot.id).unwrap().status,
        SlotStatus::Worn
    );

    for entry in &outfit.items {
        let item = f.repos.item_repo.get_by_id(&entry.item_id).unwrap();
        assert_eq!(item.wears_since_wash, 1);
        assert_eq!(item.times_worn, 1);
        assert_eq!(item.last_worn, Some(slot.date));
    }

    let mut rng = StdRng::seed_from_u64(1);
    assert!(matches!(
        f.orchestrator.accept_outfit(USER, &slot.id, now()),
        Err(EngineError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        f.orchestrator.skip_day(USER, &slot.id, now()),
        Err(EngineError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        f.orchestrator.mark_as_worn(USER, &slot.id, now()),
        Err(EngineError::InvalidStateTransition { .. })
    ));
    assert!(matches!(
        f.orchestrator
            .regenerate_day(USER, &slot.id, now(), &mut rng)
            .await,
        Err(EngineError::InvalidStateTransition { .. })
    ));
}

#[tokio::test]
async fn test_regenerate_day_picks_a_different_primary() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 25).await;
    let slot = &plan.slots[2];
    let before = slot.primary_outfit_id.clone();
    let mut rng = StdRng::seed_from_u64(99);

    let updated = f
        .orchestrator
        .regenerate_day(USER, &slot.id, now(), &mut rng)
        .await
        .unwrap();

    assert_eq!(updated.id, slot.id);
    assert_eq!(updated.date, slot.date);
    assert_eq!(updated.status, SlotStatus::Suggested);
    assert!(updated.primary_outfit_id.is_some());
    assert_ne!(updated.primary_outfit_id, before);
    assert!(!updated.selection_reason.is_empty());

    // 其余日计划不受影响
    let stored = f.orchestrator.get_plan(USER, monday()).unwrap().unwrap();
    for (old, new) in plan.slots.iter().zip(&stored.slots) {
        if old.id != slot.id {
            assert_eq!(old.primary_outfit_id, new.primary_outfit_id);
        }
    }
    let primary = updated.primary_outfit_id.unwrap();
    assert!(f.repos.outfit_repo.find_by_id(&primary).unwrap().is_some());
}

#[tokio::test]
async fn test_skip_day_then_worn_is_allowed() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 26).await;
    let slot = &plan.slots[3];

    let skipped = f.orchestrator.skip_day(USER, &slot.id, now()).unwrap();
    assert_eq!(skipped.status, SlotStatus::Skipped);

    let worn = f.orchestrator.mark_as_worn(USER, &slot.id, now()).unwrap();
    assert_eq!(worn.status, SlotStatus::Worn);
}

#[tokio::test]
async fn test_slot_of_other_user_is_not_found() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 27).await;

    let result = f.orchestrator.accept_outfit("intruder", &plan.slots[0].id, now());
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
    assert!(matches!(
        f.orchestrator.get_slot(USER, "missing-slot"),
        Err(EngineError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_today_and_tomorrow_lookup() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 28).await;

    let today = f
        .orchestrator
        .get_today_slot(USER, monday())
        .unwrap()
        .unwrap();
    assert_eq!(today.id, plan.slots[0].id);

    let tomorrow = f
        .orchestrator
        .get_tomorrow_slot(USER, monday())
        .unwrap()
        .unwrap();
    assert_eq!(tomorrow.id, plan.slots[1].id);

    assert!(f
        .orchestrator
        .get_today_slot(USER, monday() + Duration::days(14))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_record_outfit_used_without_plan() {
    let f = fixture(MockConfig::default());
    let items = seed_wardrobe(&f.repos);
    let outfit = add_outfit(&f.repos, "Weekend", &[&items[0], &items[4]]);

    let record = f
        .orchestrator
        .record_outfit_used(USER, &outfit.id, now().date(), None, now())
        .unwrap();
    assert_eq!(record.outfit_id, outfit.id);
    assert!(record.slot_id.is_none());

    let shirt = f.repos.item_repo.get_by_id(&items[0].id).unwrap();
    assert_eq!(shirt.wears_since_wash, 1);

    let result = f
        .orchestrator
        .record_outfit_used("intruder", &outfit.id, now().date(), None, now());
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
}

#[tokio::test]
async fn test_second_wear_on_same_slot_does_not_double_count() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 29).await;
    let slot = &plan.slots[0];
    let outfit_id = slot.primary_outfit_id.clone().unwrap();
    let outfit = f.repos.outfit_repo.get_by_id(&outfit_id).unwrap();
    let item_ids: Vec<String> = outfit.items.iter().map(|i| i.item_id.clone()).collect();
    let record = |id: &str| WearRecord {
        id: id.to_string(),
        user_id: USER.to_string(),
        outfit_id: outfit_id.clone(),
        worn_on: slot.date,
        slot_id: Some(slot.id.clone()),
        created_at: now(),
    };

    // 两个请求都已通过状态检查, 依次提交
    f.repos
        .wear_repo
        .record_wear(&record("wear-a"), &item_ids, now())
        .unwrap();
    let second = f
        .repos
        .wear_repo
        .record_wear(&record("wear-b"), &item_ids, now());
    assert!(matches!(second, Err(RepositoryError::StateConflict { .. })));

    for item_id in &item_ids {
        let item = f.repos.item_repo.get_by_id(item_id).unwrap();
        assert_eq!(item.times_worn, 1);
        assert_eq!(item.wears_since_wash, 1);
    }
    assert_eq!(f.repos.outfit_repo.get_by_id(&outfit_id).unwrap().times_worn, 1);
    assert_eq!(f.repos.wear_repo.list_by_user(USER, 10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_stale_status_write_cannot_leave_worn() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 30).await;
    let slot = &plan.slots[0];

    // 先读到 suggested 的 accept/skip/swap, 在 worn 提交后才写入
    f.orchestrator.mark_as_worn(USER, &slot.id, now()).unwrap();
    let stale = f.repos.plan_repo.update_slot_status(
        &slot.id,
        SlotStatus::Accepted,
        SlotStatus::Suggested,
        now(),
    );
    match stale {
        Err(RepositoryError::StateConflict { actual, .. }) => assert_eq!(actual, "worn"),
        other => panic!("unexpected: {:?}", other),
    }

    let mut swapped = slot.clone();
    swapped.status = SlotStatus::Modified;
    assert!(matches!(
        f.repos.plan_repo.update_slot(&swapped, SlotStatus::Suggested),
        Err(RepositoryError::StateConflict { .. })
    ));
    assert_eq!(
        f.orchestrator.get_slot(USER, &slot.id).unwrap().status,
        SlotStatus::Worn
    );
}

#[tokio::test]
async fn test_status_write_requires_status_read() {
    let f = fixture(MockConfig::default());
    let plan = planned(&f, 31).await;
    let slot = &plan.slots[1];

    f.orchestrator.accept_outfit(USER, &slot.id, now()).unwrap();
    // 基于旧的 suggested 读取的 skip 不得覆盖 accepted
    assert!(matches!(
        f.repos.plan_repo.update_slot_status(
            &slot.id,
            SlotStatus::Skipped,
            SlotStatus::Suggested,
            now(),
        ),
        Err(RepositoryError::StateConflict { .. })
    ));
    assert!(matches!(
        f.repos.plan_repo.update_slot_status(
            "missing-slot",
            SlotStatus::Skipped,
            SlotStatus::Suggested,
            now(),
        ),
        Err(RepositoryError::NotFound { .. })
    ));

    let skipped = f.orchestrator.skip_day(USER, &slot.id, now()).unwrap();
    assert_eq!(skipped.status, SlotStatus::Skipped);
}
