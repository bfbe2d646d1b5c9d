use super::*;
use crate::domain::outfit::{Outfit, OutfitItem, OutfitSource};
use crate::domain::types::{ItemStatus, LayerPosition, Role};
use crate::domain::wardrobe::ClothingItem;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ==========================================
// 测试辅助函数
// ==========================================

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn now() -> NaiveDateTime {
    date().and_hms_opt(8, 0, 0).unwrap()
}

fn item(id: &str, name: &str, color: &str) -> ClothingItem {
    ClothingItem {
        id: id.to_string(),
        user_id: "u1".to_string(),
        name: name.to_string(),
        category: "Tops".to_string(),
        color: Some(color.to_string()),
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

fn outfit(id: &str, items: &[ClothingItem]) -> Outfit {
    Outfit {
        id: id.to_string(),
        user_id: "u1".to_string(),
        name: id.to_string(),
        items: items
            .iter()
            .enumerate()
            .map(|(idx, i)| OutfitItem {
                item_id: i.id.clone(),
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

fn candidate(outfit: Outfit, items: Vec<ClothingItem>) -> CandidateOutfit {
    CandidateOutfit {
        outfit,
        items,
        is_new: false,
    }
}

fn weather(temp: f64, condition: &str) -> DailyForecast {
    DailyForecast {
        temp_min: temp - 3.0,
        temp_max: temp + 3.0,
        temp_avg: temp,
        condition: condition.to_string(),
        ..DailyForecast::neutral(date())
    }
}

fn event(occasion: &str) -> CalendarEvent {
    CalendarEvent {
        id: format!("e-{}", occasion),
        user_id: "u1".to_string(),
        title: format!("{} meeting", occasion),
        date: date(),
        occasion: Some(occasion.to_string()),
    }
}

struct FixedBoost(Result<Option<f64>, ()>);

impl PreferenceSource for FixedBoost {
    fn preference_boost(&self, _candidate: &CandidateOutfit) -> EngineResult<Option<f64>> {
        match &self.0 {
            Ok(v) => Ok(*v),
            Err(_) => Err(EngineError::Preference("模型损坏".to_string())),
        }
    }
}

// ==========================================
// 权重
// ==========================================

#[test]
fn test_weekly_weights_sum_to_one() {
    assert!((ScoringWeights::WEEKLY.sum() - 1.0).abs() < 1e-9);
    assert_eq!(ScoringWeights::default(), ScoringWeights::WEEKLY);
}

#[test]
fn test_personalized_weights_keep_unit_sum() {
    let w = ScoringWeights::from_personalized(&PersonalizedWeights::VARIETY);
    assert!((w.sum() - 1.0).abs() < 1e-9);
    assert_eq!(w.color, 0.06);
}

// ==========================================
// 单项评分
// ==========================================

#[test]
fn test_weather_inside_declared_bounds_scores_full() {
    let tee = item("a", "Tee", "white");
    let mut o = outfit("o1", &[tee.clone()]);
    o.min_temperature = Some(10.0);
    o.max_temperature = Some(20.0);
    let c = candidate(o, vec![tee]);

    assert_eq!(weather_score(&c, &weather(15.0, "Clear")), 1.0);
    assert_eq!(weather_score(&c, &weather(23.0, "Clear")), 0.7);
    assert_eq!(weather_score(&c, &weather(30.0, "Clear")), 0.3);
}

#[test]
fn test_weather_keyword_inference_and_rain_shift() {
    let coat = item("a", "Wool Coat", "black");
    let c = candidate(outfit("o1", &[coat.clone()]), vec![coat]);
    assert!((weather_score(&c, &weather(5.0, "Clear")) - 0.7).abs() < 1e-12);
    assert!((weather_score(&c, &weather(5.0, "Rain")) - 0.5).abs() < 1e-12);

    let mut rain_ready = c.clone();
    rain_ready.outfit.suitable_weather = vec!["Rainy".to_string()];
    assert!((weather_score(&rain_ready, &weather(5.0, "light rain")) - 0.9).abs() < 1e-12);
}

#[test]
fn test_occasion_rules() {
    let tee = item("a", "Tee", "white");
    let mut o = outfit("o1", &[tee]);

    assert_eq!(occasion_score(&o, &[]), 0.5);
    o.occasion = Some("Casual".to_string());
    assert_eq!(occasion_score(&o, &[]), 0.9);

    o.occasion = Some("work".to_string());
    assert_eq!(occasion_score(&o, &[event("work")]), 1.0);

    o.occasion = Some("evening".to_string());
    assert_eq!(occasion_score(&o, &[event("formal")]), 0.8);

    o.occasion = Some("casual".to_string());
    assert_eq!(occasion_score(&o, &[event("formal")]), 0.5);

    o.occasion = None;
    assert_eq!(occasion_score(&o, &[event("formal")]), 0.4);
}

#[test]
fn test_recency_is_monotonic() {
    let target = date();
    let mut previous = 0.0;
    for days in 0..40 {
        let score = recency_score(Some(target - Duration::days(days)), target);
        assert!(score >= previous, "days={} score={}", days, score);
        previous = score;
    }
    assert_eq!(recency_score(None, target), 1.0);
    assert_eq!(recency_score(Some(target - Duration::days(3)), target), 0.2);
    assert_eq!(recency_score(Some(target - Duration::days(4)), target), 0.5);
}

#[test]
fn test_style_score_components() {
    let tee = item("a", "Tee", "white");
    let mut o = outfit("o1", &[tee]);
    assert_eq!(style_score(&o, None), 0.6);

    let profile = StyleProfile {
        user_id: "u1".to_string(),
        preferred_styles: vec!["Minimal".to_string(), "street".to_string()],
    };
    o.style_tags = vec!["minimal".to_string(), "street".to_string()];
    o.favorite = true;
    o.rating = Some(5);
    assert_eq!(style_score(&o, Some(&profile)), 1.0);

    o.style_tags.clear();
    o.favorite = false;
    o.rating = Some(1);
    assert!((style_score(&o, Some(&profile)) - 0.3).abs() < 1e-12);
}

#[test]
fn test_color_buckets() {
    let c = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(color_score(&c(&["red"])), 0.7);
    assert_eq!(color_score(&c(&["red", "black"])), 0.9);
    assert_eq!(color_score(&c(&["red", "green", "blue"])), 0.7);
    assert_eq!(color_score(&c(&["red", "green", "blue", "pink"])), 0.5);
}

// ==========================================
// 综合评分
// ==========================================

#[test]
fn test_every_factor_in_unit_range() {
    let items = vec![
        item("a", "Wool Coat", "red"),
        item("b", "Linen Shorts", "green"),
        item("c", "Tank", "blue"),
        item("d", "Sandal", "pink"),
    ];
    let mut o = outfit("o1", &items);
    o.rating = Some(1);
    o.occasion = Some("sport".to_string());
    let c = candidate(o, items);
    let history = HashMap::new();
    let events = vec![event("sports"), event("formal")];
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, DEFAULT_JITTER, PreferenceState::Unavailable);
    let mut rng = StdRng::seed_from_u64(1);

    for temp in [-10.0, 0.0, 12.0, 20.0, 29.0, 40.0] {
        for condition in ["Clear", "Rain", "Snow"] {
            let w = weather(temp, condition);
            let ctx = DayContext {
                date: date(),
                weather: &w,
                events: &events,
                wear_history: &history,
                style_profile: None,
            };
            let s = engine.score(&c, &ctx, &mut rng);
            for v in [s.weather, s.occasion, s.recency, s.preference, s.style, s.color, s.total] {
                assert!((0.0..=1.0).contains(&v), "值越界: {}", v);
            }
        }
    }
}

#[test]
fn test_jitter_is_separable_from_base() {
    let tee = item("a", "Tee", "white");
    let c = candidate(outfit("o1", &[tee.clone()]), vec![tee]);
    let history = HashMap::new();
    let w = weather(20.0, "Clear");
    let ctx = DayContext {
        date: date(),
        weather: &w,
        events: &[],
        wear_history: &history,
        style_profile: None,
    };
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, DEFAULT_JITTER, PreferenceState::Unavailable);
    let base = engine.score_base(&c, &ctx);
    assert_eq!(base.jitter, 0.0);
    assert_eq!(base.base, base.total);

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let s = engine.score(&c, &ctx, &mut rng);
        assert_eq!(s.base, base.base);
        assert!(s.jitter.abs() <= DEFAULT_JITTER + 1e-12);
        assert!((s.total - (s.base + s.jitter).clamp(0.0, 1.0)).abs() < 1e-12);
    }
}

#[test]
fn test_same_seed_same_scores() {
    let tee = item("a", "Tee", "white");
    let c = candidate(outfit("o1", &[tee.clone()]), vec![tee]);
    let history = HashMap::new();
    let w = weather(20.0, "Clear");
    let ctx = DayContext {
        date: date(),
        weather: &w,
        events: &[],
        wear_history: &history,
        style_profile: None,
    };
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, DEFAULT_JITTER, PreferenceState::Unavailable);
    let a = engine.score(&c, &ctx, &mut StdRng::seed_from_u64(7));
    let b = engine.score(&c, &ctx, &mut StdRng::seed_from_u64(7));
    assert_eq!(a, b);
}

#[test]
fn test_wear_history_feeds_recency() {
    let tee = item("a", "Tee", "white");
    let c = candidate(outfit("o1", &[tee.clone()]), vec![tee]);
    let mut history = HashMap::new();
    history.insert("o1".to_string(), date() - Duration::days(2));
    let w = weather(20.0, "Clear");
    let ctx = DayContext {
        date: date(),
        weather: &w,
        events: &[],
        wear_history: &history,
        style_profile: None,
    };
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Unavailable);
    assert_eq!(engine.score_base(&c, &ctx).recency, 0.2);
}

#[test]
fn test_preference_outcomes_are_reported() {
    let tee = item("a", "Tee", "white");
    let c = candidate(outfit("o1", &[tee.clone()]), vec![tee]);

    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Unavailable);
    assert_eq!(engine.preference_score(&c), (0.5, PreferenceOutcome::Unavailable));

    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::LoadFailed);
    assert_eq!(engine.preference_score(&c), (0.5, PreferenceOutcome::Failed));

    let learned = FixedBoost(Ok(Some(0.6)));
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Ready(&learned));
    let (score, outcome) = engine.preference_score(&c);
    assert!((score - 0.8).abs() < 1e-12);
    assert_eq!(outcome, PreferenceOutcome::Learned);

    let empty = FixedBoost(Ok(None));
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Ready(&empty));
    assert_eq!(engine.preference_score(&c), (0.5, PreferenceOutcome::NoData));

    let broken = FixedBoost(Err(()));
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Ready(&broken));
    assert_eq!(engine.preference_score(&c), (0.5, PreferenceOutcome::Failed));
}

#[test]
fn test_empty_model_reports_no_data() {
    let tee = item("a", "Tee", "white");
    let c = candidate(outfit("o1", &[tee.clone()]), vec![tee]);
    let model = PreferenceModel::default();
    let engine = ScoringEngine::new(ScoringWeights::WEEKLY, 0.0, PreferenceState::Ready(&model));
    assert_eq!(engine.preference_score(&c).1, PreferenceOutcome::NoData);
}

// ==========================================
// 即时推荐评分
// ==========================================

#[test]
fn test_color_harmony_pairs() {
    let c = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    assert_eq!(color_harmony(&c(&["red"])), 0.5);
    assert_eq!(color_harmony(&c(&["red", "black"])), 0.9);
    assert_eq!(color_harmony(&c(&["red", "red"])), 0.8);
    assert_eq!(color_harmony(&c(&["red", "green"])), 0.5);
}

#[test]
fn test_daily_score_is_bounded() {
    let mut a = item("a", "Tee", "black");
    a.favorite = true;
    a.seasons = vec!["Summer".to_string()];
    a.tags = vec!["minimal".to_string()];
    let mut b = a.clone();
    b.id = "b".to_string();
    b.color = Some("white".to_string());
    let items = vec![a, b];
    let prefs = DailyPreferences::build(&items, &[]);
    let profile = StyleProfile {
        user_id: "u1".to_string(),
        preferred_styles: vec!["minimal".to_string()],
    };

    let s = daily_score(&items, &prefs, Some(&profile), date());
    assert_eq!(season_of(date()), "summer");
    assert_eq!(s.season_match, 1.0);
    assert_eq!(s.style, 1.0);
    assert!(s.total <= 1.0);
    assert!(!s.reason.is_empty());
}
