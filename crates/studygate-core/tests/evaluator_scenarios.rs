//! End-to-end quota scenarios against the in-memory record store.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use studygate_core::{FixedClock, FixedPlanResolver, MemoryRecordStore, QuotaEvaluator};
use studygate_models::{ActionKind, Calendar, Plan, QuotaDefinition, RecordKind, UsageSummary};

const USER: &str = "student-1";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0).unwrap()
}

fn month_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()
}

fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()
}

fn free_evaluator(store: Arc<MemoryRecordStore>) -> QuotaEvaluator {
    evaluator_for(store, Plan::Free)
}

fn evaluator_for(store: Arc<MemoryRecordStore>, plan: Plan) -> QuotaEvaluator {
    QuotaEvaluator::new(store, Arc::new(FixedPlanResolver::new(plan)))
        .with_clock(Arc::new(FixedClock(now())))
        .with_calendar(Calendar::utc())
}

// =============================================================================
// Materials
// =============================================================================

#[tokio::test]
async fn test_three_materials_denies_upload() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .insert_many(RecordKind::StudyMaterial, USER, now() - TimeDelta::days(90), 3)
        .await;

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::UploadMaterial)
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert_eq!(decision.current, Some(3));
    assert_eq!(decision.limit, Some(3));
    assert!(decision.reason.unwrap().contains('3'));
    assert!(decision.upgrade_message.is_some());
}

#[tokio::test]
async fn test_two_materials_allows_with_one_remaining() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, USER, now(), 2).await;

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::UploadMaterial)
        .await
        .unwrap();

    assert!(decision.allowed);
    assert_eq!(decision.current, Some(2));
    assert_eq!(decision.limit, Some(3));
    assert_eq!(decision.remaining, Some(1));
}

#[tokio::test]
async fn test_other_users_records_are_ignored() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, "someone-else", now(), 5).await;

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::UploadMaterial)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.current, Some(0));
}

#[tokio::test]
async fn test_user_id_is_matched_exactly() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, "u1", now(), 3).await;

    let evaluator = free_evaluator(store);
    let padded = evaluator.evaluate(" u1 ", ActionKind::UploadMaterial).await.unwrap();
    assert!(padded.allowed);
    assert_eq!(padded.current, Some(0));

    let exact = evaluator.evaluate("u1", ActionKind::UploadMaterial).await.unwrap();
    assert!(!exact.allowed);
    assert_eq!(exact.current, Some(3));
}

// =============================================================================
// Quizzes
// =============================================================================

#[tokio::test]
async fn test_quizzes_from_last_month_do_not_count() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .insert_many(RecordKind::QuizResult, USER, month_start() - TimeDelta::days(3), 10)
        .await;
    store.insert_many(RecordKind::QuizResult, USER, month_start() + TimeDelta::days(2), 5).await;

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::TakeQuiz)
        .await
        .unwrap();

    assert!(!decision.allowed);
    assert_eq!(decision.current, Some(5));
    assert_eq!(decision.limit, Some(QuotaDefinition::QUIZZES_PER_MONTH));
}

#[tokio::test]
async fn test_month_boundary() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .insert_many(RecordKind::QuizResult, USER, month_start() - TimeDelta::milliseconds(1), 4)
        .await;
    store.insert(RecordKind::QuizResult, USER, month_start()).await;

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::TakeQuiz)
        .await
        .unwrap();

    // Only the record at exactly the month start is inside the window
    assert!(decision.allowed);
    assert_eq!(decision.current, Some(1));
    assert_eq!(decision.remaining, Some(4));
}

// =============================================================================
// AI writings
// =============================================================================

#[tokio::test]
async fn test_day_boundary() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .insert(RecordKind::AiWriting, USER, day_start() - TimeDelta::milliseconds(1))
        .await;

    let evaluator = free_evaluator(store.clone());
    let decision = evaluator.evaluate(USER, ActionKind::AiWriting).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.remaining, Some(1));

    store.insert(RecordKind::AiWriting, USER, day_start()).await;
    let decision = evaluator.evaluate(USER, ActionKind::AiWriting).await.unwrap();
    assert!(!decision.allowed);
    assert_eq!(decision.current, Some(1));
}

#[tokio::test]
async fn test_fixed_offset_calendar_shifts_day_start() {
    let store = Arc::new(MemoryRecordStore::new());
    // 22:00 UTC on the 17th is already the 18th at +03:00
    store
        .insert(RecordKind::AiWriting, USER, Utc.with_ymd_and_hms(2026, 10, 17, 22, 0, 0).unwrap())
        .await;

    let plus_three: Calendar = "+03:00".parse().unwrap();
    let decision = free_evaluator(store.clone())
        .with_calendar(plus_three)
        .evaluate(USER, ActionKind::AiWriting)
        .await
        .unwrap();
    assert!(!decision.allowed);

    let decision = free_evaluator(store)
        .evaluate(USER, ActionKind::AiWriting)
        .await
        .unwrap();
    assert!(decision.allowed);
}

// =============================================================================
// Plans and ungated actions
// =============================================================================

#[tokio::test]
async fn test_paid_plans_always_allowed() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, USER, now(), 50).await;
    store.insert_many(RecordKind::QuizResult, USER, now(), 50).await;
    store.insert_many(RecordKind::AiWriting, USER, now(), 50).await;

    for plan in [Plan::Starter, Plan::Pro] {
        let evaluator = evaluator_for(store.clone(), plan);
        for action in [
            ActionKind::UploadMaterial,
            ActionKind::TakeQuiz,
            ActionKind::AiWriting,
            ActionKind::GenerateQuestions,
            ActionKind::Other,
        ] {
            let decision = evaluator.evaluate(USER, action).await.unwrap();
            assert!(decision.allowed, "{plan} {action}");
            assert!(decision.current.is_none());
            assert!(decision.remaining.is_none());
        }
    }
}

#[tokio::test]
async fn test_generate_questions_and_unknown_actions_allowed() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, USER, now(), 10).await;

    let evaluator = free_evaluator(store);
    let questions = evaluator
        .evaluate(USER, ActionKind::GenerateQuestions)
        .await
        .unwrap();
    assert!(questions.allowed);

    let unknown = evaluator
        .evaluate(USER, ActionKind::from_str("export_flashcards"))
        .await
        .unwrap();
    assert!(unknown.allowed);
    assert!(!unknown.is_metered());
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_evaluate_is_idempotent() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::QuizResult, USER, now(), 2).await;

    let evaluator = free_evaluator(store);
    let first = evaluator.evaluate(USER, ActionKind::TakeQuiz).await.unwrap();
    let second = evaluator.evaluate(USER, ActionKind::TakeQuiz).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_remaining_decreases_until_denied() {
    let store = Arc::new(MemoryRecordStore::new());
    let evaluator = free_evaluator(store.clone());

    for taken in 0..QuotaDefinition::QUIZZES_PER_MONTH {
        let decision = evaluator.evaluate(USER, ActionKind::TakeQuiz).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.current, Some(taken));
        assert_eq!(decision.remaining, Some(QuotaDefinition::QUIZZES_PER_MONTH - taken));
        store.insert(RecordKind::QuizResult, USER, now()).await;
    }

    let decision = evaluator.evaluate(USER, ActionKind::TakeQuiz).await.unwrap();
    assert!(!decision.allowed);
}

// =============================================================================
// Usage stats
// =============================================================================

#[tokio::test]
async fn test_usage_stats_for_new_user() {
    let store = Arc::new(MemoryRecordStore::new());
    let stats = free_evaluator(store).usage_stats(USER).await.unwrap();

    assert_eq!(
        stats.materials,
        UsageSummary { used: 0, limit: 3, remaining: 3 }
    );
    assert_eq!(
        stats.quizzes,
        UsageSummary { used: 0, limit: 5, remaining: 5 }
    );
    assert_eq!(
        stats.writings,
        UsageSummary { used: 0, limit: 1, remaining: 1 }
    );
}

#[tokio::test]
async fn test_usage_stats_zero_remaining_at_limit() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, USER, now(), 4).await;
    store.insert_many(RecordKind::QuizResult, USER, now(), 2).await;
    store.insert(RecordKind::AiWriting, USER, now()).await;

    let stats = free_evaluator(store).usage_stats(USER).await.unwrap();
    assert_eq!(stats.materials, UsageSummary { used: 4, limit: 3, remaining: 0 });
    assert_eq!(stats.quizzes, UsageSummary { used: 2, limit: 5, remaining: 3 });
    assert_eq!(stats.writings, UsageSummary { used: 1, limit: 1, remaining: 0 });
}

#[tokio::test]
async fn test_usage_stats_ignore_plan() {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_many(RecordKind::StudyMaterial, USER, now(), 1).await;

    let stats = evaluator_for(store, Plan::Pro).usage_stats(USER).await.unwrap();
    assert_eq!(stats.materials.used, 1);
    assert_eq!(stats.materials.remaining, 2);
}
