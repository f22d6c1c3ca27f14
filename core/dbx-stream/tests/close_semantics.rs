// Close 보장 통합 테스트
//
// 등록된 close 동작과 cursor 가 모든 종료 경로(소진, 조기 종료, 실패, drop,
// 동시 close)에서 정확히 한 번 실행되는지 확인한다.

mod common;

use common::*;
use dbx_stream::{
    AutoClose, CloseAction, CloseRegistry, EntitySource, EntityStream, StreamError, VecCursor,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

// ─── Helpers ────────────────────────────────────────────

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn record(log: &Log, name: impl Into<String>) -> CloseAction {
    let log = Arc::clone(log);
    let name = name.into();
    CloseAction::infallible(move || log.lock().push(name.clone()))
}

/// close 시 이름을 기록하는 cursor 위의 시퀀스
fn logged_cursor(log: &Log, name: &str, items: Vec<i64>) -> AutoClose<i64> {
    let log = Arc::clone(log);
    let name = name.to_string();
    AutoClose::from_cursor(Box::new(
        VecCursor::new(items).with_close_hook(move || log.lock().push(name)),
    ))
}

fn counter_action(counter: &Arc<AtomicUsize>) -> CloseAction {
    let counter = Arc::clone(counter);
    CloseAction::infallible(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

fn sqlite_stream(source: &Arc<SqliteSource>) -> EntityStream<Person> {
    let source: Arc<dyn EntitySource<Person>> = source.clone();
    EntityStream::new(source)
}

// ═══════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════

#[test]
fn test_concurrent_close_runs_each_action_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let registry = CloseRegistry::new();
    let shared = counter_action(&runs);
    registry.on_close(shared.clone());
    registry.on_close(shared);
    registry.on_close(counter_action(&runs));

    thread::scope(|scope| {
        for _ in 0..2 {
            let registry = Arc::clone(&registry);
            scope.spawn(move || {
                for _ in 0..3 {
                    registry.close().unwrap();
                }
            });
        }
    });

    assert!(registry.is_closed());
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[test]
fn test_action_registered_after_close_runs_immediately() {
    let runs = Arc::new(AtomicUsize::new(0));
    let registry = CloseRegistry::new();
    registry.close().unwrap();

    registry.on_close(counter_action(&runs));
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    registry.close().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

// ═══════════════════════════════════════════════════════════
// flat_map
// ═══════════════════════════════════════════════════════════

#[test]
fn test_flat_map_children_close_before_parent() {
    let events = log();
    let child_log = Arc::clone(&events);

    let out: Vec<i64> = logged_cursor(&events, "parent-cursor", vec![1, 2])
        .on_close(record(&events, "parent"))
        .flat_map(move |n| {
            logged_cursor(&child_log, &format!("child-{n}"), vec![n * 10, n * 10 + 1])
        })
        .collect()
        .unwrap();

    assert_eq!(out, vec![10, 11, 20, 21]);
    assert_eq!(
        *events.lock(),
        vec!["child-1", "child-2", "parent-cursor", "parent"]
    );
}

#[test]
fn test_flat_map_open_child_closed_by_parent() {
    let events = log();
    let child_log = Arc::clone(&events);

    let out: Vec<i64> = logged_cursor(&events, "parent-cursor", vec![1, 2])
        .on_close(record(&events, "parent"))
        .flat_map(move |n| logged_cursor(&child_log, &format!("child-{n}"), vec![n; 3]))
        .limit(2)
        .collect()
        .unwrap();

    assert_eq!(out, vec![1, 1]);
    assert_eq!(
        *events.lock(),
        vec!["child-1", "parent-cursor", "parent"]
    );
}

// ═══════════════════════════════════════════════════════════
// Failure paths
// ═══════════════════════════════════════════════════════════

#[test]
fn test_close_failure_surfaces_after_success() {
    let result = AutoClose::from_vec(vec![1, 2, 3])
        .on_close(CloseAction::new(|| {
            Err(StreamError::ResourceRelease("connection reset".into()))
        }))
        .count();

    assert!(matches!(result, Err(StreamError::ResourceRelease(_))));
}

#[test]
fn test_computation_failure_wins_over_close_failure() {
    let runs = Arc::new(AtomicUsize::new(0));
    let result: Result<Vec<i64>, _> = AutoClose::from_vec(vec![1, 2, 3])
        .on_close(counter_action(&runs))
        .on_close(CloseAction::new(|| {
            Err(StreamError::ResourceRelease("late".into()))
        }))
        .try_map(|n| {
            if n == 2 {
                Err(StreamError::RowMapping("bad row".into()))
            } else {
                Ok(n)
            }
        })
        .collect();

    assert!(matches!(result, Err(StreamError::RowMapping(_))));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unterminated_sequence_closes_on_drop() {
    let events = log();
    {
        let _pending = logged_cursor(&events, "cursor", vec![1, 2, 3])
            .filter(|n| n % 2 == 1)
            .on_close(record(&events, "action"));
    }
    assert_eq!(*events.lock(), vec!["cursor", "action"]);
}

// ═══════════════════════════════════════════════════════════
// Open handles over SQLite
// ═══════════════════════════════════════════════════════════

#[test]
fn test_iterator_dropped_early_releases_cursor() {
    let source = SqliteSource::shared(&people());
    let runs = Arc::new(AtomicUsize::new(0));

    let mut iter = sqlite_stream(&source)
        .filter(age().greater_than(20))
        .on_close(counter_action(&runs))
        .iterator()
        .unwrap();
    assert_eq!(iter.next().unwrap().unwrap().id, 1);
    assert_eq!(source.close_count(), 0);

    drop(iter);
    assert_eq!(source.close_count(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_spliterator_halves_share_one_close() {
    let source = SqliteSource::shared(&people());

    let mut suffix = sqlite_stream(&source).spliterator().unwrap();
    let mut prefix = suffix.try_split().unwrap().expect("split");

    let mut seen = Vec::new();
    prefix.for_each_remaining(|p| seen.push(p.id)).unwrap();
    suffix.for_each_remaining(|p| seen.push(p.id)).unwrap();
    seen.sort_unstable();
    assert_eq!(seen, (1..=8).collect::<Vec<_>>());

    // 두 조각은 레지스트리를 공유하므로 cursor 는 한 번만 닫힌다
    prefix.close().unwrap();
    suffix.close().unwrap();
    assert_eq!(source.close_count(), 1);
}

#[test]
fn test_terminal_closes_pipeline_actions_once() {
    let source = SqliteSource::shared(&people());
    let runs = Arc::new(AtomicUsize::new(0));
    let action = counter_action(&runs);

    let count = sqlite_stream(&source)
        .on_close(action.clone())
        .filter(city().equal("Busan"))
        .on_close(action)
        .count()
        .unwrap();

    assert_eq!(count, 2);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}
