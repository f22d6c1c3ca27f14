// Pushdown 동등성 테스트
//
// 같은 Pipeline 을 SQL pushdown 경로(실제 SQLite 실행)와 전체 in-memory 경로로
// 실행해 결과가 순서까지 같은지 확인한다.

mod common;

use common::*;
use dbx_stream::{
    Comparator, EntitySource, EntityStream, FeatureFlags, Inclusion, NullOrder, Predicate,
    StreamError, StreamResult,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;

// ─── Helpers ────────────────────────────────────────────

fn stream(source: &Arc<SqliteSource>) -> EntityStream<Person> {
    let source: Arc<dyn EntitySource<Person>> = source.clone();
    EntityStream::new(source)
}

fn in_memory(source: &Arc<SqliteSource>) -> EntityStream<Person> {
    stream(source).with_flags(FeatureFlags::in_memory_only())
}

fn ids(people: StreamResult<Vec<Person>>) -> Vec<i64> {
    people.unwrap().into_iter().map(|p| p.id).collect()
}

/// 두 경로의 결과를 비교하고 pushdown 결과의 id 를 돌려준다
fn both_paths<F>(source: &Arc<SqliteSource>, build: F) -> Vec<i64>
where
    F: Fn(EntityStream<Person>) -> EntityStream<Person>,
{
    let pushed = ids(build(stream(source)).collect());
    let memory = ids(build(in_memory(source)).collect());
    assert_eq!(pushed, memory, "pushdown and in-memory results differ");
    pushed
}

const WORDS: &[&str] = &[
    "", "alice", "Alice", "ALICE", "al", "ce", "bob", "Bob", "100%", "%", "_", "a_c", "abc",
    "Seoul", "seoul", "Busan",
];

// ─── Generated conditions ───────────────────────────────

#[derive(Debug, Clone)]
enum Cond {
    AgeCompare { op: u8, value: i64 },
    AgeBetween { lo: i64, hi: i64, inclusion: (bool, bool), negated: bool },
    AgeIn { values: Vec<i64>, negated: bool },
    AgeNull { negated: bool },
    Text { city: bool, equality: bool, mode: u8, ignore_case: bool, negated: bool, value: String },
    TextEmpty { city: bool, negated: bool },
    TagsCompare { op: u8, values: Vec<i64> },
    Constant(bool),
}

impl Cond {
    fn predicate(&self) -> Predicate<Person> {
        match self {
            Cond::AgeCompare { op, value } => match op {
                0 => age().equal(*value),
                1 => age().not_equal(*value),
                2 => age().greater_than(*value),
                3 => age().greater_or_equal(*value),
                4 => age().less_than(*value),
                _ => age().less_or_equal(*value),
            },
            Cond::AgeBetween { lo, hi, inclusion, negated } => {
                let inclusion = Inclusion::new(inclusion.0, inclusion.1);
                if *negated {
                    age().not_between(*lo, *hi, inclusion)
                } else {
                    age().between_with(*lo, *hi, inclusion)
                }
            }
            Cond::AgeIn { values, negated } => {
                if *negated {
                    age().not_in(values.clone())
                } else {
                    age().is_in(values.clone())
                }
            }
            Cond::AgeNull { negated } => {
                if *negated {
                    age().is_not_null()
                } else {
                    age().is_null()
                }
            }
            Cond::Text { city: on_city, equality, mode, ignore_case, negated, value } => {
                let field = if *on_city { city() } else { name() };
                let value = value.as_str();
                if *equality {
                    return match (ignore_case, negated) {
                        (false, false) => field.equal(value),
                        (false, true) => field.not_equal(value),
                        (true, false) => field.equal_ignore_case(value),
                        (true, true) => field.not_equal_ignore_case(value),
                    };
                }
                match (mode % 3, ignore_case, negated) {
                    (0, false, false) => field.starts_with(value),
                    (0, false, true) => field.not_starts_with(value),
                    (0, true, false) => field.starts_with_ignore_case(value),
                    (0, true, true) => field.not_starts_with_ignore_case(value),
                    (1, false, false) => field.contains(value),
                    (1, false, true) => field.not_contains(value),
                    (1, true, false) => field.contains_ignore_case(value),
                    (1, true, true) => field.not_contains_ignore_case(value),
                    (_, false, false) => field.ends_with(value),
                    (_, false, true) => field.not_ends_with(value),
                    (_, true, false) => field.ends_with_ignore_case(value),
                    (_, true, true) => field.not_ends_with_ignore_case(value),
                }
            }
            Cond::TextEmpty { city: on_city, negated } => {
                let field = if *on_city { city() } else { name() };
                if *negated {
                    field.is_not_empty()
                } else {
                    field.is_empty()
                }
            }
            Cond::TagsCompare { op, values } => {
                let values = values.clone();
                match op {
                    0 => tags().equal(values),
                    1 => tags().not_equal(values),
                    2 => tags().greater_than(values),
                    3 => tags().greater_or_equal(values),
                    4 => tags().less_than(values),
                    _ => tags().less_or_equal(values),
                }
            }
            Cond::Constant(value) => {
                if *value {
                    id().always_true()
                } else {
                    id().always_false()
                }
            }
        }
    }
}

fn word() -> impl Strategy<Value = String> {
    prop::sample::select(WORDS).prop_map(str::to_string)
}

fn cond() -> impl Strategy<Value = Cond> {
    prop_oneof![
        (0u8..6, 0i64..15).prop_map(|(op, value)| Cond::AgeCompare { op, value }),
        (0i64..15, 0i64..15, any::<(bool, bool)>(), any::<bool>()).prop_map(
            |(lo, hi, inclusion, negated)| Cond::AgeBetween { lo, hi, inclusion, negated }
        ),
        (vec(0i64..15, 0..4), any::<bool>())
            .prop_map(|(values, negated)| Cond::AgeIn { values, negated }),
        any::<bool>().prop_map(|negated| Cond::AgeNull { negated }),
        (any::<bool>(), any::<bool>(), 0u8..3, any::<bool>(), any::<bool>(), word()).prop_map(
            |(city, equality, mode, ignore_case, negated, value)| Cond::Text {
                city,
                equality,
                mode,
                ignore_case,
                negated,
                value,
            }
        ),
        (any::<bool>(), any::<bool>())
            .prop_map(|(city, negated)| Cond::TextEmpty { city, negated }),
        (0u8..6, vec(0i64..12, 0..3))
            .prop_map(|(op, values)| Cond::TagsCompare { op, values }),
        any::<bool>().prop_map(Cond::Constant),
    ]
}

fn rows() -> impl Strategy<Value = Vec<Person>> {
    vec(
        (
            prop::option::of(word()),
            prop::option::of(0i64..15),
            prop::option::of(word()),
            vec(0i64..12, 0..3),
        ),
        0..14,
    )
    .prop_map(|columns| {
        columns
            .into_iter()
            .enumerate()
            .map(|(i, (name, age, city, tags))| Person {
                id: i as i64 + 1,
                name,
                age,
                city,
                tags,
            })
            .collect()
    })
}

/// 필드 하나 + id tie-break (결과 순서가 완전히 결정되도록)
fn sort_key(field: u8, reversed: bool, nulls_first: bool) -> Comparator<Person> {
    let field = match field {
        0 => name(),
        1 => age(),
        _ => city(),
    };
    let key = if nulls_first {
        field.comparator_nulls_first()
    } else {
        field.comparator()
    };
    let key = if reversed { key.reversed() } else { key };
    key.then_comparing(id().comparator())
}

#[derive(Debug, Clone)]
struct Plan {
    conds: Vec<Cond>,
    opaque_odd_ids: bool,
    sort: (u8, bool, bool),
    skip: u64,
    limit: Option<u64>,
}

fn plan() -> impl Strategy<Value = Plan> {
    (
        vec(cond(), 0..4),
        any::<bool>(),
        (0u8..3, any::<bool>(), any::<bool>()),
        0u64..4,
        prop::option::of(0u64..8),
    )
        .prop_map(|(conds, opaque_odd_ids, sort, skip, limit)| Plan {
            conds,
            opaque_odd_ids,
            sort,
            skip,
            limit,
        })
}

impl Plan {
    fn apply(&self, mut stream: EntityStream<Person>) -> EntityStream<Person> {
        for cond in &self.conds {
            stream = stream.filter(cond.predicate());
        }
        if self.opaque_odd_ids {
            stream = stream.filter(Predicate::opaque(|p: &Person| p.id % 2 == 1));
        }
        let (field, reversed, nulls_first) = self.sort;
        stream = stream.sorted(sort_key(field, reversed, nulls_first));
        if self.skip > 0 {
            stream = stream.skip(self.skip);
        }
        if let Some(limit) = self.limit {
            stream = stream.limit(limit);
        }
        stream
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// 임의의 filter / sort / skip / limit 조합에서 두 경로의 결과가 같다
    #[test]
    fn prop_pushdown_matches_in_memory(data in rows(), plan in plan()) {
        let source = SqliteSource::shared(&data);

        let pushed = ids(plan.apply(stream(&source)).collect());
        let memory = ids(plan.apply(in_memory(&source)).collect());
        prop_assert_eq!(&pushed, &memory);

        let pushed_count = plan.apply(stream(&source)).count().unwrap();
        let memory_count = plan.apply(in_memory(&source)).count().unwrap();
        prop_assert_eq!(pushed_count, memory_count);
        prop_assert_eq!(pushed_count, pushed.len() as u64);
    }

    /// AND / OR / NOT 조합은 구조와 관계없이 같은 결과
    #[test]
    fn prop_compound_predicates_match(data in rows(), a in cond(), b in cond(), c in cond()) {
        let source = SqliteSource::shared(&data);
        let build = |s: EntityStream<Person>| {
            s.filter(a.predicate().or(b.predicate()).and(c.predicate().negate()))
                .sorted(id().comparator())
        };

        let pushed = ids(build(stream(&source)).collect());
        let memory = ids(build(in_memory(&source)).collect());
        prop_assert_eq!(pushed, memory);
    }
}

// ─── Exhaustive between ─────────────────────────────────

#[test]
fn test_between_and_not_between_over_small_range() {
    let mut data: Vec<Person> = (0..15)
        .map(|age| person(age + 1, None, Some(age), None))
        .collect();
    data.push(person(100, None, None, None));
    let source = SqliteSource::shared(&data);

    let inclusions = [
        Inclusion::StartInclusiveEndInclusive,
        Inclusion::StartInclusiveEndExclusive,
        Inclusion::StartExclusiveEndInclusive,
        Inclusion::StartExclusiveEndExclusive,
    ];
    for lo in 0..15_i64 {
        for hi in 0..15_i64 {
            for inclusion in inclusions {
                let inside = both_paths(&source, |s| {
                    s.filter(age().between_with(lo, hi, inclusion))
                        .sorted(id().comparator())
                });
                let outside = both_paths(&source, |s| {
                    s.filter(age().not_between(lo, hi, inclusion))
                        .sorted(id().comparator())
                });

                // NULL 나이는 어느 쪽에도 속하지 않는다
                assert!(!inside.contains(&100) && !outside.contains(&100));
                assert_eq!(inside.len() + outside.len(), 15, "{lo}..{hi} {inclusion:?}");
            }
        }
    }
}

// ─── Fixed data ─────────────────────────────────────────

#[test]
fn test_like_metacharacters_match_literally() {
    let source = SqliteSource::shared(&people());

    assert_eq!(
        both_paths(&source, |s| s.filter(name().contains("%_"))),
        vec![5]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(name().ends_with("_o"))),
        vec![8]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(name().starts_with("100%"))),
        vec![5]
    );

    let sql = source.issued_sql();
    assert!(sql.iter().any(|s| s.contains("LIKE ? ESCAPE '\\'")));
}

#[test]
fn test_case_sensitivity() {
    let source = SqliteSource::shared(&people());

    assert_eq!(
        both_paths(&source, |s| s.filter(name().equal("alice"))),
        vec![4]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(name().equal_ignore_case("ALICE"))),
        vec![1, 4]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(name().starts_with("Al"))),
        vec![1]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(city().ends_with_ignore_case("UL"))),
        vec![1, 4]
    );
}

#[test]
fn test_null_rows_never_match_comparisons() {
    let source = SqliteSource::shared(&people());

    // age NULL 인 id 2 는 = 와 <> 모두에서 제외
    assert_eq!(
        both_paths(&source, |s| s.filter(age().not_equal(19))),
        vec![1, 4, 5, 7, 8]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(age().equal(19).negate())),
        vec![1, 4, 5, 7, 8]
    );
    assert_eq!(
        both_paths(&source, |s| s.filter(age().not_in(vec![19, 27]))),
        vec![1, 5, 7]
    );
    assert_eq!(both_paths(&source, |s| s.filter(age().is_null())), vec![2]);
}

#[test]
fn test_empty_string_checks() {
    let source = SqliteSource::shared(&people());

    assert_eq!(both_paths(&source, |s| s.filter(city().is_empty())), vec![6]);
    assert_eq!(
        both_paths(&source, |s| s.filter(city().is_not_empty())),
        vec![1, 2, 4, 5, 7, 8]
    );
    assert_eq!(both_paths(&source, |s| s.filter(name().is_empty())), vec![7]);
}

#[test]
fn test_null_placement_in_sort() {
    let source = SqliteSource::shared(&people());

    let nulls_last = both_paths(&source, |s| {
        s.sorted(age().comparator().then_comparing(id().comparator()))
    });
    assert_eq!(nulls_last, vec![3, 6, 4, 8, 1, 5, 7, 2]);

    let nulls_first = both_paths(&source, |s| {
        s.sorted(age().comparator_nulls_first().then_comparing(id().comparator()))
    });
    assert_eq!(nulls_first, vec![2, 3, 6, 4, 8, 1, 5, 7]);

    let descending = both_paths(&source, |s| {
        s.sorted(
            age()
                .comparator()
                .reversed()
                .then_comparing(id().comparator()),
        )
    });
    // 역순이면 NULL 배치도 함께 뒤집힌다
    assert_eq!(descending, vec![2, 7, 5, 1, 4, 8, 3, 6]);
}

#[test]
fn test_sort_without_null_order_fails_on_both_paths() {
    let data = vec![
        person(1, None, None, None),
        person(2, None, None, None),
        person(3, None, Some(5), None),
    ];
    let source = SqliteSource::shared(&data);

    let pushed: StreamResult<Vec<Person>> = stream(&source)
        .sorted(age().comparator_with(NullOrder::None))
        .collect();
    let memory: StreamResult<Vec<Person>> = in_memory(&source)
        .sorted(age().comparator_with(NullOrder::None))
        .collect();
    assert!(matches!(pushed, Err(StreamError::NullComparison { .. })));
    assert!(matches!(memory, Err(StreamError::NullComparison { .. })));
    // ORDER BY 없이 조회만 하고 정렬은 메모리에서
    assert!(source.issued_sql().iter().all(|sql| !sql.contains("ORDER BY \"age\"")));
    assert_eq!(source.close_count(), 2);
}

#[test]
fn test_collection_column_compares_as_encoded_text() {
    let data = vec![
        person(1, None, None, None).with_tags(vec![10]),
        person(2, None, None, None).with_tags(vec![9]),
        person(3, None, None, None).with_tags(vec![1, 2]),
        person(4, None, None, None),
    ];
    let source = SqliteSource::shared(&data);

    // "10" < "9" 텍스트 순서
    let above = both_paths(&source, |s| s.filter(tags().greater_than(vec![9])));
    assert!(above.is_empty());
    let below = both_paths(&source, |s| s.filter(tags().less_than(vec![9])));
    assert_eq!(below, vec![1, 3, 4]);
    let pair = both_paths(&source, |s| s.filter(tags().equal(vec![1, 2])));
    assert_eq!(pair, vec![3]);
    assert_eq!(
        both_paths(&source, |s| {
            s.sorted(tags().comparator().then_comparing(id().comparator()))
        }),
        vec![4, 3, 1, 2]
    );
    assert!(source.issued_sql().iter().any(|sql| sql.contains("\"tags\" > ?")));
}

#[test]
fn test_pushdown_issues_single_filtered_query() {
    let source = SqliteSource::shared(&people());

    let found = ids(stream(&source)
        .filter(city().equal("Busan"))
        .sorted(id().comparator().reversed())
        .limit(1)
        .collect());
    assert_eq!(found, vec![8]);
    assert_eq!(
        source.issued_sql(),
        vec![
            "SELECT id, name, age, home_city, tags FROM \"people\" WHERE (\"home_city\" = ?) \
             ORDER BY \"id\" DESC NULLS FIRST LIMIT ?"
                .to_string()
        ]
    );
    assert_eq!(source.close_count(), 1);
}

#[test]
fn test_count_pushdown_with_window() {
    let source = SqliteSource::shared(&people());

    let count = stream(&source).skip(2).limit(3).count().unwrap();
    assert_eq!(count, 3);

    let sql = source.issued_sql();
    assert_eq!(sql.len(), 1);
    assert!(sql[0].starts_with("SELECT COUNT(*) FROM (SELECT * FROM \"people\""));

    let tail = stream(&source).skip(6).limit(5).count().unwrap();
    assert_eq!(tail, 2);
}

#[test]
fn test_count_falls_back_when_stages_remain() {
    let source = SqliteSource::shared(&people());

    let count = stream(&source)
        .filter(age().greater_than(20))
        .filter(Predicate::opaque(|p: &Person| p.id > 4))
        .count()
        .unwrap();
    assert_eq!(count, 3);
    assert!(
        source
            .issued_sql()
            .iter()
            .all(|s| !s.starts_with("SELECT COUNT(*)"))
    );
}

#[test]
fn test_explain_sqlite() {
    let source = SqliteSource::shared(&people());

    let plan = stream(&source)
        .filter(age().greater_or_equal(30))
        .sorted(name().comparator())
        .skip(1)
        .explain();
    assert_eq!(
        plan,
        "path: pushdown\n\
         sql: SELECT * FROM \"people\" WHERE (\"age\" >= ?) ORDER BY \"name\" ASC NULLS LAST \
         LIMIT -1 OFFSET ? -- params: [30, 1]\n\
         in-memory: (none)"
    );

    let fallback = in_memory(&source).filter(age().greater_or_equal(30)).explain();
    assert_eq!(fallback, "path: in-memory\nin-memory: filter");
}
