//! # DBX Stream — Lazy Entity Streams with SQL Pushdown
//!
//! DBX Stream은 엔티티 source 위에 지연 평가 파이프라인을 구성하고,
//! 번역 가능한 prefix(WHERE / ORDER BY / LIMIT / OFFSET)를 SQL로 내려보낸 뒤
//! 나머지 단계만 in-memory로 실행하는 라이브러리입니다.
//!
//! ## 주요 특징
//!
//! - **Pushdown 최적화**: 필드 predicate / comparator 를 SQL fragment 로 번역
//! - **In-memory fallback**: 번역할 수 없는 단계는 SQL 삼치 논리와 동일한 의미로 실행
//! - **자동 close**: 종단 연산이 끝나면 cursor 와 등록된 close 동작을 정확히 한 번 실행
//! - **병렬 실행**: rayon 기반 filter / map / sort
//! - **방언 지원**: ANSI, SQLite, PostgreSQL, MySQL
//!
//! ## 빠른 시작
//!
//! ```rust
//! use dbx_stream::{AutoClose, CloseAction};
//!
//! # fn main() -> dbx_stream::StreamResult<()> {
//! let evens: Vec<i64> = AutoClose::from_vec((1..=10_i64).collect())
//!     .on_close(CloseAction::infallible(|| println!("released")))
//!     .filter(|n| n % 2 == 0)
//!     .map(|n| n * 10)
//!     .collect()?;
//!
//! assert_eq!(evens, vec![20, 40, 60, 80, 100]);
//! # Ok(())
//! # }
//! ```
//!
//! ## 아키텍처
//!
//! ```text
//! EntityStream ──► Pipeline ──► QueryOptimizer ──► Dispatcher
//!                                  │                  │
//!                       PredicatePushdown        Pushdown: native_rows(SqlQuery)
//!                       SortPushdown                 + remaining ops in-memory
//!                       LimitPushdown            InMemory: native_sequence()
//!                                                    + whole pipeline in-memory
//!                                                     │
//!                                              AutoClose (CloseRegistry)
//! ```

pub mod comparator;
pub mod config;
pub mod error;
pub mod executor;
pub mod field;
pub mod optimizer;
pub mod pipeline;
pub mod predicate;
pub mod sql;
pub mod stream;
pub mod value;

// Logging utilities
pub mod logging;

#[cfg(test)]
mod test_fixtures;

// ===== Re-exports =====
pub use comparator::{CombinedComparator, Comparator, FieldComparator, NullOrder};
pub use config::{Feature, FeatureFlags};
pub use error::{StreamError, StreamResult};
pub use executor::{
    Cursor, Dispatcher, EntitySource, ExecutionPath, Row, TerminatorKind, VecCursor,
};
pub use field::{ColumnNamer, Field, FieldId, TableMapping, TypeLookup};
pub use optimizer::{OptimizerResult, QueryOptimizer};
pub use pipeline::{Operation, OperationKind, Pipeline};
pub use predicate::{FieldPredicate, Inclusion, Predicate, PredicateType};
pub use sql::{Dialect, Fragment, SqlQuery, Statement};
pub use stream::{AutoClose, CloseAction, CloseRegistry, ClosingIter, EntityStream, Spliterator};
pub use value::{DbType, ScalarValue};
