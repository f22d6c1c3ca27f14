//! SQL 생성 계층
//!
//! - `dialect`: 대상 데이터베이스별 토큰 (ANSI / SQLite / PostgreSQL / MySQL)
//! - `fragment`: 텍스트 + 위치 파라미터 조각
//! - `query`: pushdown 누적기와 SELECT / COUNT 렌더러
//! - `translate`: 필드 predicate / comparator 번역 규칙

mod dialect;
mod fragment;
mod query;
mod translate;


pub use dialect::{AnsiDialect, Dialect, MySqlDialect, PostgresDialect, SqliteDialect};
pub use fragment::Fragment;
pub use query::{SqlQuery, Statement};
pub use translate::{TranslationContext, translate_comparator, translate_predicate};
