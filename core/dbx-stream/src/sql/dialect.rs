//! SQL 방언 — 리터럴, placeholder, 식별자 인용, NULL 정렬, LIMIT/OFFSET 문법

use super::Fragment;
use crate::value::ScalarValue;
use std::fmt;

/// 대상 데이터베이스별 fragment 토큰 공급자
pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn true_literal(&self) -> &'static str {
        "TRUE"
    }

    fn false_literal(&self) -> &'static str {
        "FALSE"
    }

    /// 1부터 시작하는 위치 파라미터 placeholder
    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// 대소문자 무시 비교에 쓰는 함수 이름
    fn case_fold_function(&self) -> &'static str {
        "LOWER"
    }

    /// LIKE 뒤에 붙는 ESCAPE 절 (패턴 escape 문자는 `\`)
    fn like_escape_clause(&self) -> Option<&'static str> {
        Some(" ESCAPE '\\'")
    }

    /// 오름차순에서 NULL 이 앞에 오는가
    fn nulls_sort_low(&self) -> bool {
        true
    }

    /// 명시적 NULL 배치 절. 표현할 수 없으면 `None`.
    fn null_ordering(&self, nulls_first: bool) -> Option<&'static str> {
        Some(if nulls_first {
            " NULLS FIRST"
        } else {
            " NULLS LAST"
        })
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> Fragment {
        let mut clause = Fragment::new();
        if let Some(limit) = limit {
            clause.push_sql(" LIMIT ");
            clause.push_param(count_param(limit));
        }
        if offset > 0 {
            clause.push_sql(" OFFSET ");
            clause.push_param(count_param(offset));
        }
        clause
    }
}

pub(crate) fn count_param(n: u64) -> ScalarValue {
    ScalarValue::Int64(i64::try_from(n).unwrap_or(i64::MAX))
}

/// ANSI SQL (기본)
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }
}

/// SQLite
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn true_literal(&self) -> &'static str {
        "1"
    }

    fn false_literal(&self) -> &'static str {
        "0"
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> Fragment {
        let mut clause = Fragment::new();
        match limit {
            Some(limit) => {
                clause.push_sql(" LIMIT ");
                clause.push_param(count_param(limit));
            }
            // SQLite 는 LIMIT 없는 OFFSET 을 허용하지 않는다
            None if offset > 0 => clause.push_sql(" LIMIT -1"),
            None => {}
        }
        if offset > 0 {
            clause.push_sql(" OFFSET ");
            clause.push_param(count_param(offset));
        }
        clause
    }
}

/// PostgreSQL
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn nulls_sort_low(&self) -> bool {
        false
    }
}

/// MySQL / MariaDB
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    // 기본 escape 문자가 이미 `\`
    fn like_escape_clause(&self) -> Option<&'static str> {
        None
    }

    fn null_ordering(&self, _nulls_first: bool) -> Option<&'static str> {
        None
    }

    fn limit_clause(&self, limit: Option<u64>, offset: u64) -> Fragment {
        let mut clause = Fragment::new();
        match limit {
            Some(limit) => {
                clause.push_sql(" LIMIT ");
                clause.push_param(count_param(limit));
            }
            None if offset > 0 => clause.push_sql(" LIMIT 18446744073709551615"),
            None => {}
        }
        if offset > 0 {
            clause.push_sql(" OFFSET ");
            clause.push_param(count_param(offset));
        }
        clause
    }
}
