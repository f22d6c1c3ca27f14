//! SqlQuery — pushdown 된 WHERE / ORDER BY / LIMIT / OFFSET 누적기와 렌더러

use super::{Dialect, Fragment};
use crate::value::ScalarValue;
use std::fmt;

/// 최종 SQL 문 + 바인딩 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<ScalarValue>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| p.to_sql_literal()).collect();
            write!(f, " -- params: [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// 단일 테이블 쿼리의 pushdown 가능한 부분
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlQuery {
    predicates: Vec<Fragment>,
    order_by: Vec<Fragment>,
    limit: Option<u64>,
    offset: u64,
}

impl SqlQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.offset == 0
    }

    pub fn predicates(&self) -> &[Fragment] {
        &self.predicates
    }

    pub fn order_by(&self) -> &[Fragment] {
        &self.order_by
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_window(&self) -> bool {
        self.limit.is_some() || self.offset > 0
    }

    pub fn add_predicate(&mut self, predicate: Fragment) {
        self.predicates.push(predicate);
    }

    /// 뒤에 오는 정렬이 주 정렬 키가 되므로 앞에 붙인다
    pub fn prepend_order_by(&mut self, keys: Vec<Fragment>) {
        let earlier = std::mem::replace(&mut self.order_by, keys);
        self.order_by.extend(earlier);
    }

    pub fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// `<select_prefix> WHERE … ORDER BY … LIMIT … OFFSET …`
    pub fn render(&self, dialect: &dyn Dialect, select_prefix: &str) -> Statement {
        let mut sql = String::from(select_prefix);
        let mut params = Vec::new();
        self.render_where(dialect, &mut sql, &mut params);

        for (i, key) in self.order_by.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            key.render_into(dialect, &mut sql, &mut params);
        }

        dialect
            .limit_clause(self.limit, self.offset)
            .render_into(dialect, &mut sql, &mut params);

        Statement { sql, params }
    }

    /// `SELECT * FROM <table> …`
    pub fn render_select(&self, dialect: &dyn Dialect, table: &str) -> Statement {
        let prefix = format!("SELECT * FROM {}", dialect.quote_identifier(table));
        self.render(dialect, &prefix)
    }

    /// `SELECT COUNT(*)`. LIMIT/OFFSET 이 있으면 서브쿼리로 감싸고 ORDER BY 는 버린다.
    pub fn render_count(&self, dialect: &dyn Dialect, table: &str) -> Statement {
        let from = format!("FROM {}", dialect.quote_identifier(table));
        if !self.has_window() {
            let mut sql = format!("SELECT COUNT(*) {from}");
            let mut params = Vec::new();
            self.render_where(dialect, &mut sql, &mut params);
            return Statement { sql, params };
        }

        let window = SqlQuery {
            predicates: self.predicates.clone(),
            order_by: Vec::new(),
            limit: self.limit,
            offset: self.offset,
        };
        let inner = window.render(dialect, &format!("SELECT * {from}"));
        Statement {
            sql: format!("SELECT COUNT(*) FROM ({}) AS counted", inner.sql),
            params: inner.params,
        }
    }

    fn render_where(&self, dialect: &dyn Dialect, sql: &mut String, params: &mut Vec<ScalarValue>) {
        for (i, predicate) in self.predicates.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            predicate.render_into(dialect, sql, params);
        }
    }
}
