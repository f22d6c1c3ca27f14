//! 파이프라인 옵티마이저 — 규칙 기반 pushdown
//!
//! Pipeline 을 앞에서부터 한 번만 훑으며 번역 가능한 접두부를 SQL 로 옮긴다.
//! 3가지 규칙: PredicatePushdown, SortPushdown, LimitPushdown.
//! 각 규칙은 바로 다음 단계만 보고, 번역할 수 없으면 그 자리에서 멈춘다.

mod limit_pushdown;
mod predicate_pushdown;
mod sort_pushdown;


pub use limit_pushdown::LimitPushdownRule;
pub use predicate_pushdown::PredicatePushdownRule;
pub use sort_pushdown::SortPushdownRule;

use crate::config::{Feature, FeatureFlags};
use crate::pipeline::{Operation, Pipeline};
use crate::sql::{SqlQuery, TranslationContext};
use std::fmt;

/// pushdown 규칙 트레이트
pub trait PushdownRule<E>: Send + Sync {
    /// 규칙 이름
    fn name(&self) -> &str;

    /// 현재 위치부터 가능한 단계를 쿼리로 옮기고 cursor 를 전진
    fn apply(&self, state: &mut OptimizerState<'_, E>);
}

/// 규칙들이 공유하는 진행 상태
pub struct OptimizerState<'a, E> {
    ops: &'a [Operation<E>],
    cursor: usize,
    query: SqlQuery,
    ctx: TranslationContext<'a>,
}

impl<'a, E> OptimizerState<'a, E> {
    fn new(ops: &'a [Operation<E>], ctx: TranslationContext<'a>) -> Self {
        Self {
            ops,
            cursor: 0,
            query: SqlQuery::new(),
            ctx,
        }
    }

    /// 표식 단계를 건너뛴 다음 실질 단계 (index, op)
    pub fn peek(&self) -> Option<(usize, &'a Operation<E>)> {
        self.peek_from(self.cursor)
    }

    /// `index` 이후의 다음 실질 단계
    pub fn peek_after(&self, index: usize) -> Option<(usize, &'a Operation<E>)> {
        self.peek_from(index + 1)
    }

    fn peek_from(&self, start: usize) -> Option<(usize, &'a Operation<E>)> {
        let ops: &'a [Operation<E>] = self.ops;
        ops.iter()
            .enumerate()
            .skip(start)
            .find(|(_, op)| !op.is_neutral())
    }

    /// `index` 까지 (포함) 소비
    pub fn consume_through(&mut self, index: usize) {
        self.cursor = self.cursor.max(index + 1);
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn query(&self) -> &SqlQuery {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut SqlQuery {
        &mut self.query
    }

    pub fn context(&self) -> &TranslationContext<'a> {
        &self.ctx
    }
}

/// 최적화 결과
pub struct OptimizerResult<E> {
    /// SQL 로 옮겨진 접두부 길이. 0 이면 쿼리를 실행하지 않는다.
    pub consumed: usize,
    pub query: SqlQuery,
    /// in-memory 로 적용할 나머지 단계 (원래 순서)
    pub remaining: Vec<Operation<E>>,
}

impl<E> OptimizerResult<E> {
    pub fn is_pushdown(&self) -> bool {
        self.consumed > 0
    }
}

impl<E> fmt::Debug for OptimizerResult<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerResult")
            .field("consumed", &self.consumed)
            .field("query", &self.query)
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// 쿼리 옵티마이저
pub struct QueryOptimizer<E> {
    rules: Vec<Box<dyn PushdownRule<E>>>,
}

impl<E> QueryOptimizer<E> {
    /// 기본 규칙 전부로 생성
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(PredicatePushdownRule),
                Box::new(SortPushdownRule),
                Box::new(LimitPushdownRule),
            ],
        }
    }

    /// 활성화된 Feature 의 규칙만 설치
    pub fn with_features(flags: &FeatureFlags) -> Self {
        let mut rules: Vec<Box<dyn PushdownRule<E>>> = Vec::new();
        if flags.is_enabled(Feature::FilterPushdown) {
            rules.push(Box::new(PredicatePushdownRule));
        }
        if flags.is_enabled(Feature::SortPushdown) {
            rules.push(Box::new(SortPushdownRule));
        }
        if flags.is_enabled(Feature::LimitPushdown) {
            rules.push(Box::new(LimitPushdownRule));
        }
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// 모든 규칙을 순서대로 적용
    pub fn optimize(
        &self,
        pipeline: &Pipeline<E>,
        ctx: TranslationContext<'_>,
    ) -> OptimizerResult<E> {
        let ops = pipeline.operations();
        let mut state = OptimizerState::new(ops, ctx);

        for rule in &self.rules {
            let before = state.cursor;
            rule.apply(&mut state);
            tracing::debug!(
                target: crate::logging::OPTIMIZER,
                rule = rule.name(),
                consumed = state.cursor - before,
                "rule applied"
            );
        }

        let consumed = if state.query.is_empty() {
            0
        } else {
            state.cursor
        };
        let remaining = ops[consumed..].to_vec();

        tracing::debug!(
            target: crate::logging::OPTIMIZER,
            consumed,
            remaining = remaining.len(),
            predicates = state.query.predicates().len(),
            order_keys = state.query.order_by().len(),
            limit = ?state.query.limit(),
            offset = state.query.offset(),
            "pipeline optimized"
        );

        OptimizerResult {
            consumed,
            query: if consumed == 0 {
                SqlQuery::new()
            } else {
                state.query
            },
            remaining,
        }
    }
}

impl<E> Default for QueryOptimizer<E> {
    fn default() -> Self {
        Self::new()
    }
}
