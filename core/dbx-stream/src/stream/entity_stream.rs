//! EntityStream — 엔티티 source 위의 지연 Pipeline facade
//!
//! 중간 연산은 Pipeline 에 기록만 하고, 종단 연산이 호출될 때 최적화 →
//! dispatch → 실행 → close 순서로 평가된다. 종단 연산은 스트림의 소유권을
//! 가져가므로 평가 후 단계를 덧붙일 수 없다.

use crate::comparator::Comparator;
use crate::config::{Feature, FeatureFlags};
use crate::error::StreamResult;
use crate::executor::dispatcher::release_registered;
use crate::executor::{Dispatcher, EntitySource, ExecutionPath};
use crate::optimizer::OptimizerResult;
use crate::pipeline::{DistinctFilter, Operation, Pipeline};
use crate::predicate::Predicate;
use crate::stream::{AutoClose, CloseAction, ClosingIter, Spliterator};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

pub struct EntityStream<E> {
    source: Arc<dyn EntitySource<E>>,
    pipeline: Pipeline<E>,
    flags: FeatureFlags,
}

impl<E: Send + 'static> EntityStream<E> {
    pub fn new(source: Arc<dyn EntitySource<E>>) -> Self {
        Self {
            source,
            pipeline: Pipeline::new(),
            flags: FeatureFlags::new(),
        }
    }

    /// pushdown / 병렬 실행 Feature 설정
    pub fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn pipeline(&self) -> &Pipeline<E> {
        &self.pipeline
    }

    fn push(mut self, op: Operation<E>) -> Self {
        self.pipeline = self.pipeline.with(op);
        self
    }

    // ── Intermediate operations ──

    pub fn filter(self, predicate: impl Into<Predicate<E>>) -> Self {
        self.push(Operation::Filter(predicate.into()))
    }

    pub fn map<F>(self, transform: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        self.push(Operation::map(transform))
    }

    pub fn sorted(self, comparator: impl Into<Comparator<E>>) -> Self {
        self.push(Operation::Sorted(comparator.into()))
    }

    pub fn sorted_natural(self) -> Self
    where
        E: Ord,
    {
        self.push(Operation::Sorted(Comparator::natural()))
    }

    pub fn distinct(self) -> Self
    where
        E: Eq + Hash + Clone,
    {
        self.push(Operation::Distinct(DistinctFilter::new()))
    }

    pub fn peek<F>(self, action: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.push(Operation::peek(action))
    }

    pub fn limit(self, count: u64) -> Self {
        self.push(Operation::Limit(count))
    }

    pub fn skip(self, count: u64) -> Self {
        self.push(Operation::Skip(count))
    }

    pub fn parallel(self) -> Self {
        self.push(Operation::Parallel)
    }

    pub fn sequential(self) -> Self {
        self.push(Operation::Sequential)
    }

    pub fn unordered(self) -> Self {
        self.push(Operation::Unordered)
    }

    pub fn on_close(self, action: CloseAction) -> Self {
        self.push(Operation::OnClose(action))
    }

    pub fn is_parallel(&self) -> bool {
        self.pipeline.is_parallel()
    }

    pub fn is_ordered(&self) -> bool {
        self.pipeline.is_ordered()
    }

    // ── Planning ──

    fn dispatcher(&self) -> Dispatcher<E> {
        Dispatcher::new(Arc::clone(&self.source), self.flags.clone())
    }

    pub fn optimize(&self) -> OptimizerResult<E> {
        self.dispatcher().plan(&self.pipeline)
    }

    /// 실행 계획 설명: 경로, pushdown SQL, in-memory 로 남은 단계
    pub fn explain(&self) -> String {
        let plan = self.optimize();
        let path = ExecutionPath::of(&plan);
        let mut lines = vec![format!("path: {path}")];
        if path == ExecutionPath::Pushdown {
            let statement = plan
                .query
                .render_select(self.source.dialect(), self.source.table());
            lines.push(format!("sql: {statement}"));
        }
        let remaining: Vec<&str> = plan.remaining.iter().map(|op| op.kind().name()).collect();
        if remaining.is_empty() {
            lines.push("in-memory: (none)".to_string());
        } else {
            lines.push(format!("in-memory: {}", remaining.join(" -> ")));
        }
        lines.join("\n")
    }

    /// Pipeline 을 실행해 자동으로 닫히는 시퀀스로 만든다
    pub fn into_sequence(self) -> StreamResult<AutoClose<E>> {
        self.dispatcher().execute(&self.pipeline)
    }

    /// 실행 후 다른 타입으로 변환 (이후 단계는 in-memory)
    pub fn map_into<R, F>(self, transform: F) -> StreamResult<AutoClose<R>>
    where
        R: Send + 'static,
        F: FnMut(E) -> R + Send + 'static,
    {
        Ok(self.into_sequence()?.map(transform))
    }

    pub fn flat_map<R, F>(self, expand: F) -> StreamResult<AutoClose<R>>
    where
        R: Send + 'static,
        F: FnMut(E) -> AutoClose<R> + Send + 'static,
    {
        Ok(self.into_sequence()?.flat_map(expand))
    }

    // ── Terminal operations ──

    pub fn for_each<F>(self, action: F) -> StreamResult<()>
    where
        F: Fn(E) + Send + Sync,
    {
        self.into_sequence()?.for_each(action)
    }

    pub fn for_each_ordered<F>(self, action: F) -> StreamResult<()>
    where
        F: FnMut(E),
    {
        self.into_sequence()?.for_each_ordered(action)
    }

    pub fn reduce<F>(self, op: F) -> StreamResult<Option<E>>
    where
        F: Fn(E, E) -> E + Send + Sync,
    {
        self.into_sequence()?.reduce(op)
    }

    pub fn reduce_with<F>(self, identity: E, op: F) -> StreamResult<E>
    where
        F: Fn(E, E) -> E + Send + Sync,
    {
        self.into_sequence()?.reduce_with(identity, op)
    }

    pub fn fold<R, A, C>(self, identity: R, accumulator: A, combiner: C) -> StreamResult<R>
    where
        R: Clone + Send + Sync,
        A: Fn(R, E) -> R + Send + Sync,
        C: Fn(R, R) -> R + Send + Sync,
    {
        self.into_sequence()?.fold(identity, accumulator, combiner)
    }

    pub fn collect<C>(self) -> StreamResult<C>
    where
        C: FromIterator<E>,
    {
        self.into_sequence()?.collect()
    }

    pub fn collect_with<R, S, A, C>(self, supplier: S, accumulator: A, combiner: C) -> StreamResult<R>
    where
        R: Send,
        S: Fn() -> R + Send + Sync,
        A: Fn(&mut R, E) + Send + Sync,
        C: Fn(&mut R, R) + Send + Sync,
    {
        self.into_sequence()?
            .collect_with(supplier, accumulator, combiner)
    }

    /// 남은 in-memory 단계가 없으면 `SELECT COUNT(*)` 를 먼저 시도한다
    pub fn count(self) -> StreamResult<u64> {
        let dispatcher = self.dispatcher();
        let plan = dispatcher.plan(&self.pipeline);

        if self.flags.is_enabled(Feature::CountPushdown)
            && plan.remaining.iter().all(Operation::is_neutral)
        {
            match self.source.native_count(&plan.query) {
                Ok(Some(count)) => {
                    tracing::debug!(
                        target: crate::logging::EXECUTOR,
                        count,
                        "count answered by source"
                    );
                    return release_registered(self.pipeline.operations(), Ok(count));
                }
                Ok(None) => {}
                Err(err) => return release_registered(self.pipeline.operations(), Err(err)),
            }
        }

        dispatcher.execute_plan(&self.pipeline, plan)?.count()
    }

    pub fn min(self, comparator: impl Into<Comparator<E>>) -> StreamResult<Option<E>> {
        self.into_sequence()?.min(comparator)
    }

    pub fn max(self, comparator: impl Into<Comparator<E>>) -> StreamResult<Option<E>> {
        self.into_sequence()?.max(comparator)
    }

    pub fn any_match(self, test: impl Into<Predicate<E>>) -> StreamResult<bool> {
        let test = test.into();
        self.into_sequence()?.any_match(|e| test.test(e))
    }

    pub fn all_match(self, test: impl Into<Predicate<E>>) -> StreamResult<bool> {
        let test = test.into();
        self.into_sequence()?.all_match(|e| test.test(e))
    }

    pub fn none_match(self, test: impl Into<Predicate<E>>) -> StreamResult<bool> {
        let test = test.into();
        self.into_sequence()?.none_match(|e| test.test(e))
    }

    pub fn find_first(self) -> StreamResult<Option<E>> {
        self.into_sequence()?.find_first()
    }

    pub fn find_any(self) -> StreamResult<Option<E>> {
        self.into_sequence()?.find_any()
    }

    pub fn to_array(self) -> StreamResult<Box<[E]>> {
        self.into_sequence()?.to_array()
    }

    pub fn to_array_with<G>(self, generator: G) -> StreamResult<Box<[E]>>
    where
        G: FnOnce(usize) -> Vec<E>,
    {
        self.into_sequence()?.to_array_with(generator)
    }

    pub fn iterator(self) -> StreamResult<ClosingIter<E>> {
        Ok(self.into_sequence()?.iterator())
    }

    pub fn spliterator(self) -> StreamResult<Spliterator<E>> {
        Ok(self.into_sequence()?.spliterator())
    }
}

impl<E> Clone for EntityStream<E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            pipeline: self.pipeline.clone(),
            flags: self.flags.clone(),
        }
    }
}

impl<E> fmt::Debug for EntityStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStream")
            .field("table", &self.source.table())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
