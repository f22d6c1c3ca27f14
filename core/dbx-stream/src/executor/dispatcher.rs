//! Dispatcher — 최적화 결과를 실제 시퀀스로 실행
//!
//! pushdown 된 prefix 가 있으면 source 에 쿼리를 보내 행을 받고, 남은 단계만
//! in-memory 로 적용한다. 없으면 전체 엔티티 시퀀스에 Pipeline 전부를 적용한다.

use crate::config::{Feature, FeatureFlags};
use crate::error::{StreamResult, finish};
use crate::executor::operators::{ParallelOperator, Stage};
use crate::executor::source::EntitySource;
use crate::optimizer::{OptimizerResult, QueryOptimizer};
use crate::pipeline::{Operation, Pipeline};
use crate::stream::{AutoClose, CloseRegistry};
use std::fmt;
use std::sync::Arc;

/// 실행 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionPath {
    /// 쿼리로 prefix 를 실행하고 나머지는 in-memory
    Pushdown,
    /// 전체 Pipeline in-memory
    InMemory,
}

impl ExecutionPath {
    pub fn of<E>(plan: &OptimizerResult<E>) -> Self {
        if plan.is_pushdown() {
            ExecutionPath::Pushdown
        } else {
            ExecutionPath::InMemory
        }
    }
}

impl fmt::Display for ExecutionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPath::Pushdown => f.write_str("pushdown"),
            ExecutionPath::InMemory => f.write_str("in-memory"),
        }
    }
}

/// 종단 연산 dispatcher
pub struct Dispatcher<E> {
    source: Arc<dyn EntitySource<E>>,
    flags: FeatureFlags,
}

impl<E: Send + 'static> Dispatcher<E> {
    pub fn new(source: Arc<dyn EntitySource<E>>, flags: FeatureFlags) -> Self {
        Self { source, flags }
    }

    pub fn source(&self) -> &Arc<dyn EntitySource<E>> {
        &self.source
    }

    /// 활성화된 규칙으로 Pipeline 최적화
    pub fn plan(&self, pipeline: &Pipeline<E>) -> OptimizerResult<E> {
        QueryOptimizer::with_features(&self.flags)
            .optimize(pipeline, self.source.translation_context())
    }

    pub fn execute(&self, pipeline: &Pipeline<E>) -> StreamResult<AutoClose<E>> {
        let plan = self.plan(pipeline);
        self.execute_plan(pipeline, plan)
    }

    pub fn execute_plan(
        &self,
        pipeline: &Pipeline<E>,
        plan: OptimizerResult<E>,
    ) -> StreamResult<AutoClose<E>> {
        let parallel = self.is_parallel(pipeline);
        let path = ExecutionPath::of(&plan);
        tracing::debug!(
            target: crate::logging::EXECUTOR,
            %path,
            consumed = plan.consumed,
            remaining = plan.remaining.len(),
            parallel,
            "dispatching pipeline"
        );

        match path {
            ExecutionPath::Pushdown => {
                let rows = match self.source.native_rows(&plan.query) {
                    Ok(rows) => rows,
                    Err(err) => return release_registered(pipeline.operations(), Err(err)),
                };
                let source = Arc::clone(&self.source);
                let mut sequence = AutoClose::from_cursor(rows).try_map(move |row| source.map_row(row));
                for op in &pipeline.operations()[..plan.consumed] {
                    if let Operation::OnClose(action) = op {
                        sequence = sequence.on_close(action.clone());
                    }
                }
                Ok(apply_operations(sequence, &plan.remaining, parallel))
            }
            ExecutionPath::InMemory => {
                let entities = match self.source.native_sequence() {
                    Ok(entities) => entities,
                    Err(err) => return release_registered(pipeline.operations(), Err(err)),
                };
                Ok(apply_operations(
                    AutoClose::from_cursor(entities),
                    pipeline.operations(),
                    parallel,
                ))
            }
        }
    }

    fn is_parallel(&self, pipeline: &Pipeline<E>) -> bool {
        pipeline.is_parallel() && self.flags.is_enabled(Feature::ParallelExecution)
    }
}

/// 시퀀스를 열지 못했을 때도 Pipeline 에 등록된 close 동작은 실행한다
pub(crate) fn release_registered<E, R>(
    ops: &[Operation<E>],
    result: StreamResult<R>,
) -> StreamResult<R> {
    let registry = CloseRegistry::new();
    for op in ops {
        if let Operation::OnClose(action) = op {
            registry.on_close(action.clone());
        }
    }
    finish(result, registry.close())
}

/// 병렬 stage 로 묶을 수 있는 단계
fn as_stage<E>(op: &Operation<E>) -> Option<Stage<E>>
where
    E: 'static,
{
    match op {
        Operation::Filter(predicate) => {
            let predicate = predicate.clone();
            Some(Stage::Filter(Arc::new(move |e: &E| predicate.test(e))))
        }
        Operation::Map(transform) => Some(Stage::Map(Arc::clone(transform))),
        Operation::Peek(action) => Some(Stage::Peek(Arc::clone(action))),
        _ => None,
    }
}

/// 남은 단계를 순서대로 in-memory 시퀀스에 적용
pub(crate) fn apply_operations<E: Send + 'static>(
    sequence: AutoClose<E>,
    ops: &[Operation<E>],
    parallel: bool,
) -> AutoClose<E> {
    let mut sequence = if parallel {
        sequence.parallel()
    } else {
        sequence
    };

    let mut index = 0;
    while index < ops.len() {
        if parallel {
            let stages: Vec<Stage<E>> = ops[index..].iter().map_while(as_stage).collect();
            if !stages.is_empty() {
                index += stages.len();
                sequence =
                    sequence.chain(|input| Box::new(ParallelOperator::new(input, stages)));
                continue;
            }
        }

        sequence = match &ops[index] {
            Operation::Filter(predicate) => {
                let predicate = predicate.clone();
                sequence.filter(move |e| predicate.test(e))
            }
            Operation::Map(transform) => {
                let transform = Arc::clone(transform);
                sequence.map(move |e| transform(e))
            }
            Operation::Sorted(comparator) => sequence.sorted_with(comparator.clone()),
            Operation::Distinct(distinct) => sequence.filter(distinct.first_seen()),
            Operation::Peek(action) => {
                let action = Arc::clone(action);
                sequence.peek(move |e| action(e))
            }
            Operation::Limit(count) => sequence.limit(*count),
            Operation::Skip(count) => sequence.skip(*count),
            Operation::Unordered => sequence.unordered(),
            // 병렬 여부는 Pipeline 전체에 대해 이미 결정됨
            Operation::Parallel | Operation::Sequential => sequence,
            Operation::OnClose(action) => sequence.on_close(action.clone()),
        };
        index += 1;
    }
    sequence
}
