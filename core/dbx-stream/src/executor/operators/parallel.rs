//! Parallel Operator — 상태 없는 단계들의 rayon 병렬 실행
//!
//! 입력 전체를 materialize 한 뒤 filter / map / peek 단계를 원소마다 순서대로
//! 적용한다. 결과는 입력 순서를 유지한다.

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;
use rayon::prelude::*;
use std::sync::Arc;
use std::vec;

/// 병렬로 실행 가능한 단계
pub enum Stage<T> {
    Filter(Arc<dyn Fn(&T) -> bool + Send + Sync>),
    Map(Arc<dyn Fn(T) -> T + Send + Sync>),
    Peek(Arc<dyn Fn(&T) + Send + Sync>),
}

impl<T> Stage<T> {
    /// 원소 하나에 단계 적용. 걸러지면 `None`.
    fn apply(&self, item: T) -> Option<T> {
        match self {
            Stage::Filter(test) => test(&item).then_some(item),
            Stage::Map(transform) => Some(transform(item)),
            Stage::Peek(action) => {
                action(&item);
                Some(item)
            }
        }
    }
}

pub struct ParallelOperator<T> {
    input: Box<dyn SequenceOperator<T>>,
    stages: Vec<Stage<T>>,
    output: Option<vec::IntoIter<T>>,
}

impl<T: Send> ParallelOperator<T> {
    pub fn new(input: Box<dyn SequenceOperator<T>>, stages: Vec<Stage<T>>) -> Self {
        Self {
            input,
            stages,
            output: None,
        }
    }

    fn run(&mut self) -> StreamResult<vec::IntoIter<T>> {
        let mut items = Vec::with_capacity(self.input.size_hint().unwrap_or(0));
        while let Some(item) = self.input.next()? {
            items.push(item);
        }

        let stages = &self.stages;
        let processed: Vec<T> = items
            .into_par_iter()
            .filter_map(|item| stages.iter().try_fold(item, |acc, stage| stage.apply(acc)))
            .collect();
        tracing::trace!(
            target: crate::logging::EXECUTOR,
            stages = stages.len(),
            rows = processed.len(),
            "parallel stage finished"
        );
        Ok(processed.into_iter())
    }
}

impl<T: Send> SequenceOperator<T> for ParallelOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        if self.output.is_none() {
            self.output = Some(self.run()?);
        }
        Ok(self.output.as_mut().and_then(Iterator::next))
    }

    fn size_hint(&self) -> Option<usize> {
        self.output.as_ref().map(ExactSizeIterator::len)
    }
}
