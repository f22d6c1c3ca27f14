//! Pipeline — 지연된 Operation 의 순서 있는 기록
//!
//! `append` 는 기존 참조를 변경하지 않고 새 Pipeline 을 반환한다.
//! 내부 목록은 `Arc` 로 공유되며 기록 시에만 복사된다.

mod operation;

pub use operation::{DistinctFilter, MapFn, Operation, OperationKind, PeekFn};

use std::fmt;
use std::sync::Arc;

pub struct Pipeline<E> {
    ops: Arc<Vec<Operation<E>>>,
    parallel: bool,
    ordered: bool,
}

impl<E> Pipeline<E> {
    pub fn new() -> Self {
        Self {
            ops: Arc::new(Vec::new()),
            parallel: false,
            ordered: true,
        }
    }

    /// 새 단계를 덧붙인 Pipeline (self 는 그대로)
    pub fn append(&self, op: Operation<E>) -> Self {
        self.clone().with(op)
    }

    /// 소유권을 넘겨받아 단계 추가
    pub fn with(mut self, op: Operation<E>) -> Self {
        match &op {
            Operation::Parallel => self.parallel = true,
            Operation::Sequential => self.parallel = false,
            Operation::Unordered => self.ordered = false,
            Operation::Sorted(_) => self.ordered = true,
            _ => {}
        }
        Arc::make_mut(&mut self.ops).push(op);
        self
    }

    pub fn operations(&self) -> &[Operation<E>] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }
}

impl<E> Default for Pipeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
            parallel: self.parallel,
            ordered: self.ordered,
        }
    }
}

impl<E> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("ops", &self.ops)
            .field("parallel", &self.parallel)
            .field("ordered", &self.ordered)
            .finish()
    }
}
