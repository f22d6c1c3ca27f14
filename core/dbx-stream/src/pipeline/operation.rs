//! Operation — 지연된 파이프라인 단계 하나

use crate::comparator::Comparator;
use crate::predicate::Predicate;
use crate::stream::CloseAction;
use ahash::AHashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

pub type MapFn<E> = Arc<dyn Fn(E) -> E + Send + Sync>;
pub type PeekFn<E> = Arc<dyn Fn(&E) + Send + Sync>;

type SeenFilter<E> = Box<dyn FnMut(&E) -> bool + Send>;
type SeenFactory<E> = Arc<dyn Fn() -> SeenFilter<E> + Send + Sync>;

/// 중복 제거 상태 팩토리. 실행마다 새 seen-set 을 만든다.
pub struct DistinctFilter<E> {
    factory: SeenFactory<E>,
}

impl<E> DistinctFilter<E>
where
    E: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self {
            factory: Arc::new(|| {
                let mut seen = AHashSet::new();
                let filter: SeenFilter<E> = Box::new(move |item: &E| seen.insert(item.clone()));
                filter
            }),
        }
    }
}

impl<E> DistinctFilter<E> {
    /// 처음 보는 원소에만 true 를 반환하는 필터
    pub fn first_seen(&self) -> SeenFilter<E> {
        (self.factory)()
    }
}

impl<E> Default for DistinctFilter<E>
where
    E: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for DistinctFilter<E> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

/// 파이프라인 단계
pub enum Operation<E> {
    Filter(Predicate<E>),
    Map(MapFn<E>),
    Sorted(Comparator<E>),
    Distinct(DistinctFilter<E>),
    Peek(PeekFn<E>),
    Limit(u64),
    Skip(u64),
    Parallel,
    Sequential,
    Unordered,
    OnClose(CloseAction),
}

/// 단계 종류 태그
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Filter,
    Map,
    Sorted,
    Distinct,
    Peek,
    Limit,
    Skip,
    Parallel,
    Sequential,
    Unordered,
    OnClose,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Filter => "filter",
            OperationKind::Map => "map",
            OperationKind::Sorted => "sorted",
            OperationKind::Distinct => "distinct",
            OperationKind::Peek => "peek",
            OperationKind::Limit => "limit",
            OperationKind::Skip => "skip",
            OperationKind::Parallel => "parallel",
            OperationKind::Sequential => "sequential",
            OperationKind::Unordered => "unordered",
            OperationKind::OnClose => "on_close",
        }
    }
}

impl<E> Operation<E> {
    pub fn map<F>(transform: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Operation::Map(Arc::new(transform))
    }

    pub fn peek<F>(action: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        Operation::Peek(Arc::new(action))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Filter(_) => OperationKind::Filter,
            Operation::Map(_) => OperationKind::Map,
            Operation::Sorted(_) => OperationKind::Sorted,
            Operation::Distinct(_) => OperationKind::Distinct,
            Operation::Peek(_) => OperationKind::Peek,
            Operation::Limit(_) => OperationKind::Limit,
            Operation::Skip(_) => OperationKind::Skip,
            Operation::Parallel => OperationKind::Parallel,
            Operation::Sequential => OperationKind::Sequential,
            Operation::Unordered => OperationKind::Unordered,
            Operation::OnClose(_) => OperationKind::OnClose,
        }
    }

    /// 원소에 영향을 주지 않는 표식 / close 등록
    pub fn is_neutral(&self) -> bool {
        matches!(
            self,
            Operation::Parallel | Operation::Sequential | Operation::Unordered | Operation::OnClose(_)
        )
    }
}

impl<E> Clone for Operation<E> {
    fn clone(&self) -> Self {
        match self {
            Operation::Filter(p) => Operation::Filter(p.clone()),
            Operation::Map(f) => Operation::Map(Arc::clone(f)),
            Operation::Sorted(c) => Operation::Sorted(c.clone()),
            Operation::Distinct(d) => Operation::Distinct(d.clone()),
            Operation::Peek(f) => Operation::Peek(Arc::clone(f)),
            Operation::Limit(n) => Operation::Limit(*n),
            Operation::Skip(n) => Operation::Skip(*n),
            Operation::Parallel => Operation::Parallel,
            Operation::Sequential => Operation::Sequential,
            Operation::Unordered => Operation::Unordered,
            Operation::OnClose(action) => Operation::OnClose(action.clone()),
        }
    }
}

impl<E> fmt::Debug for Operation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Filter(p) => f.debug_tuple("Filter").field(p).finish(),
            Operation::Sorted(c) => f.debug_tuple("Sorted").field(c).finish(),
            Operation::Limit(n) => f.debug_tuple("Limit").field(n).finish(),
            Operation::Skip(n) => f.debug_tuple("Skip").field(n).finish(),
            other => f.write_str(other.kind().name()),
        }
    }
}
