//! AutoClose — 자원 체인을 자동으로 닫는 지연 시퀀스
//!
//! 중간 연산은 같은 `CloseRegistry` 를 공유하는 새 `AutoClose` 를 반환한다.
//! 종단 연산은 결과를 돌려주기 전에 레지스트리를 닫으며, 실패나 panic 으로
//! 빠져나가는 경우에도 한 번 닫힌다. `iterator` / `spliterator` 는 열린 자원을
//! 호출자에게 넘긴다.

use crate::comparator::Comparator;
use crate::error::{StreamResult, finish};
use crate::executor::TerminatorKind;
use crate::executor::operators::{
    BufferOperator, EmptyOperator, FilterOperator, FlatMapOperator, IterOperator, LimitOperator,
    MapOperator, ScanOperator, SequenceOperator, SortOperator, VecOperator,
};
use crate::executor::source::Cursor;
use crate::pipeline::DistinctFilter;
use crate::stream::{CloseAction, CloseRegistry, ClosingIter, Spliterator};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// 자동으로 닫히는 지연 시퀀스
pub struct AutoClose<T> {
    operator: Option<Box<dyn SequenceOperator<T>>>,
    registry: Arc<CloseRegistry>,
    /// drop 시 레지스트리를 닫을 책임이 있는가
    owner: bool,
    parallel: bool,
    ordered: bool,
}

fn drain<T>(operator: &mut dyn SequenceOperator<T>) -> StreamResult<Vec<T>> {
    let mut items = Vec::with_capacity(operator.size_hint().unwrap_or(0));
    while let Some(item) = operator.next()? {
        items.push(item);
    }
    Ok(items)
}

impl<T: Send + 'static> AutoClose<T> {
    pub(crate) fn from_operator(
        operator: Box<dyn SequenceOperator<T>>,
        registry: Arc<CloseRegistry>,
    ) -> Self {
        Self {
            operator: Some(operator),
            registry,
            owner: true,
            parallel: false,
            ordered: true,
        }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self::from_operator(Box::new(VecOperator::new(items)), CloseRegistry::new())
    }

    /// 임의의 iterator 를 지연 공급
    pub fn from_iterator<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_operator(
            Box::new(IterOperator::new(items.into_iter())),
            CloseRegistry::new(),
        )
    }

    /// cursor 를 감싼다. 시퀀스를 닫으면 cursor 도 한 번 닫힌다.
    pub fn from_cursor(cursor: Box<dyn Cursor<T>>) -> Self {
        let scan = ScanOperator::new(cursor);
        let registry = CloseRegistry::new();
        registry.on_close(scan.close_action());
        Self::from_operator(Box::new(scan), registry)
    }

    pub fn empty() -> Self {
        Self::from_operator(Box::new(EmptyOperator), CloseRegistry::new())
    }

    fn take_operator(&mut self) -> Box<dyn SequenceOperator<T>> {
        match self.operator.take() {
            Some(operator) => operator,
            None => Box::new(EmptyOperator),
        }
    }

    /// 연산자를 하나 덧붙인 파생 시퀀스. 레지스트리와 닫기 책임을 넘긴다.
    pub(crate) fn chain<U, B>(mut self, build: B) -> AutoClose<U>
    where
        U: Send + 'static,
        B: FnOnce(Box<dyn SequenceOperator<T>>) -> Box<dyn SequenceOperator<U>>,
    {
        let input = self.take_operator();
        let owner = std::mem::replace(&mut self.owner, false);
        AutoClose {
            operator: Some(build(input)),
            registry: Arc::clone(&self.registry),
            owner,
            parallel: self.parallel,
            ordered: self.ordered,
        }
    }

    // ── Intermediate operations ──

    pub fn filter<F>(self, test: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        self.chain(|input| Box::new(FilterOperator::new(input, test)))
    }

    pub fn map<U, F>(self, mut transform: F) -> AutoClose<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        self.try_map(move |item| Ok(transform(item)))
    }

    /// 실패할 수 있는 변환. 실패는 종단 연산의 오류가 된다.
    pub fn try_map<U, F>(self, transform: F) -> AutoClose<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> StreamResult<U> + Send + 'static,
    {
        self.chain(|input| Box::new(MapOperator::new(input, transform)))
    }

    /// 원소마다 하위 시퀀스를 열어 이어 붙인다.
    ///
    /// 하위 시퀀스는 소진되면 닫히고, 이 시퀀스가 닫힐 때 열려 있던 하위
    /// 시퀀스는 이 시퀀스의 동작보다 먼저 닫힌다.
    pub fn flat_map<U, F>(self, mut expand: F) -> AutoClose<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> AutoClose<U> + Send + 'static,
    {
        let parent = Arc::clone(&self.registry);
        self.chain(move |input| {
            Box::new(FlatMapOperator::new(input, parent, move |item| {
                Ok(expand(item))
            }))
        })
    }

    pub fn sorted_by<F>(self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.sort_with(move |a, b| Ok(compare(a, b)))
    }

    /// comparator 정렬. 두 NULL 비교 실패 등은 종단 연산의 오류가 된다.
    pub fn sorted_with(self, comparator: impl Into<Comparator<T>>) -> Self {
        let comparator = comparator.into();
        self.sort_with(move |a, b| comparator.compare(a, b))
    }

    pub fn sorted(self) -> Self
    where
        T: Ord,
    {
        self.sorted_by(|a, b| a.cmp(b))
    }

    fn sort_with<F>(self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> StreamResult<Ordering> + Send + Sync + 'static,
    {
        let parallel = self.parallel;
        let mut sorted = self.chain(|input| Box::new(SortOperator::new(input, compare, parallel)));
        sorted.ordered = true;
        sorted
    }

    pub fn distinct(self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.filter(DistinctFilter::<T>::new().first_seen())
    }

    pub fn limit(self, count: u64) -> Self {
        self.chain(|input| Box::new(LimitOperator::new(input, Some(count), 0)))
    }

    pub fn skip(self, count: u64) -> Self {
        self.chain(|input| Box::new(LimitOperator::new(input, None, count)))
    }

    pub fn peek<F>(self, mut action: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.try_map(move |item| {
            action(&item);
            Ok(item)
        })
    }

    pub fn on_close(self, action: CloseAction) -> Self {
        self.registry.on_close(action);
        self
    }

    /// 첫 요청 시 입력 전체를 읽어 둔다
    pub fn materialize(self) -> Self {
        self.chain(|input| Box::new(BufferOperator::new(input)))
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn unordered(mut self) -> Self {
        self.ordered = false;
        self
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn registry(&self) -> &Arc<CloseRegistry> {
        &self.registry
    }

    /// 레지스트리를 닫는다 (두 번째 호출부터는 no-op)
    pub fn close(mut self) -> StreamResult<()> {
        let operator = self.operator.take();
        self.owner = false;
        let closed = self.registry.close();
        drop(operator);
        closed
    }

    pub(crate) fn pull(&mut self) -> StreamResult<Option<T>> {
        match self.operator.as_mut() {
            Some(operator) => operator.next(),
            None => Ok(None),
        }
    }

    // ── Terminal operations ──

    /// 종단 연산 실행 후 레지스트리를 닫는다. 계산 실패가 close 실패보다 우선한다.
    fn terminate<R, F>(mut self, kind: TerminatorKind, run: F) -> StreamResult<R>
    where
        F: FnOnce(&mut dyn SequenceOperator<T>, bool) -> StreamResult<R>,
    {
        tracing::debug!(
            target: crate::logging::EXECUTOR,
            terminator = kind.name(),
            parallel = self.parallel,
            "terminal operation"
        );
        let mut operator = self.take_operator();
        let result = run(&mut *operator, self.parallel);
        self.owner = false;
        let closed = self.registry.close();
        drop(operator);
        finish(result, closed)
    }

    /// 병렬 모드에서는 rayon 으로 실행하며 순서를 보장하지 않는다.
    pub fn for_each<F>(self, action: F) -> StreamResult<()>
    where
        F: Fn(T) + Send + Sync,
    {
        self.terminate(TerminatorKind::ForEach, |operator, parallel| {
            if parallel {
                drain(operator)?.into_par_iter().for_each(action);
            } else {
                while let Some(item) = operator.next()? {
                    action(item);
                }
            }
            Ok(())
        })
    }

    pub fn for_each_ordered<F>(self, mut action: F) -> StreamResult<()>
    where
        F: FnMut(T),
    {
        self.terminate(TerminatorKind::ForEachOrdered, |operator, _| {
            while let Some(item) = operator.next()? {
                action(item);
            }
            Ok(())
        })
    }

    /// identity 없는 reduce. 빈 시퀀스면 `None`.
    pub fn reduce<F>(self, op: F) -> StreamResult<Option<T>>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        self.terminate(TerminatorKind::Reduce, |operator, parallel| {
            if parallel {
                return Ok(drain(operator)?.into_par_iter().reduce_with(op));
            }
            let mut acc = None;
            while let Some(item) = operator.next()? {
                acc = Some(match acc {
                    Some(prev) => op(prev, item),
                    None => item,
                });
            }
            Ok(acc)
        })
    }

    /// `identity` 는 `op` 의 항등원이어야 한다.
    pub fn reduce_with<F>(self, identity: T, op: F) -> StreamResult<T>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        self.terminate(TerminatorKind::Reduce, |operator, parallel| {
            if parallel {
                let reduced = drain(operator)?.into_par_iter().reduce_with(&op);
                return Ok(match reduced {
                    Some(value) => op(identity, value),
                    None => identity,
                });
            }
            let mut acc = identity;
            while let Some(item) = operator.next()? {
                acc = op(acc, item);
            }
            Ok(acc)
        })
    }

    /// 누적 + 결합 reduce. 병렬 모드에서는 rayon 청크마다 누적한 뒤 `combiner` 로 합친다.
    pub fn fold<R, A, C>(self, identity: R, accumulator: A, combiner: C) -> StreamResult<R>
    where
        R: Clone + Send + Sync,
        A: Fn(R, T) -> R + Send + Sync,
        C: Fn(R, R) -> R + Send + Sync,
    {
        self.terminate(TerminatorKind::Reduce, |operator, parallel| {
            if parallel {
                return Ok(drain(operator)?
                    .into_par_iter()
                    .fold(|| identity.clone(), &accumulator)
                    .reduce(|| identity.clone(), &combiner));
            }
            let mut acc = identity.clone();
            while let Some(item) = operator.next()? {
                acc = accumulator(acc, item);
            }
            Ok(acc)
        })
    }

    pub fn collect<C>(self) -> StreamResult<C>
    where
        C: FromIterator<T>,
    {
        self.terminate(TerminatorKind::Collect, |operator, _| {
            Ok(drain(operator)?.into_iter().collect())
        })
    }

    /// 가변 컨테이너 수집 (supplier / accumulator / combiner)
    pub fn collect_with<R, S, A, C>(self, supplier: S, accumulator: A, combiner: C) -> StreamResult<R>
    where
        R: Send,
        S: Fn() -> R + Send + Sync,
        A: Fn(&mut R, T) + Send + Sync,
        C: Fn(&mut R, R) + Send + Sync,
    {
        self.terminate(TerminatorKind::Collect, |operator, parallel| {
            if parallel {
                return Ok(drain(operator)?
                    .into_par_iter()
                    .fold(&supplier, |mut acc, item| {
                        accumulator(&mut acc, item);
                        acc
                    })
                    .reduce(&supplier, |mut left, right| {
                        combiner(&mut left, right);
                        left
                    }));
            }
            let mut acc = supplier();
            while let Some(item) = operator.next()? {
                accumulator(&mut acc, item);
            }
            Ok(acc)
        })
    }

    pub fn count(self) -> StreamResult<u64> {
        self.terminate(TerminatorKind::Count, |operator, _| {
            let mut count = 0u64;
            while operator.next()?.is_some() {
                count += 1;
            }
            Ok(count)
        })
    }

    /// 최솟값. 같은 값이면 먼저 나온 원소.
    pub fn min(self, comparator: impl Into<Comparator<T>>) -> StreamResult<Option<T>> {
        let comparator = comparator.into();
        self.terminate(TerminatorKind::Min, |operator, _| {
            let mut best: Option<T> = None;
            while let Some(item) = operator.next()? {
                best = Some(match best {
                    Some(current) if comparator.compare(&current, &item)? == Ordering::Greater => {
                        item
                    }
                    Some(current) => current,
                    None => item,
                });
            }
            Ok(best)
        })
    }

    /// 최댓값. 같은 값이면 먼저 나온 원소.
    pub fn max(self, comparator: impl Into<Comparator<T>>) -> StreamResult<Option<T>> {
        let comparator = comparator.into();
        self.terminate(TerminatorKind::Max, |operator, _| {
            let mut best: Option<T> = None;
            while let Some(item) = operator.next()? {
                best = Some(match best {
                    Some(current) if comparator.compare(&current, &item)? == Ordering::Less => item,
                    Some(current) => current,
                    None => item,
                });
            }
            Ok(best)
        })
    }

    pub fn any_match<F>(self, mut test: F) -> StreamResult<bool>
    where
        F: FnMut(&T) -> bool,
    {
        self.terminate(TerminatorKind::AnyMatch, |operator, _| {
            while let Some(item) = operator.next()? {
                if test(&item) {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    pub fn all_match<F>(self, mut test: F) -> StreamResult<bool>
    where
        F: FnMut(&T) -> bool,
    {
        self.terminate(TerminatorKind::AllMatch, |operator, _| {
            while let Some(item) = operator.next()? {
                if !test(&item) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    pub fn none_match<F>(self, mut test: F) -> StreamResult<bool>
    where
        F: FnMut(&T) -> bool,
    {
        self.terminate(TerminatorKind::NoneMatch, |operator, _| {
            while let Some(item) = operator.next()? {
                if test(&item) {
                    return Ok(false);
                }
            }
            Ok(true)
        })
    }

    pub fn find_first(self) -> StreamResult<Option<T>> {
        self.terminate(TerminatorKind::FindFirst, |operator, _| operator.next())
    }

    pub fn find_any(self) -> StreamResult<Option<T>> {
        self.terminate(TerminatorKind::FindAny, |operator, _| operator.next())
    }

    pub fn to_array(self) -> StreamResult<Box<[T]>> {
        self.terminate(TerminatorKind::ToArray, |operator, _| {
            Ok(drain(operator)?.into_boxed_slice())
        })
    }

    /// `generator` 는 원소 수를 받아 결과를 담을 버퍼를 만든다.
    pub fn to_array_with<G>(self, generator: G) -> StreamResult<Box<[T]>>
    where
        G: FnOnce(usize) -> Vec<T>,
    {
        self.terminate(TerminatorKind::ToArray, |operator, _| {
            let items = drain(operator)?;
            let mut array = generator(items.len());
            array.extend(items);
            Ok(array.into_boxed_slice())
        })
    }

    /// 열린 iterator. 닫기는 `ClosingIter::close()` 또는 drop 이 맡는다.
    pub fn iterator(mut self) -> ClosingIter<T> {
        tracing::debug!(
            target: crate::logging::EXECUTOR,
            terminator = TerminatorKind::Iterator.name(),
            "handing open sequence to caller"
        );
        let operator = self.take_operator();
        self.owner = false;
        ClosingIter::new(operator, Arc::clone(&self.registry))
    }

    /// 열린 spliterator. 닫기는 `Spliterator::close()` 또는 drop 이 맡는다.
    pub fn spliterator(mut self) -> Spliterator<T> {
        tracing::debug!(
            target: crate::logging::EXECUTOR,
            terminator = TerminatorKind::Spliterator.name(),
            "handing open sequence to caller"
        );
        let operator = self.take_operator();
        self.owner = false;
        Spliterator::new(operator, Arc::clone(&self.registry))
    }
}

impl<T> Drop for AutoClose<T> {
    fn drop(&mut self) {
        if self.owner
            && let Err(err) = self.registry.close()
        {
            tracing::warn!(
                target: crate::logging::CLOSE,
                error = %err,
                "close failure while dropping sequence"
            );
        }
    }
}

impl<T> fmt::Debug for AutoClose<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoClose")
            .field("registry", &self.registry)
            .field("parallel", &self.parallel)
            .field("ordered", &self.ordered)
            .finish()
    }
}
