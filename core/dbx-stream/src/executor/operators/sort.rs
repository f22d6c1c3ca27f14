//! Sort Operator — in-memory 정렬 (전체 materialize 후 정렬)

use crate::error::{StreamError, StreamResult};
use crate::executor::operators::SequenceOperator;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::vec;

type CompareFn<T> = Box<dyn Fn(&T, &T) -> StreamResult<Ordering> + Send + Sync>;

/// Sort 연산자 — 안정 정렬, 병렬 모드에서는 rayon `par_sort_by`
pub struct SortOperator<T> {
    input: Box<dyn SequenceOperator<T>>,
    compare: CompareFn<T>,
    parallel: bool,
    /// Materialized sorted result (sort requires all data)
    sorted: Option<vec::IntoIter<T>>,
}

impl<T: Send> SortOperator<T> {
    pub fn new<F>(input: Box<dyn SequenceOperator<T>>, compare: F, parallel: bool) -> Self
    where
        F: Fn(&T, &T) -> StreamResult<Ordering> + Send + Sync + 'static,
    {
        Self {
            input,
            compare: Box::new(compare),
            parallel,
            sorted: None,
        }
    }

    /// 입력 전체를 모아 정렬. 비교 실패는 첫 번째 것을 정렬 후 반환한다.
    fn materialize(&mut self) -> StreamResult<vec::IntoIter<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.input.next()? {
            items.push(item);
        }

        let failure: Mutex<Option<StreamError>> = Mutex::new(None);
        let compare = &self.compare;
        let by = |a: &T, b: &T| match compare(a, b) {
            Ok(ordering) => ordering,
            Err(err) => {
                let mut slot = failure.lock();
                if slot.is_none() {
                    *slot = Some(err);
                }
                Ordering::Equal
            }
        };
        if self.parallel {
            items.par_sort_by(by);
        } else {
            items.sort_by(by);
        }

        match failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(items.into_iter()),
        }
    }
}

impl<T: Send> SequenceOperator<T> for SortOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        if self.sorted.is_none() {
            self.sorted = Some(self.materialize()?);
        }
        Ok(self.sorted.as_mut().and_then(Iterator::next))
    }

    fn size_hint(&self) -> Option<usize> {
        self.sorted.as_ref().map(ExactSizeIterator::len)
    }
}
