//! 열린 자원을 호출자에게 넘기는 종단 연산 결과: `ClosingIter`, `Spliterator`
//!
//! 둘 다 `close()` 또는 drop 시 레지스트리를 닫는다.

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;
use crate::stream::CloseRegistry;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

fn close_on_drop(registry: &CloseRegistry, what: &'static str) {
    if let Err(err) = registry.close() {
        tracing::warn!(
            target: crate::logging::CLOSE,
            error = %err,
            handle = what,
            "close failure while dropping open handle"
        );
    }
}

/// 자원을 닫을 수 있는 iterator. 첫 오류를 돌려준 뒤에는 끝난다.
pub struct ClosingIter<T> {
    operator: Option<Box<dyn SequenceOperator<T>>>,
    registry: Arc<CloseRegistry>,
}

impl<T> ClosingIter<T> {
    pub(crate) fn new(operator: Box<dyn SequenceOperator<T>>, registry: Arc<CloseRegistry>) -> Self {
        Self {
            operator: Some(operator),
            registry,
        }
    }

    pub fn close(mut self) -> StreamResult<()> {
        let closed = self.registry.close();
        self.operator = None;
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.registry.is_closed()
    }
}

impl<T> Iterator for ClosingIter<T> {
    type Item = StreamResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let operator = self.operator.as_mut()?;
        match operator.next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.operator = None;
                None
            }
            Err(err) => {
                self.operator = None;
                Some(Err(err))
            }
        }
    }
}

impl<T> Drop for ClosingIter<T> {
    fn drop(&mut self) {
        close_on_drop(&self.registry, "iterator");
    }
}

impl<T> fmt::Debug for ClosingIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosingIter")
            .field("exhausted", &self.operator.is_none())
            .field("registry", &self.registry)
            .finish()
    }
}

enum Remaining<T> {
    Lazy(Box<dyn SequenceOperator<T>>),
    Buffered(VecDeque<T>),
}

/// 분할 가능한 순회자.
///
/// `try_split()` 은 남은 원소를 버퍼링한 뒤 앞쪽 절반을 새 spliterator 로 떼어 준다.
/// 떼어 낸 쪽은 같은 레지스트리를 공유하지만 drop 으로 닫지 않으며,
/// 원래 spliterator 가 닫기를 책임진다.
pub struct Spliterator<T> {
    remaining: Remaining<T>,
    registry: Arc<CloseRegistry>,
    owner: bool,
}

impl<T> Spliterator<T> {
    pub(crate) fn new(operator: Box<dyn SequenceOperator<T>>, registry: Arc<CloseRegistry>) -> Self {
        Self {
            remaining: Remaining::Lazy(operator),
            registry,
            owner: true,
        }
    }

    fn advance(&mut self) -> StreamResult<Option<T>> {
        match &mut self.remaining {
            Remaining::Lazy(operator) => operator.next(),
            Remaining::Buffered(items) => Ok(items.pop_front()),
        }
    }

    /// 원소가 있으면 `action` 을 실행하고 true
    pub fn try_advance<F>(&mut self, action: F) -> StreamResult<bool>
    where
        F: FnOnce(T),
    {
        match self.advance()? {
            Some(item) => {
                action(item);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn for_each_remaining<F>(&mut self, mut action: F) -> StreamResult<()>
    where
        F: FnMut(T),
    {
        while let Some(item) = self.advance()? {
            action(item);
        }
        Ok(())
    }

    /// 남은 원소가 2개 미만이면 `None`
    pub fn try_split(&mut self) -> StreamResult<Option<Spliterator<T>>> {
        let mut items = match std::mem::replace(
            &mut self.remaining,
            Remaining::Buffered(VecDeque::new()),
        ) {
            Remaining::Lazy(mut operator) => {
                let mut items = VecDeque::with_capacity(operator.size_hint().unwrap_or(0));
                while let Some(item) = operator.next()? {
                    items.push_back(item);
                }
                items
            }
            Remaining::Buffered(items) => items,
        };

        if items.len() < 2 {
            self.remaining = Remaining::Buffered(items);
            return Ok(None);
        }
        let suffix = items.split_off(items.len() / 2);
        self.remaining = Remaining::Buffered(suffix);
        Ok(Some(Spliterator {
            remaining: Remaining::Buffered(items),
            registry: Arc::clone(&self.registry),
            owner: false,
        }))
    }

    /// 정확히 알 수 있을 때만 남은 원소 수
    pub fn estimate_size(&self) -> Option<usize> {
        match &self.remaining {
            Remaining::Lazy(operator) => operator.size_hint(),
            Remaining::Buffered(items) => Some(items.len()),
        }
    }

    /// 공유 레지스트리를 닫는다
    pub fn close(mut self) -> StreamResult<()> {
        self.owner = false;
        self.registry.close()
    }
}

impl<T> Drop for Spliterator<T> {
    fn drop(&mut self) {
        if self.owner {
            close_on_drop(&self.registry, "spliterator");
        }
    }
}

impl<T> fmt::Debug for Spliterator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spliterator")
            .field("estimate", &self.estimate_size())
            .field("owner", &self.owner)
            .finish()
    }
}
