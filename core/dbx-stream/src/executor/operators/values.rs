//! Value Operators — 메모리 상의 값 공급 (Vec / Iterator / Empty)

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;
use std::vec;

/// 이미 materialize 된 원소 공급
pub struct VecOperator<T> {
    items: vec::IntoIter<T>,
}

impl<T> VecOperator<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<T: Send> SequenceOperator<T> for VecOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        Ok(self.items.next())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// 임의의 `Iterator` 를 지연 공급
pub struct IterOperator<I> {
    iter: I,
}

impl<I> IterOperator<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I, T> SequenceOperator<T> for IterOperator<I>
where
    I: Iterator<Item = T> + Send,
{
    fn next(&mut self) -> StreamResult<Option<T>> {
        Ok(self.iter.next())
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        }
    }
}

/// 빈 시퀀스
pub struct EmptyOperator;

impl<T> SequenceOperator<T> for EmptyOperator {
    fn next(&mut self) -> StreamResult<Option<T>> {
        Ok(None)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(0)
    }
}

/// 입력 전체를 한 번에 읽어 버퍼링 (`materialize`)
pub struct BufferOperator<T> {
    input: Box<dyn SequenceOperator<T>>,
    buffered: Option<vec::IntoIter<T>>,
}

impl<T> BufferOperator<T> {
    pub fn new(input: Box<dyn SequenceOperator<T>>) -> Self {
        Self {
            input,
            buffered: None,
        }
    }
}

impl<T: Send> SequenceOperator<T> for BufferOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        if self.buffered.is_none() {
            let mut items = Vec::with_capacity(self.input.size_hint().unwrap_or(0));
            while let Some(item) = self.input.next()? {
                items.push(item);
            }
            self.buffered = Some(items.into_iter());
        }
        Ok(self.buffered.as_mut().and_then(Iterator::next))
    }

    fn size_hint(&self) -> Option<usize> {
        match &self.buffered {
            Some(items) => Some(items.len()),
            None => self.input.size_hint(),
        }
    }
}
