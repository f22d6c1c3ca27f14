//! Map Operator — 원소 변환 (map / peek / row mapping)

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;

type MapFn<T, U> = Box<dyn FnMut(T) -> StreamResult<U> + Send>;

/// 변환 연산자. 변환 실패는 그대로 전파된다.
pub struct MapOperator<T, U> {
    input: Box<dyn SequenceOperator<T>>,
    transform: MapFn<T, U>,
}

impl<T, U> MapOperator<T, U> {
    pub fn new<F>(input: Box<dyn SequenceOperator<T>>, transform: F) -> Self
    where
        F: FnMut(T) -> StreamResult<U> + Send + 'static,
    {
        Self {
            input,
            transform: Box::new(transform),
        }
    }
}

impl<T, U> SequenceOperator<U> for MapOperator<T, U> {
    fn next(&mut self) -> StreamResult<Option<U>> {
        match self.input.next()? {
            Some(item) => (self.transform)(item).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.input.size_hint()
    }
}
