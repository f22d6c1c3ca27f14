//! Filter Operator — 원소 단위 boolean 테스트

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;

type TestFn<T> = Box<dyn FnMut(&T) -> bool + Send>;

/// 필터 연산자 (filter / distinct)
pub struct FilterOperator<T> {
    input: Box<dyn SequenceOperator<T>>,
    test: TestFn<T>,
}

impl<T> FilterOperator<T> {
    pub fn new<F>(input: Box<dyn SequenceOperator<T>>, test: F) -> Self
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        Self {
            input,
            test: Box::new(test),
        }
    }
}

impl<T> SequenceOperator<T> for FilterOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        while let Some(item) = self.input.next()? {
            if (self.test)(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}
