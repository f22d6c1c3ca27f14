//! FlatMap Operator — 원소마다 하위 시퀀스를 열고 이어 붙임
//!
//! 하위 시퀀스의 레지스트리는 부모 레지스트리의 자식으로 연결되므로,
//! 부모를 닫으면 열려 있는 하위 시퀀스가 부모 동작보다 먼저 닫힌다.

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;
use crate::stream::{AutoClose, CloseRegistry};
use std::sync::Arc;

type ExpandFn<T, U> = Box<dyn FnMut(T) -> StreamResult<AutoClose<U>> + Send>;

/// FlatMap 연산자
pub struct FlatMapOperator<T, U> {
    input: Box<dyn SequenceOperator<T>>,
    expand: ExpandFn<T, U>,
    parent: Arc<CloseRegistry>,
    current: Option<AutoClose<U>>,
}

impl<T, U: Send + 'static> FlatMapOperator<T, U> {
    pub fn new<F>(input: Box<dyn SequenceOperator<T>>, parent: Arc<CloseRegistry>, expand: F) -> Self
    where
        F: FnMut(T) -> StreamResult<AutoClose<U>> + Send + 'static,
    {
        Self {
            input,
            expand: Box::new(expand),
            parent,
            current: None,
        }
    }

    /// 소진된 하위 시퀀스를 닫는다 (닫힌 레지스트리는 부모에서 스스로 분리된다)
    fn finish_current(&mut self) -> StreamResult<()> {
        match self.current.take() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }
}

impl<T, U: Send + 'static> SequenceOperator<U> for FlatMapOperator<T, U> {
    fn next(&mut self) -> StreamResult<Option<U>> {
        loop {
            if let Some(child) = self.current.as_mut() {
                if let Some(item) = child.pull()? {
                    return Ok(Some(item));
                }
                self.finish_current()?;
            }

            let Some(element) = self.input.next()? else {
                return Ok(None);
            };
            let child = (self.expand)(element)?;
            self.parent.adopt(Arc::clone(child.registry()))?;
            self.current = Some(child);
        }
    }
}
