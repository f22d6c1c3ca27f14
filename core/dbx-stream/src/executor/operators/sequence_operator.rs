//! Sequence Operator Trait — Volcano Execution Model

use crate::error::StreamResult;

/// 시퀀스 연산자 트레이트 — Volcano 실행 모델 (Pull 기반, 원소 단위)
pub trait SequenceOperator<T>: Send {
    /// 다음 원소 반환 (None이면 끝)
    fn next(&mut self) -> StreamResult<Option<T>>;

    /// 남은 원소 수를 정확히 알 때만 `Some`
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

impl<T> SequenceOperator<T> for Box<dyn SequenceOperator<T>> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        (**self).next()
    }

    fn size_hint(&self) -> Option<usize> {
        (**self).size_hint()
    }
}
