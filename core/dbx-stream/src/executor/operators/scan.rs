//! Scan Operator — 외부 cursor 읽기

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;
use crate::executor::source::Cursor;
use crate::stream::CloseAction;
use parking_lot::Mutex;
use std::sync::Arc;

type CursorSlot<T> = Arc<Mutex<Option<Box<dyn Cursor<T>>>>>;

/// cursor 스캔 연산자.
///
/// cursor 는 소진되는 즉시 닫히며, 나머지 경우는 `close_action()` 이 닫는다.
/// 어느 쪽이든 cursor 의 `close()` 는 한 번만 호출된다.
pub struct ScanOperator<T> {
    cursor: CursorSlot<T>,
}

impl<T: 'static> ScanOperator<T> {
    pub fn new(cursor: Box<dyn Cursor<T>>) -> Self {
        Self {
            cursor: Arc::new(Mutex::new(Some(cursor))),
        }
    }

    /// 남아 있는 cursor 를 닫는 close 동작
    pub fn close_action(&self) -> CloseAction {
        let slot = Arc::clone(&self.cursor);
        CloseAction::new(move || match slot.lock().take() {
            Some(mut cursor) => cursor.close(),
            None => Ok(()),
        })
    }
}

impl<T> SequenceOperator<T> for ScanOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        let mut slot = self.cursor.lock();
        let Some(cursor) = slot.as_mut() else {
            return Ok(None);
        };
        match cursor.next_item()? {
            Some(item) => Ok(Some(item)),
            None => {
                if let Some(mut exhausted) = slot.take() {
                    exhausted.close()?;
                }
                Ok(None)
            }
        }
    }
}
