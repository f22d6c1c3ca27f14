//! Entity source — 행 cursor 와 엔티티 시퀀스를 공급하는 외부 협력자 계약

use crate::error::StreamResult;
use crate::field::{ColumnNamer, TypeLookup};
use crate::sql::{Dialect, SqlQuery, TranslationContext};
use crate::value::ScalarValue;
use std::vec;

/// 데이터베이스 행 하나 (컬럼 순서는 source 가 정한다)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<ScalarValue>);

impl Row {
    pub fn get(&self, index: usize) -> Option<&ScalarValue> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ScalarValue>> for Row {
    fn from(values: Vec<ScalarValue>) -> Self {
        Row(values)
    }
}

/// 한 번의 순회로만 소비되는 cursor.
///
/// `close()` 는 statement / 연결 등 모든 자원을 해제해야 하며,
/// 호출자는 cursor 마다 정확히 한 번만 호출한다.
pub trait Cursor<T>: Send {
    fn next_item(&mut self) -> StreamResult<Option<T>>;

    fn close(&mut self) -> StreamResult<()> {
        Ok(())
    }
}

type CloseHook = Box<dyn FnOnce() + Send>;

/// 메모리 상의 cursor. 테스트와 이미 가져온 결과에 사용한다.
pub struct VecCursor<T> {
    items: vec::IntoIter<T>,
    on_close: Option<CloseHook>,
}

impl<T> VecCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            on_close: None,
        }
    }

    /// close 시 한 번 실행할 hook
    pub fn with_close_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }
}

impl<T: Send> Cursor<T> for VecCursor<T> {
    fn next_item(&mut self) -> StreamResult<Option<T>> {
        Ok(self.items.next())
    }

    fn close(&mut self) -> StreamResult<()> {
        if let Some(hook) = self.on_close.take() {
            hook();
        }
        Ok(())
    }
}

/// 엔티티 source.
///
/// pushdown 경로는 `native_rows` + `map_row`, 전체 in-memory 경로는
/// `native_sequence` 를 사용한다. 컬럼 이름 / 타입 / 방언은 번역에 쓰인다.
pub trait EntitySource<E>: Send + Sync {
    fn table(&self) -> &str;

    fn dialect(&self) -> &dyn Dialect;

    fn column_namer(&self) -> &dyn ColumnNamer;

    fn type_lookup(&self) -> &dyn TypeLookup;

    /// pushdown 된 쿼리 실행. 반환된 cursor 를 닫으면 자원이 해제된다.
    fn native_rows(&self, query: &SqlQuery) -> StreamResult<Box<dyn Cursor<Row>>>;

    fn map_row(&self, row: Row) -> StreamResult<E>;

    /// 필터되지 않은 전체 엔티티 시퀀스
    fn native_sequence(&self) -> StreamResult<Box<dyn Cursor<E>>>;

    /// `SELECT COUNT(*)` 실행. `None` 이면 행을 세어서 대신한다.
    fn native_count(&self, _query: &SqlQuery) -> StreamResult<Option<u64>> {
        Ok(None)
    }

    fn translation_context(&self) -> TranslationContext<'_> {
        TranslationContext::new(self.column_namer(), self.type_lookup(), self.dialect())
    }
}
