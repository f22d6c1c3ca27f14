//! 엔티티 필드 — 식별자, 값 접근자, 컬럼 이름/타입 조회

use crate::value::{DbType, ScalarValue};
use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;

/// 필드 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(Arc<str>);

impl FieldId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

type Getter<E> = Arc<dyn Fn(&E) -> ScalarValue + Send + Sync>;

/// 엔티티 `E` 의 필드: 식별자 + 값 접근자.
///
/// 필드에서 만든 predicate / comparator 는 번역 가능한 형태로 인식된다.
pub struct Field<E> {
    id: FieldId,
    getter: Getter<E>,
}

impl<E> Field<E> {
    pub fn new<F>(id: impl Into<FieldId>, getter: F) -> Self
    where
        F: Fn(&E) -> ScalarValue + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            getter: Arc::new(getter),
        }
    }

    pub fn id(&self) -> &FieldId {
        &self.id
    }

    /// 엔티티에서 필드 값 읽기
    pub fn get(&self, entity: &E) -> ScalarValue {
        (self.getter)(entity)
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            getter: Arc::clone(&self.getter),
        }
    }
}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.id).finish()
    }
}

/// 필드 → 물리 컬럼 이름. 모르는 필드는 `None` (번역 불가).
pub trait ColumnNamer: Send + Sync {
    fn column_name(&self, field: &FieldId) -> Option<String>;
}

/// 필드 → 데이터베이스 타입 태그
pub trait TypeLookup: Send + Sync {
    fn database_type(&self, field: &FieldId) -> Option<DbType>;
}

/// 컬럼 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub db_type: DbType,
}

/// 테이블 하나의 필드 ↔ 컬럼 매핑.
///
/// 실행 컨텍스트가 소유하는 명시적 값이며 전역 레지스트리가 아니다.
#[derive(Debug, Clone, Default)]
pub struct TableMapping {
    table: String,
    columns: AHashMap<FieldId, ColumnInfo>,
}

impl TableMapping {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: AHashMap::new(),
        }
    }

    /// 컬럼 추가 (builder)
    pub fn with_column(
        mut self,
        field: impl Into<FieldId>,
        column: impl Into<String>,
        db_type: DbType,
    ) -> Self {
        self.columns.insert(
            field.into(),
            ColumnInfo {
                name: column.into(),
                db_type,
            },
        );
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self, field: &FieldId) -> Option<&ColumnInfo> {
        self.columns.get(field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl ColumnNamer for TableMapping {
    fn column_name(&self, field: &FieldId) -> Option<String> {
        self.column(field).map(|info| info.name.clone())
    }
}

impl TypeLookup for TableMapping {
    fn database_type(&self, field: &FieldId) -> Option<DbType> {
        self.column(field).map(|info| info.db_type)
    }
}
