//! Comparator 모델 — 필드 comparator, 결합 comparator, opaque 비교 함수
//!
//! NULL 배치는 오름차순 기준으로 정의되며 `reversed()` 는 키의 방향과
//! NULL 배치를 함께 뒤집는다.

use crate::error::{StreamError, StreamResult};
use crate::field::{Field, FieldId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// NULL 정렬 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NullOrder {
    /// NULL 은 가장 작은 값. 두 NULL 비교는 실패.
    None,
    NullsFirst,
    #[default]
    NullsLast,
}

/// 필드 하나에 대한 comparator
pub struct FieldComparator<E> {
    field: Field<E>,
    reversed: bool,
    null_order: NullOrder,
}

impl<E> FieldComparator<E> {
    pub fn new(field: Field<E>, null_order: NullOrder) -> Self {
        Self {
            field,
            reversed: false,
            null_order,
        }
    }

    pub fn field(&self) -> &Field<E> {
        &self.field
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn null_order(&self) -> NullOrder {
        self.null_order
    }

    pub fn reversed(&self) -> Self {
        Self {
            field: self.field.clone(),
            reversed: !self.reversed,
            null_order: self.null_order,
        }
    }

    /// 실제 정렬 방향에서 NULL 이 앞에 오는가
    pub fn nulls_first(&self) -> bool {
        self.nulls_first_ascending() != self.reversed
    }

    fn nulls_first_ascending(&self) -> bool {
        !matches!(self.null_order, NullOrder::NullsLast)
    }

    pub fn compare(&self, a: &E, b: &E) -> StreamResult<Ordering> {
        let (left, right) = (self.field.get(a), self.field.get(b));
        let null_low = if self.nulls_first_ascending() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => match self.null_order {
                NullOrder::None => {
                    return Err(StreamError::NullComparison {
                        field: self.field.id().to_string(),
                    });
                }
                _ => Ordering::Equal,
            },
            (true, false) => null_low,
            (false, true) => null_low.reverse(),
            (false, false) => left.total_cmp(&right),
        };
        Ok(if self.reversed {
            ordering.reverse()
        } else {
            ordering
        })
    }

    pub fn then_comparing(self, other: impl Into<Comparator<E>>) -> Comparator<E> {
        Comparator::Field(self).then_comparing(other)
    }
}

impl<E> Clone for FieldComparator<E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            reversed: self.reversed,
            null_order: self.null_order,
        }
    }
}

impl<E> PartialEq for FieldComparator<E> {
    fn eq(&self, other: &Self) -> bool {
        self.field.id() == other.field.id()
            && self.reversed == other.reversed
            && self.null_order == other.null_order
    }
}

impl<E> Eq for FieldComparator<E> {}

impl<E> Hash for FieldComparator<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.id().hash(state);
        self.reversed.hash(state);
        self.null_order.hash(state);
    }
}

impl<E> fmt::Debug for FieldComparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldComparator")
            .field("field", self.field.id())
            .field("reversed", &self.reversed)
            .field("null_order", &self.null_order)
            .finish()
    }
}

type CompareFn<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// 호출자가 제공한 비교 함수 (번역 불가)
pub struct OpaqueComparator<E> {
    compare: CompareFn<E>,
    reversed: bool,
}

impl<E> OpaqueComparator<E> {
    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        let ordering = (self.compare)(a, b);
        if self.reversed {
            ordering.reverse()
        } else {
            ordering
        }
    }

    fn reversed(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            reversed: !self.reversed,
        }
    }
}

impl<E> Clone for OpaqueComparator<E> {
    fn clone(&self) -> Self {
        Self {
            compare: Arc::clone(&self.compare),
            reversed: self.reversed,
        }
    }
}

impl<E> PartialEq for OpaqueComparator<E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.compare, &other.compare) && self.reversed == other.reversed
    }
}

impl<E> Eq for OpaqueComparator<E> {}

impl<E> Hash for OpaqueComparator<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.compare) as *const () as usize).hash(state);
        self.reversed.hash(state);
    }
}

/// 결합 comparator 의 정렬 키
pub enum SortKey<E> {
    Field(FieldComparator<E>),
    Opaque(OpaqueComparator<E>),
}

impl<E> SortKey<E> {
    fn compare(&self, a: &E, b: &E) -> StreamResult<Ordering> {
        match self {
            SortKey::Field(key) => key.compare(a, b),
            SortKey::Opaque(key) => Ok(key.compare(a, b)),
        }
    }

    fn reversed(&self) -> Self {
        match self {
            SortKey::Field(key) => SortKey::Field(key.reversed()),
            SortKey::Opaque(key) => SortKey::Opaque(key.reversed()),
        }
    }

    fn field_id(&self) -> Option<&FieldId> {
        match self {
            SortKey::Field(key) => Some(key.field().id()),
            SortKey::Opaque(_) => None,
        }
    }
}

impl<E> PartialEq for SortKey<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SortKey::Field(a), SortKey::Field(b)) => a == b,
            (SortKey::Opaque(a), SortKey::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> Eq for SortKey<E> {}

impl<E> Hash for SortKey<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            SortKey::Field(key) => key.hash(state),
            SortKey::Opaque(key) => key.hash(state),
        }
    }
}

impl<E> Clone for SortKey<E> {
    fn clone(&self) -> Self {
        match self {
            SortKey::Field(key) => SortKey::Field(key.clone()),
            SortKey::Opaque(key) => SortKey::Opaque(key.clone()),
        }
    }
}

impl<E> fmt::Debug for SortKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Field(key) => key.fmt(f),
            SortKey::Opaque(key) => write!(f, "Opaque(reversed: {})", key.reversed),
        }
    }
}

/// 사전식 tie-break 를 하는 정렬 키 목록. 첫 키가 주 정렬 키.
pub struct CombinedComparator<E> {
    keys: Vec<SortKey<E>>,
}

impl<E> CombinedComparator<E> {
    pub fn keys(&self) -> &[SortKey<E>] {
        &self.keys
    }

    /// 첫 번째 0 이 아닌 결과, 모두 같으면 `Equal`
    pub fn compare(&self, a: &E, b: &E) -> StreamResult<Ordering> {
        for key in &self.keys {
            match key.compare(a, b)? {
                Ordering::Equal => continue,
                decided => return Ok(decided),
            }
        }
        Ok(Ordering::Equal)
    }

    /// 키마다 방향을 뒤집는다 (키 순서는 유지)
    pub fn reversed(&self) -> Self {
        Self {
            keys: self.keys.iter().map(SortKey::reversed).collect(),
        }
    }

    fn push(&mut self, key: SortKey<E>) {
        // 같은 필드의 뒤쪽 키는 결과에 영향을 주지 않는다
        if let Some(id) = key.field_id()
            && self.keys.iter().any(|k| k.field_id() == Some(id))
        {
            return;
        }
        self.keys.push(key);
    }

    fn extend(&mut self, comparator: Comparator<E>) {
        match comparator {
            Comparator::Field(key) => self.push(SortKey::Field(key)),
            Comparator::Opaque(key) => self.push(SortKey::Opaque(key)),
            Comparator::Combined(other) => {
                for key in other.keys {
                    self.push(key);
                }
            }
        }
    }
}

impl<E> PartialEq for CombinedComparator<E> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl<E> Eq for CombinedComparator<E> {}

impl<E> Hash for CombinedComparator<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keys.hash(state);
    }
}

impl<E> Clone for CombinedComparator<E> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
        }
    }
}

impl<E> fmt::Debug for CombinedComparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.keys).finish()
    }
}

/// 정렬 comparator
pub enum Comparator<E> {
    Field(FieldComparator<E>),
    Combined(CombinedComparator<E>),
    Opaque(OpaqueComparator<E>),
}

impl<E> Comparator<E> {
    pub fn opaque<F>(compare: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        Comparator::Opaque(OpaqueComparator {
            compare: Arc::new(compare),
            reversed: false,
        })
    }

    /// `E: Ord` 의 자연 순서 (opaque)
    pub fn natural() -> Self
    where
        E: Ord,
    {
        Self::opaque(|a: &E, b: &E| a.cmp(b))
    }

    pub fn compare(&self, a: &E, b: &E) -> StreamResult<Ordering> {
        match self {
            Comparator::Field(key) => key.compare(a, b),
            Comparator::Combined(keys) => keys.compare(a, b),
            Comparator::Opaque(key) => Ok(key.compare(a, b)),
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            Comparator::Field(key) => Comparator::Field(key.reversed()),
            Comparator::Combined(keys) => Comparator::Combined(keys.reversed()),
            Comparator::Opaque(key) => Comparator::Opaque(key.reversed()),
        }
    }

    /// 뒤에 tie-break 키를 덧붙인 결합 comparator
    pub fn then_comparing(self, other: impl Into<Comparator<E>>) -> Self {
        let mut combined = CombinedComparator { keys: Vec::new() };
        combined.extend(self);
        combined.extend(other.into());
        Comparator::Combined(combined)
    }

    /// 모든 키가 필드 comparator 이면 그 목록, opaque 키가 있으면 `None`
    pub fn field_keys(&self) -> Option<Vec<&FieldComparator<E>>> {
        match self {
            Comparator::Field(key) => Some(vec![key]),
            Comparator::Combined(combined) => combined
                .keys
                .iter()
                .map(|key| match key {
                    SortKey::Field(key) => Some(key),
                    SortKey::Opaque(_) => None,
                })
                .collect(),
            Comparator::Opaque(_) => None,
        }
    }
}

impl<E> From<FieldComparator<E>> for Comparator<E> {
    fn from(key: FieldComparator<E>) -> Self {
        Comparator::Field(key)
    }
}

impl<E> From<CombinedComparator<E>> for Comparator<E> {
    fn from(keys: CombinedComparator<E>) -> Self {
        Comparator::Combined(keys)
    }
}

impl<E> PartialEq for Comparator<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparator::Field(a), Comparator::Field(b)) => a == b,
            (Comparator::Combined(a), Comparator::Combined(b)) => a == b,
            (Comparator::Opaque(a), Comparator::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> Eq for Comparator<E> {}

impl<E> Hash for Comparator<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Comparator::Field(key) => key.hash(state),
            Comparator::Combined(keys) => keys.hash(state),
            Comparator::Opaque(key) => key.hash(state),
        }
    }
}

impl<E> Clone for Comparator<E> {
    fn clone(&self) -> Self {
        match self {
            Comparator::Field(key) => Comparator::Field(key.clone()),
            Comparator::Combined(keys) => Comparator::Combined(keys.clone()),
            Comparator::Opaque(key) => Comparator::Opaque(key.clone()),
        }
    }
}

impl<E> fmt::Debug for Comparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Field(key) => key.fmt(f),
            Comparator::Combined(keys) => f.debug_tuple("Combined").field(keys).finish(),
            Comparator::Opaque(key) => write!(f, "Opaque(reversed: {})", key.reversed),
        }
    }
}

impl<E> Field<E> {
    /// 오름차순, NULL 은 뒤로
    pub fn comparator(&self) -> FieldComparator<E> {
        FieldComparator::new(self.clone(), NullOrder::NullsLast)
    }

    pub fn comparator_nulls_first(&self) -> FieldComparator<E> {
        FieldComparator::new(self.clone(), NullOrder::NullsFirst)
    }

    pub fn comparator_with(&self, null_order: NullOrder) -> FieldComparator<E> {
        FieldComparator::new(self.clone(), null_order)
    }
}
