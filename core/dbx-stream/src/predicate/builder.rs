//! `Field<E>` 에서 필드 predicate 를 만드는 builder 메서드

use super::{FieldPredicate, Inclusion, Operands, Predicate, PredicateType};
use crate::field::Field;
use crate::value::ScalarValue;

impl<E> Field<E> {
    fn predicate(&self, kind: PredicateType, operands: Operands) -> Predicate<E> {
        Predicate::Field(FieldPredicate::of(self.clone(), kind, operands))
    }

    fn single(&self, kind: PredicateType, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.predicate(kind, Operands::Single(value.into()))
    }

    fn list<I, V>(&self, kind: PredicateType, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        self.predicate(
            kind,
            Operands::List(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn always_true(&self) -> Predicate<E> {
        self.predicate(PredicateType::AlwaysTrue, Operands::Nil)
    }

    pub fn always_false(&self) -> Predicate<E> {
        self.predicate(PredicateType::AlwaysFalse, Operands::Nil)
    }

    pub fn is_null(&self) -> Predicate<E> {
        self.predicate(PredicateType::IsNull, Operands::Nil)
    }

    pub fn is_not_null(&self) -> Predicate<E> {
        self.predicate(PredicateType::IsNotNull, Operands::Nil)
    }

    pub fn is_empty(&self) -> Predicate<E> {
        self.predicate(PredicateType::IsEmpty, Operands::Nil)
    }

    pub fn is_not_empty(&self) -> Predicate<E> {
        self.predicate(PredicateType::IsNotEmpty, Operands::Nil)
    }

    pub fn equal(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::Equal, value)
    }

    pub fn not_equal(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotEqual, value)
    }

    pub fn equal_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::EqualIgnoreCase, value)
    }

    pub fn not_equal_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotEqualIgnoreCase, value)
    }

    pub fn greater_than(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::GreaterThan, value)
    }

    pub fn greater_or_equal(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::GreaterOrEqual, value)
    }

    pub fn less_than(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::LessThan, value)
    }

    pub fn less_or_equal(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::LessOrEqual, value)
    }

    /// `[start, end]` 양쪽 포함
    pub fn between(
        &self,
        start: impl Into<ScalarValue>,
        end: impl Into<ScalarValue>,
    ) -> Predicate<E> {
        self.between_with(start, end, Inclusion::StartInclusiveEndInclusive)
    }

    pub fn between_with(
        &self,
        start: impl Into<ScalarValue>,
        end: impl Into<ScalarValue>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        self.predicate(
            PredicateType::Between,
            Operands::Pair {
                first: start.into(),
                second: end.into(),
                inclusion,
            },
        )
    }

    pub fn not_between(
        &self,
        start: impl Into<ScalarValue>,
        end: impl Into<ScalarValue>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        self.predicate(
            PredicateType::NotBetween,
            Operands::Pair {
                first: start.into(),
                second: end.into(),
                inclusion,
            },
        )
    }

    pub fn is_in<I, V>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        self.list(PredicateType::In, values)
    }

    pub fn not_in<I, V>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        self.list(PredicateType::NotIn, values)
    }

    pub fn starts_with(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::StartsWith, value)
    }

    pub fn not_starts_with(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotStartsWith, value)
    }

    pub fn starts_with_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::StartsWithIgnoreCase, value)
    }

    pub fn not_starts_with_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotStartsWithIgnoreCase, value)
    }

    pub fn contains(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::Contains, value)
    }

    pub fn not_contains(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotContains, value)
    }

    pub fn contains_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::ContainsIgnoreCase, value)
    }

    pub fn not_contains_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotContainsIgnoreCase, value)
    }

    pub fn ends_with(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::EndsWith, value)
    }

    pub fn not_ends_with(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotEndsWith, value)
    }

    pub fn ends_with_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::EndsWithIgnoreCase, value)
    }

    pub fn not_ends_with_ignore_case(&self, value: impl Into<ScalarValue>) -> Predicate<E> {
        self.single(PredicateType::NotEndsWithIgnoreCase, value)
    }
}
