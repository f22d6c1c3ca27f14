//! Field predicate — 필드 하나에 대한 인식 가능한 boolean 테스트
//!
//! 번역기와 in-memory 평가기는 같은 정규화 형태([`Shape`])를 사용하므로
//! `in` 의 0/1 피연산자 축약 같은 규칙이 두 경로에서 항상 일치한다.

use crate::error::{StreamError, StreamResult};
use crate::field::Field;
use crate::value::ScalarValue;
use std::cmp::Ordering;
use std::fmt;

static NULL: ScalarValue = ScalarValue::Null;

/// 필드 predicate 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateType {
    AlwaysTrue,
    AlwaysFalse,
    IsNull,
    IsNotNull,
    IsEmpty,
    IsNotEmpty,
    Equal,
    NotEqual,
    EqualIgnoreCase,
    NotEqualIgnoreCase,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Between,
    NotBetween,
    In,
    NotIn,
    StartsWith,
    NotStartsWith,
    StartsWithIgnoreCase,
    NotStartsWithIgnoreCase,
    Contains,
    NotContains,
    ContainsIgnoreCase,
    NotContainsIgnoreCase,
    EndsWith,
    NotEndsWith,
    EndsWithIgnoreCase,
    NotEndsWithIgnoreCase,
}

/// 피연산자 개수 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Nil,
    Single,
    Pair,
    List,
}

impl PredicateType {
    pub fn as_str(&self) -> &'static str {
        use PredicateType::*;
        match self {
            AlwaysTrue => "always-true",
            AlwaysFalse => "always-false",
            IsNull => "is-null",
            IsNotNull => "is-not-null",
            IsEmpty => "is-empty",
            IsNotEmpty => "is-not-empty",
            Equal => "equal",
            NotEqual => "not-equal",
            EqualIgnoreCase => "equal-ignore-case",
            NotEqualIgnoreCase => "not-equal-ignore-case",
            GreaterThan => "greater-than",
            GreaterOrEqual => "greater-or-equal",
            LessThan => "less-than",
            LessOrEqual => "less-or-equal",
            Between => "between",
            NotBetween => "not-between",
            In => "in",
            NotIn => "not-in",
            StartsWith => "starts-with",
            NotStartsWith => "not-starts-with",
            StartsWithIgnoreCase => "starts-with-ignore-case",
            NotStartsWithIgnoreCase => "not-starts-with-ignore-case",
            Contains => "contains",
            NotContains => "not-contains",
            ContainsIgnoreCase => "contains-ignore-case",
            NotContainsIgnoreCase => "not-contains-ignore-case",
            EndsWith => "ends-with",
            NotEndsWith => "not-ends-with",
            EndsWithIgnoreCase => "ends-with-ignore-case",
            NotEndsWithIgnoreCase => "not-ends-with-ignore-case",
        }
    }

    pub fn arity(&self) -> Arity {
        use PredicateType::*;
        match self {
            AlwaysTrue | AlwaysFalse | IsNull | IsNotNull | IsEmpty | IsNotEmpty => Arity::Nil,
            Between | NotBetween => Arity::Pair,
            In | NotIn => Arity::List,
            _ => Arity::Single,
        }
    }

    /// 삼치 논리에서 동치인 여집합 종류
    pub fn negate(&self) -> PredicateType {
        use PredicateType::*;
        match self {
            AlwaysTrue => AlwaysFalse,
            AlwaysFalse => AlwaysTrue,
            IsNull => IsNotNull,
            IsNotNull => IsNull,
            IsEmpty => IsNotEmpty,
            IsNotEmpty => IsEmpty,
            Equal => NotEqual,
            NotEqual => Equal,
            EqualIgnoreCase => NotEqualIgnoreCase,
            NotEqualIgnoreCase => EqualIgnoreCase,
            GreaterThan => LessOrEqual,
            LessOrEqual => GreaterThan,
            GreaterOrEqual => LessThan,
            LessThan => GreaterOrEqual,
            Between => NotBetween,
            NotBetween => Between,
            In => NotIn,
            NotIn => In,
            StartsWith => NotStartsWith,
            NotStartsWith => StartsWith,
            StartsWithIgnoreCase => NotStartsWithIgnoreCase,
            NotStartsWithIgnoreCase => StartsWithIgnoreCase,
            Contains => NotContains,
            NotContains => Contains,
            ContainsIgnoreCase => NotContainsIgnoreCase,
            NotContainsIgnoreCase => ContainsIgnoreCase,
            EndsWith => NotEndsWith,
            NotEndsWith => EndsWith,
            EndsWithIgnoreCase => NotEndsWithIgnoreCase,
            NotEndsWithIgnoreCase => EndsWithIgnoreCase,
        }
    }

    fn is_negated(&self) -> bool {
        use PredicateType::*;
        matches!(
            self,
            NotEqual
                | NotEqualIgnoreCase
                | NotBetween
                | NotIn
                | NotStartsWith
                | NotStartsWithIgnoreCase
                | NotContains
                | NotContainsIgnoreCase
                | NotEndsWith
                | NotEndsWithIgnoreCase
        )
    }

    fn ignores_case(&self) -> bool {
        use PredicateType::*;
        matches!(
            self,
            EqualIgnoreCase
                | NotEqualIgnoreCase
                | StartsWithIgnoreCase
                | NotStartsWithIgnoreCase
                | ContainsIgnoreCase
                | NotContainsIgnoreCase
                | EndsWithIgnoreCase
                | NotEndsWithIgnoreCase
        )
    }
}

impl fmt::Display for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// between 경계 포함 여부
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Inclusion {
    StartInclusiveEndInclusive,
    StartInclusiveEndExclusive,
    StartExclusiveEndInclusive,
    StartExclusiveEndExclusive,
}

impl Inclusion {
    pub fn new(start_inclusive: bool, end_inclusive: bool) -> Self {
        match (start_inclusive, end_inclusive) {
            (true, true) => Inclusion::StartInclusiveEndInclusive,
            (true, false) => Inclusion::StartInclusiveEndExclusive,
            (false, true) => Inclusion::StartExclusiveEndInclusive,
            (false, false) => Inclusion::StartExclusiveEndExclusive,
        }
    }

    pub fn start_inclusive(&self) -> bool {
        matches!(
            self,
            Inclusion::StartInclusiveEndInclusive | Inclusion::StartInclusiveEndExclusive
        )
    }

    pub fn end_inclusive(&self) -> bool {
        matches!(
            self,
            Inclusion::StartInclusiveEndInclusive | Inclusion::StartExclusiveEndInclusive
        )
    }
}

/// predicate 피연산자
#[derive(Debug, Clone, PartialEq)]
pub enum Operands {
    Nil,
    Single(ScalarValue),
    Pair {
        first: ScalarValue,
        second: ScalarValue,
        inclusion: Inclusion,
    },
    List(Vec<ScalarValue>),
}

impl Operands {
    fn arity(&self) -> Arity {
        match self {
            Operands::Nil => Arity::Nil,
            Operands::Single(_) => Arity::Single,
            Operands::Pair { .. } => Arity::Pair,
            Operands::List(_) => Arity::List,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Operands::Nil => 0,
            Operands::Single(_) => 1,
            Operands::Pair { .. } => 2,
            Operands::List(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn single(&self) -> &ScalarValue {
        match self {
            Operands::Single(value) => value,
            _ => &NULL,
        }
    }

    fn list(&self) -> &[ScalarValue] {
        match self {
            Operands::List(values) => values,
            Operands::Single(value) => std::slice::from_ref(value),
            _ => &[],
        }
    }
}

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering.is_eq(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Ge => ordering.is_ge(),
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Le => ordering.is_le(),
        }
    }
}

/// LIKE 패턴 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LikeMode {
    Prefix,
    Suffix,
    Infix,
}

/// 정규화된 predicate 형태 (번역기와 평가기가 공유)
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'a> {
    Constant(bool),
    Null {
        negated: bool,
    },
    Empty {
        negated: bool,
    },
    Compare {
        op: CompareOp,
        operand: &'a ScalarValue,
        ignore_case: bool,
        negated: bool,
    },
    Between {
        from: &'a ScalarValue,
        to: &'a ScalarValue,
        inclusion: Inclusion,
        negated: bool,
    },
    InList {
        values: &'a [ScalarValue],
        negated: bool,
    },
    Like {
        mode: LikeMode,
        operand: &'a ScalarValue,
        ignore_case: bool,
        negated: bool,
    },
}

impl Shape<'_> {
    /// 삼치 논리 평가: `None` = unknown (SQL NULL)
    pub(crate) fn evaluate(&self, value: &ScalarValue) -> Option<bool> {
        match *self {
            Shape::Constant(result) => Some(result),
            Shape::Null { negated } => Some(value.is_null() != negated),
            Shape::Empty { negated } => value.as_text().map(|text| text.is_empty() != negated),
            Shape::Compare {
                op,
                operand,
                ignore_case,
                negated,
            } => {
                let ordering = if ignore_case {
                    let left = value.as_text()?.to_ascii_lowercase();
                    let right = operand.as_text()?.to_ascii_lowercase();
                    left.cmp(&right)
                } else {
                    value.sql_cmp(operand)?
                };
                Some(op.accepts(ordering) != negated)
            }
            Shape::Between {
                from,
                to,
                inclusion,
                negated,
            } => {
                let lower = value.sql_cmp(from).map(|o| {
                    if inclusion.start_inclusive() {
                        o.is_ge()
                    } else {
                        o.is_gt()
                    }
                });
                let upper = value.sql_cmp(to).map(|o| {
                    if inclusion.end_inclusive() {
                        o.is_le()
                    } else {
                        o.is_lt()
                    }
                });
                and3(lower, upper).map(|inside| inside != negated)
            }
            Shape::InList { values, negated } => {
                if value.is_null() {
                    return None;
                }
                let mut unknown = false;
                for candidate in values {
                    match value.sql_cmp(candidate) {
                        Some(Ordering::Equal) => return Some(!negated),
                        Some(_) => {}
                        None => unknown = true,
                    }
                }
                if unknown { None } else { Some(negated) }
            }
            Shape::Like {
                mode,
                operand,
                ignore_case,
                negated,
            } => {
                let text = value.as_text()?;
                let needle = operand.as_text()?;
                let (text, needle) = if ignore_case {
                    (text.to_ascii_lowercase(), needle.to_ascii_lowercase())
                } else {
                    (text.into_owned(), needle.into_owned())
                };
                let hit = match mode {
                    LikeMode::Prefix => text.starts_with(&needle),
                    LikeMode::Suffix => text.ends_with(&needle),
                    LikeMode::Infix => text.contains(&needle),
                };
                Some(hit != negated)
            }
        }
    }
}

/// Kleene AND
pub(crate) fn and3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

/// Kleene OR
pub(crate) fn or3(left: Option<bool>, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

/// 필드 하나에 대한 인식 가능한 predicate
pub struct FieldPredicate<E> {
    field: Field<E>,
    kind: PredicateType,
    operands: Operands,
}

impl<E> FieldPredicate<E> {
    /// 피연산자 개수를 검증하며 생성
    pub fn new(field: Field<E>, kind: PredicateType, operands: Operands) -> StreamResult<Self> {
        let expected = kind.arity();
        if expected != operands.arity() {
            let expected = match expected {
                Arity::Nil => "0",
                Arity::Single => "1",
                Arity::Pair => "2",
                Arity::List => "0..n",
            };
            return Err(StreamError::PredicateShape {
                predicate: kind.to_string(),
                expected: expected.to_string(),
                actual: operands.len(),
            });
        }
        Ok(Self {
            field,
            kind,
            operands,
        })
    }

    /// 호출자가 모양을 보장하는 내부 생성자
    pub(crate) fn of(field: Field<E>, kind: PredicateType, operands: Operands) -> Self {
        debug_assert_eq!(kind.arity(), operands.arity());
        Self {
            field,
            kind,
            operands,
        }
    }

    pub fn field(&self) -> &Field<E> {
        &self.field
    }

    pub fn kind(&self) -> PredicateType {
        self.kind
    }

    pub fn operands(&self) -> &Operands {
        &self.operands
    }

    /// 여집합 predicate (번역 가능성 유지)
    pub fn negate(&self) -> Self {
        Self {
            field: self.field.clone(),
            kind: self.kind.negate(),
            operands: self.operands.clone(),
        }
    }

    pub(crate) fn shape(&self) -> Shape<'_> {
        use PredicateType::*;
        let negated = self.kind.is_negated();
        let ignore_case = self.kind.ignores_case();
        match self.kind {
            AlwaysTrue => Shape::Constant(true),
            AlwaysFalse => Shape::Constant(false),
            IsNull => Shape::Null { negated: false },
            IsNotNull => Shape::Null { negated: true },
            IsEmpty => Shape::Empty { negated: false },
            IsNotEmpty => Shape::Empty { negated: true },
            Equal | NotEqual | EqualIgnoreCase | NotEqualIgnoreCase => Shape::Compare {
                op: CompareOp::Eq,
                operand: self.operands.single(),
                ignore_case,
                negated,
            },
            GreaterThan | GreaterOrEqual | LessThan | LessOrEqual => Shape::Compare {
                op: match self.kind {
                    GreaterThan => CompareOp::Gt,
                    GreaterOrEqual => CompareOp::Ge,
                    LessThan => CompareOp::Lt,
                    _ => CompareOp::Le,
                },
                operand: self.operands.single(),
                ignore_case: false,
                negated: false,
            },
            Between | NotBetween => match &self.operands {
                Operands::Pair {
                    first,
                    second,
                    inclusion,
                } => Shape::Between {
                    from: first,
                    to: second,
                    inclusion: *inclusion,
                    negated,
                },
                _ => Shape::Constant(negated),
            },
            In | NotIn => match self.operands.list() {
                [] => Shape::Constant(negated),
                [single] => Shape::Compare {
                    op: CompareOp::Eq,
                    operand: single,
                    ignore_case: false,
                    negated,
                },
                values => Shape::InList { values, negated },
            },
            StartsWith | NotStartsWith | StartsWithIgnoreCase | NotStartsWithIgnoreCase => {
                self.like(LikeMode::Prefix, ignore_case, negated)
            }
            Contains | NotContains | ContainsIgnoreCase | NotContainsIgnoreCase => {
                self.like(LikeMode::Infix, ignore_case, negated)
            }
            EndsWith | NotEndsWith | EndsWithIgnoreCase | NotEndsWithIgnoreCase => {
                self.like(LikeMode::Suffix, ignore_case, negated)
            }
        }
    }

    fn like(&self, mode: LikeMode, ignore_case: bool, negated: bool) -> Shape<'_> {
        Shape::Like {
            mode,
            operand: self.operands.single(),
            ignore_case,
            negated,
        }
    }

    /// 삼치 논리 평가 — SQL `WHERE` 와 동일하게 unknown 은 `None`
    pub fn evaluate(&self, entity: &E) -> Option<bool> {
        match self.shape() {
            Shape::Constant(result) => Some(result),
            shape => shape.evaluate(&self.field.get(entity)),
        }
    }

    /// unknown 을 false 로 취급하는 필터 테스트
    pub fn test(&self, entity: &E) -> bool {
        self.evaluate(entity).unwrap_or(false)
    }
}

impl<E> Clone for FieldPredicate<E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            kind: self.kind,
            operands: self.operands.clone(),
        }
    }
}

impl<E> fmt::Debug for FieldPredicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPredicate")
            .field("field", self.field.id())
            .field("kind", &self.kind)
            .field("operands", &self.operands)
            .finish()
    }
}
