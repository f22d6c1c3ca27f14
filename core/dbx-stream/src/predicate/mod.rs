//! Predicate 모델 — 인식 가능한 필드 predicate 와 opaque 클로저
//!
//! `Predicate<E>` 는 AND / OR / NOT 조합을 구조적으로 보존하므로 optimizer 가
//! 최상위 AND-결합을 평탄화해 번역 가능 여부를 판단할 수 있다.

mod builder;
mod field;


pub use field::{Arity, FieldPredicate, Inclusion, Operands, PredicateType};
pub(crate) use field::{LikeMode, Shape};

use field::{and3, or3};
use std::fmt;
use std::sync::Arc;

type TestFn<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// 호출자가 제공한 임의의 boolean 테스트 (번역 불가)
pub struct OpaquePredicate<E>(TestFn<E>);

impl<E> OpaquePredicate<E> {
    pub fn test(&self, entity: &E) -> bool {
        (self.0)(entity)
    }
}

impl<E> Clone for OpaquePredicate<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// 필터 predicate
pub enum Predicate<E> {
    /// 번역 가능한 필드 predicate
    Field(FieldPredicate<E>),
    And(Vec<Predicate<E>>),
    Or(Vec<Predicate<E>>),
    Not(Box<Predicate<E>>),
    Opaque(OpaquePredicate<E>),
}

impl<E> Predicate<E> {
    /// 클로저로 opaque predicate 생성
    pub fn opaque<F>(test: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Predicate::Opaque(OpaquePredicate(Arc::new(test)))
    }

    /// AND 결합 (중첩 AND 는 평탄화)
    pub fn and(self, other: impl Into<Predicate<E>>) -> Self {
        let other = other.into();
        match self {
            Predicate::And(mut terms) => {
                match other {
                    Predicate::And(more) => terms.extend(more),
                    other => terms.push(other),
                }
                Predicate::And(terms)
            }
            first => match other {
                Predicate::And(mut more) => {
                    more.insert(0, first);
                    Predicate::And(more)
                }
                other => Predicate::And(vec![first, other]),
            },
        }
    }

    /// OR 결합
    pub fn or(self, other: impl Into<Predicate<E>>) -> Self {
        let other = other.into();
        match self {
            Predicate::Or(mut terms) => {
                terms.push(other);
                Predicate::Or(terms)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    /// 부정. 필드 predicate 는 여집합 종류로 바뀌어 번역 가능성을 유지한다.
    pub fn negate(self) -> Self {
        match self {
            Predicate::Field(predicate) => Predicate::Field(predicate.negate()),
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    /// 삼치 논리 평가. opaque 테스트는 항상 true/false 를 반환한다.
    pub fn evaluate(&self, entity: &E) -> Option<bool> {
        match self {
            Predicate::Field(predicate) => predicate.evaluate(entity),
            Predicate::And(terms) => terms
                .iter()
                .try_fold(Some(true), |acc, term| match and3(acc, term.evaluate(entity)) {
                    Some(false) => Err(()),
                    next => Ok(next),
                })
                .unwrap_or(Some(false)),
            Predicate::Or(terms) => terms
                .iter()
                .try_fold(Some(false), |acc, term| match or3(acc, term.evaluate(entity)) {
                    Some(true) => Err(()),
                    next => Ok(next),
                })
                .unwrap_or(Some(true)),
            Predicate::Not(inner) => inner.evaluate(entity).map(|value| !value),
            Predicate::Opaque(test) => Some(test.test(entity)),
        }
    }

    /// 필터 테스트 (unknown 은 제외)
    pub fn test(&self, entity: &E) -> bool {
        self.evaluate(entity).unwrap_or(false)
    }

    /// 최상위 AND-결합을 필드 predicate 목록으로 평탄화.
    ///
    /// OR, NOT, opaque 항이 하나라도 있으면 `None`.
    pub fn conjuncts(&self) -> Option<Vec<&FieldPredicate<E>>> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out).then_some(out)
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<&'a FieldPredicate<E>>) -> bool {
        match self {
            Predicate::Field(predicate) => {
                out.push(predicate);
                true
            }
            Predicate::And(terms) => terms.iter().all(|term| term.collect_conjuncts(out)),
            _ => false,
        }
    }

    pub fn as_field(&self) -> Option<&FieldPredicate<E>> {
        match self {
            Predicate::Field(predicate) => Some(predicate),
            _ => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, Predicate::Opaque(_))
    }
}

impl<E> From<FieldPredicate<E>> for Predicate<E> {
    fn from(predicate: FieldPredicate<E>) -> Self {
        Predicate::Field(predicate)
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        match self {
            Predicate::Field(predicate) => Predicate::Field(predicate.clone()),
            Predicate::And(terms) => Predicate::And(terms.clone()),
            Predicate::Or(terms) => Predicate::Or(terms.clone()),
            Predicate::Not(inner) => Predicate::Not(inner.clone()),
            Predicate::Opaque(test) => Predicate::Opaque(test.clone()),
        }
    }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Field(predicate) => predicate.fmt(f),
            Predicate::And(terms) => f.debug_tuple("And").field(terms).finish(),
            Predicate::Or(terms) => f.debug_tuple("Or").field(terms).finish(),
            Predicate::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Predicate::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}
