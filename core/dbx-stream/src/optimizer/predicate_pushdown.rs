//! Rule 1: Predicate Pushdown
//!
//! 선두의 Filter 들을 WHERE 절로 이동

use super::{OptimizerState, PushdownRule};
use crate::pipeline::Operation;
use crate::sql::translate_predicate;

/// AND-결합된 필드 predicate 로만 이루어진 Filter 를 WHERE 로 이동.
///
/// 결합의 일부만 번역 가능한 Filter 는 통째로 in-memory 에 남긴다.
pub struct PredicatePushdownRule;

impl<E> PushdownRule<E> for PredicatePushdownRule {
    fn name(&self) -> &str {
        "PredicatePushdown"
    }

    fn apply(&self, state: &mut OptimizerState<'_, E>) {
        while let Some((index, Operation::Filter(predicate))) = state.peek() {
            let Some(conjuncts) = predicate.conjuncts() else {
                tracing::debug!(
                    target: crate::logging::OPTIMIZER,
                    index,
                    "filter is not a conjunction of field predicates; stopping"
                );
                return;
            };

            let translated: Option<Vec<_>> = conjuncts
                .iter()
                .map(|conjunct| translate_predicate(conjunct, state.context()))
                .collect();
            let Some(fragments) = translated else {
                tracing::debug!(
                    target: crate::logging::OPTIMIZER,
                    index,
                    "filter has an untranslatable conjunct; stopping"
                );
                return;
            };

            for fragment in fragments {
                state.query_mut().add_predicate(fragment);
            }
            state.consume_through(index);
        }
    }
}
