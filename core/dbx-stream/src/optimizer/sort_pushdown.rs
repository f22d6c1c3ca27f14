//! Rule 2: Sort Pushdown
//!
//! Filter 뒤의 Sorted 를 ORDER BY 로 이동

use super::{OptimizerState, PushdownRule};
use crate::pipeline::Operation;
use crate::sql::translate_comparator;

/// 모든 키가 번역 가능한 Sorted 를 ORDER BY 로 이동.
///
/// 연속된 정렬은 나중 것이 주 정렬 키가 된다 (안정 정렬을 다시 한 것과 같음).
pub struct SortPushdownRule;

impl<E> PushdownRule<E> for SortPushdownRule {
    fn name(&self) -> &str {
        "SortPushdown"
    }

    fn apply(&self, state: &mut OptimizerState<'_, E>) {
        while let Some((index, Operation::Sorted(comparator))) = state.peek() {
            let Some(keys) = comparator.field_keys() else {
                tracing::debug!(target: crate::logging::OPTIMIZER, index, "opaque sort key; stopping");
                return;
            };

            let translated: Option<Vec<_>> = keys
                .iter()
                .map(|key| translate_comparator(key, state.context()))
                .collect();
            let Some(fragments) = translated else {
                tracing::debug!(
                    target: crate::logging::OPTIMIZER,
                    index,
                    "sort key not expressible in dialect; stopping"
                );
                return;
            };

            state.query_mut().prepend_order_by(fragments);
            state.consume_through(index);
        }
    }
}
