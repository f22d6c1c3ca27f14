//! Rule 3: Limit Pushdown
//!
//! Skip / Limit 을 OFFSET / LIMIT 로 이동

use super::{OptimizerState, PushdownRule};
use crate::pipeline::Operation;

/// `Skip(n), Limit(m)` ⇒ OFFSET n LIMIT m,
/// `Limit(m), Skip(n)` ⇒ OFFSET n LIMIT m-n
pub struct LimitPushdownRule;

impl<E> PushdownRule<E> for LimitPushdownRule {
    fn name(&self) -> &str {
        "LimitPushdown"
    }

    fn apply(&self, state: &mut OptimizerState<'_, E>) {
        let Some((index, first)) = state.peek() else {
            return;
        };
        let following = state.peek_after(index);

        match (first, following) {
            (Operation::Skip(skip), Some((next, Operation::Limit(limit)))) => {
                state.query_mut().set_offset(*skip);
                state.query_mut().set_limit(*limit);
                state.consume_through(next);
            }
            (Operation::Limit(limit), Some((next, Operation::Skip(skip)))) => {
                state.query_mut().set_offset(*skip);
                state.query_mut().set_limit(limit.saturating_sub(*skip));
                state.consume_through(next);
            }
            (Operation::Skip(skip), _) => {
                state.query_mut().set_offset(*skip);
                state.consume_through(index);
            }
            (Operation::Limit(limit), _) => {
                state.query_mut().set_limit(*limit);
                state.consume_through(index);
            }
            _ => {}
        }
    }
}
