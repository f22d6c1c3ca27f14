//! Limit Operator — limit / skip handling

use crate::error::StreamResult;
use crate::executor::operators::SequenceOperator;

/// Limit 연산자 (limit / skip)
pub struct LimitOperator<T> {
    input: Box<dyn SequenceOperator<T>>,
    count: Option<u64>,
    offset: u64,
    /// Total items emitted so far
    emitted: u64,
    /// Total items skipped so far (for offset)
    skipped: u64,
}

impl<T> LimitOperator<T> {
    pub fn new(input: Box<dyn SequenceOperator<T>>, count: Option<u64>, offset: u64) -> Self {
        Self {
            input,
            count,
            offset,
            emitted: 0,
            skipped: 0,
        }
    }
}

impl<T> SequenceOperator<T> for LimitOperator<T> {
    fn next(&mut self) -> StreamResult<Option<T>> {
        // Already reached the limit
        if self.count.is_some_and(|count| self.emitted >= count) {
            return Ok(None);
        }

        // Handle offset: skip items
        while self.skipped < self.offset {
            if self.input.next()?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }

        let item = self.input.next()?;
        if item.is_some() {
            self.emitted += 1;
        }
        Ok(item)
    }

    fn size_hint(&self) -> Option<usize> {
        let upstream = self.input.size_hint()? as u64;
        let after_skip = upstream.saturating_sub(self.offset - self.skipped);
        let remaining = match self.count {
            Some(count) => after_skip.min(count - self.emitted),
            None => after_skip,
        };
        usize::try_from(remaining).ok()
    }
}
