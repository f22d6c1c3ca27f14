//! TerminatorKind — 파이프라인 평가를 강제하는 종단 연산 태그

use std::fmt;

/// 종단 연산 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminatorKind {
    ForEach,
    ForEachOrdered,
    Reduce,
    Collect,
    Count,
    Min,
    Max,
    AnyMatch,
    AllMatch,
    NoneMatch,
    FindFirst,
    FindAny,
    ToArray,
    Iterator,
    Spliterator,
}

impl TerminatorKind {
    pub const ALL: [TerminatorKind; 15] = [
        TerminatorKind::ForEach,
        TerminatorKind::ForEachOrdered,
        TerminatorKind::Reduce,
        TerminatorKind::Collect,
        TerminatorKind::Count,
        TerminatorKind::Min,
        TerminatorKind::Max,
        TerminatorKind::AnyMatch,
        TerminatorKind::AllMatch,
        TerminatorKind::NoneMatch,
        TerminatorKind::FindFirst,
        TerminatorKind::FindAny,
        TerminatorKind::ToArray,
        TerminatorKind::Iterator,
        TerminatorKind::Spliterator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TerminatorKind::ForEach => "for_each",
            TerminatorKind::ForEachOrdered => "for_each_ordered",
            TerminatorKind::Reduce => "reduce",
            TerminatorKind::Collect => "collect",
            TerminatorKind::Count => "count",
            TerminatorKind::Min => "min",
            TerminatorKind::Max => "max",
            TerminatorKind::AnyMatch => "any_match",
            TerminatorKind::AllMatch => "all_match",
            TerminatorKind::NoneMatch => "none_match",
            TerminatorKind::FindFirst => "find_first",
            TerminatorKind::FindAny => "find_any",
            TerminatorKind::ToArray => "to_array",
            TerminatorKind::Iterator => "iterator",
            TerminatorKind::Spliterator => "spliterator",
        }
    }

    /// 열린 자원을 호출자에게 넘기는가 (닫기는 호출자 책임)
    pub fn leaves_open(&self) -> bool {
        matches!(self, TerminatorKind::Iterator | TerminatorKind::Spliterator)
    }
}

impl fmt::Display for TerminatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_iterators_leave_resources_open() {
        let open: Vec<_> = TerminatorKind::ALL
            .into_iter()
            .filter(TerminatorKind::leaves_open)
            .collect();
        assert_eq!(open, vec![TerminatorKind::Iterator, TerminatorKind::Spliterator]);
        assert_eq!(TerminatorKind::ForEachOrdered.to_string(), "for_each_ordered");
    }
}
