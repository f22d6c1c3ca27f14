//! Physical Operators — Volcano 모델 시퀀스 연산자
//!
//! 각 연산자는 `SequenceOperator<T>` 를 구현하고, 입력 연산자를
//! `Box<dyn SequenceOperator<T>>` 로 소유한다.

pub mod filter;
pub mod flat_map;
pub mod limit;
pub mod map;
pub mod parallel;
pub mod scan;
pub mod sequence_operator;
pub mod sort;
pub mod values;

pub use filter::FilterOperator;
pub use flat_map::FlatMapOperator;
pub use limit::LimitOperator;
pub use map::MapOperator;
pub use parallel::{ParallelOperator, Stage};
pub use scan::ScanOperator;
pub use sequence_operator::SequenceOperator;
pub use sort::SortOperator;
pub use values::{BufferOperator, EmptyOperator, IterOperator, VecOperator};
