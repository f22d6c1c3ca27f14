//! Executor 모듈 — Volcano 연산자, 엔티티 source 계약, 종단 dispatcher

pub mod dispatcher;
pub mod operators;
pub mod source;
pub mod terminator;

pub use dispatcher::{Dispatcher, ExecutionPath};
pub use operators::SequenceOperator;
pub use source::{Cursor, EntitySource, Row, VecCursor};
pub use terminator::TerminatorKind;
