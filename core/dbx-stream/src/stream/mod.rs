//! Stream 모듈 — 자동으로 닫히는 지연 시퀀스와 엔티티 스트림 facade

mod close;
mod entity_stream;
mod iter;
mod sequence;


pub use close::{CloseAction, CloseRegistry};
pub use entity_stream::EntityStream;
pub use iter::{ClosingIter, Spliterator};
pub use sequence::AutoClose;
