//! 계획/작업 저장소 구현.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;
