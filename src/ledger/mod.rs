pub mod addressing;
pub mod store;

pub use addressing::slot_row;
pub use store::{MemoryLedger, RecordStore};
