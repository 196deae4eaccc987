pub mod engine;
pub mod notification;
pub mod path;

pub use engine::{EventState, ReconciliationEngine};
pub use notification::Notification;
pub use path::{classify, EventKind, FileInfo};
