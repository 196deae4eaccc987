pub mod free_space;
pub mod storage_cleanup;
pub mod sweep;

pub use free_space::{free_space_alert, FreeSpaceThreshold};
pub use storage_cleanup::StorageCleanupService;
pub use sweep::{sweep_subfolders, SweepReport};
