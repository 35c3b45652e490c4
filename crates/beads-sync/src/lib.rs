//! Replica export/import engine and the debounced flush that keeps the
//! relational Store and the text replica in sync.

mod debounce;
mod deletion;
mod engine;
mod error;
mod replica;

pub use debounce::Debouncer;
pub use deletion::{append_deletion, load_manifest, DeletionRecord, LoadedManifest};
pub use engine::{export_store, import_store, ExportStats, ImportStats};
pub use error::{Result, SyncError};
pub use replica::{read_replica, write_replica, ReplicaRecord};
