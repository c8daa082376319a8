//! Domain Layer - record entries and the local node record, no I/O

mod entry;
mod errors;
mod record;

pub use entry::{EthEnrEntry, RecordEntry};
pub use errors::EntryError;
pub use record::{LocalNodeRecord, NodeRecord};
