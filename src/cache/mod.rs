//! Cache module for persisting the last forecast snapshot to disk
//!
//! The binary uses it to show the previous forecast without a network round
//! trip. Expired entries are still returned with an `is_stale` flag.

mod store;

pub use store::{SnapshotStore, StoredSnapshot};
