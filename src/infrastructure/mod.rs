//! Adapters for durable client storage and the gateway window.

pub mod file;
pub mod in_memory;
pub mod process_window;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
