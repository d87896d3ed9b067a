use crate::domain::ports::SessionStorage;
use crate::error::StorageError;
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the session key/value entries.
pub const CF_SESSION: &str = "session";

/// A persistent session store implementation using RocksDB.
///
/// Entries live in their own Column Family so the database can be shared with
/// other client state. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBSessionStorage {
    db: Arc<DB>,
}

impl RocksDBSessionStorage {
    /// Opens or creates a RocksDB instance at the specified path, creating the
    /// "session" column family if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_session = ColumnFamilyDescriptor::new(CF_SESSION, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_session])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| StorageError::Internal("Session column family not found".to_string()))
    }
}

#[async_trait]
impl SessionStorage for RocksDBSessionStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cf = self.cf()?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| StorageError::Internal(format!("Invalid UTF-8 value: {e}"))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let cf = self.cf()?;
        self.db.put_cf(cf, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let cf = self.cf()?;
        self.db.delete_cf(cf, key.as_bytes())?;
        Ok(())
    }
}
