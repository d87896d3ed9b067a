use thiserror::Error;

/// Rejections of the shipping form, raised before any backend call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all shipping details")]
    MissingField(&'static str),
    #[error("Invalid phone number")]
    InvalidPhone,
    #[error("Invalid email address")]
    InvalidEmail,
}

/// Failures talking to the storefront backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Could not decode backend response: {0}")]
    Decode(String),
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
}

/// Failures of the durable client-side storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
    #[error("Storage error: {0}")]
    Internal(String),
}

/// Reasons `begin_payment` stops before the monitor loop starts.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("You need to sign in before paying")]
    Unauthenticated { return_path: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Payment could not be started: {0}")]
    Backend(#[from] BackendError),
    #[error("Please allow popups to open the payment gateway")]
    PopupBlocked,
    #[error("Session storage unavailable: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
