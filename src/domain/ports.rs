use super::outcome::{Notice, OrderStatus};
use super::session::TransactionRef;
use super::shipping::{AccountId, ShippingDetails};
use crate::error::{BackendError, StorageError};
use async_trait::async_trait;
use std::sync::Arc;

/// The storefront REST backend that owns orders and talks to the payment gateway.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_pending_order(
        &self,
        details: &ShippingDetails,
        account: &AccountId,
    ) -> Result<TransactionRef, BackendError>;
    async fn request_payment_url(&self, txn: &TransactionRef) -> Result<String, BackendError>;
    async fn order_status(&self, txn: &TransactionRef) -> Result<OrderStatus, BackendError>;
    /// Returns whether the backend acknowledged the cancellation.
    async fn cancel_transaction(&self, txn: &TransactionRef) -> Result<bool, BackendError>;
}

/// An externally controlled window hosting the gateway UI.
///
/// Only its open/closed state is observable.
#[async_trait]
pub trait GatewayWindow: Send + Sync {
    async fn is_closed(&self) -> bool;
    /// Requests closure. Closing an already closed window is a no-op.
    async fn close(&self);
}

#[async_trait]
pub trait GatewayLauncher: Send + Sync {
    /// Opens `url` in a new window, or `None` when the host refuses.
    async fn open(&self, url: &str) -> Option<Box<dyn GatewayWindow>>;
}

/// Durable string key/value storage on the client.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

pub type PaymentBackendRef = Arc<dyn PaymentBackend>;
pub type GatewayLauncherRef = Arc<dyn GatewayLauncher>;
pub type SessionStorageRef = Arc<dyn SessionStorage>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type NavigatorRef = Arc<dyn Navigator>;
