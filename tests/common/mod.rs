#![allow(dead_code)]

use async_trait::async_trait;
use paywatch::application::PaymentConfirmationMonitor;
use paywatch::config::MonitorConfig;
use paywatch::domain::keys;
use paywatch::domain::outcome::{Notice, OrderStatus};
use paywatch::domain::ports::{
    GatewayLauncher, GatewayWindow, Navigator, Notifier, PaymentBackend, SessionStorage,
};
use paywatch::domain::session::TransactionRef;
use paywatch::domain::shipping::{AccountId, ShippingDetails};
use paywatch::error::BackendError;
use paywatch::infrastructure::in_memory::InMemorySessionStorage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub fn shipping_details() -> ShippingDetails {
    ShippingDetails {
        receiver_name: "Tran Thi B".to_string(),
        receiver_phone: "0912345678".to_string(),
        email: "buyer@shop.vn".to_string(),
        shipping_address: "45 Nguyen Hue, District 1".to_string(),
    }
}

/// Backend double that hands out `TXN1`, `TXN2`, ... and records every call.
pub struct ScriptedBackend {
    pub calls: Mutex<Vec<String>>,
    pub fail_create: AtomicBool,
    pub fail_url: AtomicBool,
    pub order_status: Mutex<Result<OrderStatus, String>>,
    pub status_delay: Mutex<Duration>,
    pub cancel_ack: AtomicBool,
    issued: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
            fail_url: AtomicBool::new(false),
            order_status: Mutex::new(Ok(OrderStatus::AwaitingPayment)),
            status_delay: Mutex::new(Duration::ZERO),
            cancel_ack: AtomicBool::new(true),
            issued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl ScriptedBackend {
    pub fn with_status(status: OrderStatus) -> Self {
        let backend = Self::default();
        *backend.order_status.lock().unwrap() = Ok(status);
        backend
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn round_trip<T>(&self, delay: Duration, result: T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl PaymentBackend for ScriptedBackend {
    async fn create_pending_order(
        &self,
        _details: &ShippingDetails,
        account: &AccountId,
    ) -> Result<TransactionRef, BackendError> {
        self.record(format!("create:{account}"));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TransactionRef::new(format!("TXN{n}")))
    }

    async fn request_payment_url(&self, txn: &TransactionRef) -> Result<String, BackendError> {
        self.record(format!("url:{txn}"));
        if self.fail_url.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected("gateway unavailable".to_string()));
        }
        Ok(format!("https://gateway.test/pay?ref={txn}"))
    }

    async fn order_status(&self, txn: &TransactionRef) -> Result<OrderStatus, BackendError> {
        self.record(format!("status:{txn}"));
        let delay = *self.status_delay.lock().unwrap();
        let result = self.order_status.lock().unwrap().clone();
        self.round_trip(delay, result.map_err(BackendError::Transport))
            .await
    }

    async fn cancel_transaction(&self, txn: &TransactionRef) -> Result<bool, BackendError> {
        self.record(format!("cancel:{txn}"));
        let ack = self.cancel_ack.load(Ordering::SeqCst);
        self.round_trip(Duration::ZERO, Ok(ack)).await
    }
}

/// Observable state of a fake gateway window.
pub struct WindowState {
    pub url: String,
    closes_at: Option<Instant>,
    closed: AtomicBool,
    pub close_calls: AtomicUsize,
}

impl WindowState {
    pub fn user_closes(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
            || self.closes_at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

struct FakeWindow {
    state: Arc<WindowState>,
}

#[async_trait]
impl GatewayWindow for FakeWindow {
    async fn is_closed(&self) -> bool {
        self.state.closed()
    }

    async fn close(&self) {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy)]
pub enum LaunchMode {
    /// Window stays open until closed explicitly.
    StaysOpen,
    /// The user closes the window this long after it opened.
    ClosesAfter(Duration),
    /// The host hands back no window at all.
    Refused,
    /// A window is returned but is already closed.
    ClosedImmediately,
}

pub struct FakeLauncher {
    mode: Mutex<LaunchMode>,
    pub windows: Mutex<Vec<Arc<WindowState>>>,
}

impl FakeLauncher {
    pub fn new(mode: LaunchMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn set_mode(&self, mode: LaunchMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn windows(&self) -> Vec<Arc<WindowState>> {
        self.windows.lock().unwrap().clone()
    }

    pub fn window(&self, index: usize) -> Arc<WindowState> {
        Arc::clone(&self.windows.lock().unwrap()[index])
    }
}

#[async_trait]
impl GatewayLauncher for FakeLauncher {
    async fn open(&self, url: &str) -> Option<Box<dyn GatewayWindow>> {
        let mode = *self.mode.lock().unwrap();
        let closes_at = match mode {
            LaunchMode::Refused => return None,
            LaunchMode::StaysOpen => None,
            LaunchMode::ClosesAfter(after) => Some(Instant::now() + after),
            LaunchMode::ClosedImmediately => Some(Instant::now()),
        };
        let state = Arc::new(WindowState {
            url: url.to_string(),
            closes_at,
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        });
        self.windows.lock().unwrap().push(Arc::clone(&state));
        Some(Box::new(FakeWindow { state }))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// A monitor wired to fakes, with a signed-in account.
pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub launcher: Arc<FakeLauncher>,
    pub storage: InMemorySessionStorage,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub monitor: PaymentConfirmationMonitor,
}

impl Harness {
    pub async fn new(backend: ScriptedBackend, mode: LaunchMode) -> Self {
        Self::with_config(backend, mode, MonitorConfig::default()).await
    }

    pub async fn with_config(
        backend: ScriptedBackend,
        mode: LaunchMode,
        config: MonitorConfig,
    ) -> Self {
        let storage = InMemorySessionStorage::new();
        storage.set(keys::ACCOUNT_ID, "42").await.unwrap();
        Self::build(backend, mode, config, storage)
    }

    pub fn signed_out(backend: ScriptedBackend, mode: LaunchMode) -> Self {
        Self::build(
            backend,
            mode,
            MonitorConfig::default(),
            InMemorySessionStorage::new(),
        )
    }

    fn build(
        backend: ScriptedBackend,
        mode: LaunchMode,
        config: MonitorConfig,
        storage: InMemorySessionStorage,
    ) -> Self {
        let backend = Arc::new(backend);
        let launcher = Arc::new(FakeLauncher::new(mode));
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());
        let monitor = PaymentConfirmationMonitor::new(
            backend.clone(),
            launcher.clone(),
            Arc::new(storage.clone()),
            notifier.clone(),
            navigator.clone(),
            config,
        );
        Self {
            backend,
            launcher,
            storage,
            notifier,
            navigator,
            monitor,
        }
    }

    pub async fn persisted_txn(&self) -> Option<String> {
        self.storage.get(keys::TRANSACTION_REF).await.unwrap()
    }

    pub async fn persisted_started_at(&self) -> Option<String> {
        self.storage.get(keys::STARTED_AT).await.unwrap()
    }

    pub async fn assert_storage_cleared(&self) {
        assert!(self.persisted_txn().await.is_none());
        assert!(self.persisted_started_at().await.is_none());
    }
}
