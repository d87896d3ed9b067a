use crate::domain::outcome::PaymentOutcome;
use crate::domain::ports::GatewayWindow;
use crate::domain::session::{SessionStatus, TransactionRef};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::task::{AbortHandle, JoinHandle};

/// The live resources of one session: its polling task and its gateway window.
pub(crate) struct SessionResources {
    task: Mutex<Option<AbortHandle>>,
    window: Arc<dyn GatewayWindow>,
    released: AtomicBool,
}

impl SessionResources {
    pub(crate) fn new(window: Arc<dyn GatewayWindow>) -> Self {
        Self {
            task: Mutex::new(None),
            window,
            released: AtomicBool::new(false),
        }
    }

    /// Registers the polling task. A session released before its task was
    /// attached stops the task straight away.
    pub(crate) async fn attach(&self, task: AbortHandle) {
        let mut slot = self.task.lock().await;
        if self.is_released() {
            tracing::debug!("Session released before its loop started, stopping it");
            task.abort();
            return;
        }
        *slot = Some(task);
    }

    /// Forgets the polling task without stopping it. Called by the task itself
    /// once it has reached a terminal state.
    pub(crate) async fn detach(&self) {
        self.task.lock().await.take();
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Stops the polling task and closes the gateway window. Safe to call
    /// any number of times.
    pub(crate) async fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        if let Some(task) = self.task.lock().await.take() {
            tracing::debug!("Stopping payment monitor loop");
            task.abort();
        }
        if !self.window.is_closed().await {
            self.window.close().await;
        }
    }
}

/// Cleanup hook for the hosting surface going away (reload, tab close, Ctrl-C).
///
/// Best effort: it stops polling and closes the gateway window but leaves the
/// backend order in whatever state it last reached.
#[derive(Clone)]
pub struct UnloadHook {
    resources: Arc<SessionResources>,
}

impl UnloadHook {
    pub async fn fire(&self) {
        self.resources.release().await;
    }
}

/// Returned by `begin_payment` once the monitor loop is running.
pub struct SessionHandle {
    transaction_ref: TransactionRef,
    status: watch::Receiver<SessionStatus>,
    task: Option<JoinHandle<PaymentOutcome>>,
    resources: Arc<SessionResources>,
}

impl SessionHandle {
    pub(crate) fn new(
        transaction_ref: TransactionRef,
        status: watch::Receiver<SessionStatus>,
        task: JoinHandle<PaymentOutcome>,
        resources: Arc<SessionResources>,
    ) -> Self {
        Self {
            transaction_ref,
            status,
            task: Some(task),
            resources,
        }
    }

    pub fn transaction_ref(&self) -> &TransactionRef {
        &self.transaction_ref
    }

    /// Latest status published by the session.
    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn unload_hook(&self) -> UnloadHook {
        UnloadHook {
            resources: Arc::clone(&self.resources),
        }
    }

    pub async fn cleanup(&self) {
        self.resources.release().await;
    }

    /// Waits for the terminal outcome, including the redirect that follows it.
    ///
    /// Returns `None` if the session was cleaned up or superseded first, or if
    /// the outcome was already taken.
    pub async fn outcome(&mut self) -> Option<PaymentOutcome> {
        let task = self.task.take()?;
        task.await.ok()
    }
}
