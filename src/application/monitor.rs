use super::handle::{SessionHandle, SessionResources};
use crate::config::MonitorConfig;
use crate::domain::keys;
use crate::domain::outcome::{FailureReason, Notice, PaymentOutcome};
use crate::domain::ports::{
    GatewayLauncherRef, GatewayWindow, NavigatorRef, NotifierRef, PaymentBackendRef,
    SessionStorage, SessionStorageRef,
};
use crate::domain::session::{PaymentSession, SessionStatus, TransactionRef};
use crate::domain::shipping::{AccountId, ShippingDetails};
use crate::error::{MonitorError, Result};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

struct ActiveSession {
    generation: u64,
    resources: Arc<SessionResources>,
}

type ActiveSlot = Arc<Mutex<Option<ActiveSession>>>;

/// Drives external-gateway payment attempts from order creation to redirect.
///
/// At most one session is active per monitor; starting a new one stops the
/// previous session's loop and closes its window first.
pub struct PaymentConfirmationMonitor {
    backend: PaymentBackendRef,
    launcher: GatewayLauncherRef,
    storage: SessionStorageRef,
    notifier: NotifierRef,
    navigator: NavigatorRef,
    config: MonitorConfig,
    active: ActiveSlot,
    generation: AtomicU64,
}

impl PaymentConfirmationMonitor {
    pub fn new(
        backend: PaymentBackendRef,
        launcher: GatewayLauncherRef,
        storage: SessionStorageRef,
        notifier: NotifierRef,
        navigator: NavigatorRef,
        config: MonitorConfig,
    ) -> Self {
        Self {
            backend,
            launcher,
            storage,
            notifier,
            navigator,
            config,
            active: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Whether a session's monitor loop is currently live.
    pub async fn has_active_session(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|active| !active.resources.is_released())
    }

    /// Starts a payment attempt and returns once the gateway window is being
    /// monitored. The outcome is reported through the notifier and a final
    /// navigation to the order-status view.
    ///
    /// Every error is also reported to the user before it is returned.
    pub async fn begin_payment(&self, details: ShippingDetails) -> Result<SessionHandle> {
        self.cleanup().await;

        let mut session = PaymentSession::new();
        let (status_tx, status_rx) = watch::channel(session.status());

        if let Err(e) = details.validate() {
            return Err(self.abort(&mut session, &status_tx, e.into()));
        }

        let account = match self.signed_in_account().await {
            Ok(Some(account)) => account,
            Ok(None) => return Err(self.redirect_to_sign_in(&mut session, &status_tx).await),
            Err(e) => return Err(self.abort(&mut session, &status_tx, e)),
        };

        let txn = match self.backend.create_pending_order(&details, &account).await {
            Ok(txn) => txn,
            Err(e) => return Err(self.abort(&mut session, &status_tx, e.into())),
        };
        info!(txn = %txn, account = %account, "Pending order created");

        if let Err(e) = self.persist(&mut session, &txn).await {
            clear_persisted(self.storage.as_ref()).await;
            return Err(self.abort(&mut session, &status_tx, e));
        }

        let url = match self.backend.request_payment_url(&txn).await {
            Ok(url) => url,
            Err(e) => {
                clear_persisted(self.storage.as_ref()).await;
                return Err(self.abort(&mut session, &status_tx, e.into()));
            }
        };
        transition(&mut session, &status_tx, SessionStatus::AwaitingGatewayWindow);

        self.notifier
            .notify(Notice::success("Redirecting to the payment gateway..."));
        sleep(self.config.launch_delay).await;

        let window = match self.launcher.open(&url).await {
            Some(window) => Arc::<dyn GatewayWindow>::from(window),
            None => return Err(self.popup_blocked(&mut session, &status_tx, &txn).await),
        };
        if window.is_closed().await {
            return Err(self.popup_blocked(&mut session, &status_tx, &txn).await);
        }
        transition(&mut session, &status_tx, SessionStatus::Polling);
        info!(txn = %txn, "Gateway window opened, polling for completion");

        Ok(self.spawn_loop(session, txn, window, status_tx, status_rx).await)
    }

    /// Stops the active session's loop and closes its gateway window, if any.
    pub async fn cleanup(&self) {
        let previous = self.active.lock().await.take();
        if let Some(previous) = previous {
            debug!(generation = previous.generation, "Releasing active payment session");
            previous.resources.release().await;
        }
    }

    async fn spawn_loop(
        &self,
        session: PaymentSession,
        txn: TransactionRef,
        window: Arc<dyn GatewayWindow>,
        status_tx: watch::Sender<SessionStatus>,
        status_rx: watch::Receiver<SessionStatus>,
    ) -> SessionHandle {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let resources = Arc::new(SessionResources::new(Arc::clone(&window)));

        let superseded = self.active.lock().await.replace(ActiveSession {
            generation,
            resources: Arc::clone(&resources),
        });
        if let Some(superseded) = superseded {
            superseded.resources.release().await;
        }

        let driver = SessionDriver {
            backend: Arc::clone(&self.backend),
            storage: Arc::clone(&self.storage),
            notifier: Arc::clone(&self.notifier),
            navigator: Arc::clone(&self.navigator),
            config: self.config.clone(),
            active: Arc::clone(&self.active),
            generation,
            resources: Arc::clone(&resources),
            session,
            txn: txn.clone(),
            window,
            status: status_tx,
        };
        let task = tokio::spawn(driver.run());
        resources.attach(task.abort_handle()).await;

        SessionHandle::new(txn, status_rx, task, resources)
    }

    async fn signed_in_account(&self) -> Result<Option<AccountId>> {
        let id = self.storage.get(keys::ACCOUNT_ID).await?;
        Ok(id.filter(|id| !id.trim().is_empty()).map(AccountId::new))
    }

    async fn redirect_to_sign_in(
        &self,
        session: &mut PaymentSession,
        status_tx: &watch::Sender<SessionStatus>,
    ) -> MonitorError {
        let return_path = self.config.return_path.clone();
        if let Err(e) = self.storage.set(keys::RETURN_PATH, &return_path).await {
            warn!(error = %e, "Failed to remember return path");
        }
        let error = self.abort(session, status_tx, MonitorError::Unauthenticated { return_path });
        sleep(self.config.redirect_delay).await;
        self.navigator.navigate(&self.config.sign_in_path);
        error
    }

    async fn persist(&self, session: &mut PaymentSession, txn: &TransactionRef) -> Result<()> {
        if let Some(stale) = self.storage.get(keys::TRANSACTION_REF).await? {
            warn!(stale = %stale, "Discarding transaction left over from an earlier session");
        }
        let started_at = Utc::now();
        if let Err(e) = session.assign_transaction(txn.clone(), started_at) {
            warn!(error = %e, "Unexpected session state");
        }
        self.storage.set(keys::TRANSACTION_REF, txn.as_str()).await?;
        self.storage
            .set(keys::STARTED_AT, &started_at.timestamp_millis().to_string())
            .await?;
        Ok(())
    }

    async fn popup_blocked(
        &self,
        session: &mut PaymentSession,
        status_tx: &watch::Sender<SessionStatus>,
        txn: &TransactionRef,
    ) -> MonitorError {
        warn!(txn = %txn, "Gateway window could not be opened");
        clear_persisted(self.storage.as_ref()).await;
        self.abort(session, status_tx, MonitorError::PopupBlocked)
    }

    fn abort(
        &self,
        session: &mut PaymentSession,
        status_tx: &watch::Sender<SessionStatus>,
        error: MonitorError,
    ) -> MonitorError {
        warn!(error = %error, "Payment could not be started");
        transition(session, status_tx, SessionStatus::Failed);
        self.notifier.notify(Notice::error(error.to_string()));
        error
    }
}

/// Owns one session after its window opened: polls, reconciles, redirects.
struct SessionDriver {
    backend: PaymentBackendRef,
    storage: SessionStorageRef,
    notifier: NotifierRef,
    navigator: NavigatorRef,
    config: MonitorConfig,
    active: ActiveSlot,
    generation: u64,
    resources: Arc<SessionResources>,
    session: PaymentSession,
    txn: TransactionRef,
    window: Arc<dyn GatewayWindow>,
    status: watch::Sender<SessionStatus>,
}

impl SessionDriver {
    async fn run(mut self) -> PaymentOutcome {
        let opened_at = Instant::now();
        let period = self.config.poll_interval;
        let mut ticker = interval_at(opened_at + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Round-trips are awaited inside the loop body, so a slow backend
        // delays the next tick instead of overlapping with it.
        let outcome = loop {
            ticker.tick().await;
            if opened_at.elapsed() > self.config.timeout {
                break self.expire().await;
            }
            if self.window.is_closed().await {
                break self.reconcile().await;
            }
        };
        drop(ticker);

        self.finish(outcome).await
    }

    async fn expire(&self) -> PaymentOutcome {
        info!(txn = %self.txn, "Payment session timed out");
        if !self.window.is_closed().await {
            self.window.close().await;
        }
        self.cancel_transaction().await;
        PaymentOutcome::TimedOut
    }

    async fn reconcile(&mut self) -> PaymentOutcome {
        transition(
            &mut self.session,
            &self.status,
            SessionStatus::ReconcilingResult,
        );
        debug!(txn = %self.txn, "Gateway window closed, querying order status");

        let outcome = match self.backend.order_status(&self.txn).await {
            Ok(status) => {
                debug!(txn = %self.txn, status = ?status, "Order status received");
                PaymentOutcome::from_order_status(&status)
            }
            Err(e) => {
                warn!(txn = %self.txn, error = %e, "Order status query failed");
                PaymentOutcome::Failed(FailureReason::Unresolved)
            }
        };
        if outcome == PaymentOutcome::Cancelled {
            self.cancel_transaction().await;
        }
        outcome
    }

    async fn cancel_transaction(&self) {
        match self.backend.cancel_transaction(&self.txn).await {
            Ok(true) => debug!(txn = %self.txn, "Transaction cancelled"),
            Ok(false) => warn!(txn = %self.txn, "Backend did not acknowledge cancellation"),
            Err(e) => warn!(txn = %self.txn, error = %e, "Cancel transaction failed"),
        }
    }

    async fn finish(mut self, outcome: PaymentOutcome) -> PaymentOutcome {
        transition(&mut self.session, &self.status, outcome.status());
        info!(txn = %self.txn, outcome = ?outcome, "Payment session finished");
        self.notifier.notify(outcome.notice());
        clear_persisted(self.storage.as_ref()).await;

        {
            let mut active = self.active.lock().await;
            if active
                .as_ref()
                .is_some_and(|current| current.generation == self.generation)
            {
                *active = None;
            }
        }
        self.resources.detach().await;

        sleep(self.config.redirect_delay).await;
        self.navigator.navigate(&self.config.order_status_path);
        outcome
    }
}

fn transition(
    session: &mut PaymentSession,
    status_tx: &watch::Sender<SessionStatus>,
    next: SessionStatus,
) {
    match session.advance(next) {
        Ok(()) => {
            status_tx.send_replace(next);
        }
        Err(e) => warn!(error = %e, "Ignoring invalid session transition"),
    }
}

async fn clear_persisted(storage: &dyn SessionStorage) {
    for key in [keys::TRANSACTION_REF, keys::STARTED_AT] {
        if let Err(e) = storage.remove(key).await {
            warn!(key, error = %e, "Failed to clear persisted payment field");
        }
    }
}
