use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Backend-issued identifier correlating a pending order with one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionRef(String);

impl TransactionRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Initiating,
    AwaitingGatewayWindow,
    Polling,
    ReconcilingResult,
    Completed,
    Cancelled,
    TimedOut,
    Failed,
}

impl SessionStatus {
    /// Position along the state machine. Terminal states share the last rank.
    fn rank(self) -> u8 {
        match self {
            Self::Initiating => 0,
            Self::AwaitingGatewayWindow => 1,
            Self::Polling => 2,
            Self::ReconcilingResult => 3,
            Self::Completed | Self::Cancelled | Self::TimedOut | Self::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.rank() == 4
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot move session from {from:?} to {to:?}")]
    Backward { from: SessionStatus, to: SessionStatus },
    #[error("Cannot open a gateway window before a transaction reference is assigned")]
    MissingTransaction,
    #[error("Transaction reference can only be assigned while initiating")]
    AlreadyAssigned,
}

/// One attempt to pay for a cart through the external gateway.
///
/// Status only moves forward; a retry is a brand-new session.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    transaction_ref: Option<TransactionRef>,
    started_at: Option<DateTime<Utc>>,
    status: SessionStatus,
}

impl Default for PaymentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentSession {
    pub fn new() -> Self {
        Self {
            transaction_ref: None,
            started_at: None,
            status: SessionStatus::Initiating,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn transaction_ref(&self) -> Option<&TransactionRef> {
        self.transaction_ref.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Records the backend's reference for this attempt.
    pub fn assign_transaction(
        &mut self,
        transaction_ref: TransactionRef,
        started_at: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status != SessionStatus::Initiating || self.transaction_ref.is_some() {
            return Err(TransitionError::AlreadyAssigned);
        }
        self.transaction_ref = Some(transaction_ref);
        self.started_at = Some(started_at);
        Ok(())
    }

    /// Moves the session forward along the state machine.
    pub fn advance(&mut self, next: SessionStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() || next.rank() <= self.status.rank() {
            return Err(TransitionError::Backward {
                from: self.status,
                to: next,
            });
        }
        if next.rank() >= SessionStatus::AwaitingGatewayWindow.rank()
            && !next.is_terminal()
            && self.transaction_ref.is_none()
        {
            return Err(TransitionError::MissingTransaction);
        }
        self.status = next;
        Ok(())
    }
}
