use super::session::SessionStatus;
use serde::{Deserialize, Serialize};

/// Order state as reported by the backend's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The pending order was never paid.
    AwaitingPayment,
    /// Paid and waiting for merchant review.
    AwaitingApproval,
    PaymentFailed,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The gateway reported the payment as failed.
    Declined,
    /// The status query failed or returned something unrecognized.
    Unresolved,
}

/// Terminal result of a payment session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed,
    Cancelled,
    TimedOut,
    Failed(FailureReason),
}

impl PaymentOutcome {
    /// Reconciles the backend status seen after the gateway window closed.
    pub fn from_order_status(status: &OrderStatus) -> Self {
        match status {
            OrderStatus::AwaitingPayment => Self::Cancelled,
            OrderStatus::AwaitingApproval => Self::Completed,
            OrderStatus::PaymentFailed => Self::Failed(FailureReason::Declined),
            OrderStatus::Other(_) => Self::Failed(FailureReason::Unresolved),
        }
    }

    pub fn status(self) -> SessionStatus {
        match self {
            Self::Completed => SessionStatus::Completed,
            Self::Cancelled => SessionStatus::Cancelled,
            Self::TimedOut => SessionStatus::TimedOut,
            Self::Failed(_) => SessionStatus::Failed,
        }
    }

    pub fn notice(self) -> Notice {
        match self {
            Self::Completed => Notice::success("Payment successful!"),
            Self::Cancelled => Notice::warning("You cancelled the payment"),
            Self::TimedOut => Notice::error("The payment session has expired"),
            Self::Failed(FailureReason::Declined) => Notice::error("Payment failed"),
            Self::Failed(FailureReason::Unresolved) => {
                Notice::error("Could not determine the payment status")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}
