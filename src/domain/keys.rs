//! Keys used in durable client storage.

pub const ACCOUNT_ID: &str = "account.id";
pub const RETURN_PATH: &str = "auth.return_path";
pub const TRANSACTION_REF: &str = "payment.txn_ref";
/// Unix epoch milliseconds at which the session started.
pub const STARTED_AT: &str = "payment.started_at";
