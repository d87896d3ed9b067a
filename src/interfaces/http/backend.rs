use crate::domain::outcome::OrderStatus;
use crate::domain::ports::PaymentBackend;
use crate::domain::session::TransactionRef;
use crate::domain::shipping::{AccountId, ShippingDetails};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Order state strings as written by the storefront backend.
pub const STATUS_AWAITING_PAYMENT: &str = "CHỜ THANH TOÁN";
pub const STATUS_AWAITING_APPROVAL: &str = "Chờ duyệt";
pub const STATUS_PAYMENT_FAILED: &str = "THANH TOÁN THẤT BẠI";

const ACCOUNT_HEADER: &str = "X-Account-ID";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateOrderResponse {
    status: String,
    txn_ref: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PaymentUrlResponse {
    status: String,
    payment_url: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrderStatusResponse {
    order_status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CancelResponse {
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorResponse {
    message: Option<String>,
}

/// Prefers the backend's own `message` field over the raw error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|error| error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

pub fn parse_order_status(raw: &str) -> OrderStatus {
    match raw.trim() {
        STATUS_AWAITING_PAYMENT => OrderStatus::AwaitingPayment,
        STATUS_AWAITING_APPROVAL => OrderStatus::AwaitingApproval,
        STATUS_PAYMENT_FAILED => OrderStatus::PaymentFailed,
        other => OrderStatus::Other(other.to_string()),
    }
}

/// REST client for the storefront backend's payment endpoints.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    client: Client,
    base_url: String,
}

impl HttpPaymentBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn create_pending_order(
        &self,
        details: &ShippingDetails,
        account: &AccountId,
    ) -> Result<TransactionRef, BackendError> {
        let request = self
            .client
            .post(self.url("/orders/vnpay"))
            .header(ACCOUNT_HEADER, account.as_str())
            .json(details);
        let body: CreateOrderResponse = self.send(request).await?;

        match (body.status.as_str(), body.txn_ref) {
            ("success", Some(txn)) if !txn.is_empty() => Ok(TransactionRef::new(txn)),
            _ => Err(BackendError::Rejected(
                body.message
                    .unwrap_or_else(|| "order was not created".to_string()),
            )),
        }
    }

    async fn request_payment_url(&self, txn: &TransactionRef) -> Result<String, BackendError> {
        let request = self
            .client
            .post(self.url("/create-payment"))
            .query(&[("txnRef", txn.as_str())]);
        let body: PaymentUrlResponse = self.send(request).await?;

        match (body.status.as_str(), body.payment_url) {
            ("success", Some(url)) if !url.is_empty() => Ok(url),
            _ => Err(BackendError::Rejected(
                body.message
                    .unwrap_or_else(|| "payment link unavailable".to_string()),
            )),
        }
    }

    async fn order_status(&self, txn: &TransactionRef) -> Result<OrderStatus, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("/check-payment-status/{txn}")));
        let body: OrderStatusResponse = self.send(request).await?;
        debug!(txn = %txn, raw = %body.order_status, "Order status fetched");
        Ok(parse_order_status(&body.order_status))
    }

    async fn cancel_transaction(&self, txn: &TransactionRef) -> Result<bool, BackendError> {
        let request = self.client.post(self.url(&format!("/vnpay-cancel/{txn}")));
        let body: CancelResponse = self.send(request).await?;
        Ok(body.status == "ok")
    }
}
