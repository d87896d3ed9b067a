use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipping and contact details submitted with a checkout.
///
/// Field names serialize in the backend's camelCase form so the struct can be
/// posted as-is when creating a pending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub receiver_name: String,
    pub receiver_phone: String,
    pub email: String,
    pub shipping_address: String,
}

impl ShippingDetails {
    /// Checks the form the way the checkout page does: presence first, then
    /// phone, then email.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("receiver name", &self.receiver_name),
            ("receiver phone", &self.receiver_phone),
            ("email", &self.email),
            ("shipping address", &self.shipping_address),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::MissingField(name));
        }

        if !is_valid_phone(&self.receiver_phone) {
            return Err(ValidationError::InvalidPhone);
        }

        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }

        Ok(())
    }
}

fn is_valid_phone(phone: &str) -> bool {
    (9..=11).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty()
        || !local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c))
    {
        return false;
    }

    let Some((label, tld)) = domain.split_once('.') else {
        return false;
    };
    label.len() >= 2
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Identity of the signed-in storefront account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
