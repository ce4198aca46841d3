use anyhow::anyhow;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::{AccountId, RequestId};
use crate::entities::payment_requests;

/// Lifecycle of a payment request. Starts `Pending`, moves exactly once to a
/// terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

impl PaymentStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(anyhow!("Unknown payment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub id: RequestId,
    pub user_id: AccountId,
    pub user_email: String,
    pub plan: String,
    pub amount: i64,
    pub credits: i64,
    pub transaction_ref: String,
    pub status: PaymentStatus,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl TryFrom<payment_requests::Model> for PaymentRequest {
    type Error = anyhow::Error;

    fn try_from(model: payment_requests::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RequestId::new(model.id),
            user_id: AccountId::new(model.user_id),
            user_email: model.user_email,
            plan: model.plan,
            amount: model.amount,
            credits: model.credits,
            transaction_ref: model.transaction_ref,
            status: model.status.parse()?,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        })
    }
}

/// Input for a new payment request, resolved against the plan catalog.
#[derive(Debug, Clone)]
pub struct NewPaymentRequest {
    pub user_id: AccountId,
    pub user_email: String,
    pub plan: String,
    pub amount: i64,
    pub credits: i64,
    pub transaction_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Approved,
            PaymentStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn corrupt_status_column_is_an_error() {
        let model = payment_requests::Model {
            id: 1,
            user_id: 2,
            user_email: "a@b.c".to_string(),
            plan: "Starter Pack".to_string(),
            amount: 99,
            credits: 30,
            transaction_ref: "ABC123".to_string(),
            status: "lost".to_string(),
            created_at: String::new(),
            resolved_at: None,
        };
        assert!(PaymentRequest::try_from(model).is_err());
    }
}
