use anyhow::anyhow;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::domain::AccountId;
use crate::entities::credit_transactions;

/// Why a balance changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    SignupBonus,
    Usage,
    Refund,
    Purchase,
    AdminGrant,
    AdminSet,
}

impl TransactionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SignupBonus => "signup_bonus",
            Self::Usage => "usage",
            Self::Refund => "refund",
            Self::Purchase => "purchase",
            Self::AdminGrant => "admin_grant",
            Self::AdminSet => "admin_set",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup_bonus" => Ok(Self::SignupBonus),
            "usage" => Ok(Self::Usage),
            "refund" => Ok(Self::Refund),
            "purchase" => Ok(Self::Purchase),
            "admin_grant" => Ok(Self::AdminGrant),
            "admin_set" => Ok(Self::AdminSet),
            other => Err(anyhow!("Unknown transaction kind: {other}")),
        }
    }
}

/// One journal entry. `amount` is signed: negative for spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditTransaction {
    pub id: i32,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount: i64,
    pub balance_after: i64,
    pub description: Option<String>,
    pub created_at: String,
}

impl TryFrom<credit_transactions::Model> for CreditTransaction {
    type Error = anyhow::Error;

    fn try_from(model: credit_transactions::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: AccountId::new(model.account_id),
            kind: model.kind.parse()?,
            amount: model.amount,
            balance_after: model.balance_after,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
