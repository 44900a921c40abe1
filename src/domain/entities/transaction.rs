use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Payment,
    Refund,
    Chargeback,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub order_id: Option<String>,
    pub subscription_id: Option<String>,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount_cents: i64,
    pub currency: String,
    pub reference: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Transaction, "transactions", scoped);

impl Transaction {
    pub fn new(
        organization_id: String,
        customer_id: String,
        transaction_type: TransactionType,
        amount_cents: i64,
        currency: &str,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            customer_id,
            order_id: None,
            subscription_id: None,
            transaction_type,
            status: TransactionStatus::Pending,
            amount_cents,
            currency: currency.to_uppercase(),
            reference: None,
            occurred_at,
            created_at: now,
            updated_at: now,
        }
    }
}
