use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;
use crate::shared::{HelpdeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Cancelled,
    Refunded,
}

/// Amounts are integer minor units (cents).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: String,
    pub ordered_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Order, "orders", scoped);

impl Order {
    pub fn new(
        organization_id: String,
        customer_id: String,
        order_number: String,
        total_cents: i64,
        currency: &str,
    ) -> Result<Self> {
        if total_cents < 0 {
            return Err(HelpdeskError::validation("total", "Order total cannot be negative"));
        }

        let now = crate::shared::utils::now();
        Ok(Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            customer_id,
            order_number,
            status: OrderStatus::Pending,
            total_cents,
            currency: currency.to_uppercase(),
            ordered_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn complete(&mut self) -> Result<()> {
        if matches!(self.status, OrderStatus::Cancelled | OrderStatus::Refunded) {
            return Err(HelpdeskError::business_rule(format!(
                "A {:?} order cannot be completed",
                self.status
            )));
        }
        let now = crate::shared::utils::now();
        self.status = OrderStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if matches!(self.status, OrderStatus::Completed | OrderStatus::Refunded) {
            return Err(HelpdeskError::business_rule(format!(
                "A {:?} order cannot be cancelled",
                self.status
            )));
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = crate::shared::utils::now();
        Ok(())
    }
}
