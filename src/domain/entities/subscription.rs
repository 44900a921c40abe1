use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;
use crate::shared::{HelpdeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Trial,
    Active,
    PastDue,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn period(&self) -> Duration {
        match self {
            BillingCycle::Monthly => Duration::days(30),
            BillingCycle::Yearly => Duration::days(365),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub price_cents: i64,
    pub billing_cycle: BillingCycle,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Subscription, "subscriptions", scoped);

impl Subscription {
    pub fn new(
        organization_id: String,
        customer_id: String,
        plan_name: String,
        price_cents: i64,
        billing_cycle: BillingCycle,
        starts_at: DateTime<Utc>,
    ) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            customer_id,
            plan_name,
            status: SubscriptionStatus::Active,
            price_cents,
            billing_cycle,
            starts_at,
            ends_at: Some(starts_at + billing_cycle.period()),
            auto_renew: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn cancel(&mut self) -> Result<()> {
        if matches!(self.status, SubscriptionStatus::Cancelled | SubscriptionStatus::Expired) {
            return Err(HelpdeskError::business_rule("Subscription is no longer active"));
        }
        self.status = SubscriptionStatus::Cancelled;
        self.auto_renew = false;
        self.updated_at = crate::shared::utils::now();
        Ok(())
    }
}
