use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryRepository;
use crate::domain::entities::{
    Order, OrderStatus, Subscription, SubscriptionStatus, Transaction, TransactionStatus,
    TransactionType,
};
use crate::domain::queries::DateRange;
use crate::domain::repositories::{OrderRepository, SubscriptionRepository, TransactionRepository};
use crate::shared::{HelpdeskError, Result};

fn checked_total(total: Option<i64>, what: &str) -> Result<i64> {
    total.ok_or_else(|| HelpdeskError::Internal {
        message: format!("{} overflowed i64 cents", what),
    })
}

#[async_trait]
impl OrderRepository for InMemoryRepository<Order> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Order>> {
        Ok(self.select(|o| o.organization_id == organization_id).await)
    }

    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Order>> {
        Ok(self.select(|o| o.customer_id == customer_id).await)
    }

    async fn get_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        Ok(self.select(|o| o.status == status).await)
    }

    async fn get_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Order>> {
        let range = DateRange::new(start, end)?;
        Ok(self.select(|o| range.contains(o.ordered_at)).await)
    }

    async fn get_total_revenue(&self) -> Result<i64> {
        let total = self
            .fold(Some(0i64), |total, o| total?.checked_add(o.total_cents))
            .await;
        checked_total(total, "order revenue")
    }
}

#[async_trait]
impl SubscriptionRepository for InMemoryRepository<Subscription> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Subscription>> {
        Ok(self.select(|s| s.organization_id == organization_id).await)
    }

    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Subscription>> {
        Ok(self.select(|s| s.customer_id == customer_id).await)
    }

    async fn get_by_status(&self, status: SubscriptionStatus) -> Result<Vec<Subscription>> {
        Ok(self.select(|s| s.status == status).await)
    }

    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>> {
        let range = DateRange::new(start, end)?;
        Ok(self.select(|s| range.contains(s.starts_at)).await)
    }

    async fn get_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>> {
        let range = DateRange::new(start, end)?;
        Ok(self
            .select(|s| s.ends_at.map(|ends| range.contains(ends)).unwrap_or(false))
            .await)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryRepository<Transaction> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Transaction>> {
        Ok(self.select(|t| t.organization_id == organization_id).await)
    }

    async fn get_by_type(&self, transaction_type: TransactionType) -> Result<Vec<Transaction>> {
        Ok(self.select(|t| t.transaction_type == transaction_type).await)
    }

    async fn get_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        Ok(self.select(|t| t.status == status).await)
    }

    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let range = DateRange::new(start, end)?;
        Ok(self.select(|t| range.contains(t.occurred_at)).await)
    }

    async fn get_total_amount_by_type(&self, transaction_type: TransactionType) -> Result<i64> {
        let total = self
            .fold(Some(0i64), |total, t| {
                if t.transaction_type == transaction_type {
                    total?.checked_add(t.amount_cents)
                } else {
                    total
                }
            })
            .await;
        checked_total(total, "transaction total")
    }
}
