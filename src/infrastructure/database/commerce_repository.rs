use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mongo_repository::{
    date_filter, enum_value, from_bson_time, to_bson_time, MongoEntity, MongoRepository,
};
use crate::domain::entities::{
    BillingCycle, Order, OrderStatus, Subscription, SubscriptionStatus, Transaction,
    TransactionStatus, TransactionType,
};
use crate::domain::queries::DateRange;
use crate::domain::repositories::{OrderRepository, SubscriptionRepository, TransactionRepository};
use crate::shared::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: String,
    pub ordered_at: bson::DateTime,
    pub completed_at: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Order {
    type Document = OrderDocument;

    fn to_document(&self) -> OrderDocument {
        OrderDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            customer_id: self.customer_id.clone(),
            order_number: self.order_number.clone(),
            status: self.status,
            total_cents: self.total_cents,
            currency: self.currency.clone(),
            ordered_at: to_bson_time(self.ordered_at),
            completed_at: self.completed_at.map(to_bson_time),
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: OrderDocument) -> Result<Self> {
        Ok(Order {
            id: doc.id,
            organization_id: doc.organization_id,
            customer_id: doc.customer_id,
            order_number: doc.order_number,
            status: doc.status,
            total_cents: doc.total_cents,
            currency: doc.currency,
            ordered_at: from_bson_time(doc.ordered_at),
            completed_at: doc.completed_at.map(from_bson_time),
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub price_cents: i64,
    pub billing_cycle: BillingCycle,
    pub starts_at: bson::DateTime,
    pub ends_at: Option<bson::DateTime>,
    pub auto_renew: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Subscription {
    type Document = SubscriptionDocument;

    fn to_document(&self) -> SubscriptionDocument {
        SubscriptionDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            customer_id: self.customer_id.clone(),
            plan_name: self.plan_name.clone(),
            status: self.status,
            price_cents: self.price_cents,
            billing_cycle: self.billing_cycle,
            starts_at: to_bson_time(self.starts_at),
            ends_at: self.ends_at.map(to_bson_time),
            auto_renew: self.auto_renew,
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: SubscriptionDocument) -> Result<Self> {
        Ok(Subscription {
            id: doc.id,
            organization_id: doc.organization_id,
            customer_id: doc.customer_id,
            plan_name: doc.plan_name,
            status: doc.status,
            price_cents: doc.price_cents,
            billing_cycle: doc.billing_cycle,
            starts_at: from_bson_time(doc.starts_at),
            ends_at: doc.ends_at.map(from_bson_time),
            auto_renew: doc.auto_renew,
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDocument {
    #[serde(rename = "_id")]
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
    pub occurred_at: bson::DateTime,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Transaction {
    type Document = TransactionDocument;

    fn to_document(&self) -> TransactionDocument {
        TransactionDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            customer_id: self.customer_id.clone(),
            order_id: self.order_id.clone(),
            subscription_id: self.subscription_id.clone(),
            transaction_type: self.transaction_type,
            status: self.status,
            amount_cents: self.amount_cents,
            currency: self.currency.clone(),
            reference: self.reference.clone(),
            occurred_at: to_bson_time(self.occurred_at),
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: TransactionDocument) -> Result<Self> {
        Ok(Transaction {
            id: doc.id,
            organization_id: doc.organization_id,
            customer_id: doc.customer_id,
            order_id: doc.order_id,
            subscription_id: doc.subscription_id,
            transaction_type: doc.transaction_type,
            status: doc.status,
            amount_cents: doc.amount_cents,
            currency: doc.currency,
            reference: doc.reference,
            occurred_at: from_bson_time(doc.occurred_at),
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[async_trait]
impl OrderRepository for MongoRepository<Order> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Order>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Order>> {
        self.find_sorted_by_id(doc! { "customer_id": customer_id }).await
    }

    async fn get_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        self.find_sorted_by_id(doc! { "status": enum_value(&status)? })
            .await
    }

    async fn get_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Order>> {
        let range = DateRange::new(start, end)?;
        self.find_sorted_by_id(date_filter("ordered_at", &range)).await
    }

    async fn get_total_revenue(&self) -> Result<i64> {
        self.sum(doc! {}, "total_cents").await
    }
}

#[async_trait]
impl SubscriptionRepository for MongoRepository<Subscription> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Subscription>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Subscription>> {
        self.find_sorted_by_id(doc! { "customer_id": customer_id }).await
    }

    async fn get_by_status(&self, status: SubscriptionStatus) -> Result<Vec<Subscription>> {
        self.find_sorted_by_id(doc! { "status": enum_value(&status)? })
            .await
    }

    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>> {
        let range = DateRange::new(start, end)?;
        self.find_sorted_by_id(date_filter("starts_at", &range)).await
    }

    async fn get_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>> {
        let range = DateRange::new(start, end)?;
        self.find_sorted_by_id(date_filter("ends_at", &range)).await
    }
}

#[async_trait]
impl TransactionRepository for MongoRepository<Transaction> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Transaction>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_by_type(&self, transaction_type: TransactionType) -> Result<Vec<Transaction>> {
        self.find_sorted_by_id(doc! { "transaction_type": enum_value(&transaction_type)? })
            .await
    }

    async fn get_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        self.find_sorted_by_id(doc! { "status": enum_value(&status)? })
            .await
    }

    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        let range = DateRange::new(start, end)?;
        self.find_sorted_by_id(date_filter("occurred_at", &range)).await
    }

    async fn get_total_amount_by_type(&self, transaction_type: TransactionType) -> Result<i64> {
        self.sum(
            doc! { "transaction_type": enum_value(&transaction_type)? },
            "amount_cents",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_stored_as_integer_cents() {
        let order = Order::new("org".to_string(), "cust".to_string(), "A-7".to_string(), 1_999, "eur")
            .unwrap();
        let document = bson::to_document(&order.to_document()).unwrap();

        assert_eq!(document.get_i64("total_cents").unwrap(), 1_999);
        assert_eq!(document.get_str("_id").unwrap(), order.id);
        assert!(document.get_datetime("ordered_at").is_ok());
        assert_eq!(document.get_str("status").unwrap(), "Pending");
    }
}
