use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use super::MongoDatabase;
use crate::domain::entities::Entity;
use crate::domain::queries::{DateRange, TagQuery};
use crate::domain::repositories::Repository;
use crate::shared::utils::with_timeout;
use crate::shared::{HelpdeskError, Result};

const DUPLICATE_KEY: i32 = 11000;

/// Maps an entity onto the BSON document stored in its collection.
pub trait MongoEntity: Entity {
    type Document: Serialize + DeserializeOwned + Send + Sync + Unpin;

    fn to_document(&self) -> Self::Document;
    fn from_document(document: Self::Document) -> Result<Self>;
}

/// Collection-backed store for one entity type.
///
/// Documents are keyed by `_id` (the entity id), so default listings sort on
/// it to match the ordering of the in-memory backend.
pub struct MongoRepository<E: MongoEntity> {
    collection: Collection<E::Document>,
    timeout: Duration,
    _entity: PhantomData<fn() -> E>,
}

impl<E: MongoEntity> MongoRepository<E> {
    pub fn new(database: &MongoDatabase, timeout: Duration) -> Self {
        Self {
            collection: database.collection(E::COLLECTION),
            timeout,
            _entity: PhantomData,
        }
    }

    fn operation(&self, name: &str) -> String {
        format!("{}.{}", E::COLLECTION, name)
    }

    pub async fn find_many(
        &self,
        filter: Document,
        sort: Document,
        limit: Option<i64>,
    ) -> Result<Vec<E>> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();
        with_timeout(self.timeout, &self.operation("find"), async {
            let cursor = self.collection.find(filter, options).await?;
            let documents: Vec<E::Document> = cursor.try_collect().await?;
            documents.into_iter().map(E::from_document).collect()
        })
        .await
    }

    pub async fn find_sorted_by_id(&self, filter: Document) -> Result<Vec<E>> {
        self.find_many(filter, doc! { "_id": 1 }, None).await
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<E>> {
        with_timeout(self.timeout, &self.operation("find_one"), async {
            match self.collection.find_one(filter, None).await? {
                Some(document) => Ok(Some(E::from_document(document)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// Server-side `field += 1`, returning the document after the update.
    pub async fn increment(&self, id: &str, field: &str) -> Result<Option<E>> {
        let update = increment_update(field, crate::shared::utils::now());
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        with_timeout(self.timeout, &self.operation("increment"), async {
            match self
                .collection
                .find_one_and_update(doc! { "_id": id }, update, options)
                .await?
            {
                Some(document) => Ok(Some(E::from_document(document)?)),
                None => Ok(None),
            }
        })
        .await
    }

    /// `$set` of the given fields only. `false` when no document has this id.
    pub async fn set_fields(&self, id: &str, fields: Document) -> Result<bool> {
        let update = set_update(fields, crate::shared::utils::now());

        with_timeout(self.timeout, &self.operation("set"), async {
            let result = self
                .collection
                .update_one(doc! { "_id": id }, update, None)
                .await?;
            Ok(result.matched_count > 0)
        })
        .await
    }

    /// `$sum` of an integer field over the matching documents.
    pub async fn sum(&self, filter: Document, field: &str) -> Result<i64> {
        let pipeline = vec![
            doc! { "$match": filter },
            doc! { "$group": { "_id": Bson::Null, "total": { "$sum": format!("${}", field) } } },
        ];

        with_timeout(self.timeout, &self.operation("sum"), async {
            let mut cursor = self.collection.aggregate(pipeline, None).await?;
            let row = cursor.try_next().await?;
            total_from(row.as_ref())
        })
        .await
    }
}

#[async_trait]
impl<E: MongoEntity> Repository<E> for MongoRepository<E> {
    async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        self.find_sorted_by_id(Document::new()).await
    }

    async fn add(&self, entity: &E) -> Result<()> {
        entity.check_invariants()?;
        let document = entity.to_document();

        with_timeout(self.timeout, &self.operation("insert"), async {
            match self.collection.insert_one(document, None).await {
                Ok(_) => {
                    info!("Added {} record {}", E::COLLECTION, entity.id());
                    Ok(())
                }
                Err(e) if is_duplicate_key(&e) => Err(duplicate_error(entity)),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn update(&self, entity: &E) -> Result<()> {
        entity.check_invariants()?;
        let document = entity.to_document();

        with_timeout(self.timeout, &self.operation("replace"), async {
            let result = match self
                .collection
                .replace_one(doc! { "_id": entity.id() }, document, None)
                .await
            {
                Ok(result) => result,
                Err(e) if is_duplicate_key(&e) => return Err(duplicate_error(entity)),
                Err(e) => return Err(e.into()),
            };

            if result.matched_count == 0 {
                return Err(HelpdeskError::business_rule(format!(
                    "Cannot update missing {} record {}",
                    E::COLLECTION,
                    entity.id()
                )));
            }
            debug!("Updated {} record {}", E::COLLECTION, entity.id());
            Ok(())
        })
        .await
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        with_timeout(self.timeout, &self.operation("delete"), async {
            let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
            if result.deleted_count > 0 {
                info!("Removed {} record {}", E::COLLECTION, id);
            }
            Ok(result.deleted_count > 0)
        })
        .await
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

fn duplicate_error<E: Entity>(entity: &E) -> HelpdeskError {
    match entity.unique_key() {
        Some((field, value)) => HelpdeskError::business_rule(format!(
            "{} with {} '{}' already exists",
            E::COLLECTION,
            field,
            value
        )),
        None => HelpdeskError::business_rule(format!(
            "{} record {} already exists",
            E::COLLECTION,
            entity.id()
        )),
    }
}

pub(crate) fn increment_update(field: &str, now: DateTime<Utc>) -> Document {
    let mut increment = Document::new();
    increment.insert(field, 1_i64);
    doc! {
        "$inc": increment,
        "$set": { "updated_at": to_bson_time(now) },
    }
}

pub(crate) fn set_update(mut fields: Document, now: DateTime<Utc>) -> Document {
    fields.insert("updated_at", to_bson_time(now));
    doc! { "$set": fields }
}

/// Highest counter first, ties by id ascending.
pub(crate) fn counter_sort(field: &str) -> Document {
    let mut sort = Document::new();
    sort.insert(field, -1);
    sort.insert("_id", 1);
    sort
}

/// `$sum` answers Int32, Int64 or Double depending on the stored values.
/// The server falls back to Double when an Int64 sum overflows.
pub(crate) fn total_from(row: Option<&Document>) -> Result<i64> {
    match row.and_then(|row| row.get("total")) {
        Some(Bson::Int32(value)) => Ok(i64::from(*value)),
        Some(Bson::Int64(value)) => Ok(*value),
        Some(Bson::Double(value)) if value.abs() < i64::MAX as f64 => Ok(value.round() as i64),
        Some(Bson::Double(_)) => Err(HelpdeskError::Internal {
            message: "sum overflowed i64 cents".to_string(),
        }),
        _ => Ok(0),
    }
}

/// Case-insensitive substring match of any term against any element of `field`.
pub(crate) fn tag_filter(field: &str, query: &TagQuery) -> Document {
    let clauses: Vec<Document> = query
        .terms()
        .iter()
        .map(|term| {
            let mut clause = Document::new();
            clause.insert(
                field,
                doc! { "$regex": regex::escape(term), "$options": "i" },
            );
            clause
        })
        .collect();
    doc! { "$or": clauses }
}

pub(crate) fn date_filter(field: &str, range: &DateRange) -> Document {
    let mut filter = Document::new();
    filter.insert(
        field,
        doc! {
            "$gte": bson::DateTime::from_chrono(range.start()),
            "$lte": bson::DateTime::from_chrono(range.end()),
        },
    );
    filter
}

pub(crate) fn enum_value<T: Serialize>(value: &T) -> Result<Bson> {
    Ok(bson::to_bson(value)?)
}

pub(crate) fn to_bson_time(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(value)
}

pub(crate) fn from_bson_time(value: bson::DateTime) -> DateTime<Utc> {
    value.to_chrono()
}
