use mongodb::{
    bson::{doc, Document},
    options::{ClientOptions, IndexOptions, ResolverConfig},
    Client, Collection, Database, IndexModel,
};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::domain::entities::*;
use crate::shared::{HelpdeskError, Result};

#[derive(Clone)]
pub struct MongoDatabase {
    client: Arc<Client>,
    database: Arc<Database>,
}

impl MongoDatabase {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let url = config.url.as_deref().ok_or_else(|| HelpdeskError::Configuration {
            message: "DATABASE_URL is required for the mongo backend".to_string(),
        })?;
        info!("Connecting to MongoDB database {}", config.name);

        let mut client_options =
            ClientOptions::parse_with_resolver_config(url, ResolverConfig::cloudflare())
                .await
                .map_err(|e| HelpdeskError::Database {
                    message: format!("Invalid MongoDB URL: {}", e),
                })?;

        // Configure connection pool
        client_options.max_pool_size = Some(config.max_connections);
        client_options.min_pool_size = Some(config.min_connections);
        client_options.connect_timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        client_options.server_selection_timeout = Some(Duration::from_secs(10));
        client_options.app_name = Some("helpdesk-backend".to_string());

        let client = Client::with_options(client_options).map_err(|e| HelpdeskError::Database {
            message: format!("Failed to create MongoDB client: {}", e),
        })?;

        let database = client.database(&config.name);
        database
            .run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| HelpdeskError::Database {
                message: format!("Failed to connect to MongoDB: {}", e),
            })?;

        info!("Successfully connected to MongoDB database: {}", config.name);

        Ok(Self {
            client: Arc::new(client),
            database: Arc::new(database),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn collection<T>(&self, collection_name: &str) -> Collection<T> {
        self.database.collection(collection_name)
    }

    pub async fn health_check(&self) -> Result<()> {
        self.database
            .run_command(doc! {"ping": 1}, None)
            .await
            .map_err(|e| HelpdeskError::Database {
                message: format!("Database health check failed: {}", e),
            })?;
        Ok(())
    }

    pub async fn create_indexes(&self) -> Result<()> {
        info!("Creating database indexes...");

        self.create_index(User::COLLECTION, doc! {"email": 1}, true).await?;
        self.create_index(User::COLLECTION, doc! {"organization_id": 1, "role": 1}, false)
            .await?;
        self.create_index(Organization::COLLECTION, doc! {"slug": 1}, true)
            .await?;

        self.create_index(Ticket::COLLECTION, doc! {"organization_id": 1}, false)
            .await?;
        self.create_index(Ticket::COLLECTION, doc! {"assignee_id": 1}, false)
            .await?;
        // Overdue scan
        self.create_index(Ticket::COLLECTION, doc! {"status": 1, "due_at": 1}, false)
            .await?;

        self.create_index(Article::COLLECTION, doc! {"organization_id": 1, "is_published": 1}, false)
            .await?;
        self.create_index(Article::COLLECTION, doc! {"tags": 1}, false).await?;
        self.create_index(Article::COLLECTION, doc! {"view_count": -1, "_id": 1}, false)
            .await?;
        self.create_index(CannedResponse::COLLECTION, doc! {"organization_id": 1}, false)
            .await?;
        self.create_index(CannedResponse::COLLECTION, doc! {"usage_count": -1, "_id": 1}, false)
            .await?;

        self.create_index(Order::COLLECTION, doc! {"organization_id": 1}, false)
            .await?;
        self.create_index(Order::COLLECTION, doc! {"customer_id": 1}, false)
            .await?;
        self.create_index(Order::COLLECTION, doc! {"ordered_at": 1}, false)
            .await?;
        self.create_index(Subscription::COLLECTION, doc! {"customer_id": 1}, false)
            .await?;
        self.create_index(Subscription::COLLECTION, doc! {"ends_at": 1}, false)
            .await?;
        self.create_index(Transaction::COLLECTION, doc! {"transaction_type": 1, "occurred_at": 1}, false)
            .await?;

        info!("Database indexes created successfully");
        Ok(())
    }

    async fn create_index(&self, collection: &str, keys: Document, unique: bool) -> Result<()> {
        let options = IndexOptions::builder().unique(unique).build();
        let model = IndexModel::builder().keys(keys.clone()).options(options).build();

        self.collection::<Document>(collection)
            .create_index(model, None)
            .await
            .map_err(|e| HelpdeskError::Database {
                message: format!("Failed to create {} index {}: {}", collection, keys, e),
            })?;
        Ok(())
    }
}
