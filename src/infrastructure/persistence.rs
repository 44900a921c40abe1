use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::domain::repositories::Repositories;
use crate::infrastructure::database::{mongo_repositories, MongoDatabase};
use crate::infrastructure::memory::MemoryStore;
use crate::shared::Result;

/// Backing store selected at start-up.
#[derive(Clone)]
pub enum Persistence {
    Mongo {
        database: MongoDatabase,
        repositories: Repositories,
    },
    Memory(MemoryStore),
}

impl Persistence {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Mongo => {
                let database = MongoDatabase::new(config).await?;
                database.create_indexes().await?;
                let repositories = mongo_repositories(&database, config.operation_timeout());
                Ok(Persistence::Mongo {
                    database,
                    repositories,
                })
            }
            StorageBackend::Memory => {
                info!("Using in-memory persistence; data is lost on restart");
                Ok(Persistence::Memory(MemoryStore::new()))
            }
        }
    }

    pub fn memory() -> Self {
        Persistence::Memory(MemoryStore::new())
    }

    pub fn repositories(&self) -> Repositories {
        match self {
            Persistence::Mongo { repositories, .. } => repositories.clone(),
            Persistence::Memory(store) => store.repositories(),
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        match self {
            Persistence::Mongo { database, .. } => database.health_check().await,
            Persistence::Memory(_) => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Persistence::Mongo { .. } => "mongo",
            Persistence::Memory(_) => "memory",
        }
    }
}
