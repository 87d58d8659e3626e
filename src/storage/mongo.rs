use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{options::ClientOptions, Client, Collection, Database};
use tracing::debug;

use crate::cli::config::StorageSettings;
use crate::error::{CrawlError, Result};
use crate::seo::ReportSummary;
use crate::storage::{PageRecord, PageStore};

/// MongoDB implementation of PageStore
pub struct MongoPageStore {
    /// MongoDB database
    database: Database,

    pages_collection: String,
    summary_collection: String,
}

impl MongoPageStore {
    /// Connect and verify the database is reachable
    pub async fn connect(settings: &StorageSettings) -> Result<Self> {
        let client_options = ClientOptions::parse(&settings.connection_string)
            .await
            .map_err(|e| CrawlError::Store(format!("Failed to parse MongoDB connection string {}: {}", settings.connection_string, e)))?;

        let client = Client::with_options(client_options)?;
        let database = client.database(&settings.database_name);

        // Test connection
        database.list_collection_names(None)
            .await
            .map_err(|e| CrawlError::Store(format!("Failed to connect to MongoDB: {}", e)))?;

        debug!("Connected to MongoDB database: {}", settings.database_name);

        Ok(Self {
            database,
            pages_collection: settings.pages_collection.clone(),
            summary_collection: settings.summary_collection.clone(),
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }
}

#[async_trait]
impl PageStore for MongoPageStore {
    async fn insert_page_record(&self, record: &PageRecord) -> Result<()> {
        let doc = mongodb::bson::to_document(record)
            .map_err(|e| CrawlError::Store(format!("Failed to convert page record to BSON: {}", e)))?;

        self.collection(&self.pages_collection)
            .insert_one(doc, None)
            .await?;

        debug!("Stored page record for URL: {}", record.url);
        Ok(())
    }

    async fn insert_report_summary(&self, summary: &ReportSummary) -> Result<()> {
        let doc = mongodb::bson::to_document(summary)
            .map_err(|e| CrawlError::Store(format!("Failed to convert report summary to BSON: {}", e)))?;

        self.collection(&self.summary_collection)
            .insert_one(doc, None)
            .await?;

        debug!("Stored report summary for run: {}", summary.run_id);
        Ok(())
    }

    async fn clear_collection(&self, name: &str) -> Result<()> {
        let result = self.collection(name)
            .delete_many(doc! {}, None)
            .await?;

        debug!("Cleared {} documents from {}", result.deleted_count, name);
        Ok(())
    }
}
