mod memory;
mod mongo_repository;
mod repository;

pub use memory::MemoryStore;
pub use repository::*;

use mongodb::{Client, Collection, Database};
use std::error::Error;

pub const USERS: &str = "users";
pub const LOADS: &str = "loads";
pub const RECEIPTS: &str = "receipts";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("LoadBoard");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };

        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes the handlers rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        use mongodb::bson::doc;
        use mongodb::options::IndexOptions;
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        // users(phone) unique: phone is the login key
        let users = self.collection::<mongodb::bson::Document>(USERS);
        let phone_index = IndexModel::builder()
            .keys(doc! { "phone": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(phone_index).await {
            Ok(_) => log::info!("   ✅ Index created: users(phone) unique"),
            Err(e) => log::warn!("   ⚠️  Could not create users(phone) index: {}", e),
        }

        // loads(created_date) - today / range listings
        let loads = self.collection::<mongodb::bson::Document>(LOADS);
        let date_index = IndexModel::builder()
            .keys(doc! { "created_date": 1 })
            .build();

        match loads.create_index(date_index).await {
            Ok(_) => log::info!("   ✅ Index created: loads(created_date)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // loads(receipt_storage_id) - receipt cleanup
        let receipt_ref_index = IndexModel::builder()
            .keys(doc! { "receipt_storage_id": 1 })
            .options(IndexOptions::builder().sparse(true).build())
            .build();

        match loads.create_index(receipt_ref_index).await {
            Ok(_) => log::info!("   ✅ Index created: loads(receipt_storage_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // receipts(storage_id)
        let receipts = self.collection::<mongodb::bson::Document>(RECEIPTS);
        let storage_index = IndexModel::builder()
            .keys(doc! { "storage_id": 1 })
            .build();

        match receipts.create_index(storage_index).await {
            Ok(_) => log::info!("   ✅ Index created: receipts(storage_id)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

}

#[async_trait::async_trait]
impl StoreHealth for MongoDB {
    async fn ping(&self) -> bool {
        self.db.list_collection_names().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/LoadBoardTest".to_string());

        let db = MongoDB::new(&uri).await;
        assert!(db.is_ok());
        assert!(db.unwrap().ping().await);
    }
}
