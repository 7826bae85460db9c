use std::sync::Arc;

use log::{error, info, warn};
use mongodb::{Client, Database};
use rocket::fairing::AdHoc;

pub mod mongo;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use mongo::MongoStore;
pub use store::{Store, StoreError, StoreResult};

pub type SharedStore = Arc<dyn Store>;

pub fn init() -> AdHoc {
    AdHoc::on_ignite("MongoDB", |rocket| async {
        match connect().await {
            Ok(database) => {
                let store = MongoStore::new(database);
                if let Err(e) = store.ensure_indexes().await {
                    warn!("Failed to create MongoDB indexes: {}", e);
                }
                info!("MongoDB connected successfully");
                let store: SharedStore = Arc::new(store);
                rocket.manage(store)
            }
            Err(e) => {
                error!("Failed to connect to MongoDB: {}", e);
                rocket
            }
        }
    })
}

async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;

    Ok(client.database("ceylon-trails"))
}
