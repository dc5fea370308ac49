use std::sync::Arc;

use crate::config::AuthSettings;
use crate::database::{LoadRepository, ReceiptRepository, StoreHealth, UserRepository};
use crate::services::notification_service::PushTransport;
use crate::services::storage_service::FileStorage;

/// Everything a handler needs, shared through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub loads: Arc<dyn LoadRepository>,
    pub receipts: Arc<dyn ReceiptRepository>,
    pub store_health: Arc<dyn StoreHealth>,
    pub storage: Arc<dyn FileStorage>,
    pub push: Arc<dyn PushTransport>,
    pub auth: AuthSettings,
}

impl AppState {
    /// Wires one backing store into every repository and the health check.
    pub fn new<S>(
        store: Arc<S>,
        storage: Arc<dyn FileStorage>,
        push: Arc<dyn PushTransport>,
        auth: AuthSettings,
    ) -> Self
    where
        S: UserRepository + LoadRepository + ReceiptRepository + StoreHealth + 'static,
    {
        Self {
            users: store.clone(),
            loads: store.clone(),
            receipts: store.clone(),
            store_health: store,
            storage,
            push,
            auth,
        }
    }
}
