//! Collection-level access used by the services.
//!
//! Every method is a single round trip against one collection. Nothing here
//! spans collections; the services sequence calls and own the consequences.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::{Load, Receipt, UpdateProfileRequest, User};
use crate::utils::AppError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<ObjectId, AppError>;

    /// First user holding `phone`, in storage order.
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError>;

    /// Newest first. `pending_only` keeps unapproved accounts.
    async fn list_users(&self, pending_only: bool) -> Result<Vec<User>, AppError>;

    /// Returns `false` when no user matched.
    async fn set_approved(&self, id: &ObjectId, approved: bool) -> Result<bool, AppError>;

    async fn set_password(&self, id: &ObjectId, password_hash: &str) -> Result<bool, AppError>;

    async fn update_profile(
        &self,
        id: &ObjectId,
        profile: &UpdateProfileRequest,
    ) -> Result<bool, AppError>;

    /// `None` removes the token.
    async fn set_push_token(&self, id: &ObjectId, token: Option<&str>) -> Result<bool, AppError>;

    /// Every non-empty push token on file.
    async fn push_tokens(&self) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait LoadRepository: Send + Sync {
    async fn insert_load(&self, load: Load) -> Result<ObjectId, AppError>;

    async fn find_load(&self, id: &ObjectId) -> Result<Option<Load>, AppError>;

    async fn find_loads_by_date(&self, date: &str) -> Result<Vec<Load>, AppError>;

    /// Inclusive string comparison on `created_date`.
    async fn find_loads_in_range(&self, from: &str, to: &str) -> Result<Vec<Load>, AppError>;

    async fn find_all_loads(&self) -> Result<Vec<Load>, AppError>;

    async fn find_loads_with_receipt(&self) -> Result<Vec<Load>, AppError>;

    /// Replaces the stored row with `load` (matched by `load.id`).
    async fn replace_load(&self, load: &Load) -> Result<bool, AppError>;

    async fn set_load_receipt(
        &self,
        id: &ObjectId,
        storage_id: &str,
        url: &str,
    ) -> Result<bool, AppError>;

    async fn clear_load_receipt(&self, id: &ObjectId) -> Result<bool, AppError>;

    /// Clears the receipt fields of every load whose `receipt_storage_id`
    /// equals one of `storage_ids`. Returns the number of loads touched.
    async fn clear_receipt_references(&self, storage_ids: &[String]) -> Result<u64, AppError>;

    async fn delete_load(&self, id: &ObjectId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ReceiptRepository: Send + Sync {
    async fn insert_receipt(&self, receipt: Receipt) -> Result<ObjectId, AppError>;

    async fn list_receipts(&self) -> Result<Vec<Receipt>, AppError>;

    /// Returns the number of rows removed.
    async fn delete_receipts_by_storage_ids(&self, storage_ids: &[String])
        -> Result<u64, AppError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// `true` when the backing store answers a round trip.
    async fn ping(&self) -> bool;
}
