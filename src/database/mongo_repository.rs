use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson};
use mongodb::error::{ErrorKind, WriteFailure};

use super::{LoadRepository, MongoDB, ReceiptRepository, UserRepository, LOADS, RECEIPTS, USERS};
use crate::models::{Load, Receipt, UpdateProfileRequest, User, PHONE_TAKEN};
use crate::utils::AppError;

fn inserted_id(result: mongodb::results::InsertOneResult) -> Result<ObjectId, AppError> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| AppError::DatabaseError("Inserted id is not an ObjectId".to_string()))
}

/// E11000, raised by a unique index.
fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(failure)) if failure.code == 11000
    )
}

#[async_trait]
impl UserRepository for MongoDB {
    async fn insert_user(&self, user: User) -> Result<ObjectId, AppError> {
        match self.collection::<User>(USERS).insert_one(user).await {
            Ok(result) => inserted_id(result),
            // users(phone) is unique; a registration that raced past the
            // service pre-check lands here
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(PHONE_TAKEN.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "phone": phone })
            .await?)
    }

    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        Ok(self
            .collection::<User>(USERS)
            .find_one(doc! { "_id": *id })
            .await?)
    }

    async fn list_users(&self, pending_only: bool) -> Result<Vec<User>, AppError> {
        let filter = if pending_only {
            doc! { "is_approved": false }
        } else {
            doc! {}
        };

        let cursor = self
            .collection::<User>(USERS)
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .await?;

        Ok(cursor.try_collect().await?)
    }

    async fn set_approved(&self, id: &ObjectId, approved: bool) -> Result<bool, AppError> {
        let result = self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": *id }, doc! { "$set": { "is_approved": approved } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_password(&self, id: &ObjectId, password_hash: &str) -> Result<bool, AppError> {
        let result = self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": *id }, doc! { "$set": { "password": password_hash } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        profile: &UpdateProfileRequest,
    ) -> Result<bool, AppError> {
        let mut set = doc! {
            "name": profile.name.as_str(),
            "transport_name": profile.transport_name.as_str(),
            "address": profile.address.as_str(),
        };
        if let Some(url) = &profile.document_url {
            set.insert("document_url", url.as_str());
        }
        if let Some(storage_id) = &profile.document_storage_id {
            set.insert("document_storage_id", storage_id.as_str());
        }

        let result = self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": *id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_push_token(&self, id: &ObjectId, token: Option<&str>) -> Result<bool, AppError> {
        let update = match token {
            Some(token) => doc! { "$set": { "push_token": token } },
            None => doc! { "$unset": { "push_token": "" } },
        };

        let result = self
            .collection::<User>(USERS)
            .update_one(doc! { "_id": *id }, update)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn push_tokens(&self) -> Result<Vec<String>, AppError> {
        let cursor = self
            .collection::<User>(USERS)
            .find(doc! { "push_token": { "$exists": true, "$ne": "" } })
            .await?;

        let users: Vec<User> = cursor.try_collect().await?;
        Ok(users.into_iter().filter_map(|u| u.push_token).collect())
    }
}

#[async_trait]
impl LoadRepository for MongoDB {
    async fn insert_load(&self, load: Load) -> Result<ObjectId, AppError> {
        let result = self.collection::<Load>(LOADS).insert_one(load).await?;
        inserted_id(result)
    }

    async fn find_load(&self, id: &ObjectId) -> Result<Option<Load>, AppError> {
        Ok(self
            .collection::<Load>(LOADS)
            .find_one(doc! { "_id": *id })
            .await?)
    }

    async fn find_loads_by_date(&self, date: &str) -> Result<Vec<Load>, AppError> {
        let cursor = self
            .collection::<Load>(LOADS)
            .find(doc! { "created_date": date })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_loads_in_range(&self, from: &str, to: &str) -> Result<Vec<Load>, AppError> {
        let cursor = self
            .collection::<Load>(LOADS)
            .find(doc! { "created_date": { "$gte": from, "$lte": to } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_all_loads(&self) -> Result<Vec<Load>, AppError> {
        let cursor = self.collection::<Load>(LOADS).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_loads_with_receipt(&self) -> Result<Vec<Load>, AppError> {
        let cursor = self
            .collection::<Load>(LOADS)
            .find(doc! { "receipt_storage_id": { "$exists": true, "$ne": "" } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_load(&self, load: &Load) -> Result<bool, AppError> {
        let id = load
            .id
            .ok_or_else(|| AppError::InvalidRequest("Load has no id".to_string()))?;

        let result = self
            .collection::<Load>(LOADS)
            .replace_one(doc! { "_id": id }, load)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_load_receipt(
        &self,
        id: &ObjectId,
        storage_id: &str,
        url: &str,
    ) -> Result<bool, AppError> {
        let result = self
            .collection::<Load>(LOADS)
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "receipt_storage_id": storage_id, "receipt_url": url } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn clear_load_receipt(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self
            .collection::<Load>(LOADS)
            .update_one(
                doc! { "_id": *id },
                doc! { "$unset": { "receipt_storage_id": "", "receipt_url": "" } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn clear_receipt_references(&self, storage_ids: &[String]) -> Result<u64, AppError> {
        let ids: Vec<Bson> = storage_ids.iter().map(|s| Bson::String(s.clone())).collect();

        let result = self
            .collection::<Load>(LOADS)
            .update_many(
                doc! { "receipt_storage_id": { "$in": ids } },
                doc! { "$unset": { "receipt_storage_id": "", "receipt_url": "" } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_load(&self, id: &ObjectId) -> Result<bool, AppError> {
        let result = self
            .collection::<Load>(LOADS)
            .delete_one(doc! { "_id": *id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl ReceiptRepository for MongoDB {
    async fn insert_receipt(&self, receipt: Receipt) -> Result<ObjectId, AppError> {
        let result = self.collection::<Receipt>(RECEIPTS).insert_one(receipt).await?;
        inserted_id(result)
    }

    async fn list_receipts(&self) -> Result<Vec<Receipt>, AppError> {
        let cursor = self
            .collection::<Receipt>(RECEIPTS)
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_receipts_by_storage_ids(
        &self,
        storage_ids: &[String],
    ) -> Result<u64, AppError> {
        let ids: Vec<Bson> = storage_ids.iter().map(|s| Bson::String(s.clone())).collect();

        let result = self
            .collection::<Receipt>(RECEIPTS)
            .delete_many(doc! { "storage_id": { "$in": ids } })
            .await?;
        Ok(result.deleted_count)
    }
}
