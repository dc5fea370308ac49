use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{LoadRepository, ReceiptRepository, StoreHealth, UserRepository};
use crate::models::{Load, Receipt, UpdateProfileRequest, User, PHONE_TAKEN};
use crate::utils::{in_date_range, AppError};

/// Process-local store with the same semantics as the MongoDB collections.
///
/// Rows keep insertion order, which stands in for natural scan order.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    loads: RwLock<Vec<Load>>,
    receipts: RwLock<Vec<Receipt>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, mut user: User) -> Result<ObjectId, AppError> {
        let id = user.id.unwrap_or_else(ObjectId::new);
        user.id = Some(id);

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.phone == user.phone) {
            return Err(AppError::Conflict(PHONE_TAKEN.to_string()));
        }
        users.push(user);
        Ok(id)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.phone == phone).cloned())
    }

    async fn find_user_by_id(&self, id: &ObjectId) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id.as_ref() == Some(id)).cloned())
    }

    async fn list_users(&self, pending_only: bool) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        let mut list: Vec<User> = users
            .iter()
            .filter(|u| !pending_only || !u.is_approved)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn set_approved(&self, id: &ObjectId, approved: bool) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id.as_ref() == Some(id)) {
            Some(user) => {
                user.is_approved = approved;
                true
            }
            None => false,
        })
    }

    async fn set_password(&self, id: &ObjectId, password_hash: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id.as_ref() == Some(id)) {
            Some(user) => {
                user.password = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn update_profile(
        &self,
        id: &ObjectId,
        profile: &UpdateProfileRequest,
    ) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id.as_ref() == Some(id)) else {
            return Ok(false);
        };

        user.name = profile.name.clone();
        user.transport_name = profile.transport_name.clone();
        user.address = profile.address.clone();
        if profile.document_url.is_some() {
            user.document_url = profile.document_url.clone();
        }
        if profile.document_storage_id.is_some() {
            user.document_storage_id = profile.document_storage_id.clone();
        }
        Ok(true)
    }

    async fn set_push_token(&self, id: &ObjectId, token: Option<&str>) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        Ok(match users.iter_mut().find(|u| u.id.as_ref() == Some(id)) {
            Some(user) => {
                user.push_token = token.map(str::to_string);
                true
            }
            None => false,
        })
    }

    async fn push_tokens(&self) -> Result<Vec<String>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter_map(|u| u.push_token.clone())
            .filter(|t| !t.is_empty())
            .collect())
    }
}

#[async_trait]
impl LoadRepository for MemoryStore {
    async fn insert_load(&self, mut load: Load) -> Result<ObjectId, AppError> {
        let id = load.id.unwrap_or_else(ObjectId::new);
        load.id = Some(id);
        self.loads.write().await.push(load);
        Ok(id)
    }

    async fn find_load(&self, id: &ObjectId) -> Result<Option<Load>, AppError> {
        let loads = self.loads.read().await;
        Ok(loads.iter().find(|l| l.id.as_ref() == Some(id)).cloned())
    }

    async fn find_loads_by_date(&self, date: &str) -> Result<Vec<Load>, AppError> {
        let loads = self.loads.read().await;
        Ok(loads
            .iter()
            .filter(|l| l.created_date == date)
            .cloned()
            .collect())
    }

    async fn find_loads_in_range(&self, from: &str, to: &str) -> Result<Vec<Load>, AppError> {
        let loads = self.loads.read().await;
        Ok(loads
            .iter()
            .filter(|l| in_date_range(&l.created_date, from, to))
            .cloned()
            .collect())
    }

    async fn find_all_loads(&self) -> Result<Vec<Load>, AppError> {
        Ok(self.loads.read().await.clone())
    }

    async fn find_loads_with_receipt(&self) -> Result<Vec<Load>, AppError> {
        let loads = self.loads.read().await;
        Ok(loads.iter().filter(|l| l.has_receipt()).cloned().collect())
    }

    async fn replace_load(&self, load: &Load) -> Result<bool, AppError> {
        let id = load
            .id
            .ok_or_else(|| AppError::InvalidRequest("Load has no id".to_string()))?;

        let mut loads = self.loads.write().await;
        Ok(match loads.iter_mut().find(|l| l.id == Some(id)) {
            Some(stored) => {
                *stored = load.clone();
                true
            }
            None => false,
        })
    }

    async fn set_load_receipt(
        &self,
        id: &ObjectId,
        storage_id: &str,
        url: &str,
    ) -> Result<bool, AppError> {
        let mut loads = self.loads.write().await;
        Ok(match loads.iter_mut().find(|l| l.id.as_ref() == Some(id)) {
            Some(load) => {
                load.receipt_storage_id = Some(storage_id.to_string());
                load.receipt_url = Some(url.to_string());
                true
            }
            None => false,
        })
    }

    async fn clear_load_receipt(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut loads = self.loads.write().await;
        Ok(match loads.iter_mut().find(|l| l.id.as_ref() == Some(id)) {
            Some(load) => {
                load.receipt_storage_id = None;
                load.receipt_url = None;
                true
            }
            None => false,
        })
    }

    async fn clear_receipt_references(&self, storage_ids: &[String]) -> Result<u64, AppError> {
        let mut loads = self.loads.write().await;
        let mut touched = 0;
        for load in loads.iter_mut() {
            let referenced = load
                .receipt_storage_id
                .as_ref()
                .map(|id| storage_ids.contains(id))
                .unwrap_or(false);
            if referenced {
                load.receipt_storage_id = None;
                load.receipt_url = None;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete_load(&self, id: &ObjectId) -> Result<bool, AppError> {
        let mut loads = self.loads.write().await;
        let before = loads.len();
        loads.retain(|l| l.id.as_ref() != Some(id));
        Ok(loads.len() < before)
    }
}

#[async_trait]
impl ReceiptRepository for MemoryStore {
    async fn insert_receipt(&self, mut receipt: Receipt) -> Result<ObjectId, AppError> {
        let id = receipt.id.unwrap_or_else(ObjectId::new);
        receipt.id = Some(id);
        self.receipts.write().await.push(receipt);
        Ok(id)
    }

    async fn list_receipts(&self) -> Result<Vec<Receipt>, AppError> {
        let mut list = self.receipts.read().await.clone();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn delete_receipts_by_storage_ids(
        &self,
        storage_ids: &[String],
    ) -> Result<u64, AppError> {
        let mut receipts = self.receipts.write().await;
        let before = receipts.len();
        receipts.retain(|r| !storage_ids.contains(&r.storage_id));
        Ok((before - receipts.len()) as u64)
    }
}
