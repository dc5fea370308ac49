use serde::Serialize;

use crate::database::{LoadRepository, ReceiptRepository};
use crate::models::{
    AttachReceiptRequest, Load, Receipt, ReceiptDescriptor, ReceiptKind, SaveReceiptRequest,
    STANDALONE_RECEIPT_TYPE,
};
use crate::services::load_service::{get_load, parse_load_id};
use crate::services::storage_service::{clean_storage_id, FileStorage};
use crate::utils::{now_secs, AppError, CleanupStatus, Outcome};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReceiptDeletion {
    pub storage_id: String,
    pub loads_cleared: u64,
    pub receipts_deleted: u64,
}

/// Attaches an already-uploaded file to a load.
pub async fn upload_receipt(
    loads: &dyn LoadRepository,
    load_id: &str,
    request: &AttachReceiptRequest,
) -> Result<Load, AppError> {
    let id = parse_load_id(load_id)?;

    if !loads
        .set_load_receipt(&id, &request.public_id, &request.url)
        .await?
    {
        return Err(AppError::NotFound("Load".to_string()));
    }

    get_load(loads, load_id).await
}

/// Deletes the file behind a load's receipt, then clears the reference.
/// The two steps are not atomic.
pub async fn remove_load_receipt(
    loads: &dyn LoadRepository,
    storage: &dyn FileStorage,
    load_id: &str,
) -> Result<Outcome<Load>, AppError> {
    let load = get_load(loads, load_id).await?;

    let cleanup = match load.receipt_storage_id.as_deref().filter(|s| !s.is_empty()) {
        Some(storage_id) => {
            let status = CleanupStatus::from_result(storage.delete_file(storage_id).await);
            if let CleanupStatus::Failed(e) = &status {
                log::warn!("⚠️  Receipt file {} could not be deleted: {}", storage_id, e);
            }
            status
        }
        None => CleanupStatus::NotNeeded,
    };

    let id = parse_load_id(load_id)?;
    if !loads.clear_load_receipt(&id).await? {
        return Err(AppError::NotFound("Load".to_string()));
    }

    let load = get_load(loads, load_id).await?;
    Ok(Outcome::new(load, cleanup))
}

pub async fn save_standalone_receipt(
    receipts: &dyn ReceiptRepository,
    request: &SaveReceiptRequest,
) -> Result<Receipt, AppError> {
    if request.public_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("public_id is required".to_string()));
    }

    let mut receipt = Receipt {
        id: None,
        storage_id: request.public_id.trim().to_string(),
        url: request.url.clone(),
        created_at: now_secs(),
        receipt_type: STANDALONE_RECEIPT_TYPE.to_string(),
    };

    let id = receipts.insert_receipt(receipt.clone()).await?;
    receipt.id = Some(id);
    Ok(receipt)
}

/// Removes a receipt everywhere it is known.
///
/// The remote file is deleted by normalized id. Load references and
/// standalone rows are matched against both the raw input and the
/// normalized id, so rows stored either way are cleaned up.
pub async fn delete_standalone_receipt(
    loads: &dyn LoadRepository,
    receipts: &dyn ReceiptRepository,
    storage: &dyn FileStorage,
    raw_storage_id: &str,
) -> Result<Outcome<ReceiptDeletion>, AppError> {
    if raw_storage_id.trim().is_empty() {
        return Err(AppError::InvalidRequest("storage_id is required".to_string()));
    }

    let normalized = clean_storage_id(raw_storage_id);

    let cleanup = match normalized.as_deref() {
        Some(storage_id) => {
            let status = CleanupStatus::from_result(storage.delete_file(storage_id).await);
            if let CleanupStatus::Failed(e) = &status {
                log::warn!("⚠️  Stored file {} could not be deleted: {}", storage_id, e);
            }
            status
        }
        None => {
            log::warn!(
                "⚠️  No file id in receipt reference {:?}, skipping remote delete",
                raw_storage_id
            );
            CleanupStatus::NotNeeded
        }
    };

    let mut candidates = vec![raw_storage_id.to_string()];
    if let Some(storage_id) = normalized.as_deref().filter(|id| *id != raw_storage_id) {
        candidates.push(storage_id.to_string());
    }

    let loads_cleared = loads.clear_receipt_references(&candidates).await?;
    let receipts_deleted = receipts.delete_receipts_by_storage_ids(&candidates).await?;

    let storage_id = normalized.unwrap_or_else(|| raw_storage_id.trim().to_string());
    log::info!(
        "🧾 Receipt {} removed: {} load reference(s), {} standalone row(s)",
        storage_id,
        loads_cleared,
        receipts_deleted
    );

    Ok(Outcome::new(
        ReceiptDeletion {
            storage_id,
            loads_cleared,
            receipts_deleted,
        },
        cleanup,
    ))
}

/// Load-attached receipts followed by standalone ones. Empty ids are skipped.
pub async fn get_receipt_storage_ids(
    loads: &dyn LoadRepository,
    receipts: &dyn ReceiptRepository,
) -> Result<Vec<ReceiptDescriptor>, AppError> {
    let mut descriptors: Vec<ReceiptDescriptor> = loads
        .find_loads_with_receipt()
        .await?
        .into_iter()
        .filter_map(|load| {
            let storage_id = load.receipt_storage_id.filter(|s| !s.is_empty())?;
            Some(ReceiptDescriptor {
                storage_id,
                url: load.receipt_url,
                kind: ReceiptKind::Load,
                load_id: load.id.map(|id| id.to_hex()),
                created_date: Some(load.created_date),
                created_at: None,
            })
        })
        .collect();

    descriptors.extend(
        receipts
            .list_receipts()
            .await?
            .into_iter()
            .filter(|r| !r.storage_id.is_empty())
            .map(|r| ReceiptDescriptor {
                storage_id: r.storage_id,
                url: Some(r.url),
                kind: ReceiptKind::Standalone,
                load_id: None,
                created_date: None,
                created_at: Some(r.created_at),
            }),
    );

    Ok(descriptors)
}

pub async fn generate_upload_url(storage: &dyn FileStorage) -> Result<String, AppError> {
    storage.generate_upload_url().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::load::tests::sample_input;
    use crate::services::storage_service::tests::RecordingStorage;

    async fn load_with_receipt(store: &MemoryStore, storage_id: &str) -> String {
        let id = store
            .insert_load(sample_input().into_load("2024-01-10".into()))
            .await
            .unwrap();
        store
            .set_load_receipt(&id, storage_id, &format!("https://files.test/{}", storage_id))
            .await
            .unwrap();
        id.to_hex()
    }

    fn save_request(public_id: &str) -> SaveReceiptRequest {
        SaveReceiptRequest {
            url: format!("https://files.test/{}", public_id),
            public_id: public_id.into(),
        }
    }

    #[tokio::test]
    async fn upload_attaches_to_existing_load_only() {
        let store = MemoryStore::new();
        let id = store
            .insert_load(sample_input().into_load("2024-01-10".into()))
            .await
            .unwrap();

        let req = AttachReceiptRequest {
            url: "https://files.test/r1".into(),
            public_id: "r1".into(),
        };
        let load = upload_receipt(&store, &id.to_hex(), &req).await.unwrap();
        assert_eq!(load.receipt_storage_id.as_deref(), Some("r1"));

        let missing = mongodb::bson::oid::ObjectId::new().to_hex();
        assert_eq!(
            upload_receipt(&store, &missing, &req).await.unwrap_err(),
            AppError::NotFound("Load".into())
        );
    }

    #[tokio::test]
    async fn standalone_receipt_is_tagged() {
        let store = MemoryStore::new();
        let receipt = save_standalone_receipt(&store, &save_request("s1")).await.unwrap();
        assert_eq!(receipt.receipt_type, "standalone");
        assert!(receipt.created_at > 0);
    }

    #[tokio::test]
    async fn delete_clears_every_exact_match_and_deletes_normalized_remotely() {
        let store = MemoryStore::new();
        let raw = "https://files.test/api/storage/abc123?token=t0k";

        let first = load_with_receipt(&store, raw).await;
        let second = load_with_receipt(&store, raw).await;
        let unrelated = load_with_receipt(&store, "zzz999").await;
        save_standalone_receipt(&store, &save_request(raw)).await.unwrap();
        save_standalone_receipt(&store, &save_request("zzz999")).await.unwrap();

        let storage = RecordingStorage::default();
        let outcome = delete_standalone_receipt(&store, &store, &storage, raw)
            .await
            .unwrap();

        assert_eq!(storage.deleted(), vec!["abc123"]);
        assert_eq!(outcome.cleanup, CleanupStatus::Done);
        assert_eq!(outcome.value.loads_cleared, 2);
        assert_eq!(outcome.value.receipts_deleted, 1);

        for id in [&first, &second] {
            assert!(get_load(&store, id).await.unwrap().receipt_storage_id.is_none());
        }
        assert!(get_load(&store, &unrelated).await.unwrap().has_receipt());

        let remaining = store.list_receipts().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].storage_id, "zzz999");
    }

    #[tokio::test]
    async fn delete_by_url_also_matches_rows_stored_by_bare_id() {
        let store = MemoryStore::new();
        let load_id = load_with_receipt(&store, "abc123").await;
        save_standalone_receipt(&store, &save_request("abc123")).await.unwrap();

        let storage = RecordingStorage::default();
        let outcome = delete_standalone_receipt(
            &store,
            &store,
            &storage,
            "https://files.test/api/storage/abc123?token=t0k",
        )
        .await
        .unwrap();

        assert_eq!(outcome.value.loads_cleared, 1);
        assert_eq!(outcome.value.receipts_deleted, 1);
        assert!(!get_load(&store, &load_id).await.unwrap().has_receipt());
    }

    #[tokio::test]
    async fn rows_are_cleaned_even_when_remote_delete_fails() {
        let store = MemoryStore::new();
        save_standalone_receipt(&store, &save_request("abc123")).await.unwrap();

        let storage = RecordingStorage::failing();
        let outcome = delete_standalone_receipt(&store, &store, &storage, "abc123")
            .await
            .unwrap();

        assert!(outcome.cleanup.is_failed());
        assert_eq!(outcome.value.receipts_deleted, 1);
    }

    #[tokio::test]
    async fn reference_without_file_id_never_reaches_storage() {
        let store = MemoryStore::new();
        save_standalone_receipt(&store, &save_request("?token=abc")).await.unwrap();

        for raw in ["?token=abc", "https://files.test/?token=abc"] {
            let storage = RecordingStorage::default();
            let outcome = delete_standalone_receipt(&store, &store, &storage, raw)
                .await
                .unwrap();

            assert!(storage.deleted().is_empty());
            assert_eq!(outcome.cleanup, CleanupStatus::NotNeeded);
        }

        // rows stored under the raw reference are still removed
        assert!(store.list_receipts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_load_receipt_clears_fields() {
        let store = MemoryStore::new();
        let load_id = load_with_receipt(&store, "abc123").await;

        let storage = RecordingStorage::default();
        let outcome = remove_load_receipt(&store, &storage, &load_id).await.unwrap();
        assert_eq!(outcome.cleanup, CleanupStatus::Done);
        assert!(outcome.value.receipt_url.is_none());
        assert_eq!(storage.deleted(), vec!["abc123"]);
    }

    #[tokio::test]
    async fn listing_unions_load_and_standalone_receipts() {
        let store = MemoryStore::new();
        let load_id = load_with_receipt(&store, "load-r").await;
        store
            .insert_load(sample_input().into_load("2024-01-11".into()))
            .await
            .unwrap();
        let blank = store
            .insert_load(sample_input().into_load("2024-01-12".into()))
            .await
            .unwrap();
        store.set_load_receipt(&blank, "", "").await.unwrap();
        save_standalone_receipt(&store, &save_request("solo-r")).await.unwrap();

        let all = get_receipt_storage_ids(&store, &store).await.unwrap();
        assert_eq!(all.len(), 2);

        assert_eq!(all[0].kind, ReceiptKind::Load);
        assert_eq!(all[0].storage_id, "load-r");
        assert_eq!(all[0].load_id.as_deref(), Some(load_id.as_str()));
        assert_eq!(all[0].created_date.as_deref(), Some("2024-01-10"));

        assert_eq!(all[1].kind, ReceiptKind::Standalone);
        assert_eq!(all[1].storage_id, "solo-r");
    }
}
