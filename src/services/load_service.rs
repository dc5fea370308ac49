use mongodb::bson::oid::ObjectId;

use crate::database::LoadRepository;
use crate::models::{Load, LoadInput, LoadQuery};
use crate::services::storage_service::FileStorage;
use crate::utils::{today, AppError, CleanupStatus, Outcome};

pub fn parse_load_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidRequest("Invalid load ID".to_string()))
}

/// Validates and stores a new load stamped with today's date.
pub async fn add_load(loads: &dyn LoadRepository, input: LoadInput) -> Result<Load, AppError> {
    input.validate()?;

    let mut load = input.into_load(today());
    let id = loads.insert_load(load.clone()).await?;
    load.id = Some(id);

    log::info!(
        "📦 Load {} created: {:?} → {:?}",
        id.to_hex(),
        load.current_locations,
        load.destination_locations
    );

    Ok(load)
}

pub async fn get_today_loads(loads: &dyn LoadRepository) -> Result<Vec<Load>, AppError> {
    loads.find_loads_by_date(&today()).await
}

/// Date range first (both bounds required), then the location term over
/// whatever the date filter left.
pub async fn get_loads(loads: &dyn LoadRepository, query: &LoadQuery) -> Result<Vec<Load>, AppError> {
    let mut result = match query.date_range() {
        Some((from, to)) => loads.find_loads_in_range(from, to).await?,
        None => loads.find_all_loads().await?,
    };

    if let Some(term) = query.location_term() {
        result.retain(|load| load.matches_location(term));
    }

    Ok(result)
}

pub async fn get_load(loads: &dyn LoadRepository, load_id: &str) -> Result<Load, AppError> {
    let id = parse_load_id(load_id)?;
    loads
        .find_load(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Load".to_string()))
}

/// Replaces every mutable field. Creation date and receipt are preserved.
pub async fn update_load(
    loads: &dyn LoadRepository,
    load_id: &str,
    input: LoadInput,
) -> Result<Load, AppError> {
    let mut load = get_load(loads, load_id).await?;
    input.validate()?;
    input.apply_to(&mut load);

    if !loads.replace_load(&load).await? {
        return Err(AppError::NotFound("Load".to_string()));
    }

    Ok(load)
}

/// Deletes the load row. An attached receipt file is removed first on a
/// best-effort basis; its failure is reported in the outcome only.
pub async fn delete_load(
    loads: &dyn LoadRepository,
    storage: &dyn FileStorage,
    load_id: &str,
) -> Result<Outcome<String>, AppError> {
    let load = get_load(loads, load_id).await?;
    let id = load
        .id
        .ok_or_else(|| AppError::DatabaseError("Load row has no id".to_string()))?;

    let cleanup = match load.receipt_storage_id.as_deref().filter(|s| !s.is_empty()) {
        Some(storage_id) => {
            let status = CleanupStatus::from_result(storage.delete_file(storage_id).await);
            if let CleanupStatus::Failed(e) = &status {
                log::warn!(
                    "⚠️  Receipt {} of load {} could not be deleted: {}",
                    storage_id,
                    load_id,
                    e
                );
            }
            status
        }
        None => CleanupStatus::NotNeeded,
    };

    if !loads.delete_load(&id).await? {
        return Err(AppError::NotFound("Load".to_string()));
    }

    Ok(Outcome::new(id.to_hex(), cleanup))
}
