use mongodb::bson::oid::ObjectId;

use crate::database::UserRepository;
use crate::models::{UpdateProfileRequest, UserProfile};
use crate::utils::AppError;

pub fn parse_user_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidRequest("Invalid user ID".to_string()))
}

pub async fn list_users(
    users: &dyn UserRepository,
    pending_only: bool,
) -> Result<Vec<UserProfile>, AppError> {
    let list = users.list_users(pending_only).await?;
    Ok(list.into_iter().map(UserProfile::from).collect())
}

/// Marks the account approved. Approving twice is harmless.
pub async fn approve_user(
    users: &dyn UserRepository,
    user_id: &str,
) -> Result<UserProfile, AppError> {
    let id = parse_user_id(user_id)?;

    if !users.set_approved(&id, true).await? {
        return Err(AppError::NotFound("User".to_string()));
    }

    get_profile(users, user_id).await
}

pub async fn get_profile(users: &dyn UserRepository, user_id: &str) -> Result<UserProfile, AppError> {
    let id = parse_user_id(user_id)?;
    users
        .find_user_by_id(&id)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| AppError::NotFound("User".to_string()))
}

pub async fn update_profile(
    users: &dyn UserRepository,
    user_id: &str,
    request: &UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    request.validate()?;
    let id = parse_user_id(user_id)?;

    if !users.update_profile(&id, request).await? {
        return Err(AppError::NotFound("User".to_string()));
    }

    get_profile(users, user_id).await
}

/// Stores the caller's device token; an empty token clears it.
pub async fn set_push_token(
    users: &dyn UserRepository,
    user_id: &str,
    token: &str,
) -> Result<(), AppError> {
    let id = parse_user_id(user_id)?;
    let token = token.trim();
    let value = if token.is_empty() { None } else { Some(token) };

    if !users.set_push_token(&id, value).await? {
        return Err(AppError::NotFound("User".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::auth_service::{self, tests::register_request, tests::test_settings};

    async fn registered(store: &MemoryStore, phone: &str) -> UserProfile {
        auth_service::register(store, &test_settings(), &register_request(phone, "secret1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn pending_listing_excludes_approved_users() {
        let store = MemoryStore::new();
        let a = registered(&store, "9990001111").await;
        registered(&store, "9990002222").await;

        approve_user(&store, &a.id).await.unwrap();

        let pending = list_users(&store, true).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].phone, "9990002222");
        assert_eq!(list_users(&store, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn approve_is_idempotent_and_checks_existence() {
        let store = MemoryStore::new();
        let a = registered(&store, "9990001111").await;

        assert!(approve_user(&store, &a.id).await.unwrap().is_approved);
        assert!(approve_user(&store, &a.id).await.unwrap().is_approved);

        let missing = ObjectId::new().to_hex();
        assert_eq!(
            approve_user(&store, &missing).await.unwrap_err(),
            AppError::NotFound("User".into())
        );
        assert!(matches!(
            approve_user(&store, "not-an-id").await,
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn profile_update_and_push_token() {
        let store = MemoryStore::new();
        let a = registered(&store, "9990001111").await;

        let updated = update_profile(
            &store,
            &a.id,
            &UpdateProfileRequest {
                name: "Ravi K".into(),
                transport_name: "RK Logistics".into(),
                address: "Pune".into(),
                document_url: Some("https://files.test/doc1".into()),
                document_storage_id: Some("doc1".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.transport_name, "RK Logistics");
        assert_eq!(updated.document_url.as_deref(), Some("https://files.test/doc1"));

        set_push_token(&store, &a.id, "ExponentPushToken[a]").await.unwrap();
        assert_eq!(store.push_tokens().await.unwrap(), vec!["ExponentPushToken[a]"]);

        set_push_token(&store, &a.id, "  ").await.unwrap();
        assert!(store.push_tokens().await.unwrap().is_empty());
    }
}
