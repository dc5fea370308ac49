use bcrypt::hash;

use crate::config::{AdminSeed, AuthSettings};
use crate::database::UserRepository;
use crate::models::{validate_phone, User, UserType};
use crate::utils::{now_secs, AppError};

/// Creates the configured admin account unless its phone is already taken.
///
/// Returns `true` when an account was inserted.
pub async fn seed_admin(
    users: &dyn UserRepository,
    settings: &AuthSettings,
    seed: &AdminSeed,
) -> Result<bool, AppError> {
    validate_phone(&seed.phone)?;

    if users.find_user_by_phone(&seed.phone).await?.is_some() {
        log::info!("   ℹ️  Admin {} already exists", seed.phone);
        return Ok(false);
    }

    let admin = User {
        id: None,
        name: seed.name.clone(),
        phone: seed.phone.clone(),
        transport_name: seed.name.clone(),
        password: hash(&seed.password, settings.bcrypt_cost)?,
        address: String::new(),
        user_type: UserType::Admin,
        is_admin: true,
        is_approved: true,
        document_url: None,
        document_storage_id: None,
        created_at: now_secs(),
        push_token: None,
    };

    users.insert_user(admin).await?;
    log::info!("   ✅ Admin account seeded: {}", seed.phone);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::LoginRequest;
    use crate::services::auth_service::{self, tests::test_settings};

    fn seed() -> AdminSeed {
        AdminSeed {
            name: "Office".into(),
            phone: "9000000000".into(),
            password: "changeme".into(),
        }
    }

    #[tokio::test]
    async fn seeded_admin_can_log_in_once_seeded() {
        let store = MemoryStore::new();
        let settings = test_settings();

        assert!(seed_admin(&store, &settings, &seed()).await.unwrap());
        assert!(!seed_admin(&store, &settings, &seed()).await.unwrap());

        let login = LoginRequest {
            phone: "9000000000".into(),
            password: "changeme".into(),
        };
        let response = auth_service::login(&store, &settings, &login).await.unwrap();
        assert!(response.user.is_admin);
    }
}
