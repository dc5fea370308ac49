use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::AuthSettings;
use crate::database::UserRepository;
use crate::models::{
    LoginRequest, RegisterRequest, ResetPasswordRequest, User, UserProfile, UserType, PHONE_TAKEN,
};
use crate::utils::{now_secs, AppError};

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (ObjectId hex)
    pub phone: String,
    pub user_type: UserType,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub user: UserProfile,
}

// Generate JWT token
pub fn generate_jwt(settings: &AuthSettings, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::hours(settings.token_ttl_hours)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        phone: user.phone.clone(),
        user_type: user.user_type,
        is_admin: user.is_admin,
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        aud: settings.jwt_audience.clone(),
        iss: settings.jwt_issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to generate token: {}", e)))
}

// Verify JWT token
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[settings.jwt_audience.clone()]);

    let mut issuers = HashSet::new();
    issuers.insert(settings.jwt_issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Creates an unapproved, non-admin account.
pub async fn register(
    users: &dyn UserRepository,
    settings: &AuthSettings,
    request: &RegisterRequest,
) -> Result<UserProfile, AppError> {
    request.validate()?;

    if request.is_admin == Some(true) || request.is_approved == Some(true) {
        log::warn!(
            "⚠️  Registration for {} asked for elevated flags; ignoring",
            request.phone
        );
    }

    if users.find_user_by_phone(&request.phone).await?.is_some() {
        return Err(AppError::Conflict(PHONE_TAKEN.to_string()));
    }

    let password_hash = hash(&request.password, settings.bcrypt_cost)?;

    let mut user = User {
        id: None,
        name: request.name.trim().to_string(),
        phone: request.phone.clone(),
        transport_name: request.transport_name.trim().to_string(),
        password: password_hash,
        address: request.address.trim().to_string(),
        user_type: request.user_type,
        is_admin: false,
        is_approved: false,
        document_url: request.document_url.clone(),
        document_storage_id: request.document_storage_id.clone(),
        created_at: now_secs(),
        push_token: None,
    };

    let id = users.insert_user(user.clone()).await?;
    user.id = Some(id);

    Ok(UserProfile::from(user))
}

// User login
pub async fn login(
    users: &dyn UserRepository,
    settings: &AuthSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let user = users
        .find_user_by_phone(request.phone.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify(&request.password, &user.password)
        .map_err(|e| AppError::DatabaseError(format!("Stored password is unreadable: {}", e)))?;

    if !valid {
        return Err(AppError::InvalidPassword);
    }

    if !user.is_approved {
        return Err(AppError::AccountNotApproved);
    }

    let token = generate_jwt(settings, &user)?;

    Ok(AuthResponse {
        success: true,
        token,
        user: UserProfile::from(user),
    })
}

/// Replaces the password of the account holding `phone`. Approval is not
/// required.
pub async fn reset_password(
    users: &dyn UserRepository,
    settings: &AuthSettings,
    request: &ResetPasswordRequest,
) -> Result<UserProfile, AppError> {
    request.validate()?;

    let mut user = users
        .find_user_by_phone(&request.phone)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    let id = user
        .id
        .ok_or_else(|| AppError::DatabaseError("User row has no id".to_string()))?;

    let password_hash = hash(&request.new_password, settings.bcrypt_cost)?;

    if !users.set_password(&id, &password_hash).await? {
        return Err(AppError::NotFound("User".to_string()));
    }
    user.password = password_hash;

    Ok(UserProfile::from(user))
}
