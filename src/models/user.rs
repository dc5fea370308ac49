use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// Message returned whenever a second account claims an existing phone.
pub const PHONE_TAKEN: &str = "Phone number already registered";

/// Account category chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum UserType {
    Driver,
    MotorOwner,
    Transporter,
    Admin,
}

/// Account document (stored in MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    /// Login key. Unique by index.
    pub phone: String,

    pub transport_name: String,

    /// bcrypt hash, never the plain password
    pub password: String,

    pub address: String,

    pub user_type: UserType,

    pub is_admin: bool,

    /// Login is refused until an admin flips this.
    pub is_approved: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_storage_id: Option<String>,

    /// Unix timestamp (seconds)
    pub created_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

/// Public view of a user. Carries no secret material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub transport_name: String,
    pub address: String,
    pub user_type: UserType,
    pub is_admin: bool,
    pub is_approved: bool,
    pub document_url: Option<String>,
    pub created_at: i64,
    pub has_push_token: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: user.name,
            phone: user.phone,
            transport_name: user.transport_name,
            address: user.address,
            user_type: user.user_type,
            is_admin: user.is_admin,
            is_approved: user.is_approved,
            document_url: user.document_url,
            created_at: user.created_at,
            has_push_token: user.push_token.map(|t| !t.is_empty()).unwrap_or(false),
        }
    }
}

/// Registration request.
///
/// `is_admin` and `is_approved` are accepted so older clients keep working,
/// but registration always ignores them.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub phone: String,
    pub transport_name: String,
    pub address: String,
    pub user_type: UserType,
    pub password: String,
    pub confirm_password: String,
    pub document_url: Option<String>,
    pub document_storage_id: Option<String>,
    pub is_admin: Option<bool>,
    pub is_approved: Option<bool>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("transport_name", &self.transport_name)?;
        require_non_blank("address", &self.address)?;
        validate_phone(&self.phone)?;
        validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(AppError::InvalidRequest("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub phone: String,
    pub new_password: String,
    pub confirm_password: Option<String>,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_phone(&self.phone)?;
        validate_password(&self.new_password)?;
        if let Some(confirm) = &self.confirm_password {
            if confirm != &self.new_password {
                return Err(AppError::InvalidRequest("Passwords do not match".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub transport_name: String,
    pub address: String,
    pub document_url: Option<String>,
    pub document_storage_id: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("transport_name", &self.transport_name)?;
        require_non_blank("address", &self.address)
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PushTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub pending: Option<bool>,
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(())
}

/// Ten digits, nothing else.
pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidRequest(
            "Phone number must be 10 digits".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < 6 {
        return Err(AppError::InvalidRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}
