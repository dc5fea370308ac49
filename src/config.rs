use std::env;

use crate::services::notification_service::DEFAULT_PUSH_ENDPOINT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MongoDB,
    Memory,
}

/// JWT and password hashing parameters.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "default-secret-change-me".to_string(),
            jwt_issuer: "load-board-service".to_string(),
            jwt_audience: "load-board-api".to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

/// Account created at startup so someone can approve registrations.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub auth: AuthSettings,
    pub storage_base_url: String,
    pub storage_api_key: Option<String>,
    pub push_endpoint: String,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p
                .parse::<u16>()
                .map_err(|e| format!("PORT must be a port number: {}", e))?,
            None => 3002,
        };

        let store_backend = match get("STORE_BACKEND").as_deref() {
            None | Some("mongodb") => StoreBackend::MongoDB,
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(format!(
                    "Invalid STORE_BACKEND: {}. Supported: mongodb, memory",
                    other
                ))
            }
        };

        let database_url = get("DATABASE_URL");
        if store_backend == StoreBackend::MongoDB && database_url.is_none() {
            return Err("DATABASE_URL must be set".to_string());
        }

        let defaults = AuthSettings::default();
        let auth = AuthSettings {
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: get("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            token_ttl_hours: match get("JWT_TTL_HOURS") {
                Some(v) => v
                    .parse()
                    .map_err(|e| format!("JWT_TTL_HOURS must be a number: {}", e))?,
                None => defaults.token_ttl_hours,
            },
            bcrypt_cost: match get("BCRYPT_COST") {
                Some(v) => v
                    .parse()
                    .map_err(|e| format!("BCRYPT_COST must be a number: {}", e))?,
                None => defaults.bcrypt_cost,
            },
        };

        let admin_seed = match (get("ADMIN_PHONE"), get("ADMIN_PASSWORD")) {
            (Some(phone), Some(password)) => Some(AdminSeed {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                phone,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            store_backend,
            database_url,
            auth,
            storage_base_url: get("STORAGE_BASE_URL")
                .unwrap_or_else(|| "http://localhost:4000".to_string()),
            storage_api_key: get("STORAGE_API_KEY"),
            push_endpoint: get("PUSH_ENDPOINT").unwrap_or_else(|| DEFAULT_PUSH_ENDPOINT.to_string()),
            admin_seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn mongodb_requires_database_url() {
        assert!(config(&[]).is_err());
        let cfg = config(&[("DATABASE_URL", "mongodb://localhost:27017/LoadBoard")]).unwrap();
        assert_eq!(cfg.port, 3002);
        assert_eq!(cfg.push_endpoint, DEFAULT_PUSH_ENDPOINT);
        assert!(cfg.admin_seed.is_none());
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = config(&[("STORE_BACKEND", "memory"), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.store_backend, StoreBackend::Memory);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn admin_seed_needs_phone_and_password() {
        let cfg = config(&[
            ("STORE_BACKEND", "memory"),
            ("ADMIN_PHONE", "9000000000"),
            ("ADMIN_PASSWORD", "changeme"),
        ])
        .unwrap();
        let seed = cfg.admin_seed.unwrap();
        assert_eq!(seed.name, "Administrator");
        assert_eq!(seed.phone, "9000000000");
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(config(&[("STORE_BACKEND", "sqlite")]).is_err());
    }
}
