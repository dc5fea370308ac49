pub mod auth_service;
pub mod load_service;
pub mod notification_service;
pub mod receipt_service;
pub mod storage_service;
pub mod user_service;
