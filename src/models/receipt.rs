use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const STANDALONE_RECEIPT_TYPE: &str = "standalone";

/// Standalone receipt (not attached to a load)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub storage_id: String,

    pub url: String,

    /// Unix timestamp (seconds)
    pub created_at: i64,

    /// Always `"standalone"` for rows in this collection
    pub receipt_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptKind {
    Load,
    Standalone,
}

/// One entry of the receipt listing, either attached to a load or standalone.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReceiptDescriptor {
    pub storage_id: String,
    pub url: Option<String>,
    pub kind: ReceiptKind,
    /// Set for load receipts
    pub load_id: Option<String>,
    /// Load creation date for load receipts
    pub created_date: Option<String>,
    /// Upload time for standalone receipts
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct SaveReceiptRequest {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct DeleteReceiptRequest {
    /// Bare id or a URL carrying it
    pub storage_id: String,
}
