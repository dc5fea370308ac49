use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::database::UserRepository;
use crate::models::{Load, WeightUnit};
use crate::utils::AppError;

pub const DEFAULT_PUSH_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";
pub const PUSH_BATCH_SIZE: usize = 100;

const NOTIFICATION_TITLE: &str = "New Load Available";
const NOTIFICATION_SOUND: &str = "default";

/// Event payload describing a newly posted load.
///
/// Every field is optional so partial payloads can be projected safely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadNotification {
    pub load_id: Option<String>,
    #[serde(default)]
    pub current_locations: Vec<String>,
    #[serde(default)]
    pub destination_locations: Vec<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
}

impl LoadNotification {
    pub fn from_load(load: &Load) -> Self {
        Self {
            load_id: load.id.map(|id| id.to_hex()),
            current_locations: load.current_locations.clone(),
            destination_locations: load.destination_locations.clone(),
            weight: Some(load.weight),
            weight_unit: Some(load.weight_unit),
        }
    }

    /// `Pune → Nashik → Delhi (5 ton)`. `None` when there is no route to show.
    pub fn body(&self) -> Option<String> {
        let route: Vec<&str> = self
            .current_locations
            .iter()
            .chain(self.destination_locations.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if route.is_empty() {
            return None;
        }

        let mut body = route.join(" → ");
        if let Some(weight) = self.weight {
            match self.weight_unit {
                Some(unit) => body.push_str(&format!(" ({} {})", weight, unit)),
                None => body.push_str(&format!(" ({})", weight)),
            }
        }
        Some(body)
    }
}

/// One entry of the relay's JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub batches: usize,
    pub sent: usize,
    /// (batch index, error)
    pub failed_batches: Vec<(usize, String)>,
}

impl DispatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed_batches.is_empty()
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send_batch(&self, batch: &[PushMessage]) -> Result<(), AppError>;
}

pub struct HttpPushTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPushTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send_batch(&self, batch: &[PushMessage]) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(batch)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Push relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "Push relay error: {}",
                response.status()
            )));
        }

        Ok(())
    }
}

pub fn build_messages(tokens: &[String], payload: &LoadNotification) -> Vec<PushMessage> {
    let Some(body) = payload.body() else {
        return Vec::new();
    };

    let data = serde_json::json!({ "load_id": payload.load_id });

    tokens
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|token| PushMessage {
            to: token.to_string(),
            sound: NOTIFICATION_SOUND.to_string(),
            title: NOTIFICATION_TITLE.to_string(),
            body: body.clone(),
            data: data.clone(),
        })
        .collect()
}

/// Sends every batch concurrently. Failures are logged and reported, never
/// retried, and never stop the other batches.
pub async fn dispatch(
    transport: &dyn PushTransport,
    tokens: &[String],
    payload: &LoadNotification,
) -> DispatchReport {
    let messages = build_messages(tokens, payload);
    if messages.is_empty() {
        log::debug!("📭 No push messages to send");
        return DispatchReport::default();
    }

    let batches: Vec<&[PushMessage]> = messages.chunks(PUSH_BATCH_SIZE).collect();
    log::info!(
        "📨 Dispatching {} push messages in {} batches",
        messages.len(),
        batches.len()
    );

    let results = futures::future::join_all(batches.iter().enumerate().map(
        |(index, batch)| async move { (index, batch.len(), transport.send_batch(batch).await) },
    ))
    .await;

    let mut report = DispatchReport {
        batches: batches.len(),
        ..Default::default()
    };

    for (index, size, result) in results {
        match result {
            Ok(()) => report.sent += size,
            Err(e) => {
                log::warn!("⚠️  Push batch {} failed: {}", index, e);
                report.failed_batches.push((index, e.to_string()));
            }
        }
    }

    report
}

/// Notifies every user with a push token about `load`.
pub async fn notify_new_load(
    users: &dyn UserRepository,
    transport: &dyn PushTransport,
    load: &Load,
) -> Result<DispatchReport, AppError> {
    let tokens = users.push_tokens().await?;
    Ok(dispatch(transport, &tokens, &LoadNotification::from_load(load)).await)
}
