use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum WeightUnit {
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "ton")]
    Ton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum LengthUnit {
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "ft")]
    Feet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum BodyType {
    #[serde(rename = "open body")]
    OpenBody,
    #[serde(rename = "covered")]
    Covered,
    #[serde(rename = "flatbed")]
    Flatbed,
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightUnit::Kg => write!(f, "kg"),
            WeightUnit::Ton => write!(f, "ton"),
        }
    }
}

/// Posted load (stored in MongoDB)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Origins, in route order
    pub current_locations: Vec<String>,

    /// Destinations, in route order
    pub destination_locations: Vec<String>,

    pub weight: f64,
    pub weight_unit: WeightUnit,

    pub truck_length: f64,
    pub length_unit: LengthUnit,

    pub contact_number: String,
    pub staff_contact_number: String,

    pub body_type: BodyType,

    pub products: String,

    /// `YYYY-MM-DD`
    pub created_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_storage_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_owner: Option<bool>,
}

impl Load {
    pub fn has_receipt(&self) -> bool {
        self.receipt_storage_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false)
    }

    /// Case-insensitive substring match against every origin and destination.
    pub fn matches_location(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.current_locations
            .iter()
            .chain(self.destination_locations.iter())
            .any(|loc| loc.to_lowercase().contains(&needle))
    }
}

/// Editable load fields (create and update)
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct LoadInput {
    pub current_locations: Vec<String>,
    pub destination_locations: Vec<String>,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub truck_length: f64,
    pub length_unit: LengthUnit,
    pub contact_number: String,
    pub staff_contact_number: String,
    pub body_type: BodyType,
    pub products: String,
    pub is_owner: Option<bool>,
}

impl LoadInput {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_locations("current_locations", &self.current_locations)?;
        validate_locations("destination_locations", &self.destination_locations)?;

        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(AppError::InvalidRequest("Weight must be positive".to_string()));
        }
        if !(self.truck_length.is_finite() && self.truck_length > 0.0) {
            return Err(AppError::InvalidRequest(
                "Truck length must be positive".to_string(),
            ));
        }
        if self.contact_number.trim().is_empty() {
            return Err(AppError::InvalidRequest("contact_number is required".to_string()));
        }
        Ok(())
    }

    pub fn into_load(self, created_date: String) -> Load {
        Load {
            id: None,
            current_locations: trim_all(self.current_locations),
            destination_locations: trim_all(self.destination_locations),
            weight: self.weight,
            weight_unit: self.weight_unit,
            truck_length: self.truck_length,
            length_unit: self.length_unit,
            contact_number: self.contact_number,
            staff_contact_number: self.staff_contact_number,
            body_type: self.body_type,
            products: self.products,
            created_date,
            receipt_storage_id: None,
            receipt_url: None,
            is_owner: self.is_owner,
        }
    }

    /// Overwrites every mutable field of `load`; date and receipt stay.
    pub fn apply_to(self, load: &mut Load) {
        load.current_locations = trim_all(self.current_locations);
        load.destination_locations = trim_all(self.destination_locations);
        load.weight = self.weight;
        load.weight_unit = self.weight_unit;
        load.truck_length = self.truck_length;
        load.length_unit = self.length_unit;
        load.contact_number = self.contact_number;
        load.staff_contact_number = self.staff_contact_number;
        load.body_type = self.body_type;
        load.products = self.products;
        load.is_owner = self.is_owner;
    }
}

fn validate_locations(field: &str, locations: &[String]) -> Result<(), AppError> {
    if locations.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} must not be empty", field)));
    }
    if locations.iter().any(|l| l.trim().is_empty()) {
        return Err(AppError::InvalidRequest(format!(
            "{} entries must not be blank",
            field
        )));
    }
    Ok(())
}

fn trim_all(locations: Vec<String>) -> Vec<String> {
    locations.into_iter().map(|l| l.trim().to_string()).collect()
}

/// Listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadQuery {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub location: Option<String>,
}

impl LoadQuery {
    /// Both bounds or nothing.
    pub fn date_range(&self) -> Option<(&str, &str)> {
        match (self.date_from.as_deref(), self.date_to.as_deref()) {
            (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => Some((from, to)),
            _ => None,
        }
    }

    pub fn location_term(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct AttachReceiptRequest {
    pub url: String,
    pub public_id: String,
}

/// Load as returned by the API
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct LoadResponse {
    pub id: String,
    pub current_locations: Vec<String>,
    pub destination_locations: Vec<String>,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub truck_length: f64,
    pub length_unit: LengthUnit,
    pub contact_number: String,
    pub staff_contact_number: String,
    pub body_type: BodyType,
    pub products: String,
    pub created_date: String,
    pub receipt_storage_id: Option<String>,
    pub receipt_url: Option<String>,
    pub is_owner: Option<bool>,
}

impl From<Load> for LoadResponse {
    fn from(load: Load) -> Self {
        LoadResponse {
            id: load.id.map(|id| id.to_hex()).unwrap_or_default(),
            current_locations: load.current_locations,
            destination_locations: load.destination_locations,
            weight: load.weight,
            weight_unit: load.weight_unit,
            truck_length: load.truck_length,
            length_unit: load.length_unit,
            contact_number: load.contact_number,
            staff_contact_number: load.staff_contact_number,
            body_type: load.body_type,
            products: load.products,
            created_date: load.created_date,
            receipt_storage_id: load.receipt_storage_id,
            receipt_url: load.receipt_url,
            is_owner: load.is_owner,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_input() -> LoadInput {
        LoadInput {
            current_locations: vec!["Pune".into(), "Nashik".into()],
            destination_locations: vec!["Delhi".into()],
            weight: 5.0,
            weight_unit: WeightUnit::Ton,
            truck_length: 20.0,
            length_unit: LengthUnit::Feet,
            contact_number: "9876543210".into(),
            staff_contact_number: "9123456780".into(),
            body_type: BodyType::OpenBody,
            products: "Steel coils".into(),
            is_owner: None,
        }
    }

    #[test]
    fn body_type_literals_round_trip() {
        let t: BodyType = serde_json::from_str("\"open body\"").unwrap();
        assert_eq!(t, BodyType::OpenBody);
        assert!(serde_json::from_str::<BodyType>("\"open\"").is_err());
        assert!(serde_json::from_str::<WeightUnit>("\"lbs\"").is_err());
    }

    #[test]
    fn rejects_non_positive_measurements() {
        let mut input = sample_input();
        input.weight = 0.0;
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.truck_length = -3.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn rejects_blank_locations() {
        let mut input = sample_input();
        input.destination_locations.push("   ".into());
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.current_locations.clear();
        assert!(input.validate().is_err());
    }

    #[test]
    fn location_match_is_case_insensitive_substring() {
        let load = sample_input().into_load("2024-05-01".into());
        assert!(load.matches_location("nash"));
        assert!(load.matches_location("DELHI"));
        assert!(!load.matches_location("Mumbai"));
    }

    #[test]
    fn half_open_date_range_is_ignored() {
        let q = LoadQuery {
            date_from: Some("2024-01-01".into()),
            ..Default::default()
        };
        assert!(q.date_range().is_none());
    }
}
