use serde::{Deserialize, Serialize};

use crate::models::record::{current_timestamp, new_identifier, Record};
use crate::models::types::{HousingType, PrivacyType, TripStatus, TripType};
use crate::tokenizer::{FieldValue, IndexedField};

/// Volunteer trip listing
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trip {
    pub id: String,
    pub org_id: String,

    pub housing_type: HousingType,
    pub privacy_type: PrivacyType,
    pub trip_type: TripType,
    pub status: TripStatus,
    pub volunteer_limit: i64,
    pub name: String,
    pub description: String,
    pub mission: String,
    pub price: f64,
    pub currency: String,

    pub latitude: f64,
    pub longitude: f64,

    pub start_date: i64,
    pub end_date: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

static TRIP_INDEX: [IndexedField<Trip>; 15] = [
    IndexedField::equality("org_id", |t: &Trip| FieldValue::text(&t.org_id)),
    IndexedField::equality("housing_type", |t: &Trip| FieldValue::Label(t.housing_type.label())),
    IndexedField::equality("privacy_type", |t: &Trip| FieldValue::Label(t.privacy_type.label())),
    IndexedField::equality("trip_type", |t: &Trip| FieldValue::Label(t.trip_type.label())),
    IndexedField::equality("status", |t: &Trip| FieldValue::Label(t.status.label())),
    IndexedField::equality("volunteer_limit", |t: &Trip| FieldValue::Int(t.volunteer_limit)),
    IndexedField::equality("price", |t: &Trip| FieldValue::Float(t.price)),
    IndexedField::equality("currency", |t: &Trip| FieldValue::text(&t.currency)),
    IndexedField::geoposition("latitude", |t: &Trip| t.latitude),
    IndexedField::geoposition("longitude", |t: &Trip| t.longitude),
    IndexedField::time("start_date", |t: &Trip| t.start_date),
    IndexedField::time("end_date", |t: &Trip| t.end_date),
    IndexedField::time("created_at", |t: &Trip| t.created_at),
    IndexedField::time("updated_at", |t: &Trip| t.updated_at),
    IndexedField::time("deleted_at", |t: &Trip| t.deleted_at),
];

impl Record for Trip {
    const KIND: &'static str = "trip";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_fields() -> &'static [IndexedField<Self>] {
        &TRIP_INDEX
    }
}

impl Trip {
    /// New draft trip with a fresh identifier, stamped now.
    pub fn new() -> Self {
        let now = current_timestamp();
        Self {
            id: new_identifier(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }

    /// Trip with a caller-chosen identifier and zeroed timestamps.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = current_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::IndexKind;

    #[test]
    fn test_new_trip_defaults() {
        let trip = Trip::new();
        assert_eq!(trip.status, TripStatus::Draft);
        assert_eq!(trip.housing_type, HousingType::Other);
        assert_eq!(trip.created_at, trip.updated_at);
        assert_eq!(trip.id.len(), 26);
    }

    #[test]
    fn test_index_table() {
        let names: Vec<&str> = Trip::index_fields().iter().map(|f| f.name).collect();
        assert!(names.contains(&"status"));
        assert!(!names.contains(&"name"));
        assert!(!names.contains(&"description"));

        let kind_of = |name: &str| {
            Trip::index_fields()
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.kind())
        };
        assert_eq!(kind_of("latitude"), Some(IndexKind::Geoposition));
        assert_eq!(kind_of("start_date"), Some(IndexKind::Time));
        assert_eq!(kind_of("price"), Some(IndexKind::Equality));
    }

    #[test]
    fn test_json_snapshot_uses_labels() {
        let mut trip = Trip::with_id("A");
        trip.status = TripStatus::Listed;
        let json = serde_json::to_value(&trip).unwrap();
        assert_eq!(json["status"], "listed");
        assert_eq!(json["housing_type"], "other");

        let back: Trip = serde_json::from_value(json).unwrap();
        assert_eq!(back, trip);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let trip: Trip = serde_json::from_str(r#"{"id":"A","currency":"EUR"}"#).unwrap();
        assert_eq!(trip.currency, "EUR");
        assert_eq!(trip.status, TripStatus::Draft);
        assert_eq!(trip.price, 0.0);
    }
}
