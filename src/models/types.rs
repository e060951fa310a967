use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HousingType {
    Camping,
    Hostel,
    Hotel,
    Dormitory,
    Apartment,
    House,
    #[default]
    #[serde(other)]
    Other,
}

impl HousingType {
    pub fn label(&self) -> &'static str {
        match self {
            HousingType::Other => "other",
            HousingType::Camping => "camping",
            HousingType::Hostel => "hostel",
            HousingType::Hotel => "hotel",
            HousingType::Dormitory => "dormitory",
            HousingType::Apartment => "apartment",
            HousingType::House => "house",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    Shared,
    Private,
    Complete,
    #[default]
    #[serde(other)]
    Other,
}

impl PrivacyType {
    pub fn label(&self) -> &'static str {
        match self {
            PrivacyType::Other => "other",
            PrivacyType::Shared => "shared",
            PrivacyType::Private => "private",
            PrivacyType::Complete => "complete",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Local,
    Domestic,
    International,
    #[default]
    #[serde(other)]
    Other,
}

impl TripType {
    pub fn label(&self) -> &'static str {
        match self {
            TripType::Other => "other",
            TripType::Local => "local",
            TripType::Domestic => "domestic",
            TripType::International => "international",
        }
    }
}

/// Publication state of a trip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[default]
    Draft,
    Complete,
    Listed,
    Unlisted,
    Archived,
}

impl TripStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TripStatus::Draft => "draft",
            TripStatus::Complete => "complete",
            TripStatus::Listed => "listed",
            TripStatus::Unlisted => "unlisted",
            TripStatus::Archived => "archived",
        }
    }
}
