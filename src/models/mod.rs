pub mod record;
pub mod trip;
pub mod types;
pub mod user;

pub use record::{current_timestamp, new_identifier, Record};
pub use trip::Trip;
pub use types::{HousingType, PrivacyType, TripStatus, TripType};
pub use user::User;
