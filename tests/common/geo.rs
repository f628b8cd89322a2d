use geonear::model::Entity;
use geonear::schema::{FieldType, Schema};
use serde::{Deserialize, Serialize};

pub const MONGODB_NYC_OFFICE: [f64; 2] = [-73.987732, 40.757471];
pub const BRYANT_PARK_NY: [f64; 2] = [-73.983677, 40.753628];
pub const EAST_HARLEM_SHOP: [f64; 2] = [-73.93831, 40.794963];
pub const CENTRAL_PARK_ZOO: [f64; 2] = [-73.972299, 40.767732];
pub const PORT_AUTHORITY_STATION: [f64; 2] = [-73.990147, 40.757253];

pub const EARTH_RADIUS_METERS: f64 = 6371.0 * 1000.0;

// Legacy pairs queried spherically measure distance in radians.
pub fn meters_to_radians(m: f64) -> f64 {
    m / EARTH_RADIUS_METERS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(rename = "_id")]
    pub id: String,
    pub coordinates: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: Option<i64>,
}

impl Entity for Geo {
    fn id(&self) -> String {
        self.id.clone()
    }
}

pub fn geo_schema() -> Schema {
    Schema::new()
        .field("coordinates", FieldType::array(FieldType::Number))
        .field("type", FieldType::String)
        .field("priority", FieldType::Number)
}
