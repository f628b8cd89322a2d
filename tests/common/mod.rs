use geonear::model::Model;
use geonear::results::Record;
use serde_json::Value;
use uuid::Uuid;

use crate::common::geo::{geo_schema, Geo};
use crate::common::test_config::TestContext;

pub mod geo;
pub mod memory_connection;
pub mod test_config;

pub fn new_collection_name(ctx: &TestContext) -> String {
    format!("{}{}", ctx.collection_prefix, Uuid::new_v4().simple())
}

pub fn geo_model(ctx: &TestContext) -> Model<Geo> {
    Model::new(ctx.connection.clone(), new_collection_name(ctx), geo_schema())
}

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}
