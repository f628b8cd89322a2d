use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use geonear::clients::connection::Connection;
use geonear::error;
use geonear::results::Record;
use serde_json::{json, Value};
use uuid::Uuid;

/// Field that holds each stored document's location.
pub const LOCATION_FIELD: &str = "coordinates";

// Mean radius used by the server when reporting GeoJSON distances.
const EARTH_RADIUS_METERS: f64 = 6378.1 * 1000.0;

/// A store that answers geoNear commands from memory, the way a server with a
/// 2d/2dsphere index on [`LOCATION_FIELD`] would.
#[derive(Debug)]
pub struct MemoryConnection {
    default_num: usize,
    collections: Mutex<HashMap<String, Vec<Record>>>,
    commands: Mutex<Vec<Record>>,
    next_outcome: Mutex<Option<error::Result<Value>>>,
}

impl MemoryConnection {
    pub fn new(default_num: usize) -> Self {
        Self {
            default_num,
            collections: Mutex::new(HashMap::new()),
            commands: Mutex::new(vec![]),
            next_outcome: Mutex::new(None),
        }
    }

    /// Stores `doc`, assigning an `_id` if it has none, and returns the id.
    pub fn insert(&self, collection: &str, doc: Value) -> String {
        let mut doc = doc.as_object().cloned().unwrap_or_default();
        let id = match doc.get("_id") {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => {
                let id = Uuid::new_v4().simple().to_string();
                doc.insert("_id".to_string(), Value::String(id.clone()));
                id
            }
        };

        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(doc);

        id
    }

    /// The next command gets `outcome` instead of being evaluated.
    pub fn respond_next_with(&self, outcome: error::Result<Value>) {
        *self.next_outcome.lock().unwrap() = Some(outcome);
    }

    pub fn commands(&self) -> Vec<Record> {
        self.commands.lock().unwrap().clone()
    }

    fn geo_near(&self, command: &Record) -> Value {
        let Some(collection) = command.get("geoNear").and_then(Value::as_str) else {
            return rejection(2, "geoNear requires a collection name");
        };
        let spherical = command
            .get("spherical")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let (origin, geo_json) = match command.get("near") {
            Some(Value::Array(pair)) => (coordinates(pair), false),
            Some(Value::Object(point)) => (
                point
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .and_then(|pair| coordinates(pair)),
                true,
            ),
            _ => (None, false),
        };
        let Some(origin) = origin else {
            return rejection(2, "'near' field must be point");
        };
        if geo_json && !spherical {
            return rejection(17304, "'near' GeoJSON point requires spherical: true");
        }

        let max_distance = command.get("maxDistance").and_then(Value::as_f64);
        let min_distance = command.get("minDistance").and_then(Value::as_f64);
        let multiplier = command
            .get("distanceMultiplier")
            .and_then(Value::as_f64)
            .unwrap_or(1.0);
        let include_locs = command
            .get("includeLocs")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let num = command
            .get("num")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(self.default_num);
        let query = command
            .get("query")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let collections = self.collections.lock().unwrap();
        let docs = collections.get(collection).cloned().unwrap_or_default();
        drop(collections);

        let scanned = docs.len();
        let mut hits: Vec<(f64, Record)> = docs
            .into_iter()
            .filter(|doc| matches_query(doc, &query))
            .filter_map(|doc| {
                let loc = doc
                    .get(LOCATION_FIELD)
                    .and_then(Value::as_array)
                    .and_then(|pair| coordinates(pair))?;
                let distance = match (spherical, geo_json) {
                    (true, true) => central_angle(origin, loc) * EARTH_RADIUS_METERS,
                    (true, false) => central_angle(origin, loc),
                    _ => planar(origin, loc),
                };
                Some((distance, doc))
            })
            .filter(|(distance, _)| max_distance.is_none_or(|max| *distance <= max))
            .filter(|(distance, _)| min_distance.is_none_or(|min| *distance >= min))
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.truncate(num);

        let loaded = hits.len();
        let (total, furthest) = hits
            .iter()
            .fold((0.0, 0.0_f64), |(sum, max), (d, _)| (sum + d, max.max(*d)));

        let results: Vec<Value> = hits
            .into_iter()
            .map(|(distance, doc)| {
                let mut entry = json!({"dis": distance * multiplier});
                if include_locs {
                    entry["loc"] = doc.get(LOCATION_FIELD).cloned().unwrap_or(Value::Null);
                }
                entry["obj"] = Value::Object(doc);
                entry
            })
            .collect();

        let average = if loaded == 0 {
            0.0
        } else {
            total / loaded as f64
        };

        json!({
            "results": results,
            "stats": {
                "nscanned": scanned,
                "objectsLoaded": loaded,
                "avgDistance": average,
                "maxDistance": furthest,
                "time": 0
            },
            "ok": 1.0
        })
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn run_command(&self, command: Record) -> error::Result<Value> {
        self.commands.lock().unwrap().push(command.clone());

        let injected = self.next_outcome.lock().unwrap().take();
        if let Some(outcome) = injected {
            return outcome;
        }

        // Yield once so callers observe the reply asynchronously.
        tokio::task::yield_now().await;

        Ok(self.geo_near(&command))
    }
}

fn rejection(code: i32, msg: &str) -> Value {
    json!({"ok": 0.0, "errmsg": msg, "code": code})
}

fn coordinates(pair: &[Value]) -> Option<(f64, f64)> {
    match pair {
        [x, y] => Some((x.as_f64()?, y.as_f64()?)),
        _ => None,
    }
}

fn planar(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

// Haversine angle between two (longitude, latitude) pairs in degrees.
fn central_angle(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());

    let h = ((lat2 - lat1) / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * ((lon2 - lon1) / 2.0).sin().powi(2);

    2.0 * h.sqrt().min(1.0).asin()
}

fn matches_query(doc: &Record, query: &Record) -> bool {
    query.iter().all(|(path, condition)| {
        let value = doc.get(path).unwrap_or(&Value::Null);
        match condition {
            Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) => {
                ops.iter().all(|(op, operand)| match op.as_str() {
                    "$in" => operand
                        .as_array()
                        .is_some_and(|candidates| candidates.iter().any(|c| equals(value, c))),
                    "$ne" => !equals(value, operand),
                    "$exists" => operand.as_bool().unwrap_or(true) != value.is_null(),
                    _ => equals(value, operand),
                })
            }
            _ => equals(value, condition),
        }
    })
}

// Numbers compare by value; arrays match any of their elements.
fn equals(stored: &Value, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(items), wanted) if !wanted.is_array() => {
            items.iter().any(|item| equals(item, wanted))
        }
        (a, b) => a == b,
    }
}
