/*
 *
 *  * Copyright (c) 2025 Couchbase, Inc.
 *  *
 *  * Licensed under the Apache License, Version 2.0 (the "License");
 *  * you may not use this file except in compliance with the License.
 *  * You may obtain a copy of the License at
 *  *
 *  *    http://www.apache.org/licenses/LICENSE-2.0
 *  *
 *  * Unless required by applicable law or agreed to in writing, software
 *  * distributed under the License is distributed on an "AS IS" BASIS,
 *  * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  * See the License for the specific language governing permissions and
 *  * limitations under the License.
 *
 */

use crate::error;
use crate::error::Error;
use serde_json::{json, Value};

pub(crate) const MISSING_NEAR_MSG: &str = "Must pass a near option to geoNear";
pub(crate) const INVALID_POINT_MSG: &str =
    "Must pass either a legacy coordinate array or GeoJSON Point to geoNear";
pub(crate) const LEGACY_SIZE_MSG: &str =
    "If using legacy coordinates, must be an array of size 2 for geoNear";

const GEO_JSON_POINT_TYPE: &str = "Point";

/// The reference point of a near query.
///
/// Legacy points are sent to the server as a bare `[x, y]` pair, GeoJSON
/// points as a `{"type": "Point", "coordinates": [x, y]}` object. Which of the
/// two is used also decides the distance unit the server works in, so the
/// distinction is kept all the way to the command.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum NearPoint {
    Legacy { x: f64, y: f64 },
    GeoJson { coordinates: [f64; 2] },
}

impl NearPoint {
    pub fn legacy(x: f64, y: f64) -> error::Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(invalid_point());
        }

        Ok(Self::Legacy { x, y })
    }

    pub fn geo_json(x: f64, y: f64) -> error::Result<Self> {
        if !x.is_finite() || !y.is_finite() {
            return Err(invalid_point());
        }

        Ok(Self::GeoJson {
            coordinates: [x, y],
        })
    }

    /// Classifies an unstructured point argument.
    pub fn normalize(raw: &Value) -> error::Result<Self> {
        match raw {
            Value::Null => Err(Error::invalid_argument(
                Some("near".to_string()),
                MISSING_NEAR_MSG,
            )),
            Value::Array(items) => {
                if items.len() != 2 {
                    return Err(Error::invalid_argument(
                        Some("near".to_string()),
                        LEGACY_SIZE_MSG,
                    ));
                }

                let [x, y] = coordinate_pair(items).ok_or_else(invalid_point)?;
                Ok(Self::Legacy { x, y })
            }
            Value::Object(obj) => {
                if obj.get("type").and_then(Value::as_str) != Some(GEO_JSON_POINT_TYPE) {
                    return Err(invalid_point());
                }

                let coordinates = obj
                    .get("coordinates")
                    .and_then(Value::as_array)
                    .and_then(|items| coordinate_pair(items))
                    .ok_or_else(invalid_point)?;

                Ok(Self::GeoJson { coordinates })
            }
            _ => Err(invalid_point()),
        }
    }

    pub fn x(&self) -> f64 {
        match self {
            Self::Legacy { x, .. } => *x,
            Self::GeoJson { coordinates } => coordinates[0],
        }
    }

    pub fn y(&self) -> f64 {
        match self {
            Self::Legacy { y, .. } => *y,
            Self::GeoJson { coordinates } => coordinates[1],
        }
    }

    pub fn is_geo_json(&self) -> bool {
        matches!(self, Self::GeoJson { .. })
    }
}

impl From<NearPoint> for Value {
    fn from(point: NearPoint) -> Self {
        match point {
            NearPoint::Legacy { x, y } => json!([x, y]),
            NearPoint::GeoJson { coordinates } => json!({
                "type": GEO_JSON_POINT_TYPE,
                "coordinates": [coordinates[0], coordinates[1]],
            }),
        }
    }
}

fn coordinate_pair(items: &[Value]) -> Option<[f64; 2]> {
    match items {
        [x, y] => {
            let x = x.as_f64().filter(|v| v.is_finite())?;
            let y = y.as_f64().filter(|v| v.is_finite())?;
            Some([x, y])
        }
        _ => None,
    }
}

fn invalid_point() -> Error {
    Error::invalid_argument(Some("near".to_string()), INVALID_POINT_MSG)
}
