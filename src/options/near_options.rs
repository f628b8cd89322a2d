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

use crate::results::Record;
use serde_json::Value;

/// Options for a near query.
///
/// Distances are in whatever unit the chosen distance mode uses: radians for
/// spherical queries around a legacy pair, meters around a GeoJSON point and
/// coordinate units for planar queries.
#[derive(Default, Debug, Clone)]
#[non_exhaustive]
pub struct NearOptions {
    pub spherical: Option<bool>,
    pub max_distance: Option<f64>,
    pub min_distance: Option<f64>,
    pub num: Option<u32>,
    pub limit: Option<u32>,
    pub query: Option<Record>,
    pub lean: bool,
    pub distance_multiplier: Option<f64>,
    pub include_locs: Option<bool>,
    pub unique_docs: Option<bool>,
    pub raw: Option<Record>,
}

impl NearOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spherical(mut self, spherical: bool) -> Self {
        self.spherical = Some(spherical);
        self
    }

    pub fn max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    pub fn min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = Some(min_distance);
        self
    }

    pub fn num(mut self, num: u32) -> Self {
        self.num = Some(num);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter applied by the server before distances are computed. Values are
    /// cast against the model schema first.
    pub fn query(mut self, query: impl Into<Option<Record>>) -> Self {
        self.query = query.into();
        self
    }

    pub fn lean(mut self, lean: bool) -> Self {
        self.lean = lean;
        self
    }

    pub fn distance_multiplier(mut self, distance_multiplier: f64) -> Self {
        self.distance_multiplier = Some(distance_multiplier);
        self
    }

    pub fn include_locs(mut self, include_locs: bool) -> Self {
        self.include_locs = Some(include_locs);
        self
    }

    pub fn unique_docs(mut self, unique_docs: bool) -> Self {
        self.unique_docs = Some(unique_docs);
        self
    }

    /// Any other option understood by the server's geoNear command. Entries
    /// are sent in the order they were added. `query` and `lean` must be set
    /// through their own setters.
    pub fn raw<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        let mut raw = self.raw.unwrap_or_default();
        raw.insert(key.into(), value.into());
        self.raw = Some(raw);
        self
    }
}
