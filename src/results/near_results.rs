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
use crate::error::{Error, ErrorKind};
use crate::model::{hydrate, Entity};
use crate::results::Record;
use crate::schema::Schema;
use serde::Deserialize;
use serde_json::Value;
use std::ops::Deref;

const ID_FIELD: &str = "_id";

/// The document half of a near result.
#[derive(Debug, Clone, PartialEq)]
pub enum NearObject<T> {
    /// The record as stored, returned when the query was lean.
    Lean(Record),
    /// The record hydrated into its entity type.
    Hydrated(T),
}

impl<T: Entity> NearObject<T> {
    /// The document identity, `_id` for lean records and [`Entity::id`]
    /// for hydrated ones.
    pub fn id(&self) -> Option<String> {
        match self {
            NearObject::Lean(record) => record.get(ID_FIELD).map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            NearObject::Hydrated(entity) => Some(entity.id()),
        }
    }
}

impl<T> NearObject<T> {
    pub fn is_lean(&self) -> bool {
        matches!(self, NearObject::Lean(_))
    }

    pub fn as_instance(&self) -> Option<&T> {
        match self {
            NearObject::Hydrated(entity) => Some(entity),
            NearObject::Lean(_) => None,
        }
    }

    pub fn into_instance(self) -> Option<T> {
        match self {
            NearObject::Hydrated(entity) => Some(entity),
            NearObject::Lean(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            NearObject::Lean(record) => Some(record),
            NearObject::Hydrated(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct NearResult<T> {
    pub distance: f64,
    pub object: NearObject<T>,
    pub location: Option<Value>,
    pub raw: Record,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct NearStats {
    pub nscanned: Option<u64>,
    pub objects_loaded: Option<u64>,
    pub avg_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub time: Option<u64>,
}

/// The results of one near query, in the order the server returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct NearResults<T> {
    pub(crate) results: Vec<NearResult<T>>,
    pub(crate) stats: Option<NearStats>,
}

impl<T> NearResults<T> {
    pub fn results(&self) -> &[NearResult<T>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<NearResult<T>> {
        self.results
    }

    pub fn stats(&self) -> Option<&NearStats> {
        self.stats.as_ref()
    }
}

impl<T> Deref for NearResults<T> {
    type Target = [NearResult<T>];

    fn deref(&self) -> &Self::Target {
        &self.results
    }
}

impl<T> IntoIterator for NearResults<T> {
    type Item = NearResult<T>;
    type IntoIter = std::vec::IntoIter<NearResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a NearResults<T> {
    type Item = &'a NearResult<T>;
    type IntoIter = std::slice::Iter<'a, NearResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// How the `obj` of each raw entry becomes a [`NearObject`]. Picked once per
/// query from the lean flag.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ResultBuilder<'a> {
    Lean,
    Hydrate(&'a Schema),
}

impl<'a> ResultBuilder<'a> {
    pub(crate) fn new(lean: bool, schema: &'a Schema) -> Self {
        if lean {
            ResultBuilder::Lean
        } else {
            ResultBuilder::Hydrate(schema)
        }
    }

    pub(crate) fn build<T: Entity>(&self, record: Record) -> error::Result<NearObject<T>> {
        match self {
            ResultBuilder::Lean => Ok(NearObject::Lean(record)),
            ResultBuilder::Hydrate(schema) => hydrate(schema, record).map(NearObject::Hydrated),
        }
    }

    /// Maps every raw entry, preserving order. The first failure wins.
    pub(crate) fn map_all<T: Entity>(
        &self,
        entries: Vec<Record>,
        stats: Option<NearStats>,
    ) -> error::Result<NearResults<T>> {
        let results = entries
            .into_iter()
            .map(|entry| self.map_entry(entry))
            .collect::<error::Result<Vec<_>>>()?;

        Ok(NearResults { results, stats })
    }

    fn map_entry<T: Entity>(&self, entry: Record) -> error::Result<NearResult<T>> {
        let distance = entry.get("dis").and_then(Value::as_f64).ok_or_else(|| {
            Error::new(ErrorKind::DecodingFailure(
                "near result is missing its distance".to_string(),
            ))
        })?;

        let record = match entry.get("obj") {
            Some(Value::Object(record)) => record.clone(),
            _ => {
                return Err(Error::new(ErrorKind::DecodingFailure(
                    "near result is missing its document".to_string(),
                )))
            }
        };

        Ok(NearResult {
            distance,
            object: self.build(record)?,
            location: entry.get("loc").cloned(),
            raw: entry,
        })
    }
}
