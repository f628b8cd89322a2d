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

pub mod cast;

pub use cast::{cast_filter, cast_value};

use crate::error;
use crate::results::Record;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array(Box<FieldType>),
    Mixed,
}

impl FieldType {
    pub fn array(inner: FieldType) -> Self {
        Self::Array(Box::new(inner))
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Array(inner) => write!(f, "[{inner}]"),
            FieldType::Mixed => write!(f, "mixed"),
        }
    }
}

/// How filter keys that aren't declared on the schema are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StrictQuery {
    /// Unknown keys are sent to the server as given.
    #[default]
    Passthrough,
    /// Unknown keys are dropped from the filter.
    Remove,
    /// Unknown keys fail the query.
    Throw,
}

/// Field type information used to cast filter predicates.
///
/// `Schema` is the usual implementation; anything that can answer "what type
/// does this path have" can stand in for it.
pub trait FieldLookup: Send + Sync {
    fn field_type(&self, path: &str) -> Option<&FieldType>;

    fn strict_query(&self) -> StrictQuery {
        StrictQuery::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct SchemaField {
    pub field_type: FieldType,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Schema {
    pub(crate) fields: HashMap<String, SchemaField>,
    pub(crate) strict_query: StrictQuery,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, path: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(
            path.into(),
            SchemaField {
                field_type,
                default: None,
            },
        );
        self
    }

    pub fn field_with_default(
        mut self,
        path: impl Into<String>,
        field_type: FieldType,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.insert(
            path.into(),
            SchemaField {
                field_type,
                default: Some(default.into()),
            },
        );
        self
    }

    pub fn strict_query(mut self, strict_query: StrictQuery) -> Self {
        self.strict_query = strict_query;
        self
    }

    pub fn get(&self, path: &str) -> Option<&SchemaField> {
        self.fields.get(path)
    }

    /// Applies defaults and casts declared top level fields of a raw record,
    /// the way any document read from the server is prepared before it is
    /// deserialized into its entity type.
    pub fn apply(&self, mut record: Record) -> error::Result<Record> {
        for (path, field) in &self.fields {
            match record.get_mut(path) {
                Some(value) => {
                    let cast = cast_value(path, value, &field.field_type)?;
                    // A scalar stored in an array field is read back as a
                    // single element array.
                    *value = match &field.field_type {
                        FieldType::Array(_) if !cast.is_array() && !cast.is_null() => {
                            Value::Array(vec![cast])
                        }
                        _ => cast,
                    };
                }
                None => {
                    if let Some(default) = &field.default {
                        record.insert(path.clone(), default.clone());
                    }
                }
            }
        }

        Ok(record)
    }
}

impl FieldLookup for Schema {
    fn field_type(&self, path: &str) -> Option<&FieldType> {
        self.fields.get(path).map(|f| &f.field_type)
    }

    fn strict_query(&self) -> StrictQuery {
        self.strict_query
    }
}
