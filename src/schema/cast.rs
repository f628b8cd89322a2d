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
use crate::results::Record;
use crate::schema::{FieldLookup, FieldType, StrictQuery};
use serde_json::{Number, Value};
use tracing::trace;

const ID_FIELD: &str = "_id";

/// Casts a filter predicate against the declared field types.
///
/// Declared fields have their values (and the operands of comparison
/// operators) coerced to the declared type. `$and`, `$or` and `$nor` are
/// walked recursively. Keys that aren't declared are handled according to
/// [`FieldLookup::strict_query`].
pub fn cast_filter(filter: &Record, fields: &dyn FieldLookup) -> error::Result<Record> {
    let mut cast = Record::new();

    for (key, value) in filter {
        match key.as_str() {
            "$and" | "$or" | "$nor" => {
                let Value::Array(clauses) = value else {
                    return Err(Error::invalid_argument(
                        Some(key.clone()),
                        format!("{key} must be an array of filters"),
                    ));
                };

                let mut cast_clauses = Vec::with_capacity(clauses.len());
                for clause in clauses {
                    let Value::Object(clause) = clause else {
                        return Err(Error::invalid_argument(
                            Some(key.clone()),
                            format!("{key} must be an array of filters"),
                        ));
                    };
                    cast_clauses.push(Value::Object(cast_filter(clause, fields)?));
                }

                cast.insert(key.clone(), Value::Array(cast_clauses));
            }
            k if k.starts_with('$') => {
                cast.insert(key.clone(), value.clone());
            }
            _ => {
                let Some(field_type) = fields.field_type(key) else {
                    if key == ID_FIELD {
                        cast.insert(key.clone(), value.clone());
                        continue;
                    }

                    match fields.strict_query() {
                        StrictQuery::Passthrough => {
                            cast.insert(key.clone(), value.clone());
                        }
                        StrictQuery::Remove => {
                            trace!("Removing filter key {} which is not in schema", key);
                        }
                        StrictQuery::Throw => return Err(Error::strict_mode(key.clone())),
                    }
                    continue;
                };

                let value = match value {
                    Value::Object(ops) if is_operator_object(ops) => {
                        Value::Object(cast_operators(key, ops, field_type)?)
                    }
                    _ => cast_value(key, value, field_type)?,
                };

                cast.insert(key.clone(), value);
            }
        }
    }

    Ok(cast)
}

/// Coerces a single value to a field type. `null` is left alone for every
/// type. A scalar given for an array field is cast to the element type.
pub fn cast_value(path: &str, value: &Value, field_type: &FieldType) -> error::Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match field_type {
        FieldType::Mixed => Ok(value.clone()),
        FieldType::Number => cast_number(path, value),
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(cast_error(path, value, field_type)),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(cast_error(path, value, field_type)),
            },
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 1.0 => Ok(Value::Bool(true)),
                Some(v) if v == 0.0 => Ok(Value::Bool(false)),
                _ => Err(cast_error(path, value, field_type)),
            },
            _ => Err(cast_error(path, value, field_type)),
        },
        FieldType::Array(inner) => match value {
            Value::Array(items) => items
                .iter()
                .map(|item| cast_value(path, item, inner))
                .collect::<error::Result<Vec<_>>>()
                .map(Value::Array),
            _ => cast_value(path, value, inner),
        },
    }
}

fn cast_number(path: &str, value: &Value) -> error::Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::from(u8::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }

            if let Ok(int) = trimmed.parse::<i64>() {
                return Ok(Value::from(int));
            }

            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| cast_error(path, value, &FieldType::Number))
        }
        _ => Err(cast_error(path, value, &FieldType::Number)),
    }
}

fn cast_operators(path: &str, ops: &Record, field_type: &FieldType) -> error::Result<Record> {
    let element_type = match field_type {
        FieldType::Array(inner) => inner.as_ref(),
        other => other,
    };

    let mut cast = Record::new();
    for (op, operand) in ops {
        let value = match op.as_str() {
            "$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte" => {
                cast_value(path, operand, field_type)?
            }
            "$in" | "$nin" | "$all" => match operand {
                Value::Array(items) => items
                    .iter()
                    .map(|item| cast_value(path, item, element_type))
                    .collect::<error::Result<Vec<_>>>()
                    .map(Value::Array)?,
                other => cast_value(path, other, element_type)?,
            },
            "$exists" => cast_value(path, operand, &FieldType::Boolean)?,
            "$size" => cast_value(path, operand, &FieldType::Number)?,
            "$not" => match operand {
                Value::Object(inner) if is_operator_object(inner) => {
                    Value::Object(cast_operators(path, inner, field_type)?)
                }
                other => other.clone(),
            },
            _ => operand.clone(),
        };

        cast.insert(op.clone(), value);
    }

    Ok(cast)
}

fn is_operator_object(obj: &Record) -> bool {
    !obj.is_empty() && obj.keys().all(|k| k.starts_with('$'))
}

fn cast_error(path: &str, value: &Value, field_type: &FieldType) -> Error {
    let value = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    Error::cast(path, value, field_type.to_string())
}
