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

use crate::clients::connection::Connection;
use crate::error;
use crate::error::Error;
use crate::options::near_options::NearOptions;
use crate::point::NearPoint;
use crate::results::near_results::NearStats;
use crate::results::Record;
use crate::schema::{cast_filter, FieldLookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

const PROTECTED_KEYS: [&str; 2] = ["geoNear", "near"];

// Recognised options that change how the command is built or how results are
// read. They are only accepted through their typed setters.
const TYPED_ONLY_KEYS: [&str; 2] = ["query", "lean"];

/// The native geoNear command document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct GeoNearCommand {
    // Must stay the first field, the server reads the command name from the
    // first key of the document.
    pub geo_near: String,
    pub near: Value,
    pub spherical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_locs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_docs: Option<bool>,
    #[serde(skip)]
    pub raw: Record,
}

impl GeoNearCommand {
    /// Translates a point and options into a command against `collection`.
    /// The filter is cast against `fields`; nothing touches the connection.
    pub fn build(
        collection: impl Into<String>,
        point: &NearPoint,
        opts: &NearOptions,
        fields: &dyn FieldLookup,
    ) -> error::Result<Self> {
        let mut raw = Record::new();
        if let Some(extra) = &opts.raw {
            for (k, v) in extra {
                if PROTECTED_KEYS.contains(&k.as_str()) {
                    debug!("Ignoring raw geoNear option {} which cannot be overridden", k);
                    continue;
                }
                if TYPED_ONLY_KEYS.contains(&k.as_str()) {
                    return Err(Error::invalid_argument(
                        Some(k.clone()),
                        format!("{k} cannot be passed as a raw option"),
                    ));
                }
                raw.insert(k.clone(), v.clone());
            }
        }

        let max_distance = finite("maxDistance", opts.max_distance)?;
        let min_distance = finite("minDistance", opts.min_distance)?;
        let distance_multiplier = finite("distanceMultiplier", opts.distance_multiplier)?;

        let query = match &opts.query {
            Some(query) => Some(cast_filter(query, fields)?),
            None => None,
        };

        Ok(Self {
            geo_near: collection.into(),
            near: (*point).into(),
            spherical: opts.spherical.unwrap_or(false),
            max_distance,
            min_distance,
            num: opts.num.or(opts.limit),
            query,
            distance_multiplier,
            include_locs: opts.include_locs,
            unique_docs: opts.unique_docs,
            raw,
        })
    }

    /// The document sent to the server. Raw options are applied on top of the
    /// recognised ones.
    pub fn to_document(&self) -> error::Result<Record> {
        let serialized = serde_json::to_value(self).map_err(Error::encoding_failure_from_serde)?;

        let Value::Object(mut doc) = serialized else {
            return Err(Error::other_failure(
                "geoNear command did not serialize to a document",
            ));
        };

        for (k, v) in &self.raw {
            doc.insert(k.clone(), v.clone());
        }

        Ok(doc)
    }
}

fn finite(arg: &str, value: Option<f64>) -> error::Result<Option<f64>> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::invalid_argument(
            Some(arg.to_string()),
            format!("{arg} must be a finite number"),
        )),
        other => Ok(other),
    }
}

/// The server's reply to a geoNear command.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct GeoNearReply {
    #[serde(default)]
    pub results: Vec<Record>,
    pub stats: Option<NearStats>,
    #[serde(default)]
    pub ok: f64,
    pub errmsg: Option<String>,
    pub code: Option<i32>,
}

/// Issues one geoNear command. Transport errors are returned as the
/// connection reported them; an `ok: 0` reply becomes a command failure.
pub async fn execute(conn: &dyn Connection, command: Record) -> error::Result<GeoNearReply> {
    let collection = command
        .get("geoNear")
        .and_then(Value::as_str)
        .unwrap_or_default();
    debug!("Dispatching geoNear command on {}", collection);

    let reply = conn.run_command(command).await?;

    let reply: GeoNearReply =
        serde_json::from_value(reply).map_err(Error::decoding_failure_from_serde)?;

    if reply.ok != 1.0 {
        return Err(Error::command_failed(
            reply.code,
            reply
                .errmsg
                .unwrap_or_else(|| "geoNear command failed".to_string()),
        ));
    }

    trace!("geoNear returned {} results", reply.results.len());

    Ok(reply)
}
