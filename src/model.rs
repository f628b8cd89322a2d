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
use crate::command;
use crate::command::GeoNearCommand;
use crate::deferred;
use crate::deferred::{Callback, DeferredValue};
use crate::error;
use crate::error::Error;
use crate::options::near_options::NearOptions;
use crate::point::NearPoint;
use crate::results::near_results::{NearResults, ResultBuilder};
use crate::results::Record;
use crate::schema::Schema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

/// A domain type stored as a document.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// The string form of the document's `_id`.
    fn id(&self) -> String;
}

/// Builds an entity from a stored record, the same way for every read path.
pub(crate) fn hydrate<T: Entity>(schema: &Schema, record: Record) -> error::Result<T> {
    let record = schema.apply(record)?;

    serde_json::from_value(Value::Object(record)).map_err(Error::decoding_failure_from_serde)
}

/// An entity type bound to a collection, its schema and a connection.
pub struct Model<T> {
    connection: Arc<dyn Connection>,
    collection: String,
    schema: Arc<Schema>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Model<T> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            collection: self.collection.clone(),
            schema: self.schema.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> Debug for Model<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("collection", &self.collection)
            .field("schema", &self.schema)
            .finish()
    }
}

impl<T: Entity> Model<T> {
    pub fn new(
        connection: Arc<dyn Connection>,
        collection: impl Into<String>,
        schema: Schema,
    ) -> Self {
        Self {
            connection,
            collection: collection.into(),
            schema: Arc::new(schema),
            _entity: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn hydrate(&self, record: Record) -> error::Result<T> {
        hydrate(&self.schema, record)
    }

    /// Finds the documents nearest to `near`, closest first.
    ///
    /// `near` is either a legacy `[x, y]` pair or a GeoJSON point object. The
    /// query starts immediately; the returned value resolves with the results
    /// or with the first error from validation, casting, the server or
    /// hydration.
    pub fn geo_near(
        &self,
        near: impl Into<Value>,
        options: impl Into<Option<NearOptions>>,
    ) -> DeferredValue<NearResults<T>> {
        self.geo_near_inner(near.into(), options.into().unwrap_or_default(), None)
    }

    /// As [`Model::geo_near`], also invoking `callback` exactly once with the
    /// outcome before the returned value resolves.
    pub fn geo_near_with_callback<F>(
        &self,
        near: impl Into<Value>,
        options: impl Into<Option<NearOptions>>,
        callback: F,
    ) -> DeferredValue<NearResults<T>>
    where
        F: FnOnce(&error::Result<NearResults<T>>) + Send + 'static,
    {
        self.geo_near_inner(
            near.into(),
            options.into().unwrap_or_default(),
            Some(Box::new(callback)),
        )
    }

    fn geo_near_inner(
        &self,
        near: Value,
        opts: NearOptions,
        callback: Option<Callback<NearResults<T>>>,
    ) -> DeferredValue<NearResults<T>> {
        let (completion, deferred) = deferred::deferred(callback);

        let command = match self.prepare(&near, &opts) {
            Ok(command) => command,
            Err(e) => {
                debug!("geoNear on {} rejected before dispatch: {}", &self.collection, &e);
                completion.settle(Err(e));
                return deferred;
            }
        };

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                completion.settle(Err(Error::other_failure(format!(
                    "geoNear must be called from within a tokio runtime: {e}"
                ))));
                return deferred;
            }
        };

        let connection = self.connection.clone();
        let schema = self.schema.clone();
        let lean = opts.lean;

        handle.spawn(async move {
            let builder = ResultBuilder::new(lean, &schema);
            let outcome = run(connection.as_ref(), command, builder).await;
            completion.settle(outcome);
        });

        deferred
    }

    fn prepare(&self, near: &Value, opts: &NearOptions) -> error::Result<Record> {
        let point = NearPoint::normalize(near)?;

        GeoNearCommand::build(&self.collection, &point, opts, self.schema.as_ref())?.to_document()
    }
}

async fn run<T: Entity>(
    connection: &dyn Connection,
    command: Record,
    builder: ResultBuilder<'_>,
) -> error::Result<NearResults<T>> {
    let reply = command::execute(connection, command).await?;

    builder.map_all(reply.results, reply.stats)
}
