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
use crate::error::{Error, ErrorKind};
use crate::options::connection_options::HttpConnectionOptions;
use crate::results::Record;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

/// Runs commands by POSTing them as JSON to `<endpoint>/<database>/command`.
#[derive(Debug)]
pub struct HttpConnection {
    inner: reqwest::Client,
    client_id: String,
    command_uri: String,
    user_agent: Option<String>,
    request_timeout: Option<Duration>,
}

impl HttpConnection {
    pub fn new(opts: HttpConnectionOptions) -> error::Result<Self> {
        let mut builder =
            reqwest::Client::builder().pool_idle_timeout(opts.idle_connection_timeout);

        if let Some(max_idle) = opts.max_idle_connections_per_host {
            builder = builder.pool_max_idle_per_host(max_idle);
        }

        let inner = builder.build().map_err(|e| {
            Error::other_failure(format!("failed to build http client {e}")).with(Arc::new(e))
        })?;

        let client_id = Uuid::new_v4().to_string();
        debug!("Created HTTP connection {}", &client_id);

        Ok(Self {
            inner,
            client_id,
            command_uri: command_uri(&opts.endpoint, &opts.database),
            user_agent: opts.user_agent,
            request_timeout: opts.request_timeout,
        })
    }

    pub fn command_uri(&self) -> &str {
        &self.command_uri
    }

    async fn read_reply(&self, id: &str, response: reqwest::Response) -> error::Result<Value> {
        let status = response.status();

        if status.is_success() {
            return response.json::<Value>().await.map_err(|e| {
                Error::new(ErrorKind::DecodingFailure(format!(
                    "failed to read command reply: {e}"
                )))
                .with(Arc::new(e))
            });
        }

        let body = response.bytes().await.map_err(|e| {
            Error::transport(format!(
                "non-success status code received {status} but reading the body failed: {e}"
            ))
            .with(Arc::new(e))
        })?;

        trace!(
            "Non-success reply on {}. Request id={}. Status: {}",
            &self.client_id,
            id,
            status
        );

        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(reply)) if reply.contains_key("errmsg") => {
                let msg = reply
                    .get("errmsg")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let code = reply
                    .get("code")
                    .and_then(Value::as_i64)
                    .and_then(|c| i32::try_from(c).ok());

                Err(Error::command_failed(code, msg))
            }
            _ => Err(Error::transport(format!(
                "non-success status code received {status}"
            ))),
        }
    }
}

#[async_trait]
impl Connection for HttpConnection {
    async fn run_command(&self, command: Record) -> error::Result<Value> {
        let id = Uuid::new_v4().to_string();

        trace!(
            "Writing command on {} to {}. Request id={}",
            &self.client_id,
            &self.command_uri,
            &id
        );

        let mut builder = self.inner.post(&self.command_uri).json(&command);

        if let Some(user_agent) = &self.user_agent {
            builder = builder.header(USER_AGENT, user_agent);
        }

        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        match builder.send().await {
            Ok(response) => {
                trace!(
                    "Received response on {}. Request id={}. Status: {}",
                    &self.client_id,
                    &id,
                    response.status()
                );
                self.read_reply(&id, response).await
            }
            Err(err) => {
                let mut msg = format!(
                    "Received error on {}. Request id={}. Err: {}",
                    &self.client_id, &id, &err,
                );

                if let Some(source) = err.source() {
                    msg = format!("{msg}. Source: {source}");
                }

                trace!("{msg}");

                Err(Error::transport(err.to_string()).with(Arc::new(err)))
            }
        }
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        debug!("Dropping HTTP connection {}", &self.client_id);
    }
}

fn command_uri(endpoint: &str, database: &str) -> String {
    format!("{}/{}/command", endpoint.trim_end_matches('/'), database)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_uri_joins_endpoint_and_database() {
        assert_eq!(
            "http://localhost:8080/geo/command",
            command_uri("http://localhost:8080/", "geo")
        );
        assert_eq!(
            "http://localhost:8080/geo/command",
            command_uri("http://localhost:8080", "geo")
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let conn = HttpConnection::new(
            HttpConnectionOptions::new("http://127.0.0.1:1", "geo")
                .request_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let err = conn.run_command(Record::new()).await.unwrap_err();

        assert!(matches!(err.kind(), ErrorKind::Transport { .. }));
        assert!(err.source().is_some());
    }
}
