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
use crate::results::Record;
use async_trait::async_trait;
use serde_json::Value;

/// A handle able to run database commands.
///
/// Implementations own transport concerns such as timeouts, pooling and
/// multiplexing. Errors they return are handed to callers unchanged.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Runs one command document and returns the server's reply document.
    async fn run_command(&self, command: Record) -> error::Result<Value>;
}
