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
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::trace;

/// Error-first completion callback. It sees the outcome by reference, the
/// deferred value receives it afterwards.
pub type Callback<T> = Box<dyn FnOnce(&error::Result<T>) + Send + 'static>;

/// The eventual outcome of an operation that is already running.
///
/// Awaiting it is optional: the operation completes, and any callback fires,
/// whether or not this value is polled.
#[derive(Debug)]
#[must_use = "the outcome of the operation is only observable through the deferred value or its callback"]
pub struct DeferredValue<T> {
    receiver: oneshot::Receiver<error::Result<T>>,
}

impl<T> Future for DeferredValue<T> {
    type Output = error::Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_| Err(Error::request_canceled())))
    }
}

/// The settling half of a [`DeferredValue`]. Settling consumes it, so an
/// outcome is delivered at most once.
pub(crate) struct Completion<T> {
    sender: oneshot::Sender<error::Result<T>>,
    callback: Option<Callback<T>>,
}

impl<T> Completion<T> {
    pub(crate) fn settle(self, outcome: error::Result<T>) {
        if let Some(callback) = self.callback {
            callback(&outcome);
        }

        if self.sender.send(outcome).is_err() {
            trace!("Deferred value was dropped before it settled");
        }
    }
}

pub(crate) fn deferred<T>(callback: Option<Callback<T>>) -> (Completion<T>, DeferredValue<T>) {
    let (sender, receiver) = oneshot::channel();

    (Completion { sender, callback }, DeferredValue { receiver })
}
